//! Claim state kept in sled survives reopening the store.

#![allow(
    unused_crate_dependencies,
    reason = "test dependencies shared across test suite"
)]

use fedpeg_db_store_sled::SledClaimDb;
use fedpeg_primitives::ClaimState;
use fedpeg_test_utils::PegFixture;
use integration_tests::harness::PegHarness;

#[test]
fn test_finalized_claim_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let mut h = PegHarness::new(PegFixture::default(), SledClaimDb::open(dir.path()).unwrap());
    let d = h.deposit(1, 10);
    let pending = h.deposit(2, 10);

    let tx = h.fx.pegin_tx(&[&d], 0);
    let b = h.block(vec![tx.clone()]);
    let b_id = b.blkid();
    h.coordinator.connect_block(&h.fx.chain, b).unwrap();

    let mempool_tx = h.fx.pegin_tx(&[&pending], 0);
    h.validator()
        .admit_transaction(&h.fx.chain, &mempool_tx)
        .unwrap();
    h.validator().registry().db().flush().unwrap();

    let PegHarness { fx, coordinator, .. } = h;
    drop(coordinator);

    let h = PegHarness::new(fx, SledClaimDb::open(dir.path()).unwrap());
    assert_eq!(
        h.state(&d.key()),
        ClaimState::Finalized {
            sidechain_txid: tx.compute_txid(),
            block: b_id
        }
    );
    assert_eq!(
        h.state(&pending.key()),
        ClaimState::Pending {
            sidechain_txid: mempool_tx.compute_txid()
        }
    );
    assert_eq!(h.validator().registry().claims().unwrap().len(), 2);

    // The reopened node still refuses a second claim.
    let rival = h.fx.pegin_tx(&[&d], 9);
    assert!(h
        .validator()
        .admit_transaction(&h.fx.chain, &rival)
        .is_err());
}
