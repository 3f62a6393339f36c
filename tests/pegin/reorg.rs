//! Claim state across sidechain reorgs.

#![allow(
    unused_crate_dependencies,
    reason = "test dependencies shared across test suite"
)]

use fedpeg_pegin::{BlockStatus, RejectReason, ValidationError};
use fedpeg_primitives::ClaimState;
use integration_tests::harness::PegHarness;

fn rejection<T>(res: Result<T, ValidationError>) -> RejectReason {
    match res {
        Ok(_) => panic!("expected a rejection"),
        Err(ValidationError::Rejected(reason)) => reason,
        Err(ValidationError::Fault(fault)) => panic!("unexpected fault: {fault}"),
    }
}

#[test]
fn test_reorg_between_competing_claims() {
    let mut h = PegHarness::in_memory();
    let d = h.deposit(1, 10);
    let tx_a = h.fx.pegin_tx(&[&d], 0);
    let tx_b = h.fx.pegin_tx(&[&d], 1);

    h.validator().admit_transaction(&h.fx.chain, &tx_a).unwrap();
    let b = h.block(vec![tx_a.clone()]);
    let b_id = b.blkid();
    h.coordinator.connect_block(&h.fx.chain, b).unwrap();
    let finalized_a = h.state(&d.key());
    assert_eq!(finalized_a.finalizing_block(), Some(b_id));

    // B goes away; its peg-in tx comes back to the mempool.
    let returned = h.coordinator.invalidate_block(b_id).unwrap();
    assert_eq!(returned, vec![tx_a.clone()]);
    assert!(h.state(&d.key()).is_unclaimed());
    h.validator()
        .admit_transaction(&h.fx.chain, &returned[0])
        .unwrap();
    assert_eq!(
        h.state(&d.key()),
        ClaimState::Pending {
            sidechain_txid: tx_a.compute_txid()
        }
    );

    // One block cannot hold both claims.
    let both = h.block(vec![tx_a.clone(), tx_b.clone()]);
    let err = rejection(h.coordinator.connect_block(&h.fx.chain, both));
    assert_eq!(err, RejectReason::DuplicatePeginInBlock(d.key()));
    assert_eq!(
        h.state(&d.key()).claimant(),
        Some(tx_a.compute_txid()),
        "failed block must not touch the registry"
    );

    // The competing branch wins over the pending mempool claim.
    let b2 = h.block(vec![tx_b.clone()]);
    let b2_id = b2.blkid();
    h.coordinator.connect_block(&h.fx.chain, b2).unwrap();
    assert_eq!(
        h.state(&d.key()),
        ClaimState::Finalized {
            sidechain_txid: tx_b.compute_txid(),
            block: b2_id
        }
    );
    assert_eq!(h.validator().release_transaction(&tx_a).unwrap(), 0);

    let err = rejection(h.coordinator.reconsider_block(&h.fx.chain, b_id));
    assert!(matches!(err, RejectReason::AlreadyClaimed { .. }));
    assert_eq!(h.coordinator.status(&b_id), Some(BlockStatus::Invalidated));

    // Switch back to the original branch.
    h.coordinator.invalidate_block(b2_id).unwrap();
    assert!(h.state(&d.key()).is_unclaimed());
    h.coordinator.reconsider_block(&h.fx.chain, b_id).unwrap();
    assert_eq!(h.state(&d.key()), finalized_a);
    assert_eq!(h.state(&d.key()).to_bytes(), finalized_a.to_bytes());
    assert_eq!(h.coordinator.status(&b_id), Some(BlockStatus::Connected));
    assert_eq!(h.coordinator.status(&b2_id), Some(BlockStatus::Invalidated));
}

#[test]
fn test_parent_reorg_delays_reconsider() {
    let mut h = PegHarness::in_memory();
    let d = h.deposit(1, 10);
    let tx = h.fx.pegin_tx(&[&d], 0);
    let b = h.block(vec![tx]);
    let b_id = b.blkid();
    h.coordinator.connect_block(&h.fx.chain, b).unwrap();
    h.coordinator.invalidate_block(b_id).unwrap();

    // The deposit block survives but loses depth.
    h.fx.chain.rewind_to(d.height + 5);
    let err = rejection(h.coordinator.reconsider_block(&h.fx.chain, b_id));
    assert_eq!(
        err,
        RejectReason::NeedsMoreConfirmations {
            confirmations: 6,
            required: 10
        }
    );
    assert!(h.state(&d.key()).is_unclaimed());

    h.fx.chain.mine_empty(4);
    h.coordinator.reconsider_block(&h.fx.chain, b_id).unwrap();
    assert_eq!(h.state(&d.key()).finalizing_block(), Some(b_id));
}

#[test]
fn test_block_with_several_claims_reverts_together() {
    let mut h = PegHarness::in_memory();
    let d1 = h.deposit(1, 1);
    let d2 = h.deposit(2, 10);
    let tx1 = h.fx.pegin_tx(&[&d1], 0);
    let tx2 = h.fx.pegin_tx(&[&d2], 0);

    let b = h.block(vec![tx1, tx2]);
    let b_id = b.blkid();
    h.coordinator.connect_block(&h.fx.chain, b).unwrap();
    let mut expected = vec![d1.key(), d2.key()];
    expected.sort();
    assert_eq!(h.validator().registry().finalized_by(b_id).unwrap(), expected);

    let returned = h.coordinator.invalidate_block(b_id).unwrap();
    assert_eq!(returned.len(), 2);
    assert!(h.state(&d1.key()).is_unclaimed());
    assert!(h.state(&d2.key()).is_unclaimed());
}
