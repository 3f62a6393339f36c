//! Peg-in lifecycle from deposit to finalized claim.

#![allow(
    unused_crate_dependencies,
    reason = "test dependencies shared across test suite"
)]

use bitcoin::Amount;
use fedpeg_pegin::{ClaimScriptHint, RejectReason, ValidationContext, ValidationError};
use fedpeg_primitives::{ClaimState, SidechainTxid};
use fedpeg_test_utils::{federation::claim_script, PeginTxBuilder};
use integration_tests::harness::{PegHarness, DEPOSIT_VALUE};

fn rejection<T>(res: Result<T, ValidationError>) -> RejectReason {
    match res {
        Ok(_) => panic!("expected a rejection"),
        Err(ValidationError::Rejected(reason)) => reason,
        Err(ValidationError::Fault(fault)) => panic!("unexpected fault: {fault}"),
    }
}

#[test]
fn test_wallet_waits_for_buffered_depth() {
    let mut h = PegHarness::in_memory();
    let d = h.deposit(1, 1);
    let deposit = d.deposit_transaction();
    let cs = claim_script(1);
    let hint = ClaimScriptHint::Explicit(&cs);

    let proof = h.fx.chain.proof_for(d.tx.compute_txid()).unwrap();
    let err = rejection(h.validator().claim_pegin(&h.fx.chain, &deposit, &proof, hint));
    assert_eq!(
        err,
        RejectReason::NeedsMoreConfirmations {
            confirmations: 1,
            required: 12
        }
    );

    // Deep enough for consensus, not for the wallet.
    h.fx.confirm_to(&d, 11);
    let inspection = h
        .validator()
        .inspect_claim(&h.fx.chain, &deposit, &proof, hint)
        .unwrap();
    assert!(inspection.mature);
    assert!(!inspection.mature_with_buffer);
    assert!(h
        .validator()
        .claim_pegin(&h.fx.chain, &deposit, &proof, hint)
        .is_err());

    h.fx.confirm_to(&d, 12);
    let claim = h
        .validator()
        .claim_pegin(&h.fx.chain, &deposit, &proof, hint)
        .unwrap();
    assert_eq!(claim.key(), d.key());
    assert_eq!(claim.credited_amount, DEPOSIT_VALUE);
    assert!(!claim.is_coinbase);
}

#[test]
fn test_mempool_then_block() {
    let mut h = PegHarness::in_memory();
    let d = h.deposit(1, 1);

    let early = h.fx.pegin_tx(&[&d], 0);
    let err = rejection(h.validator().admit_transaction(&h.fx.chain, &early));
    assert_eq!(
        err,
        RejectReason::NeedsMoreConfirmations {
            confirmations: 1,
            required: 10
        }
    );
    assert!(h.state(&d.key()).is_unclaimed());

    h.fx.confirm_to(&d, 10);
    let tx = h.fx.pegin_tx(&[&d], 0);
    let claims = h.validator().admit_transaction(&h.fx.chain, &tx).unwrap();
    assert_eq!(claims.len(), 1);
    assert_eq!(
        h.state(&d.key()),
        ClaimState::Pending {
            sidechain_txid: tx.compute_txid()
        }
    );

    // A second spend of the same deposit is a mempool conflict.
    let rival = h.fx.pegin_tx(&[&d], 1);
    let err = rejection(h.validator().admit_transaction(&h.fx.chain, &rival));
    assert!(matches!(
        err,
        RejectReason::MempoolConflict { holder, .. } if holder == tx.compute_txid()
    ));
    assert!(err.is_retryable());

    let block = h.block(vec![tx.clone()]);
    let blkid = block.blkid();
    h.coordinator.connect_block(&h.fx.chain, block).unwrap();
    assert_eq!(
        h.state(&d.key()),
        ClaimState::Finalized {
            sidechain_txid: tx.compute_txid(),
            block: blkid
        }
    );

    let err = rejection(h.validator().admit_transaction(&h.fx.chain, &rival));
    assert!(matches!(err, RejectReason::AlreadyClaimed { .. }));
    assert!(!err.is_retryable());
}

#[test]
fn test_claim_script_must_match() {
    let mut h = PegHarness::in_memory();
    let d = h.deposit(1, 10);
    let deposit = d.deposit_transaction();
    let proof = h.fx.chain.proof_for(d.tx.compute_txid()).unwrap();
    let ctx = ValidationContext::Mempool {
        sidechain_txid: SidechainTxid::from([1; 32]),
    };

    let wrong = claim_script(2);
    let err = rejection(h.validator().validate(
        &h.fx.chain,
        &deposit,
        &proof,
        ClaimScriptHint::Explicit(&wrong),
        ctx,
    ));
    assert_eq!(err, RejectReason::ScriptMismatch);
    assert_eq!(
        err.to_string(),
        "Given claim_script does not match the given Bitcoin transaction."
    );

    // A wallet scanning its own scripts finds the right one.
    let mine = [claim_script(2), claim_script(1), claim_script(3)];
    let (found, script) = h
        .validator()
        .locate_deposit(&d.raw_tx(), &mine)
        .unwrap()
        .unwrap();
    assert_eq!(found.vout(), 1);
    assert_eq!(script, claim_script(1));

    h.validator()
        .validate(
            &h.fx.chain,
            &deposit,
            &proof,
            ClaimScriptHint::Candidates(&mine),
            ctx,
        )
        .unwrap();
    assert!(!h.state(&d.key()).is_unclaimed());
}

#[test]
fn test_duplicate_input_rejected_before_registry() {
    let mut h = PegHarness::in_memory();
    let d = h.deposit(1, 10);
    let proof = h.fx.chain.proof_for(d.tx.compute_txid()).unwrap();
    let witness = d.witness(h.fx.params.parent_genesis_hash, proof);
    let tx = PeginTxBuilder::new()
        .claim(d.input(&witness), d.value())
        .claim(d.input(&witness), d.value())
        .build();

    let err = rejection(h.validator().admit_transaction(&h.fx.chain, &tx));
    assert!(matches!(err, RejectReason::DuplicateInput(_)));
    assert!(err.to_string().starts_with("bad-txns-inputs-duplicate"));

    let block = h.block(vec![tx]);
    let err = rejection(h.coordinator.connect_block(&h.fx.chain, block));
    assert!(matches!(err, RejectReason::DuplicateInput(_)));

    assert!(h.validator().registry().claims().unwrap().is_empty());
}

#[test]
fn test_coinbase_deposit_needs_maturity() {
    let mut h = PegHarness::in_memory();
    let cs = claim_script(5);
    let d = h.fx.coinbase_deposit(&cs, Amount::from_sat(50_000));
    h.fx.confirm_to(&d, 10);

    let tx = h.fx.pegin_tx(&[&d], 0);
    let err = rejection(h.validator().admit_transaction(&h.fx.chain, &tx));
    assert_eq!(
        err,
        RejectReason::NeedsMoreConfirmations {
            confirmations: 10,
            required: 100
        }
    );

    // Relayable at maturity, but the wallet still waits out its buffer.
    h.fx.confirm_to(&d, 100);
    let deposit = d.deposit_transaction();
    let proof = h.fx.chain.proof_for(d.tx.compute_txid()).unwrap();
    let hint = ClaimScriptHint::Explicit(&cs);
    let err = rejection(h.validator().claim_pegin(&h.fx.chain, &deposit, &proof, hint));
    assert_eq!(
        err,
        RejectReason::NeedsMoreConfirmations {
            confirmations: 100,
            required: 102
        }
    );

    let tx = h.fx.pegin_tx(&[&d], 0);
    let claims = h.validator().admit_transaction(&h.fx.chain, &tx).unwrap();
    assert!(claims[0].is_coinbase);
}

#[test]
fn test_release_frees_claim_for_rival() {
    let mut h = PegHarness::in_memory();
    let d = h.deposit(1, 10);

    let tx = h.fx.pegin_tx(&[&d], 0);
    h.validator().admit_transaction(&h.fx.chain, &tx).unwrap();
    assert_eq!(h.validator().release_transaction(&tx).unwrap(), 1);
    assert!(h.state(&d.key()).is_unclaimed());

    let rival = h.fx.pegin_tx(&[&d], 1);
    h.validator()
        .admit_transaction(&h.fx.chain, &rival)
        .unwrap();
    assert_eq!(h.state(&d.key()).claimant(), Some(rival.compute_txid()));
}
