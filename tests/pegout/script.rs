//! Peg-out scripts, from a user's address to a checked sidechain output.

#![allow(
    unused_crate_dependencies,
    reason = "test dependencies shared across test suite"
)]

use bitcoin::{hashes::Hash, Address, Amount, BlockHash, Network, ScriptBuf, WScriptHash};
use fedpeg_pegin::{RejectReason, ValidationError};
use fedpeg_pegout::{
    classify_destination, decode_pegout, encode, parse_destination, validate_pegout_tx,
    DestinationType,
};
use fedpeg_primitives::SidechainTxOut;
use fedpeg_test_utils::PeginTxBuilder;
use integration_tests::harness::PegHarness;

fn rejection<T>(res: Result<T, ValidationError>) -> RejectReason {
    match res {
        Ok(_) => panic!("expected a rejection"),
        Err(ValidationError::Rejected(reason)) => reason,
        Err(ValidationError::Fault(fault)) => panic!("unexpected fault: {fault}"),
    }
}

fn regtest_address() -> String {
    let script = ScriptBuf::new_p2wsh(&WScriptHash::from_byte_array([7; 32]));
    Address::from_script(&script, Network::Regtest)
        .unwrap()
        .to_string()
}

#[test]
fn test_address_to_pegout_and_back() {
    let h = PegHarness::in_memory();
    let genesis = h.fx.params.parent_genesis_hash;

    let destination = parse_destination(&regtest_address(), Network::Regtest).unwrap();
    let script = encode(genesis, &destination).unwrap();
    assert!(script.is_op_return());

    let payload = decode_pegout(&script).unwrap();
    assert_eq!(payload.genesis_hash, genesis);
    assert_eq!(payload.destination_script, destination);

    let info = classify_destination(&payload.destination_script, Network::Regtest);
    assert_eq!(info.kind, DestinationType::WitnessV0Scripthash);
    assert_eq!(info.req_sigs(), Some(1));
    assert_eq!(info.address.unwrap().to_string(), regtest_address());
}

#[test]
fn test_address_for_other_network_rejected() {
    let err = parse_destination(&regtest_address(), Network::Bitcoin).unwrap_err();
    assert_eq!(
        err.to_string(),
        "bad-pegout-destination, Invalid Bitcoin address"
    );
}

#[test]
fn test_pegin_straight_to_pegout() {
    let mut h = PegHarness::in_memory();
    let d = h.deposit(1, 10);
    let genesis = h.fx.params.parent_genesis_hash;
    let proof = h.fx.chain.proof_for(d.tx.compute_txid()).unwrap();
    let witness = d.witness(genesis, proof);
    let destination = parse_destination(&regtest_address(), Network::Regtest).unwrap();
    let pegout_script = encode(genesis, &destination).unwrap();

    let tx = PeginTxBuilder::new()
        .claim(d.input(&witness), d.value())
        .destination(pegout_script.clone())
        .build();
    let requests = validate_pegout_tx(&tx, genesis, h.validator().fees()).unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].output_index, 0);
    assert_eq!(requests[0].payload.destination_script, destination);

    // Below the relay floor for its size.
    let cheap = PeginTxBuilder::new()
        .claim(d.input(&witness), d.value())
        .destination(pegout_script)
        .fee(Amount::from_sat(1))
        .build();
    let err = rejection(h.validator().admit_transaction(&h.fx.chain, &cheap));
    assert!(matches!(err, RejectReason::InsufficientFee { .. }));
    assert!(h.state(&d.key()).is_unclaimed());

    // Burning to some other chain is refused.
    let foreign = encode(BlockHash::from_byte_array([0xee; 32]), &destination).unwrap();
    let misdirected = PeginTxBuilder::new()
        .claim(d.input(&witness), d.value())
        .destination(foreign)
        .build();
    let err = rejection(h.validator().admit_transaction(&h.fx.chain, &misdirected));
    assert!(matches!(err, RejectReason::MalformedDestination(_)));

    h.validator().admit_transaction(&h.fx.chain, &tx).unwrap();
    assert_eq!(h.state(&d.key()).claimant(), Some(tx.compute_txid()));
}

#[test]
fn test_overflowing_fee_outputs_rejected() {
    let mut h = PegHarness::in_memory();
    let d = h.deposit(1, 10);
    let mut tx = h.fx.pegin_tx(&[&d], 0);
    tx.outputs.push(SidechainTxOut::fee(Amount::from_sat(u64::MAX)));
    tx.outputs.push(SidechainTxOut::fee(Amount::from_sat(u64::MAX)));

    let err = rejection(h.validator().admit_transaction(&h.fx.chain, &tx));
    assert_eq!(err, RejectReason::FeeOutOfRange);
    assert!(err.to_string().starts_with("bad-txns-fee-outofrange"));
    assert!(h.state(&d.key()).is_unclaimed());
}
