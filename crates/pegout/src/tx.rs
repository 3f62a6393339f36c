use bitcoin::{Amount, BlockHash};
use fedpeg_common::instrumentation::components;
use fedpeg_primitives::SidechainTx;
use serde::{Deserialize, Serialize};
use tracing::*;

use crate::{
    errors::PegoutError,
    fee::FeePolicy,
    script::{decode_pegout, is_pegout_script, PegoutPayload},
};

/// A decoded peg-out output and the amount it burns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PegoutRequest {
    pub payload: PegoutPayload,
    pub amount: Amount,
    pub output_index: u32,
}

/// Collects the peg-out outputs of `tx` and checks them against the parent
/// chain's genesis hash and the fee rule.
///
/// Null-data outputs burning nothing are plain data carriers and are skipped.
pub fn validate_pegout_tx(
    tx: &SidechainTx,
    parent_genesis: BlockHash,
    fees: &FeePolicy,
) -> Result<Vec<PegoutRequest>, PegoutError> {
    let span = debug_span!("pegout", component = components::PEGOUT, txid = %tx.compute_txid());
    let _guard = span.enter();

    let mut requests = Vec::new();
    for (idx, out) in tx.outputs.iter().enumerate() {
        if out.value == 0 || !is_pegout_script(out.script()) {
            continue;
        }

        let payload = decode_pegout(out.script())?;
        if payload.genesis_hash != parent_genesis {
            debug!(output = idx, genesis = %payload.genesis_hash, "peg-out to foreign chain");
            return Err(PegoutError::MalformedDestination(format!(
                "genesis commitment {} is not the parent chain",
                payload.genesis_hash
            )));
        }

        requests.push(PegoutRequest {
            payload,
            amount: out.amount(),
            output_index: idx as u32,
        });
    }

    let fee = tx.fee().ok_or(PegoutError::FeeOutOfRange)?;
    fees.check_fee(tx.vsize, fee)?;
    trace!(n_pegouts = requests.len(), "peg-out tx ok");
    Ok(requests)
}

#[cfg(test)]
mod tests {
    use bitcoin::{hashes::Hash, ScriptBuf, WPubkeyHash};
    use fedpeg_primitives::{Buf32, SidechainOutPoint, SidechainTxIn, SidechainTxOut};

    use super::*;
    use crate::script::encode;

    fn genesis() -> BlockHash {
        BlockHash::from_byte_array([0x0f; 32])
    }

    fn pegout_tx(genesis: BlockHash, fee: u64) -> SidechainTx {
        let dest = ScriptBuf::new_p2wpkh(&WPubkeyHash::from_byte_array([5; 20]));
        SidechainTx {
            inputs: vec![SidechainTxIn::spend(SidechainOutPoint::new(
                Buf32::from([1; 32]),
                0,
            ))],
            outputs: vec![
                SidechainTxOut::new(
                    Amount::from_sat(50_000),
                    encode(genesis, &dest).unwrap().into_bytes(),
                ),
                SidechainTxOut::new(Amount::ZERO, vec![0x6a, 0x01, 0xff]),
                SidechainTxOut::fee(Amount::from_sat(fee)),
            ],
            lock_time: 0,
            vsize: 250,
        }
    }

    #[test]
    fn test_finds_pegouts() {
        let reqs = validate_pegout_tx(&pegout_tx(genesis(), 250), genesis(), &FeePolicy::default())
            .unwrap();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].amount, Amount::from_sat(50_000));
        assert_eq!(reqs[0].output_index, 0);
        assert!(reqs[0].payload.destination_script.is_p2wpkh());
    }

    #[test]
    fn test_foreign_genesis_malformed() {
        let other = BlockHash::from_byte_array([0xee; 32]);
        let err = validate_pegout_tx(&pegout_tx(other, 250), genesis(), &FeePolicy::default())
            .unwrap_err();
        assert!(matches!(err, PegoutError::MalformedDestination(_)));
    }

    #[test]
    fn test_low_fee() {
        let err = validate_pegout_tx(&pegout_tx(genesis(), 249), genesis(), &FeePolicy::default())
            .unwrap_err();
        assert_eq!(
            err,
            PegoutError::InsufficientFee {
                fee: Amount::from_sat(249),
                required: Amount::from_sat(250),
            }
        );
    }

    #[test]
    fn test_fee_overflow_rejected() {
        let mut tx = pegout_tx(genesis(), 250);
        tx.outputs.push(SidechainTxOut::fee(Amount::from_sat(u64::MAX)));
        tx.outputs.push(SidechainTxOut::fee(Amount::from_sat(u64::MAX)));
        let err = validate_pegout_tx(&tx, genesis(), &FeePolicy::default()).unwrap_err();
        assert_eq!(err, PegoutError::FeeOutOfRange);
    }
}
