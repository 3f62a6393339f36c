//! Peg-in witness stack codec.

use bitcoin::{hashes::Hash, Amount, BlockHash, ScriptBuf};
use thiserror::Error;

use crate::parent::DepositProof;

/// Number of elements in a peg-in witness stack.
pub const PEGIN_WITNESS_STACK_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WitnessError {
    #[error("expected {PEGIN_WITNESS_STACK_LEN} witness elements, got {0}")]
    StackLength(usize),

    #[error("value element is {0} bytes, expected 8")]
    ValueLength(usize),

    #[error("genesis hash element is {0} bytes, expected 32")]
    GenesisLength(usize),

    #[error("undecodable merkle proof: {0}")]
    Proof(String),
}

/// Data a sidechain peg-in input carries to prove its deposit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeginWitness {
    pub value: Amount,
    pub genesis_hash: BlockHash,
    pub claim_script: ScriptBuf,
    pub raw_parent_tx: Vec<u8>,
    pub proof: DepositProof,
}

impl PeginWitness {
    pub fn to_stack(&self) -> Vec<Vec<u8>> {
        vec![
            self.value.to_sat().to_le_bytes().to_vec(),
            self.genesis_hash.to_byte_array().to_vec(),
            self.claim_script.to_bytes(),
            self.raw_parent_tx.clone(),
            self.proof.to_bytes(),
        ]
    }

    /// Decodes a witness stack. The shape is checked before any element is
    /// parsed, so oversized or extra elements are rejected without work.
    pub fn from_stack(stack: &[Vec<u8>]) -> Result<Self, WitnessError> {
        let [value, genesis, claim_script, raw_parent_tx, proof] = stack else {
            return Err(WitnessError::StackLength(stack.len()));
        };

        let value: [u8; 8] = value
            .as_slice()
            .try_into()
            .map_err(|_| WitnessError::ValueLength(value.len()))?;
        let genesis: [u8; 32] = genesis
            .as_slice()
            .try_into()
            .map_err(|_| WitnessError::GenesisLength(genesis.len()))?;
        let proof = DepositProof::from_bytes(proof).map_err(|e| WitnessError::Proof(e.to_string()))?;

        Ok(Self {
            value: Amount::from_sat(u64::from_le_bytes(value)),
            genesis_hash: BlockHash::from_byte_array(genesis),
            claim_script: ScriptBuf::from_bytes(claim_script.clone()),
            raw_parent_tx: raw_parent_tx.clone(),
            proof,
        })
    }
}
