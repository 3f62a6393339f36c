use bitcoin::{consensus, Amount, BlockHash, ScriptBuf, Transaction};
use fedpeg_primitives::{
    ClaimKey, DepositProof, DepositTransaction, PeginWitness, SidechainOutPoint, SidechainTxIn,
};

/// A parent-chain output paying to a claim script's deposit address.
#[derive(Clone, Debug)]
pub struct Deposit {
    pub tx: Transaction,
    pub vout: u32,
    pub claim_script: ScriptBuf,
    /// Block the deposit was mined in and its height at the time.
    pub block_hash: BlockHash,
    pub height: u64,
}

impl Deposit {
    pub fn key(&self) -> ClaimKey {
        ClaimKey::new(self.tx.compute_txid(), self.vout)
    }

    pub fn value(&self) -> Amount {
        self.tx.output[self.vout as usize].value
    }

    pub fn raw_tx(&self) -> Vec<u8> {
        consensus::serialize(&self.tx)
    }

    pub fn deposit_transaction(&self) -> DepositTransaction {
        DepositTransaction::from_tx(self.tx.clone(), self.vout).expect("vout in range")
    }

    pub fn witness(&self, genesis: BlockHash, proof: DepositProof) -> PeginWitness {
        PeginWitness {
            value: self.value(),
            genesis_hash: genesis,
            claim_script: self.claim_script.clone(),
            raw_parent_tx: self.raw_tx(),
            proof,
        }
    }

    /// Peg-in input claiming this deposit with `witness`.
    pub fn input(&self, witness: &PeginWitness) -> SidechainTxIn {
        SidechainTxIn::pegin(
            SidechainOutPoint::parent(self.tx.compute_txid(), self.vout),
            witness.to_stack(),
        )
    }
}
