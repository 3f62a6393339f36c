//! Minimal sidechain transaction and block model.
//!
//! Only what the peg rules look at is modelled: input outpoints and their
//! peg-in flag and witness, output values and scripts, and the tx's virtual
//! size. General UTXO accounting happens elsewhere.

use arbitrary::Arbitrary;
use bitcoin::{
    hashes::{sha256d, Hash},
    Amount, Script, Txid,
};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{buf::Buf32, claim::ClaimKey};

/// ID of a sidechain transaction.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct SidechainTxid(Buf32);

impl_buf_wrapper!(SidechainTxid);

/// ID of a sidechain block.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct SidechainBlockId(Buf32);

impl_buf_wrapper!(SidechainBlockId);

/// Reference to a previous output. For peg-in inputs this is the parent-chain
/// outpoint being claimed.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Arbitrary, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct SidechainOutPoint {
    pub txid: Buf32,
    pub vout: u32,
}

impl SidechainOutPoint {
    pub fn new(txid: Buf32, vout: u32) -> Self {
        Self { txid, vout }
    }

    /// Outpoint referring to a parent-chain deposit.
    pub fn parent(txid: Txid, vout: u32) -> Self {
        Self::new(Buf32::from(txid.to_byte_array()), vout)
    }

    /// Interprets the outpoint as a parent-chain deposit key.
    pub fn as_claim_key(&self) -> ClaimKey {
        ClaimKey::new(Txid::from_byte_array(self.txid.0), self.vout)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct SidechainTxIn {
    pub prevout: SidechainOutPoint,
    pub is_pegin: bool,
    /// Peg-in witness stack. Must be empty unless `is_pegin` is set.
    pub pegin_witness: Vec<Vec<u8>>,
}

impl SidechainTxIn {
    pub fn spend(prevout: SidechainOutPoint) -> Self {
        Self {
            prevout,
            is_pegin: false,
            pegin_witness: Vec::new(),
        }
    }

    pub fn pegin(prevout: SidechainOutPoint, pegin_witness: Vec<Vec<u8>>) -> Self {
        Self {
            prevout,
            is_pegin: true,
            pegin_witness,
        }
    }

    pub fn has_pegin_witness(&self) -> bool {
        !self.pegin_witness.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct SidechainTxOut {
    /// Value in sats of the pegged asset.
    pub value: u64,
    /// Empty for the explicit fee output.
    pub script_pubkey: Vec<u8>,
}

impl SidechainTxOut {
    pub fn new(value: Amount, script_pubkey: Vec<u8>) -> Self {
        Self {
            value: value.to_sat(),
            script_pubkey,
        }
    }

    pub fn fee(value: Amount) -> Self {
        Self::new(value, Vec::new())
    }

    pub fn amount(&self) -> Amount {
        Amount::from_sat(self.value)
    }

    pub fn script(&self) -> &Script {
        Script::from_bytes(&self.script_pubkey)
    }

    pub fn is_fee(&self) -> bool {
        self.script_pubkey.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct SidechainTx {
    pub inputs: Vec<SidechainTxIn>,
    pub outputs: Vec<SidechainTxOut>,
    pub lock_time: u32,
    /// Virtual size in vbytes, as measured by the tx's serializer.
    pub vsize: u64,
}

impl SidechainTx {
    /// Double SHA-256 over the borsh encoding of everything but witness data.
    pub fn compute_txid(&self) -> SidechainTxid {
        let inputs: Vec<_> = self
            .inputs
            .iter()
            .map(|i| (&i.prevout, i.is_pegin))
            .collect();
        let preimage = borsh::to_vec(&(inputs, self.outputs.as_slice(), self.lock_time))
            .expect("borsh encoding into a vec is infallible");
        SidechainTxid::from(sha256d::Hash::hash(&preimage).to_byte_array())
    }

    pub fn pegin_inputs(&self) -> impl Iterator<Item = &SidechainTxIn> {
        self.inputs.iter().filter(|i| i.is_pegin)
    }

    /// Claim keys of all peg-in inputs, in input order.
    pub fn pegin_keys(&self) -> Vec<ClaimKey> {
        self.pegin_inputs()
            .map(|i| i.prevout.as_claim_key())
            .collect()
    }

    /// Sum of the explicit fee outputs, or `None` if it overflows.
    pub fn fee(&self) -> Option<Amount> {
        self.outputs
            .iter()
            .filter(|o| o.is_fee())
            .try_fold(0u64, |acc, o| acc.checked_add(o.value))
            .map(Amount::from_sat)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct SidechainBlock {
    blkid: SidechainBlockId,
    parent: SidechainBlockId,
    txs: Vec<SidechainTx>,
}

impl SidechainBlock {
    /// Assembles a block. The id commits to the parent, the txids and a
    /// caller-chosen nonce so that sibling blocks with equal contents differ.
    pub fn new(parent: SidechainBlockId, txs: Vec<SidechainTx>, nonce: u64) -> Self {
        let mut buf = Vec::with_capacity(40 + txs.len() * 32);
        buf.extend_from_slice(parent.0.as_bytes());
        for tx in &txs {
            buf.extend_from_slice(tx.compute_txid().0.as_bytes());
        }
        buf.extend_from_slice(&nonce.to_le_bytes());
        let blkid = SidechainBlockId::from(sha256d::Hash::hash(&buf).to_byte_array());
        Self { blkid, parent, txs }
    }

    pub fn blkid(&self) -> SidechainBlockId {
        self.blkid
    }

    pub fn parent(&self) -> SidechainBlockId {
        self.parent
    }

    pub fn txs(&self) -> &[SidechainTx] {
        &self.txs
    }
}
