//! Parent-chain data consumed by the peg-in path: headers, deposits and
//! merkle inclusion proofs.

use bitcoin::{
    block::Header, consensus, hashes::Hash, Amount, BlockHash, Script, Transaction,
    TxMerkleNode, Txid,
};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{buf::Buf32, errors::ParseError};

/// Upper bound on the number of siblings in a [`DepositProof`].
///
/// A bitcoin block can't hold anywhere near 2^32 transactions, so a longer
/// sibling list is malformed regardless of what it hashes to.
pub const MAX_PROOF_DEPTH: usize = 32;

/// A parent-chain header as tracked by the header index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentHeader {
    hash: BlockHash,
    prev_hash: BlockHash,
    merkle_root: TxMerkleNode,
    height: u64,
}

impl ParentHeader {
    pub fn new(
        hash: BlockHash,
        prev_hash: BlockHash,
        merkle_root: TxMerkleNode,
        height: u64,
    ) -> Self {
        Self {
            hash,
            prev_hash,
            merkle_root,
            height,
        }
    }

    /// Builds the index entry for a full bitcoin header at a known height.
    pub fn from_block_header(header: &Header, height: u64) -> Self {
        Self {
            hash: header.block_hash(),
            prev_hash: header.prev_blockhash,
            merkle_root: header.merkle_root,
            height,
        }
    }

    pub fn hash(&self) -> BlockHash {
        self.hash
    }

    pub fn prev_hash(&self) -> BlockHash {
        self.prev_hash
    }

    pub fn merkle_root(&self) -> TxMerkleNode {
        self.merkle_root
    }

    pub fn height(&self) -> u64 {
        self.height
    }
}

/// Merkle inclusion proof of a parent-chain transaction.
///
/// Hashes are stored in internal byte order, the same order bitcoin uses when
/// hashing them, not the reversed order used for display.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct DepositProof {
    block_hash: Buf32,
    siblings: Vec<Buf32>,
    position: u32,
}

impl DepositProof {
    pub fn new(block_hash: BlockHash, siblings: Vec<Buf32>, position: u32) -> Self {
        Self {
            block_hash: Buf32::from(block_hash.to_byte_array()),
            siblings,
            position,
        }
    }

    /// Hash of the parent block the proof claims to be rooted in.
    pub fn block_hash(&self) -> BlockHash {
        BlockHash::from_byte_array(self.block_hash.0)
    }

    /// Sibling hashes from the leaf level up to (not including) the root.
    pub fn siblings(&self) -> &[Buf32] {
        &self.siblings
    }

    /// Leaf index of the proven transaction. Bit `i` says whether the node on
    /// level `i` is a right child.
    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        // Writing to a Vec can't fail.
        borsh::to_vec(self).unwrap_or_default()
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, borsh::io::Error> {
        borsh::from_slice(buf)
    }
}

/// A decoded parent-chain transaction together with the output being claimed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositTransaction {
    tx: Transaction,
    raw: Vec<u8>,
    txid: Txid,
    vout: u32,
    value: Amount,
    is_coinbase: bool,
}

impl DepositTransaction {
    /// Decodes raw consensus-encoded transaction bytes and selects output `vout`.
    pub fn from_raw(raw: &[u8], vout: u32) -> Result<Self, ParseError> {
        let tx: Transaction = consensus::deserialize(raw)
            .map_err(|e| ParseError::InvalidParentTx(e.to_string()))?;
        Self::from_tx(tx, vout)
    }

    pub fn from_tx(tx: Transaction, vout: u32) -> Result<Self, ParseError> {
        let out = tx
            .output
            .get(vout as usize)
            .ok_or(ParseError::OutputIndexOutOfRange {
                vout,
                n_outputs: tx.output.len(),
            })?;
        let value = out.value;
        Ok(Self {
            raw: consensus::serialize(&tx),
            txid: tx.compute_txid(),
            is_coinbase: tx.is_coinbase(),
            tx,
            vout,
            value,
        })
    }

    pub fn tx(&self) -> &Transaction {
        &self.tx
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn txid(&self) -> Txid {
        self.txid
    }

    pub fn vout(&self) -> u32 {
        self.vout
    }

    pub fn value(&self) -> Amount {
        self.value
    }

    pub fn is_coinbase(&self) -> bool {
        self.is_coinbase
    }

    /// Script of the output being claimed.
    pub fn script_pubkey(&self) -> &Script {
        // Index checked on construction.
        &self.tx.output[self.vout as usize].script_pubkey
    }
}
