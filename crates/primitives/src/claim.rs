//! Claim keys and the per-key claim state machine.

use std::fmt;

use bitcoin::{hashes::Hash, Amount, Txid};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::sidechain::{SidechainBlockId, SidechainTxid};

/// Identifies a parent-chain deposit: `(parent txid, output index)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClaimKey {
    parent_txid: Txid,
    vout: u32,
}

impl ClaimKey {
    /// Length of [`ClaimKey::to_bytes`].
    pub const SERIALIZED_LEN: usize = 36;

    pub fn new(parent_txid: Txid, vout: u32) -> Self {
        Self { parent_txid, vout }
    }

    pub fn parent_txid(&self) -> Txid {
        self.parent_txid
    }

    pub fn vout(&self) -> u32 {
        self.vout
    }

    /// Storage key: txid bytes followed by the big-endian output index, so that
    /// outputs of one transaction sort together and in order.
    pub fn to_bytes(&self) -> [u8; Self::SERIALIZED_LEN] {
        let mut buf = [0u8; Self::SERIALIZED_LEN];
        buf[..32].copy_from_slice(self.parent_txid.as_byte_array());
        buf[32..].copy_from_slice(&self.vout.to_be_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() != Self::SERIALIZED_LEN {
            return None;
        }
        let mut txid = [0u8; 32];
        txid.copy_from_slice(&buf[..32]);
        let mut vout = [0u8; 4];
        vout.copy_from_slice(&buf[32..]);
        Some(Self::new(
            Txid::from_byte_array(txid),
            u32::from_be_bytes(vout),
        ))
    }
}

impl fmt::Display for ClaimKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.parent_txid, self.vout)
    }
}

/// State of a single claim key.
///
/// Transitions are `Unclaimed -> Pending -> Finalized`, `Unclaimed ->
/// Finalized` when a block includes a tx we never saw in the mempool, and
/// `Finalized -> Unclaimed` only when the finalizing block is invalidated.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum ClaimState {
    #[default]
    Unclaimed,
    Pending {
        sidechain_txid: SidechainTxid,
    },
    Finalized {
        sidechain_txid: SidechainTxid,
        block: SidechainBlockId,
    },
}

impl ClaimState {
    pub fn is_unclaimed(&self) -> bool {
        matches!(self, Self::Unclaimed)
    }

    /// The sidechain tx holding the claim, if any.
    pub fn claimant(&self) -> Option<SidechainTxid> {
        match self {
            Self::Unclaimed => None,
            Self::Pending { sidechain_txid } | Self::Finalized { sidechain_txid, .. } => {
                Some(*sidechain_txid)
            }
        }
    }

    pub fn finalizing_block(&self) -> Option<SidechainBlockId> {
        match self {
            Self::Finalized { block, .. } => Some(*block),
            _ => None,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, borsh::io::Error> {
        borsh::from_slice(buf)
    }
}

/// A peg-in that passed validation, handed to whatever assembles the mint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedClaim {
    pub parent_txid: Txid,
    pub output_index: u32,
    pub credited_amount: Amount,
    pub is_coinbase: bool,
}

impl ValidatedClaim {
    pub fn key(&self) -> ClaimKey {
        ClaimKey::new(self.parent_txid, self.output_index)
    }
}
