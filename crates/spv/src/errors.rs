use bitcoin::{BlockHash, TxMerkleNode};
use thiserror::Error;

/// Why a merkle inclusion proof was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    #[error("proof names block {proof} but header is {header}")]
    HeaderMismatch { proof: BlockHash, header: BlockHash },

    #[error("proof has {0} siblings, more than any block can need")]
    TooDeep(usize),

    #[error("position {position} has bits set beyond proof depth {depth}")]
    PositionOutOfRange { position: u32, depth: usize },

    #[error("right-hand node duplicated at level {0}")]
    DuplicatedNode(usize),

    #[error("computed root {computed} does not match header root {expected}")]
    RootMismatch {
        computed: TxMerkleNode,
        expected: TxMerkleNode,
    },
}

/// Errors from extending or rewinding the [`HeaderChain`](crate::HeaderChain).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderChainError {
    #[error("header does not extend tip: expected prev {expected}, found {found}")]
    ContinuityError {
        expected: BlockHash,
        found: BlockHash,
    },

    #[error("cannot rewind to height {target}, oldest kept header is at {oldest}")]
    RewindTooDeep { target: u64, oldest: u64 },
}
