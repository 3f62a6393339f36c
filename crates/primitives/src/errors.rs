//! Errors during parsing/conversion of primitive types.

use thiserror::Error;

/// Parsing errors for the primitive types in this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Expected 32 bytes of hex.
    #[error("not 32 bytes of hex: {0}")]
    InvalidHex32(String),

    /// A parent-chain transaction could not be decoded.
    #[error("undecodable parent transaction: {0}")]
    InvalidParentTx(String),

    /// The requested output index does not exist in the transaction.
    #[error("output index {vout} out of range (tx has {n_outputs} outputs)")]
    OutputIndexOutOfRange { vout: u32, n_outputs: usize },
}
