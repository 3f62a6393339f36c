use fedpeg_primitives::ClaimKey;
use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error, Clone)]
pub enum DbError {
    /// A batch named the same key more than once.
    #[error("key {0} appears twice in one batch")]
    DuplicateBatchKey(ClaimKey),

    #[error("malformed key of {0} bytes")]
    MalformedKey(usize),

    #[error("codec error {0}")]
    CodecError(String),

    #[error("transaction error {0}")]
    TransactionError(String),

    #[error("IO Error: {0}")]
    IoError(String),

    #[error("{0}")]
    Other(String),
}
