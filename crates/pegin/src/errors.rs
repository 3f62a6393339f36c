use bitcoin::{Amount, BlockHash};
use fedpeg_db_types::DbError;
use fedpeg_pegout::PegoutError;
use fedpeg_primitives::{ClaimKey, ClaimState, SidechainBlockId, SidechainOutPoint, SidechainTxid};
use fedpeg_spv::ProofError;
use thiserror::Error;

/// Why a peg-in or peg-out was refused.
///
/// The message of every variant starts with the reject code callers match on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("Given claim_script does not match the given Bitcoin transaction.")]
    ScriptMismatch,

    #[error("bad-pegin-witness, Peg-in block header not found: {0}")]
    HeaderNotFound(BlockHash),

    #[error("bad-pegin-witness, Invalid merkle proof: {0}")]
    ProofInvalid(#[from] ProofError),

    #[error(
        "bad-pegin-witness, Needs more confirmations. (confirmations={confirmations}, required={required})"
    )]
    NeedsMoreConfirmations { confirmations: u64, required: u64 },

    #[error("pegin-already-claimed, {key} finalized by {holder}")]
    AlreadyClaimed { key: ClaimKey, holder: SidechainTxid },

    #[error("txn-mempool-conflict, {key} pending in {holder}")]
    MempoolConflict { key: ClaimKey, holder: SidechainTxid },

    #[error("bad-txns-double-pegin, {0} claimed twice in block")]
    DuplicatePeginInBlock(ClaimKey),

    #[error("extra-pegin-witness, input {input} is not a peg-in")]
    ExtraPeginWitness { input: usize },

    #[error("bad-txns-inputs-duplicate, {}:{}", .0.txid, .0.vout)]
    DuplicateInput(SidechainOutPoint),

    #[error("min relay fee not met, {} < {}", .fee.to_sat(), .required.to_sat())]
    InsufficientFee { fee: Amount, required: Amount },

    #[error("bad-pegout-destination, {0}")]
    MalformedDestination(String),

    #[error("bad-txns-fee-outofrange, fee outputs overflow")]
    FeeOutOfRange,

    #[error("bad-pegin-witness, {0}")]
    MalformedPeginWitness(String),
}

impl RejectReason {
    /// Whether resubmitting later can succeed without changing the tx.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NeedsMoreConfirmations { .. } | Self::MempoolConflict { .. }
        )
    }
}

impl From<PegoutError> for RejectReason {
    fn from(e: PegoutError) -> Self {
        match e {
            PegoutError::InsufficientFee { fee, required } => Self::InsufficientFee { fee, required },
            PegoutError::MalformedDestination(why) => Self::MalformedDestination(why),
            PegoutError::FeeOutOfRange => Self::FeeOutOfRange,
        }
    }
}

/// Inconsistency inside the engine itself. Processing of the affected tx or
/// block must stop.
#[derive(Debug, Clone, Error)]
pub enum EngineFault {
    #[error("claim {key} expected finalized by {expected}, found {found:?}")]
    FinalizerMismatch {
        key: ClaimKey,
        expected: SidechainBlockId,
        found: ClaimState,
    },

    #[error("claim {0} kept changing under compare-and-swap")]
    Contention(ClaimKey),

    #[error("unknown block {0}")]
    UnknownBlock(SidechainBlockId),

    #[error("registry storage: {0}")]
    Storage(#[from] DbError),
}

/// Failure of a registry transition.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("claim {key} already pending in {holder}")]
    AlreadyPending { key: ClaimKey, holder: SidechainTxid },

    #[error("claim {key} already finalized by {holder} in {block}")]
    AlreadyFinalized {
        key: ClaimKey,
        holder: SidechainTxid,
        block: SidechainBlockId,
    },

    #[error(transparent)]
    Fault(#[from] EngineFault),
}

impl From<DbError> for RegistryError {
    fn from(e: DbError) -> Self {
        Self::Fault(EngineFault::Storage(e))
    }
}

#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Rejected(#[from] RejectReason),

    #[error("engine fault: {0}")]
    Fault(#[from] EngineFault),
}

impl ValidationError {
    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            Self::Rejected(r) => Some(r),
            Self::Fault(_) => None,
        }
    }
}

impl From<RegistryError> for ValidationError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::AlreadyPending { key, holder } => {
                RejectReason::MempoolConflict { key, holder }.into()
            }
            RegistryError::AlreadyFinalized { key, holder, .. } => {
                RejectReason::AlreadyClaimed { key, holder }.into()
            }
            RegistryError::Fault(f) => f.into(),
        }
    }
}

impl From<DbError> for ValidationError {
    fn from(e: DbError) -> Self {
        Self::Fault(e.into())
    }
}

impl From<PegoutError> for ValidationError {
    fn from(e: PegoutError) -> Self {
        Self::Rejected(e.into())
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;
