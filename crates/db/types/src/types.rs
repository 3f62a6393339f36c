use fedpeg_primitives::{ClaimKey, ClaimState};

/// One compare-and-swap inside a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClaimWrite {
    pub key: ClaimKey,
    pub expected: ClaimState,
    pub new: ClaimState,
}

impl ClaimWrite {
    pub fn new(key: ClaimKey, expected: ClaimState, new: ClaimState) -> Self {
        Self { key, expected, new }
    }
}

/// Result of a compare-and-swap that reached the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CasOutcome {
    Applied,

    /// The stored state differed from the expected one; nothing was written.
    Conflict { key: ClaimKey, current: ClaimState },
}

impl CasOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}
