//! Trait definitions for low level database interfaces.

use std::{collections::BTreeSet, sync::Arc};

use fedpeg_primitives::{ClaimKey, ClaimState};

use crate::{
    types::{CasOutcome, ClaimWrite},
    DbError, DbResult,
};

/// Durable map from [`ClaimKey`] to [`ClaimState`].
///
/// [`ClaimState::Unclaimed`] is never stored; writing it deletes the key and
/// reading a missing key returns it. Every write is a compare-and-swap so that
/// the registry can serialize transitions without a global lock.
pub trait ClaimDatabase: Send + Sync + 'static {
    fn get_claim(&self, key: &ClaimKey) -> DbResult<ClaimState>;

    /// Sets `key` to `new` if it currently holds `expected`.
    fn compare_and_swap(
        &self,
        key: &ClaimKey,
        expected: &ClaimState,
        new: &ClaimState,
    ) -> DbResult<CasOutcome>;

    /// Applies every write if every expectation holds, otherwise none of them.
    /// Keys must be distinct.
    fn apply_batch(&self, writes: &[ClaimWrite]) -> DbResult<CasOutcome>;

    /// Every stored (non-unclaimed) entry, in key order.
    fn get_all_claims(&self) -> DbResult<Vec<(ClaimKey, ClaimState)>>;
}

impl<D: ClaimDatabase> ClaimDatabase for Arc<D> {
    fn get_claim(&self, key: &ClaimKey) -> DbResult<ClaimState> {
        (**self).get_claim(key)
    }

    fn compare_and_swap(
        &self,
        key: &ClaimKey,
        expected: &ClaimState,
        new: &ClaimState,
    ) -> DbResult<CasOutcome> {
        (**self).compare_and_swap(key, expected, new)
    }

    fn apply_batch(&self, writes: &[ClaimWrite]) -> DbResult<CasOutcome> {
        (**self).apply_batch(writes)
    }

    fn get_all_claims(&self) -> DbResult<Vec<(ClaimKey, ClaimState)>> {
        (**self).get_all_claims()
    }
}

/// Rejects batches that name a key twice.
pub fn check_distinct_keys(writes: &[ClaimWrite]) -> DbResult<()> {
    let mut seen = BTreeSet::new();
    for w in writes {
        if !seen.insert(w.key) {
            return Err(DbError::DuplicateBatchKey(w.key));
        }
    }
    Ok(())
}
