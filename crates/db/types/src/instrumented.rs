//! Wrapper that counts and traces every access to a claim store.

use std::sync::atomic::{AtomicU64, Ordering};

use fedpeg_common::instrumentation::components;
use fedpeg_primitives::{ClaimKey, ClaimState};
use tracing::*;

use crate::{
    traits::ClaimDatabase,
    types::{CasOutcome, ClaimWrite},
    DbResult,
};

/// Wraps a [`ClaimDatabase`] and counts reads and write attempts, so callers
/// can check that a code path left the store alone.
#[derive(Debug)]
pub struct InstrumentedClaimDb<D> {
    inner: D,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl<D: ClaimDatabase> InstrumentedClaimDb<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Write attempts, including ones that lost their compare-and-swap.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl<D: ClaimDatabase> ClaimDatabase for InstrumentedClaimDb<D> {
    #[instrument(skip(self), fields(component = components::STORAGE_CLAIMS, %key))]
    fn get_claim(&self, key: &ClaimKey) -> DbResult<ClaimState> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.inner.get_claim(key)
    }

    #[instrument(skip(self), fields(component = components::STORAGE_CLAIMS, %key))]
    fn compare_and_swap(
        &self,
        key: &ClaimKey,
        expected: &ClaimState,
        new: &ClaimState,
    ) -> DbResult<CasOutcome> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let res = self.inner.compare_and_swap(key, expected, new)?;
        if let CasOutcome::Conflict { current, .. } = res {
            debug!(?current, "claim compare-and-swap lost");
        }
        Ok(res)
    }

    #[instrument(
        skip(self, writes),
        fields(component = components::STORAGE_CLAIMS, n_writes = writes.len())
    )]
    fn apply_batch(&self, writes: &[ClaimWrite]) -> DbResult<CasOutcome> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.inner.apply_batch(writes)
    }

    fn get_all_claims(&self) -> DbResult<Vec<(ClaimKey, ClaimState)>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.inner.get_all_claims()
    }
}
