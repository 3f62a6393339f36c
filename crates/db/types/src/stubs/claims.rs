use std::collections::BTreeMap;

use fedpeg_primitives::{ClaimKey, ClaimState};
use parking_lot::Mutex;

use crate::{
    traits::{check_distinct_keys, ClaimDatabase},
    types::{CasOutcome, ClaimWrite},
    DbResult,
};

/// In-memory claim store. Not durable; for tests and `backend = "memory"`.
#[derive(Debug, Default)]
pub struct MemClaimDb {
    claims: Mutex<BTreeMap<ClaimKey, ClaimState>>,
}

impl MemClaimDb {
    pub fn new() -> Self {
        Self::default()
    }
}

fn current(tbl: &BTreeMap<ClaimKey, ClaimState>, key: &ClaimKey) -> ClaimState {
    tbl.get(key).copied().unwrap_or_default()
}

fn store(tbl: &mut BTreeMap<ClaimKey, ClaimState>, key: ClaimKey, state: ClaimState) {
    if state.is_unclaimed() {
        tbl.remove(&key);
    } else {
        tbl.insert(key, state);
    }
}

impl ClaimDatabase for MemClaimDb {
    fn get_claim(&self, key: &ClaimKey) -> DbResult<ClaimState> {
        Ok(current(&self.claims.lock(), key))
    }

    fn compare_and_swap(
        &self,
        key: &ClaimKey,
        expected: &ClaimState,
        new: &ClaimState,
    ) -> DbResult<CasOutcome> {
        let mut tbl = self.claims.lock();
        let cur = current(&tbl, key);
        if cur != *expected {
            return Ok(CasOutcome::Conflict {
                key: *key,
                current: cur,
            });
        }
        store(&mut tbl, *key, *new);
        Ok(CasOutcome::Applied)
    }

    fn apply_batch(&self, writes: &[ClaimWrite]) -> DbResult<CasOutcome> {
        check_distinct_keys(writes)?;

        let mut tbl = self.claims.lock();
        for w in writes {
            let cur = current(&tbl, &w.key);
            if cur != w.expected {
                return Ok(CasOutcome::Conflict {
                    key: w.key,
                    current: cur,
                });
            }
        }
        for w in writes {
            store(&mut tbl, w.key, w.new);
        }
        Ok(CasOutcome::Applied)
    }

    fn get_all_claims(&self) -> DbResult<Vec<(ClaimKey, ClaimState)>> {
        Ok(self
            .claims
            .lock()
            .iter()
            .map(|(k, v)| (*k, *v))
            .collect())
    }
}
