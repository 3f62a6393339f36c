use std::path::Path;

use fedpeg_common::instrumentation::components;
use fedpeg_db_types::{
    traits::{check_distinct_keys, ClaimDatabase},
    CasOutcome, ClaimWrite, DbError, DbResult,
};
use fedpeg_primitives::{ClaimKey, ClaimState};
use sled::{
    transaction::{abort, TransactionError},
    IVec, Tree,
};
use tracing::*;

use crate::{
    init::open_sled_database,
    utils::{decode_state, encode_state, to_db_error},
    SLED_NAME,
};

const CLAIMS_TREE: &str = "ClaimStateSchema";

/// Claim store in a single sled tree keyed by [`ClaimKey::to_bytes`], with
/// borsh-encoded [`ClaimState`] values.
#[derive(Debug, Clone)]
pub struct SledClaimDb {
    tree: Tree,
}

impl SledClaimDb {
    pub fn new(db: &sled::Db) -> DbResult<Self> {
        let tree = db.open_tree(CLAIMS_TREE).map_err(to_db_error)?;
        Ok(Self { tree })
    }

    /// Opens (or creates) the store under `datadir`.
    pub fn open(datadir: &Path) -> anyhow::Result<Self> {
        let db = open_sled_database(datadir, SLED_NAME)?;
        Ok(Self::new(&db)?)
    }

    /// Flushes dirty pages to disk, returning the number of bytes written.
    pub fn flush(&self) -> DbResult<usize> {
        self.tree.flush().map_err(to_db_error)
    }
}

impl ClaimDatabase for SledClaimDb {
    fn get_claim(&self, key: &ClaimKey) -> DbResult<ClaimState> {
        let raw = self.tree.get(key.to_bytes()).map_err(to_db_error)?;
        decode_state(raw.as_deref())
    }

    fn compare_and_swap(
        &self,
        key: &ClaimKey,
        expected: &ClaimState,
        new: &ClaimState,
    ) -> DbResult<CasOutcome> {
        let expected = encode_state(expected);
        let res = self
            .tree
            .compare_and_swap(key.to_bytes(), expected.as_deref(), encode_state(new))
            .map_err(to_db_error)?;

        match res {
            Ok(()) => Ok(CasOutcome::Applied),
            Err(e) => Ok(CasOutcome::Conflict {
                key: *key,
                current: decode_state(e.current.as_deref())?,
            }),
        }
    }

    fn apply_batch(&self, writes: &[ClaimWrite]) -> DbResult<CasOutcome> {
        check_distinct_keys(writes)?;

        let encoded: Vec<_> = writes
            .iter()
            .map(|w| {
                (
                    w.key,
                    w.key.to_bytes().to_vec(),
                    encode_state(&w.expected),
                    encode_state(&w.new),
                )
            })
            .collect();

        let span = debug_span!(
            "sled_transaction",
            component = components::DB_SLED_TRANSACTION,
            n_writes = writes.len()
        );
        let _guard = span.enter();

        let res = self.tree.transaction(|tx| {
            for (key, raw_key, expected, _) in &encoded {
                let cur = tx.get(raw_key)?;
                if cur.as_deref() != expected.as_deref() {
                    return abort::<(), (ClaimKey, Option<IVec>)>((*key, cur));
                }
            }
            for (_, raw_key, _, new) in &encoded {
                match new {
                    Some(value) => {
                        tx.insert(raw_key.clone(), value.clone())?;
                    }
                    None => {
                        tx.remove(raw_key.clone())?;
                    }
                }
            }
            Ok(())
        });

        match res {
            Ok(()) => Ok(CasOutcome::Applied),
            Err(TransactionError::Abort((key, cur))) => Ok(CasOutcome::Conflict {
                key,
                current: decode_state(cur.as_deref())?,
            }),
            Err(TransactionError::Storage(e)) => {
                warn!(%e, "claim batch failed in storage");
                Err(DbError::TransactionError(e.to_string()))
            }
        }
    }

    fn get_all_claims(&self) -> DbResult<Vec<(ClaimKey, ClaimState)>> {
        let mut out = Vec::new();
        for item in self.tree.iter() {
            let (k, v) = item.map_err(to_db_error)?;
            let key = ClaimKey::from_bytes(&k).ok_or(DbError::MalformedKey(k.len()))?;
            out.push((key, decode_state(Some(&v))?));
        }
        Ok(out)
    }
}
