//! Per-key claim state machine on top of a [`ClaimDatabase`].

use std::collections::BTreeMap;

use fedpeg_common::instrumentation::components;
use fedpeg_db_types::{CasOutcome, ClaimDatabase, ClaimWrite, DbError};
use fedpeg_primitives::{ClaimKey, ClaimState, SidechainBlockId, SidechainTxid};
use tracing::*;

use crate::errors::{EngineFault, RegistryError};

/// How many times a transition re-reads and retries after losing a
/// compare-and-swap race.
const MAX_CAS_ATTEMPTS: usize = 8;

/// Result of [`ClaimRegistry::revert_to_unclaimed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevertOutcome {
    Reverted,
    /// The claim is not finalized by the given block and was left alone.
    NotFinalizer(ClaimState),
}

/// Owns claim state. Reads are public; transitions go through the validator.
#[derive(Debug)]
pub struct ClaimRegistry<D> {
    db: D,
}

impl<D: ClaimDatabase> ClaimRegistry<D> {
    pub fn new(db: D) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &D {
        &self.db
    }

    pub fn lookup(&self, key: &ClaimKey) -> Result<ClaimState, EngineFault> {
        Ok(self.db.get_claim(key)?)
    }

    /// Every claim that is not unclaimed.
    pub fn claims(&self) -> Result<Vec<(ClaimKey, ClaimState)>, EngineFault> {
        Ok(self.db.get_all_claims()?)
    }

    /// Keys currently finalized by `block`.
    pub fn finalized_by(&self, block: SidechainBlockId) -> Result<Vec<ClaimKey>, EngineFault> {
        Ok(self
            .claims()?
            .into_iter()
            .filter(|(_, s)| s.finalizing_block() == Some(block))
            .map(|(k, _)| k)
            .collect())
    }

    /// Marks every key pending by `txid`, or none of them.
    ///
    /// Keys already pending by `txid` are left as they are.
    #[instrument(skip_all, fields(component = components::PEGIN_REGISTRY, %txid, n_keys = keys.len()))]
    pub(crate) fn mark_pending(
        &self,
        keys: &[ClaimKey],
        txid: SidechainTxid,
    ) -> Result<(), RegistryError> {
        let pending = ClaimState::Pending {
            sidechain_txid: txid,
        };

        self.transition_batch(keys, |key, cur| match cur {
            ClaimState::Unclaimed => Ok(Some(pending)),
            ClaimState::Pending { sidechain_txid } if sidechain_txid == txid => Ok(None),
            ClaimState::Pending { sidechain_txid } => Err(RegistryError::AlreadyPending {
                key,
                holder: sidechain_txid,
            }),
            ClaimState::Finalized {
                sidechain_txid,
                block,
            } => Err(RegistryError::AlreadyFinalized {
                key,
                holder: sidechain_txid,
                block,
            }),
        })
    }

    /// Finalizes every `(key, txid)` in `block`, or none of them.
    ///
    /// A pending claim by any tx is taken over, since the block decides. A
    /// claim already finalized by the same tx in the same block is left as it
    /// is.
    #[instrument(skip_all, fields(component = components::PEGIN_REGISTRY, %block, n_keys = claims.len()))]
    pub(crate) fn mark_finalized(
        &self,
        claims: &[(ClaimKey, SidechainTxid)],
        block: SidechainBlockId,
    ) -> Result<(), RegistryError> {
        let by_key: BTreeMap<_, _> = claims.iter().copied().collect();
        let keys: Vec<_> = claims.iter().map(|(k, _)| *k).collect();

        self.transition_batch(&keys, |key, cur| {
            let txid = by_key[&key];
            let finalized = ClaimState::Finalized {
                sidechain_txid: txid,
                block,
            };
            match cur {
                ClaimState::Unclaimed | ClaimState::Pending { .. } => Ok(Some(finalized)),
                s if s == finalized => Ok(None),
                ClaimState::Finalized {
                    sidechain_txid,
                    block,
                } => Err(RegistryError::AlreadyFinalized {
                    key,
                    holder: sidechain_txid,
                    block,
                }),
            }
        })
    }

    /// Drops the pending claim of `txid` on `key`. Returns whether anything
    /// changed.
    #[instrument(skip_all, fields(component = components::PEGIN_REGISTRY, %key, %txid))]
    pub(crate) fn release_pending(
        &self,
        key: ClaimKey,
        txid: SidechainTxid,
    ) -> Result<bool, EngineFault> {
        let expected = ClaimState::Pending {
            sidechain_txid: txid,
        };
        let res = self
            .db
            .compare_and_swap(&key, &expected, &ClaimState::Unclaimed)?;
        if res.is_applied() {
            debug!("released pending claim");
        }
        Ok(res.is_applied())
    }

    /// Sets `key` back to unclaimed if `block` is what finalized it.
    ///
    /// Single-key form of [`Self::revert_block`]: a key finalized by some
    /// other block is reported and left alone rather than treated as a fault.
    /// Reorgs revert whole blocks through `revert_block`.
    #[instrument(skip_all, fields(component = components::PEGIN_REGISTRY, %key, %block))]
    pub(crate) fn revert_to_unclaimed(
        &self,
        key: ClaimKey,
        block: SidechainBlockId,
    ) -> Result<RevertOutcome, EngineFault> {
        let mut outcome = RevertOutcome::Reverted;
        self.transition_batch::<EngineFault, _>(&[key], |_, cur| match reverted(cur, block) {
            Some(new) => {
                outcome = RevertOutcome::Reverted;
                Ok(Some(new))
            }
            None => {
                outcome = RevertOutcome::NotFinalizer(cur);
                Ok(None)
            }
        })?;

        match outcome {
            RevertOutcome::Reverted => info!("claim reverted to unclaimed"),
            RevertOutcome::NotFinalizer(cur) => {
                debug!(?cur, "claim not finalized by block, leaving it")
            }
        }
        Ok(outcome)
    }

    /// Reverts every key finalized by `block` in one atomic write.
    ///
    /// Every key must currently be finalized by `block`; anything else is a
    /// fault and nothing is written.
    #[instrument(skip_all, fields(component = components::PEGIN_REGISTRY, %block, n_keys = keys.len()))]
    pub(crate) fn revert_block(
        &self,
        keys: &[ClaimKey],
        block: SidechainBlockId,
    ) -> Result<(), EngineFault> {
        self.transition_batch(keys, |key, cur| match reverted(cur, block) {
            Some(new) => Ok(Some(new)),
            None => Err(EngineFault::FinalizerMismatch {
                key,
                expected: block,
                found: cur,
            }),
        })
    }

    /// Reads each key, asks `step` for its next state and writes every change
    /// in one batch. A lost race on any key restarts the whole batch.
    ///
    /// `step` returns `Ok(None)` to leave a key unchanged.
    fn transition_batch<E, F>(&self, keys: &[ClaimKey], mut step: F) -> Result<(), E>
    where
        E: From<DbError> + From<EngineFault>,
        F: FnMut(ClaimKey, ClaimState) -> Result<Option<ClaimState>, E>,
    {
        if keys.is_empty() {
            return Ok(());
        }

        for attempt in 0..MAX_CAS_ATTEMPTS {
            let mut writes = Vec::with_capacity(keys.len());
            for key in keys {
                let cur = self.db.get_claim(key)?;
                if let Some(new) = step(*key, cur)? {
                    writes.push(ClaimWrite::new(*key, cur, new));
                }
            }

            if writes.is_empty() {
                return Ok(());
            }

            match self.db.apply_batch(&writes)? {
                CasOutcome::Applied => {
                    for w in &writes {
                        debug!(key = %w.key, from = ?w.expected, to = ?w.new, "claim transition");
                    }
                    return Ok(());
                }
                CasOutcome::Conflict { key, current } => {
                    trace!(%key, ?current, %attempt, "lost claim race, retrying");
                }
            }
        }

        Err(EngineFault::Contention(keys[0]).into())
    }
}

/// State a claim reverts to when `block` is invalidated, if `block` finalized
/// it.
fn reverted(cur: ClaimState, block: SidechainBlockId) -> Option<ClaimState> {
    (cur.finalizing_block() == Some(block)).then_some(ClaimState::Unclaimed)
}
