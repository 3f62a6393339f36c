//! Keeps claim state in step with the active sidechain as blocks are
//! invalidated and reconsidered.

use std::{collections::HashMap, sync::Arc};

use fedpeg_common::instrumentation::components;
use fedpeg_db_types::ClaimDatabase;
use fedpeg_primitives::{SidechainBlock, SidechainBlockId, SidechainTx, ValidatedClaim};
use fedpeg_spv::ParentChainView;
use parking_lot::Mutex;
use tracing::*;

use crate::{
    errors::{EngineFault, ValidationResult},
    validator::PeginValidator,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockStatus {
    Connected,
    Invalidated,
}

#[derive(Debug)]
struct BlockEntry {
    block: SidechainBlock,
    status: BlockStatus,
}

/// Connects, invalidates and reconsiders sidechain blocks.
///
/// Operations are serialized on an internal lock, so a reorg step finishes
/// before the next one starts. Every connected block stays tracked until the
/// caller drops it with [`Self::forget_block`], typically once it is buried
/// past the sidechain's finality depth.
#[derive(Debug)]
pub struct ReorgCoordinator<D> {
    validator: Arc<PeginValidator<D>>,
    blocks: Mutex<HashMap<SidechainBlockId, BlockEntry>>,
}

impl<D: ClaimDatabase> ReorgCoordinator<D> {
    pub fn new(validator: Arc<PeginValidator<D>>) -> Self {
        Self {
            validator,
            blocks: Mutex::new(HashMap::new()),
        }
    }

    pub fn validator(&self) -> &PeginValidator<D> {
        &self.validator
    }

    pub fn status(&self, blkid: &SidechainBlockId) -> Option<BlockStatus> {
        self.blocks.lock().get(blkid).map(|e| e.status)
    }

    pub fn tracked_blocks(&self) -> usize {
        self.blocks.lock().len()
    }

    /// Stops tracking `blkid`, returning its last status.
    ///
    /// Claim state is left as it is. A forgotten block can no longer be
    /// invalidated or reconsidered.
    #[instrument(skip_all, fields(component = components::PEGIN_REORG, %blkid))]
    pub fn forget_block(&self, blkid: SidechainBlockId) -> Option<BlockStatus> {
        let status = self.blocks.lock().remove(&blkid).map(|e| e.status);
        if let Some(status) = status {
            debug!(?status, "block no longer tracked");
        }
        status
    }

    /// Validates `block` and, if it passes, finalizes its claims and tracks it
    /// as connected.
    pub fn connect_block(
        &self,
        chain: &impl ParentChainView,
        block: SidechainBlock,
    ) -> ValidationResult<Vec<ValidatedClaim>> {
        let mut blocks = self.blocks.lock();
        let claims = self.validator.validate_block(chain, &block)?;
        blocks.insert(
            block.blkid(),
            BlockEntry {
                block,
                status: BlockStatus::Connected,
            },
        );
        Ok(claims)
    }

    /// Reverts every claim `blkid` finalized, atomically.
    ///
    /// Returns the block's peg-in txs so the caller can offer them to the
    /// mempool again. A claim that is not finalized by this block is a fault
    /// and leaves everything untouched.
    #[instrument(skip_all, fields(component = components::PEGIN_REORG, %blkid))]
    pub fn invalidate_block(
        &self,
        blkid: SidechainBlockId,
    ) -> Result<Vec<SidechainTx>, EngineFault> {
        let mut blocks = self.blocks.lock();
        let entry = blocks
            .get_mut(&blkid)
            .ok_or(EngineFault::UnknownBlock(blkid))?;

        if entry.status == BlockStatus::Invalidated {
            debug!("block already invalidated");
            return Ok(Vec::new());
        }

        let keys: Vec<_> = entry
            .block
            .txs()
            .iter()
            .flat_map(|tx| tx.pegin_keys())
            .collect();

        if let Err(fault) = self.validator.registry.revert_block(&keys, blkid) {
            error!(%fault, "claim state disagrees with block, halting invalidation");
            return Err(fault);
        }

        entry.status = BlockStatus::Invalidated;
        let txs: Vec<_> = entry
            .block
            .txs()
            .iter()
            .filter(|tx| tx.pegin_inputs().next().is_some())
            .cloned()
            .collect();

        info!(n_claims = keys.len(), "block invalidated, claims reverted");
        Ok(txs)
    }

    /// Brings an invalidated block back, re-running all block-level peg-in
    /// checks against the current parent chain.
    ///
    /// Fails closed if any of its claims was finalized elsewhere meanwhile.
    #[instrument(skip_all, fields(component = components::PEGIN_REORG, %blkid))]
    pub fn reconsider_block(
        &self,
        chain: &impl ParentChainView,
        blkid: SidechainBlockId,
    ) -> ValidationResult<Vec<ValidatedClaim>> {
        let mut blocks = self.blocks.lock();
        let entry = blocks
            .get_mut(&blkid)
            .ok_or(EngineFault::UnknownBlock(blkid))?;

        if entry.status == BlockStatus::Connected {
            debug!("block already connected");
            return Ok(Vec::new());
        }

        match self.validator.validate_block(chain, &entry.block) {
            Ok(claims) => {
                entry.status = BlockStatus::Connected;
                info!(n_claims = claims.len(), "block reconsidered");
                Ok(claims)
            }
            Err(e) => {
                warn!(%e, "block cannot be reconsidered");
                Err(e)
            }
        }
    }
}
