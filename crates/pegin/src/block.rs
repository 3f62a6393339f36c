//! Structural checks on sidechain txs and block-level peg-in validation.

use std::collections::HashSet;

use fedpeg_common::instrumentation::components;
use fedpeg_db_types::ClaimDatabase;
use fedpeg_primitives::{SidechainBlock, SidechainTx, ValidatedClaim};
use fedpeg_spv::ParentChainView;
use tracing::*;

use crate::{
    errors::{RejectReason, ValidationResult},
    validator::{log_outcome, PeginValidator, ValidationContext},
};

/// Rejects a tx spending the same outpoint twice.
pub(crate) fn check_duplicate_inputs(tx: &SidechainTx) -> Result<(), RejectReason> {
    let mut seen = HashSet::with_capacity(tx.inputs.len());
    for input in &tx.inputs {
        if !seen.insert(input.prevout) {
            return Err(RejectReason::DuplicateInput(input.prevout));
        }
    }
    Ok(())
}

/// Rejects peg-in witness data on inputs not flagged as peg-ins. Looks only
/// at whether the witness is empty, so the cost does not depend on its size.
pub(crate) fn check_extra_witness(tx: &SidechainTx) -> Result<(), RejectReason> {
    match tx
        .inputs
        .iter()
        .position(|i| !i.is_pegin && i.has_pegin_witness())
    {
        Some(input) => Err(RejectReason::ExtraPeginWitness { input }),
        None => Ok(()),
    }
}

/// Rejects a block in which two peg-in inputs claim the same deposit.
pub(crate) fn check_block_collisions(block: &SidechainBlock) -> Result<(), RejectReason> {
    let mut seen = HashSet::new();
    for tx in block.txs() {
        for key in tx.pegin_keys() {
            if !seen.insert(key) {
                return Err(RejectReason::DuplicatePeginInBlock(key));
            }
        }
    }
    Ok(())
}

impl<D: ClaimDatabase> PeginValidator<D> {
    /// Validates every peg-in in `block` and finalizes all of them at once.
    ///
    /// Nothing is recorded unless the whole block passes.
    #[instrument(skip_all, fields(component = components::PEGIN_VALIDATOR, blkid = %block.blkid()))]
    pub fn validate_block(
        &self,
        chain: &impl ParentChainView,
        block: &SidechainBlock,
    ) -> ValidationResult<Vec<ValidatedClaim>> {
        log_outcome(self.check_and_finalize_block(chain, block))
    }

    fn check_and_finalize_block(
        &self,
        chain: &impl ParentChainView,
        block: &SidechainBlock,
    ) -> ValidationResult<Vec<ValidatedClaim>> {
        for tx in block.txs() {
            check_duplicate_inputs(tx)?;
            check_extra_witness(tx)?;
        }
        check_block_collisions(block)?;

        let blkid = block.blkid();
        let mut claims = Vec::new();
        let mut writes = Vec::new();
        for tx in block.txs() {
            let txid = tx.compute_txid();
            let ctx = ValidationContext::Block {
                sidechain_txid: txid,
                block: blkid,
            };
            for input in tx.pegin_inputs() {
                let claim = self.check_pegin_input(chain, input, ctx)?;
                writes.push((claim.key(), txid));
                claims.push(claim);
            }
        }

        self.registry.mark_finalized(&writes, blkid)?;
        if !claims.is_empty() {
            info!(n_claims = claims.len(), "peg-in claims finalized");
        }
        Ok(claims)
    }
}
