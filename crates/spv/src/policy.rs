//! Confirmation-depth policy for deposits.

use fedpeg_primitives::PolicyParams;

use crate::header_chain::ParentChainView;

/// Depth of a deposit's block relative to the parent-chain tip at the time it
/// was queried.
///
/// Never stored: build a fresh one from the view whenever a decision is made,
/// since the tip moves and may move backwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfirmationState {
    block_height: u64,
    tip_height: u64,
}

impl ConfirmationState {
    pub fn new(block_height: u64, tip_height: u64) -> Self {
        Self {
            block_height,
            tip_height,
        }
    }

    /// Reads the current tip from `view`.
    pub fn query(view: &impl ParentChainView, block_height: u64) -> Self {
        Self::new(block_height, view.tip_height())
    }

    /// Number of blocks from the deposit's block up to and including the tip.
    /// A deposit in the tip block has one confirmation.
    pub fn confirmations(&self) -> u64 {
        if self.tip_height < self.block_height {
            return 0;
        }
        self.tip_height - self.block_height + 1
    }

    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    pub fn tip_height(&self) -> u64 {
        self.tip_height
    }
}

/// Decides when a deposit is deep enough to claim.
///
/// Coinbase deposits must satisfy both the base depth and the coinbase
/// maturity; the larger one wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    confirmation_depth: u64,
    coinbase_maturity: u64,
    claim_safety_buffer: u64,
}

impl ConfirmationPolicy {
    pub fn new(confirmation_depth: u64, coinbase_maturity: u64, claim_safety_buffer: u64) -> Self {
        Self {
            confirmation_depth,
            coinbase_maturity,
            claim_safety_buffer,
        }
    }

    pub fn from_params(params: &PolicyParams) -> Self {
        Self::new(
            params.confirmation_depth as u64,
            params.coinbase_maturity as u64,
            params.claim_safety_buffer as u64,
        )
    }

    pub fn required_depth(&self, is_coinbase: bool) -> u64 {
        if is_coinbase {
            self.confirmation_depth.max(self.coinbase_maturity)
        } else {
            self.confirmation_depth
        }
    }

    /// Depth a wallet waits for before building a claim: the consensus depth
    /// plus the safety buffer, for coinbase deposits too.
    pub fn required_depth_with_buffer(&self, is_coinbase: bool) -> u64 {
        self.required_depth(is_coinbase)
            .saturating_add(self.claim_safety_buffer)
    }

    pub fn is_mature(&self, state: &ConfirmationState, is_coinbase: bool) -> bool {
        let confs = state.confirmations();
        if confs < self.confirmation_depth {
            return false;
        }
        !is_coinbase || confs >= self.coinbase_maturity
    }

    pub fn is_mature_with_buffer(&self, state: &ConfirmationState, is_coinbase: bool) -> bool {
        state.confirmations() >= self.required_depth_with_buffer(is_coinbase)
    }
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self::from_params(&PolicyParams::default())
    }
}
