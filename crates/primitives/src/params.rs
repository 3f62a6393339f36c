//! Consensus and policy parameters of the peg.

use bitcoin::{BlockHash, Network, ScriptBuf};
use serde::{Deserialize, Serialize};

/// How the tweaked federation script is wrapped into the parent-chain output
/// a depositor pays to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DepositScriptType {
    /// P2SH wrapping a P2WSH of the tweaked script.
    #[default]
    P2shP2wsh,
    /// Native P2WSH of the tweaked script.
    P2wsh,
}

/// Depth and fee thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyParams {
    /// Confirmations any deposit needs before it can be claimed.
    pub confirmation_depth: u32,

    /// Confirmations a coinbase deposit needs. Checked alongside
    /// `confirmation_depth`, not added to it.
    pub coinbase_maturity: u32,

    /// Extra depth wallets wait for before building a claim.
    pub claim_safety_buffer: u32,

    /// Minimum relay fee rate for peg-outs, in sats per 1000 vbytes.
    pub fallback_fee_rate_sat_per_kvb: u64,
}

impl Default for PolicyParams {
    fn default() -> Self {
        Self {
            confirmation_depth: 10,
            coinbase_maturity: 100,
            claim_safety_buffer: 2,
            fallback_fee_rate_sat_per_kvb: 1_000,
        }
    }
}

/// Everything the engine needs to know about the peg.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PegParams {
    pub parent_network: Network,
    pub parent_genesis_hash: BlockHash,
    pub fedpeg_script: ScriptBuf,
    pub deposit_script_type: DepositScriptType,
    pub policy: PolicyParams,
}
