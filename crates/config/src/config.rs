use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use bitcoin::{BlockHash, Network, ScriptBuf};
use fedpeg_claim_script::tweakable_key_count;
use fedpeg_primitives::{DepositScriptType, PegParams, PolicyParams};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Default value for `datadir` in [`RegistryConfig`].
const DEFAULT_DATADIR: &str = "fedpeg-data";

fn default_confirmation_depth() -> u32 {
    PolicyParams::default().confirmation_depth
}

fn default_coinbase_maturity() -> u32 {
    PolicyParams::default().coinbase_maturity
}

fn default_claim_safety_buffer() -> u32 {
    PolicyParams::default().claim_safety_buffer
}

fn default_fee_rate() -> u64 {
    PolicyParams::default().fallback_fee_rate_sat_per_kvb
}

fn default_datadir() -> PathBuf {
    DEFAULT_DATADIR.into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub parent_network: Network,

    /// Hex block hash, in the usual reversed display order.
    pub parent_genesis_hash: String,

    /// Hex federation peg script.
    pub fedpeg_script: String,

    #[serde(default)]
    pub deposit_script_type: DepositScriptType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeginConfig {
    #[serde(default = "default_confirmation_depth")]
    pub confirmation_depth: u32,

    #[serde(default = "default_coinbase_maturity")]
    pub coinbase_maturity: u32,

    /// Extra confirmations wallets wait for on top of `confirmation_depth`.
    #[serde(default = "default_claim_safety_buffer")]
    pub claim_safety_buffer: u32,
}

impl Default for PeginConfig {
    fn default() -> Self {
        Self {
            confirmation_depth: default_confirmation_depth(),
            coinbase_maturity: default_coinbase_maturity(),
            claim_safety_buffer: default_claim_safety_buffer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PegoutConfig {
    /// Minimum relay fee rate in sats per 1000 vbytes.
    #[serde(default = "default_fee_rate")]
    pub fallback_fee_rate_sat_per_kvb: u64,
}

impl Default for PegoutConfig {
    fn default() -> Self {
        Self {
            fallback_fee_rate_sat_per_kvb: default_fee_rate(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryBackend {
    /// Lost on exit. Tests and dry runs only.
    Memory,
    #[default]
    Sled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub backend: RegistryBackend,

    /// The data directory where database contents reside.
    #[serde(default = "default_datadir")]
    pub datadir: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            backend: RegistryBackend::default(),
            datadir: default_datadir(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json_format: bool,

    /// Also write logs to daily files here when set.
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub chain: ChainConfig,
    #[serde(default)]
    pub pegin: PeginConfig,
    #[serde(default)]
    pub pegout: PegoutConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn policy(&self) -> PolicyParams {
        PolicyParams {
            confirmation_depth: self.pegin.confirmation_depth,
            coinbase_maturity: self.pegin.coinbase_maturity,
            claim_safety_buffer: self.pegin.claim_safety_buffer,
            fallback_fee_rate_sat_per_kvb: self.pegout.fallback_fee_rate_sat_per_kvb,
        }
    }

    /// Parses and checks the chain section into engine parameters.
    pub fn peg_params(&self) -> Result<PegParams, ConfigError> {
        let genesis = BlockHash::from_str(self.chain.parent_genesis_hash.trim())
            .map_err(|e| ConfigError::InvalidGenesisHash(e.to_string()))?;

        let fedpeg_script = ScriptBuf::from_bytes(hex::decode(self.chain.fedpeg_script.trim())?);
        if !matches!(tweakable_key_count(&fedpeg_script), Ok(n) if n > 0) {
            return Err(ConfigError::NoTweakableKeys);
        }

        let policy = self.policy();
        if policy.confirmation_depth == 0 {
            return Err(ConfigError::ZeroConfirmationDepth);
        }

        Ok(PegParams {
            parent_network: self.chain.parent_network,
            parent_genesis_hash: genesis,
            fedpeg_script,
            deposit_script_type: self.chain.deposit_script_type,
            policy,
        })
    }
}
