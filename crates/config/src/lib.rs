//! Operator configuration, read from TOML.

mod config;
pub mod errors;

pub use config::{
    ChainConfig, Config, LoggingConfig, PeginConfig, PegoutConfig, RegistryBackend,
    RegistryConfig,
};
pub use errors::ConfigError;
