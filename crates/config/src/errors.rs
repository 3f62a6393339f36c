use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] io::Error),

    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid parent genesis hash: {0}")]
    InvalidGenesisHash(String),

    #[error("fedpeg_script is not hex: {0}")]
    InvalidFedpegScript(#[from] hex::FromHexError),

    #[error("fedpeg_script has no tweakable pubkeys")]
    NoTweakableKeys,

    #[error("confirmation_depth must be at least 1")]
    ZeroConfirmationDepth,
}
