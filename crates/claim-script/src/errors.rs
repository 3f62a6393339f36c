use bitcoin::script;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimScriptError {
    #[error("federation script has no tweakable pubkeys")]
    NoTweakableKeys,

    #[error("malformed script: {0}")]
    MalformedScript(#[from] script::Error),

    /// The commitment is not a valid scalar, or the tweak sends the key to
    /// infinity. Astronomically unlikely for honest inputs.
    #[error("pubkey tweak failed at key {index}")]
    TweakFailed { index: usize },

    #[error("cannot make an address from deposit script: {0}")]
    Address(String),
}
