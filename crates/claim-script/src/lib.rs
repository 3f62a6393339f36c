//! Derivation of the parent-chain deposit script for a sidechain claim.
//!
//! Every federation pubkey in the peg script is tweaked by a commitment to
//! the claimant's sidechain script, so each claim script gets its own deposit
//! address while the federation can still spend from all of them.

mod contract;
mod deriver;
pub mod errors;

pub use contract::{tweak_fedpeg_script, tweakable_key_count};
pub use deriver::{derive, ClaimScriptDeriver};
pub use errors::ClaimScriptError;
