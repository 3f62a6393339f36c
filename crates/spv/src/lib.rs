//! SPV checks on parent-chain deposits.
//!
//! This covers merkle inclusion proofs, the confirmation-depth policy and a
//! small bounded index of parent-chain headers. Nothing here touches claim
//! state, so every function is safe to call concurrently.

pub mod errors;
pub mod header_chain;
pub mod merkle;
pub mod policy;

pub use errors::{HeaderChainError, ProofError};
pub use header_chain::{HeaderChain, ParentChainView};
pub use merkle::{build_proof, compute_root, verify, verify_proof};
pub use policy::{ConfirmationPolicy, ConfirmationState};
