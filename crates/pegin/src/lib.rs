//! Peg-in validation and the claim registry.
//!
//! [`PeginValidator`] is the only way to change claim state. Mempool admission
//! marks claims pending, block validation finalizes them, and
//! [`ReorgCoordinator`] reverts and restores them as blocks leave and rejoin
//! the active chain.

mod block;
pub mod errors;
mod registry;
mod reorg;
mod validator;

pub use errors::{EngineFault, RegistryError, RejectReason, ValidationError, ValidationResult};
pub use registry::{ClaimRegistry, RevertOutcome};
pub use reorg::{BlockStatus, ReorgCoordinator};
pub use validator::{ClaimInspection, ClaimScriptHint, PeginValidator, ValidationContext};
