//! Data types shared by the peg-in/peg-out validation engine.
//!
//! Everything here is plain data: parent-chain headers, deposits and their
//! inclusion proofs, claim keys and claim states, the sidechain transaction
//! model and the consensus parameters of the peg. Validation logic lives in
//! the crates that consume these types.

#[macro_use]
mod macros;

pub mod buf;
pub mod claim;
pub mod errors;
pub mod params;
pub mod parent;
pub mod sidechain;
pub mod witness;

pub use buf::Buf32;
pub use claim::{ClaimKey, ClaimState, ValidatedClaim};
pub use errors::ParseError;
pub use params::{DepositScriptType, PegParams, PolicyParams};
pub use parent::{DepositProof, DepositTransaction, ParentHeader, MAX_PROOF_DEPTH};
pub use sidechain::{
    SidechainBlock, SidechainBlockId, SidechainOutPoint, SidechainTx, SidechainTxIn, SidechainTxOut,
    SidechainTxid,
};
pub use witness::{PeginWitness, WitnessError, PEGIN_WITNESS_STACK_LEN};
