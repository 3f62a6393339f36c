//! Peg-out requests: the null-data output that burns sidechain funds and
//! names where they should be released on the parent chain, plus the relay
//! fee rule peg-out transactions must meet.

mod destination;
pub mod errors;
mod fee;
mod script;
mod tx;

pub use destination::{classify_destination, parse_destination, DestinationInfo, DestinationType};
pub use errors::PegoutError;
pub use fee::FeePolicy;
pub use script::{decode_pegout, encode, is_pegout_script, PegoutPayload};
pub use tx::{validate_pegout_tx, PegoutRequest};
