//! Sled store for claim state.

pub mod claims;
mod init;
mod utils;

pub use claims::db::SledClaimDb;
pub use init::open_sled_database;

pub const SLED_NAME: &str = "fedpeg-registry";
