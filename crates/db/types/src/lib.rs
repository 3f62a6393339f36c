//! Storage interface for claim state.

pub mod errors;
pub mod instrumented;
pub mod stubs;
pub mod traits;
pub mod types;

pub use errors::{DbError, DbResult};
pub use instrumented::InstrumentedClaimDb;
pub use stubs::claims::MemClaimDb;
pub use traits::ClaimDatabase;
pub use types::{CasOutcome, ClaimWrite};
