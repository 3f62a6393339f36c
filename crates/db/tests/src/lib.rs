//! Backend-agnostic conformance tests for [`fedpeg_db_types::ClaimDatabase`].
//!
//! Each backend instantiates the suite with [`claim_db_tests!`].

pub mod claim_tests;

#[cfg(test)]
mod tests {
    use fedpeg_db_types::{InstrumentedClaimDb, MemClaimDb};

    mod mem {
        use super::*;

        crate::claim_db_tests!(MemClaimDb::new());
    }

    mod instrumented {
        use super::*;

        crate::claim_db_tests!(InstrumentedClaimDb::new(MemClaimDb::new()));
    }
}
