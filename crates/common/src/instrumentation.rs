//! Instrumentation component identifiers for peg operations.

/// Component identifiers for tracing spans.
pub mod components {
    /// ClaimDatabase operations. Fields: key, n_writes
    pub const STORAGE_CLAIMS: &str = "storage:claims";

    /// Sled transaction lifecycle. Fields: n_writes. DEBUG level only.
    pub const DB_SLED_TRANSACTION: &str = "db:sled:transaction";

    /// Claim registry transitions. Fields: key, sidechain_txid, block
    pub const PEGIN_REGISTRY: &str = "pegin:registry";

    /// Peg-in validation of a tx or block. Fields: sidechain_txid, blkid
    pub const PEGIN_VALIDATOR: &str = "pegin:validator";

    /// Block invalidation and reconsideration. Fields: blkid
    pub const PEGIN_REORG: &str = "pegin:reorg";

    /// Peg-out checks. Fields: sidechain_txid
    pub const PEGOUT: &str = "pegout";
}
