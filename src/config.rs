//! Store configuration

/// Number of results a query returns when the caller does not say.
pub const DEFAULT_N_RESULTS: usize = 10;

/// Number of records `peek` returns when the caller does not say.
pub const DEFAULT_PEEK_LIMIT: usize = 10;

/// Configuration shared by a registry and every collection it creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Reject vectors (and queries) whose dimension differs from the records
    /// already stored in the collection.
    pub enforce_dimension: bool,
    /// Candidate count at which query distances are computed in parallel.
    pub parallel_threshold: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enforce_dimension: true,
            parallel_threshold: 4096,
        }
    }
}
