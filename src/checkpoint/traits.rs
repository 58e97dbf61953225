//! Checkpoint store trait and error types
//!
//! This module defines the trait interface for checkpoint backends and
//! associated error types.

use crate::checkpoint::RunRecord;
use crate::state::{CrawlState, ProductSet};
use thiserror::Error;

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Checkpoint for {domain} is unreadable: {reason}")]
    Corrupt { domain: String, reason: String },

    #[error("Run not found: {0}")]
    RunNotFound(i64),
}

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Counters recorded when a run finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub pages_fetched: u64,
    pub fetch_errors: u64,
    pub products_found: u64,
}

/// Trait for per-domain checkpoint backends
///
/// A store is keyed by domain. Only the single frontier that owns a domain
/// writes that domain's checkpoint, so implementations need no cross-writer
/// locking per key, but must be usable from many domain tasks at once.
pub trait CheckpointStore: Send + Sync {
    // ===== Product Snapshot =====

    /// Loads the product set saved for a domain
    ///
    /// A missing checkpoint yields an empty set. An unreadable checkpoint is
    /// logged, moved out of the way and also yields an empty set.
    fn load(&self, domain: &str) -> ProductSet;

    /// Replaces the saved product set for a domain atomically
    ///
    /// A crash during `save` leaves either the previous snapshot or the new
    /// one, never a mix.
    fn save(&self, domain: &str, products: &ProductSet) -> CheckpointResult<()>;

    /// Deletes everything stored for a domain
    fn clear(&self, domain: &str) -> CheckpointResult<()>;

    // ===== Run Ledger =====

    /// Records the start of a run and returns its ID
    fn begin_run(&self, domain: &str, config_hash: &str) -> CheckpointResult<i64>;

    /// Records the outcome of a run
    fn finish_run(
        &self,
        domain: &str,
        run_id: i64,
        status: CrawlState,
        counters: RunCounters,
        failure: Option<&str>,
    ) -> CheckpointResult<()>;

    /// Gets the most recent run for a domain
    fn latest_run(&self, domain: &str) -> CheckpointResult<Option<RunRecord>>;
}
