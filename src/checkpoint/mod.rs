//! Checkpoint module for resumable crawls
//!
//! This module persists, per domain:
//! - the product URLs found so far (the only state a resumed crawl reuses)
//! - a small ledger of runs with their outcome and counters
//!
//! Each domain lives in its own SQLite file under the checkpoint directory.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteCheckpointStore;
pub use traits::{CheckpointError, CheckpointResult, CheckpointStore, RunCounters};

use crate::state::CrawlState;
use std::path::Path;

/// Opens a checkpoint store rooted at the given directory
///
/// # Arguments
///
/// * `dir` - Directory that holds one database file per domain
///
/// # Returns
///
/// * `Ok(SqliteCheckpointStore)` - The directory exists and is usable
/// * `Err(CheckpointError)` - The directory could not be created
pub fn open_store(dir: &Path) -> CheckpointResult<SqliteCheckpointStore> {
    SqliteCheckpointStore::new(dir)
}

/// Represents one recorded crawl of a domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: CrawlState,
    pub pages_fetched: u64,
    pub fetch_errors: u64,
    pub products_found: u64,
    pub failure: Option<String>,
}

impl RunRecord {
    /// The counters recorded for this run
    pub fn counters(&self) -> RunCounters {
        RunCounters {
            pages_fetched: self.pages_fetched,
            fetch_errors: self.fetch_errors,
            products_found: self.products_found,
        }
    }
}
