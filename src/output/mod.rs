//! Output module for reports and run summaries
//!
//! This module handles:
//! - Writing the deduplicated product report as CSV
//! - Printing the per-domain run summary
//! - Showing stored progress for `--stats`

mod report;
pub mod stats;
mod summary;

pub use report::{read_report, write_report, ReportRow, REPORT_HEADER};
pub use stats::{load_statistics, print_statistics, DomainStatistics};
pub use summary::{format_summary, print_summary};

use thiserror::Error;

/// Errors that can occur while writing the report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;
