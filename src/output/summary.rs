//! End-of-run summary
//!
//! Every domain is listed with its final state, so a partial run never
//! reads like a complete one.

use crate::crawler::{CrawlReport, CrawlResult};
use crate::state::CrawlState;

/// Formats the run summary as plain text
///
/// # Arguments
///
/// * `report` - The finished (or interrupted) crawl
///
/// # Returns
///
/// A multi-line summary: one block per domain, then the totals
pub fn format_summary(report: &CrawlReport) -> String {
    let mut out = String::from("=== Harvest Summary ===\n\n");

    for result in &report.results {
        out.push_str(&format_domain(result));
    }

    let count = |state: CrawlState| report.results.iter().filter(|r| r.state == state).count();

    out.push_str(&format!(
        "Total unique product URLs: {}\n",
        report.rows.len()
    ));
    out.push_str(&format!(
        "Domains: {} completed, {} failed, {} interrupted\n",
        count(CrawlState::Completed),
        count(CrawlState::Failed),
        count(CrawlState::Interrupted)
    ));
    out.push_str(&format!("Elapsed: {:.1}s\n", report.elapsed.as_secs_f64()));

    out
}

fn format_domain(result: &CrawlResult) -> String {
    let mut block = format!(
        "{} [{}]\n  Products: {} ({} resumed)\n  Pages fetched: {}, fetch errors: {}\n",
        result.domain_key,
        result.state,
        result.products.len(),
        result.stats.resumed_products,
        result.stats.pages_fetched,
        result.stats.fetch_errors
    );
    if result.stats.checkpoint_errors > 0 {
        block.push_str(&format!(
            "  Checkpoint save failures: {}\n",
            result.stats.checkpoint_errors
        ));
    }
    if let Some(failure) = &result.failure {
        block.push_str(&format!("  Failure: {}\n", failure));
    }
    block.push('\n');
    block
}

/// Prints the run summary to stdout
pub fn print_summary(report: &CrawlReport) {
    print!("{}", format_summary(report));
}
