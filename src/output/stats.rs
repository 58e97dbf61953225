//! Stored progress per target
//!
//! Backs the `--stats` flag: reads what the checkpoint store holds for each
//! configured target without crawling anything.

use crate::checkpoint::{CheckpointResult, CheckpointStore, RunRecord};
use crate::state::CrawlTarget;

/// Stored progress for one target
#[derive(Debug, Clone)]
pub struct DomainStatistics {
    /// The target's domain key
    pub domain: String,

    /// Products in the current checkpoint
    pub stored_products: usize,

    /// Most recent run recorded in the ledger
    pub latest_run: Option<RunRecord>,
}

/// Loads stored progress for every target
///
/// # Arguments
///
/// * `store` - The checkpoint store to query
/// * `targets` - The configured targets, in order
///
/// # Returns
///
/// * `Ok(Vec<DomainStatistics>)` - One entry per target
/// * `Err(CheckpointError)` - A ledger could not be read
pub fn load_statistics(
    store: &dyn CheckpointStore,
    targets: &[CrawlTarget],
) -> CheckpointResult<Vec<DomainStatistics>> {
    targets
        .iter()
        .map(|target| {
            let domain = target.domain_key();
            Ok(DomainStatistics {
                domain: domain.to_string(),
                stored_products: store.load(domain).len(),
                latest_run: store.latest_run(domain)?,
            })
        })
        .collect()
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &[DomainStatistics]) {
    println!("=== Stored Progress ===\n");

    for entry in stats {
        println!("{}", entry.domain);
        println!("  Stored products: {}", entry.stored_products);

        match &entry.latest_run {
            Some(run) => {
                println!("  Last run: #{} [{}]", run.id, run.status);
                println!("    Started: {}", run.started_at);
                if let Some(finished) = &run.finished_at {
                    println!("    Finished: {}", finished);
                }
                println!(
                    "    Pages fetched: {}, fetch errors: {}, products: {}",
                    run.pages_fetched, run.fetch_errors, run.products_found
                );
                if let Some(failure) = &run.failure {
                    println!("    Failure: {}", failure);
                }
            }
            None => println!("  Last run: none"),
        }
        println!();
    }

    let total: usize = stats.iter().map(|s| s.stored_products).sum();
    println!("Total stored products: {} across {} domains", total, stats.len());
}
