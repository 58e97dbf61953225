//! Crawler module for product-page discovery
//!
//! This module contains the crawl engine, including:
//! - Page fetching (`PageFetcher`, HTTP by default)
//! - Link extraction (`LinkExtractor`, HTML anchors by default)
//! - Bounded-concurrency batch dispatch
//! - The per-domain BFS frontier
//! - Multi-domain coordination and result merging

mod coordinator;
mod dispatcher;
mod fetcher;
mod frontier;
mod parser;

#[cfg(test)]
pub(crate) mod test_support;

pub use coordinator::{merge_results, Coordinator, CrawlReport};
pub use dispatcher::{DispatchResult, Dispatcher};
pub use fetcher::{build_http_client, FetchError, HttpFetcher, PageFetcher};
pub use frontier::{CrawlResult, CrawlStats, FrontierItem, FrontierManager};
pub use parser::{HtmlLinkExtractor, LinkExtractor};

use crate::config::Config;
use crate::Result;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP fetcher, link extractor and checkpoint store
/// 2. Optionally clear existing checkpoints
/// 3. Crawl every target, resuming from its checkpoint
/// 4. Merge all product sets into deduplicated report rows
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `config_hash` - Hash of the configuration file
/// * `fresh` - Whether to discard existing checkpoints first
/// * `cancel` - Token that interrupts the crawl
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl ran; individual domains may still have failed
/// * `Err(HarvestError)` - The crawl could not be set up
pub async fn crawl(
    config: &Config,
    config_hash: &str,
    fresh: bool,
    cancel: &CancellationToken,
) -> Result<CrawlReport> {
    let coordinator = Coordinator::new(config, config_hash)?;
    if fresh {
        coordinator.clear_checkpoints()?;
    }
    Ok(coordinator.run(cancel).await)
}
