//! Fetch/extract dispatcher
//!
//! Runs one batch of frontier items through the page fetcher and link
//! extractor with at most `workers` pages in flight. Every item gets its own
//! task, so a page that never finishes only holds its own permit. The
//! dispatcher keeps no crawl state between calls.

use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::crawler::frontier::FrontierItem;
use crate::crawler::parser::LinkExtractor;
use crate::url::resolve_href;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Outcome of one dispatched item
#[derive(Debug, Clone)]
pub struct DispatchResult {
    /// The item that was fetched
    pub item: FrontierItem,

    /// Absolute URLs discovered on the page, or why the page was dropped
    pub outcome: Result<Vec<Url>, FetchError>,
}

/// Bounded-concurrency fetch and extract primitive
#[derive(Clone)]
pub struct Dispatcher {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn LinkExtractor>,
    workers: usize,
}

impl Dispatcher {
    /// Creates a dispatcher
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Loads a URL and returns its markup
    /// * `extractor` - Pulls raw hrefs out of markup
    /// * `workers` - Maximum pages in flight per batch (at least 1)
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn LinkExtractor>,
        workers: usize,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            workers: workers.max(1),
        }
    }

    /// Maximum pages in flight per batch
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Fetches and extracts every item of a batch
    ///
    /// Hrefs are resolved against `base`. Results come back in the same
    /// order as `batch`, one per item. A failing item never cancels its
    /// siblings; a task that panics is reported as a page error for its item.
    ///
    /// Dropping the returned future aborts every page task of the batch.
    pub async fn dispatch(&self, batch: &[FrontierItem], base: &Url) -> Vec<DispatchResult> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for (index, item) in batch.iter().enumerate() {
            let semaphore = semaphore.clone();
            let fetcher = self.fetcher.clone();
            let extractor = self.extractor.clone();
            let base = base.clone();
            let url = item.url.clone();

            tasks.spawn(async move {
                // The semaphore is never closed, so acquire only fails on a bug
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return (index, Err(FetchError::Session(e.to_string()))),
                };
                (index, fetch_and_extract(&*fetcher, &*extractor, &url, &base).await)
            });
        }

        let mut outcomes: Vec<Option<Result<Vec<Url>, FetchError>>> = vec![None; batch.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => tracing::error!("Page task failed: {}", e),
            }
        }

        batch
            .iter()
            .zip(outcomes)
            .map(|(item, outcome)| DispatchResult {
                item: item.clone(),
                outcome: outcome
                    .unwrap_or_else(|| Err(FetchError::page(&item.url, "page task panicked"))),
            })
            .collect()
    }
}

async fn fetch_and_extract(
    fetcher: &dyn PageFetcher,
    extractor: &dyn LinkExtractor,
    url: &str,
    base: &Url,
) -> Result<Vec<Url>, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::page(url, e.to_string()))?;
    let html = fetcher.fetch(&parsed).await?;

    let links: Vec<Url> = extractor
        .extract_links(&html)
        .iter()
        .filter_map(|href| resolve_href(base, href))
        .collect();

    tracing::debug!("{}: {} links", url, links.len());
    Ok(links)
}
