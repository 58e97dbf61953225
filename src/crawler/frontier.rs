//! Frontier manager
//!
//! Owns one domain's BFS queue, visited set and product set, and drives the
//! domain through its lifecycle:
//!
//! ```text
//! Idle -> Running -> { Completed, Failed, Interrupted }
//! ```
//!
//! Each loop iteration drains the whole queue as one batch. Every item
//! enqueued while applying a batch is exactly one level deeper, so a batch
//! always holds a single BFS level.

use crate::checkpoint::{CheckpointStore, RunCounters};
use crate::crawler::dispatcher::{DispatchResult, Dispatcher};
use crate::crawler::fetcher::FetchError;
use crate::state::{CrawlState, CrawlTarget, ProductSet, VisitedSet};
use crate::url::{in_scope, UrlClassifier, UrlKind};
use crate::{HarvestError, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A URL waiting to be fetched, with its BFS distance from the root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrontierItem {
    pub url: String,
    pub depth: u32,
}

impl FrontierItem {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

/// Counters collected while crawling one domain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Pages fetched and parsed successfully
    pub pages_fetched: u64,

    /// Pages dropped because their fetch failed
    pub fetch_errors: u64,

    /// Batches dispatched (one per BFS level)
    pub batches: u64,

    /// Products carried over from the checkpoint
    pub resumed_products: u64,

    /// Checkpoint saves that failed
    pub checkpoint_errors: u64,
}

/// Final outcome of one domain crawl
#[derive(Debug, Clone)]
pub struct CrawlResult {
    pub domain_key: String,
    pub products: ProductSet,
    pub state: CrawlState,
    pub stats: CrawlStats,
    pub failure: Option<String>,
}

impl CrawlResult {
    /// Builds the result for a domain whose crawl never produced one
    pub fn failed(domain_key: &str, failure: impl Into<String>) -> Self {
        Self {
            domain_key: domain_key.to_string(),
            products: ProductSet::new(),
            state: CrawlState::Failed,
            stats: CrawlStats::default(),
            failure: Some(failure.into()),
        }
    }

    /// Counters as recorded in the run ledger
    pub fn counters(&self) -> RunCounters {
        RunCounters {
            pages_fetched: self.stats.pages_fetched,
            fetch_errors: self.stats.fetch_errors,
            products_found: self.products.len() as u64,
        }
    }
}

/// BFS frontier for one crawl target
pub struct FrontierManager {
    target: CrawlTarget,
    classifier: Arc<UrlClassifier>,
    store: Arc<dyn CheckpointStore>,
    state: CrawlState,
    queue: VecDeque<FrontierItem>,
    visited: VisitedSet,
    products: ProductSet,
    stats: CrawlStats,
    failure: Option<String>,
}

impl FrontierManager {
    pub fn new(
        target: CrawlTarget,
        classifier: Arc<UrlClassifier>,
        store: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            target,
            classifier,
            store,
            state: CrawlState::Idle,
            queue: VecDeque::new(),
            visited: VisitedSet::new(),
            products: ProductSet::new(),
            stats: CrawlStats::default(),
            failure: None,
        }
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn target(&self) -> &CrawlTarget {
        &self.target
    }

    pub fn products(&self) -> &ProductSet {
        &self.products
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn stats(&self) -> CrawlStats {
        self.stats
    }

    /// Moves to `next`, rejecting transitions the lifecycle does not allow
    fn transition(&mut self, next: CrawlState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!("{}: {} -> {}", self.target.domain_key(), self.state, next);
        self.state = next;
        Ok(())
    }

    /// Ends the crawl in a terminal state
    fn finish(&mut self, next: CrawlState) {
        if let Err(e) = self.transition(next) {
            tracing::error!("{}: {}", self.target.domain_key(), e);
        }
    }

    /// Seeds state from the checkpoint and enqueues the root
    ///
    /// Loaded products count as visited, so they are never classified or
    /// enqueued again.
    pub fn start(&mut self) -> Result<()> {
        self.transition(CrawlState::Running)?;

        let loaded = self.store.load(self.target.domain_key());
        self.stats.resumed_products = loaded.len() as u64;
        self.visited.extend(loaded.iter().cloned());
        self.products = loaded;

        let root = self.target.root_url().to_string();
        if self.visited.insert(root.clone()) {
            self.queue.push_back(FrontierItem::new(root, 0));
        }

        tracing::info!(
            "{}: started (max depth {}, {} products resumed)",
            self.target.domain_key(),
            self.target.max_depth(),
            self.stats.resumed_products
        );
        Ok(())
    }

    /// Takes every queued item as the next batch
    pub fn next_batch(&mut self) -> Vec<FrontierItem> {
        self.queue.drain(..).collect()
    }

    /// Applies a finished batch in item order
    ///
    /// Per-page errors are logged and counted. Returns the first session
    /// error, if any, after the remaining successes have been applied.
    pub fn apply(&mut self, results: Vec<DispatchResult>) -> Option<FetchError> {
        let mut fatal = None;

        for result in results {
            match result.outcome {
                Ok(links) => {
                    self.stats.pages_fetched += 1;
                    for url in links {
                        self.admit(url, result.item.depth);
                    }
                }
                Err(e) if e.is_fatal() => {
                    self.stats.fetch_errors += 1;
                    fatal.get_or_insert(e);
                }
                Err(e) => {
                    self.stats.fetch_errors += 1;
                    tracing::warn!("{}", e);
                }
            }
        }

        fatal
    }

    /// Records one discovered URL found on a page at `depth`
    fn admit(&mut self, url: Url, depth: u32) {
        let url = url.to_string();
        if !self.visited.insert(url.clone()) {
            return;
        }

        match self.classifier.classify(&url) {
            UrlKind::Product => {
                tracing::debug!("Product: {}", url);
                self.products.insert(url);
            }
            UrlKind::Navigational => {
                if !in_scope(&url, &self.target) {
                    tracing::trace!("Out of scope: {}", url);
                } else if depth + 1 > self.target.max_depth() {
                    tracing::trace!("Too deep: {}", url);
                } else {
                    self.queue.push_back(FrontierItem::new(url, depth + 1));
                }
            }
        }
    }

    /// Persists the product set; a failed save is logged and the crawl goes on
    pub fn checkpoint(&mut self) {
        if let Err(e) = self.store.save(self.target.domain_key(), &self.products) {
            self.stats.checkpoint_errors += 1;
            tracing::warn!(
                "{}: checkpoint save failed, continuing in memory: {}",
                self.target.domain_key(),
                e
            );
        }
    }

    /// Runs the crawl to a terminal state
    ///
    /// On cancellation the in-flight batch is abandoned and the checkpoint
    /// of the last completed batch is saved before returning.
    pub async fn run(mut self, dispatcher: &Dispatcher, cancel: &CancellationToken) -> CrawlResult {
        if let Err(e) = self.start() {
            self.failure = Some(e.to_string());
            self.finish(CrawlState::Failed);
            return self.into_result();
        }

        loop {
            let batch = self.next_batch();
            if batch.is_empty() {
                self.finish(CrawlState::Completed);
                break;
            }

            let depth = batch[0].depth;
            tracing::info!(
                "{}: fetching {} pages at depth {}",
                self.target.domain_key(),
                batch.len(),
                depth
            );

            let base = self.target.root_url().clone();
            let results = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.checkpoint();
                    self.finish(CrawlState::Interrupted);
                    break;
                }
                results = dispatcher.dispatch(&batch, &base) => results,
            };

            self.stats.batches += 1;
            let fatal = self.apply(results);
            self.checkpoint();

            tracing::info!(
                "{}: depth {} done, {} products, {} queued",
                self.target.domain_key(),
                depth,
                self.products.len(),
                self.queue.len()
            );

            if let Some(e) = fatal {
                tracing::error!("{}: {}", self.target.domain_key(), e);
                self.failure = Some(e.to_string());
                self.finish(CrawlState::Failed);
                break;
            }
        }

        tracing::info!(
            "{}: {} with {} products",
            self.target.domain_key(),
            self.state,
            self.products.len()
        );
        self.into_result()
    }

    fn into_result(self) -> CrawlResult {
        CrawlResult {
            domain_key: self.target.domain_key().to_string(),
            products: self.products,
            state: self.state,
            stats: self.stats,
            failure: self.failure,
        }
    }
}
