//! Crawl coordinator
//!
//! Runs one frontier per crawl target with at most `domain-concurrency`
//! domains in flight, records each domain's run in its ledger, and merges
//! the per-domain product sets into one deduplicated report.

use crate::checkpoint::{CheckpointStore, SqliteCheckpointStore};
use crate::config::Config;
use crate::crawler::dispatcher::Dispatcher;
use crate::crawler::fetcher::HttpFetcher;
use crate::crawler::frontier::{CrawlResult, FrontierManager};
use crate::crawler::parser::HtmlLinkExtractor;
use crate::output::ReportRow;
use crate::state::{CrawlState, CrawlTarget};
use crate::url::{extract_domain, UrlClassifier};
use crate::Result;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Everything a finished (or interrupted) run produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// One result per target, in configuration order
    pub results: Vec<CrawlResult>,

    /// Globally deduplicated product rows
    pub rows: Vec<ReportRow>,

    pub elapsed: Duration,
}

impl CrawlReport {
    /// Returns true if any domain stopped because of cancellation
    pub fn interrupted(&self) -> bool {
        self.results
            .iter()
            .any(|r| r.state == CrawlState::Interrupted)
    }

    /// Returns true if every domain ran to completion
    pub fn all_completed(&self) -> bool {
        self.results.iter().all(|r| r.state.is_success())
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    targets: Vec<CrawlTarget>,
    classifier: Arc<UrlClassifier>,
    store: Arc<dyn CheckpointStore>,
    dispatcher: Dispatcher,
    domain_concurrency: usize,
    config_hash: String,
}

impl Coordinator {
    /// Creates a coordinator with the HTTP fetcher, HTML extractor and
    /// SQLite checkpoints described by the configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `config_hash` - Hash of the configuration file, recorded per run
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - Targets, patterns, HTTP client or checkpoint
    ///   directory could not be set up
    pub fn new(config: &Config, config_hash: &str) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.fetcher)?;
        let dispatcher = Dispatcher::new(
            Arc::new(fetcher),
            Arc::new(HtmlLinkExtractor::new()),
            config.crawler.page_concurrency,
        );
        let store = SqliteCheckpointStore::new(&config.output.checkpoint_dir)?;

        Ok(Self::with_components(
            config.crawl_targets()?,
            Arc::new(config.url_classifier()?),
            Arc::new(store),
            dispatcher,
            config.crawler.domain_concurrency,
            config_hash,
        ))
    }

    /// Creates a coordinator from already-built parts
    pub fn with_components(
        targets: Vec<CrawlTarget>,
        classifier: Arc<UrlClassifier>,
        store: Arc<dyn CheckpointStore>,
        dispatcher: Dispatcher,
        domain_concurrency: usize,
        config_hash: &str,
    ) -> Self {
        Self {
            targets,
            classifier,
            store,
            dispatcher,
            domain_concurrency: domain_concurrency.max(1),
            config_hash: config_hash.to_string(),
        }
    }

    pub fn targets(&self) -> &[CrawlTarget] {
        &self.targets
    }

    pub fn store(&self) -> &Arc<dyn CheckpointStore> {
        &self.store
    }

    /// Deletes every target's checkpoint so the next run starts from scratch
    pub fn clear_checkpoints(&self) -> Result<()> {
        for target in &self.targets {
            self.store.clear(target.domain_key())?;
            tracing::info!("Cleared checkpoint for {}", target.domain_key());
        }
        Ok(())
    }

    /// Crawls every target and merges the results
    ///
    /// Domains fail independently. When `cancel` fires, running domains
    /// save their last completed batch and report `Interrupted`; domains
    /// still waiting for a slot start, see the cancellation, and do the same.
    pub async fn run(&self, cancel: &CancellationToken) -> CrawlReport {
        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.domain_concurrency));
        let mut tasks = JoinSet::new();

        tracing::info!(
            "Crawling {} domains ({} at a time, {} pages per batch)",
            self.targets.len(),
            self.domain_concurrency,
            self.dispatcher.workers()
        );

        for (index, target) in self.targets.iter().enumerate() {
            let semaphore = semaphore.clone();
            let frontier =
                FrontierManager::new(target.clone(), self.classifier.clone(), self.store.clone());
            let store = self.store.clone();
            let dispatcher = self.dispatcher.clone();
            let cancel = cancel.clone();
            let config_hash = self.config_hash.clone();

            tasks.spawn(async move {
                let domain = frontier.target().domain_key().to_string();
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return (index, CrawlResult::failed(&domain, e.to_string())),
                };

                let run_id = match store.begin_run(&domain, &config_hash) {
                    Ok(id) => Some(id),
                    Err(e) => {
                        tracing::warn!("{}: could not record run start: {}", domain, e);
                        None
                    }
                };

                let result = frontier.run(&dispatcher, &cancel).await;

                if let Some(run_id) = run_id {
                    if let Err(e) = store.finish_run(
                        &domain,
                        run_id,
                        result.state,
                        result.counters(),
                        result.failure.as_deref(),
                    ) {
                        tracing::warn!("{}: could not record run outcome: {}", domain, e);
                    }
                }

                (index, result)
            });
        }

        let mut slots: Vec<Option<CrawlResult>> = vec![None; self.targets.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::error!("Domain task failed: {}", e),
            }
        }

        let results: Vec<CrawlResult> = self
            .targets
            .iter()
            .zip(slots)
            .map(|(target, slot)| {
                slot.unwrap_or_else(|| {
                    CrawlResult::failed(target.domain_key(), "crawl task panicked")
                })
            })
            .collect();

        let rows = merge_results(&results);
        CrawlReport {
            results,
            rows,
            elapsed: started.elapsed(),
        }
    }
}

/// Merges per-domain product sets into one list of unique rows
///
/// Results are walked in order and the first occurrence of a URL wins. The
/// domain column is the product URL's own host, which differs from the
/// target's key for off-host products.
pub fn merge_results(results: &[CrawlResult]) -> Vec<ReportRow> {
    let mut seen = HashSet::new();
    let mut rows = Vec::new();

    for result in results {
        for url in &result.products {
            if !seen.insert(url.as_str()) {
                continue;
            }
            let domain = Url::parse(url)
                .ok()
                .and_then(|parsed| extract_domain(&parsed))
                .unwrap_or_else(|| result.domain_key.clone());
            rows.push(ReportRow {
                domain,
                product_url: url.clone(),
            });
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::PageFetcher;
    use crate::crawler::frontier::CrawlStats;
    use crate::crawler::test_support::{MemoryStore, MockSite};
    use crate::state::ProductSet;
    use crate::url::PatternRule;
    use std::collections::HashMap;

    fn result(domain: &str, products: &[&str], state: CrawlState) -> CrawlResult {
        CrawlResult {
            domain_key: domain.to_string(),
            products: products.iter().map(|p| p.to_string()).collect::<ProductSet>(),
            state,
            stats: CrawlStats::default(),
            failure: None,
        }
    }

    fn coordinator(
        roots: &[&str],
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<MemoryStore>,
        domain_concurrency: usize,
    ) -> Coordinator {
        let targets = roots
            .iter()
            .map(|root| CrawlTarget::new(root, 2).unwrap())
            .collect();
        let dispatcher = Dispatcher::new(fetcher, Arc::new(HtmlLinkExtractor::new()), 4);
        Coordinator::with_components(
            targets,
            Arc::new(UrlClassifier::new(vec![PatternRule::literal("/p/")])),
            store,
            dispatcher,
            domain_concurrency,
            "test-hash",
        )
    }

    #[test]
    fn test_merge_dedups_first_seen() {
        let results = vec![
            result(
                "a.example",
                &["https://a.example/p/1", "https://b.example/p/9"],
                CrawlState::Completed,
            ),
            result(
                "b.example",
                &["https://b.example/p/9", "https://b.example/p/2"],
                CrawlState::Completed,
            ),
        ];

        let rows = merge_results(&results);
        let urls: Vec<&str> = rows.iter().map(|r| r.product_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://a.example/p/1",
                "https://b.example/p/9",
                "https://b.example/p/2"
            ]
        );
        assert_eq!(rows[1].domain, "b.example");
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge_results(&[]).is_empty());
    }

    #[test]
    fn test_report_flags() {
        let report = CrawlReport {
            results: vec![
                result("a.example", &[], CrawlState::Completed),
                result("b.example", &[], CrawlState::Interrupted),
            ],
            rows: vec![],
            elapsed: Duration::ZERO,
        };
        assert!(report.interrupted());
        assert!(!report.all_completed());
    }

    #[tokio::test]
    async fn test_runs_all_domains() {
        let site = Arc::new(
            MockSite::new()
                .page("https://a.example/", &["/p/1", "https://b.example/p/5"])
                .page("https://b.example/", &["/p/5", "/c/x"])
                .page("https://b.example/c/x", &["/p/6"])
                .page("https://c.example/", &[]),
        );
        let store = Arc::new(MemoryStore::new());

        let report = coordinator(
            &["https://a.example/", "https://b.example/", "https://c.example/"],
            site,
            store.clone(),
            2,
        )
        .run(&CancellationToken::new())
        .await;

        assert!(report.all_completed());
        let domains: Vec<&str> = report.results.iter().map(|r| r.domain_key.as_str()).collect();
        assert_eq!(domains, vec!["a.example", "b.example", "c.example"]);

        // b.example/p/5 was found by both domains but appears once
        let urls: Vec<&str> = report.rows.iter().map(|r| r.product_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://a.example/p/1",
                "https://b.example/p/5",
                "https://b.example/p/6"
            ]
        );

        let run = store.latest_run("b.example").unwrap().unwrap();
        assert_eq!(run.status, CrawlState::Completed);
        assert_eq!(run.products_found, 2);
        assert_eq!(run.config_hash, "test-hash");
    }

    #[tokio::test]
    async fn test_failed_domain_does_not_stop_others() {
        let site = Arc::new(
            MockSite::new()
                .session_failure("https://a.example/")
                .page("https://b.example/", &["/p/1"]),
        );
        let store = Arc::new(MemoryStore::new());

        let report = coordinator(
            &["https://a.example/", "https://b.example/"],
            site,
            store.clone(),
            2,
        )
        .run(&CancellationToken::new())
        .await;

        let states: HashMap<&str, CrawlState> = report
            .results
            .iter()
            .map(|r| (r.domain_key.as_str(), r.state))
            .collect();
        assert_eq!(states["a.example"], CrawlState::Failed);
        assert_eq!(states["b.example"], CrawlState::Completed);
        assert_eq!(report.rows.len(), 1);

        let failed = store.latest_run("a.example").unwrap().unwrap();
        assert_eq!(failed.status, CrawlState::Failed);
        assert!(failed.failure.is_some());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let site = Arc::new(MockSite::new().page("https://a.example/", &["/p/1"]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = coordinator(&["https://a.example/"], site.clone(), Arc::new(MemoryStore::new()), 1)
            .run(&cancel)
            .await;

        assert!(report.interrupted());
        assert!(site.fetched().is_empty());
    }

    #[test]
    fn test_clear_checkpoints() {
        let store = Arc::new(MemoryStore::seeded("a.example", &["https://a.example/p/1"]));
        let coordinator = coordinator(
            &["https://a.example/"],
            Arc::new(MockSite::new()),
            store.clone(),
            1,
        );

        coordinator.clear_checkpoints().unwrap();
        assert!(store.snapshot("a.example").is_none());
    }
}
