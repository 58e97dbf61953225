//! In-memory doubles for crawler tests

use crate::checkpoint::{CheckpointError, CheckpointResult, CheckpointStore, RunCounters, RunRecord};
use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::state::{CrawlState, ProductSet};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// Scripted site: each URL maps to a page of links or an error
#[derive(Default)]
pub struct MockSite {
    pages: HashMap<String, Result<String, FetchError>>,
    delay: Duration,
    fetched: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl MockSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves a page whose anchors point at `hrefs`
    pub fn page(mut self, url: &str, hrefs: &[&str]) -> Self {
        let body: String = hrefs
            .iter()
            .map(|href| format!("<a href=\"{}\">link</a>", href))
            .collect();
        self.pages
            .insert(url.to_string(), Ok(format!("<html><body>{}</body></html>", body)));
        self
    }

    /// Fails this URL with a per-page error
    pub fn failing(mut self, url: &str) -> Self {
        self.pages
            .insert(url.to_string(), Err(FetchError::page(url, "HTTP 500")));
        self
    }

    /// Fails this URL with a session error
    pub fn session_failure(mut self, url: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            Err(FetchError::Session("browser handle died".to_string())),
        );
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Every URL fetched so far, in completion order
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    /// Highest number of simultaneous fetches observed
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for MockSite {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.fetched.lock().unwrap().push(url.to_string());
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.pages
            .get(url.as_str())
            .cloned()
            .unwrap_or_else(|| Err(FetchError::page(url.as_str(), "HTTP 404")))
    }
}

/// Fetcher that hangs on one URL until released and serves empty pages otherwise
pub struct BlockingFetcher {
    blocked: String,
    gate: Semaphore,
    completed: Arc<AtomicUsize>,
}

impl BlockingFetcher {
    pub fn new(blocked: &str, completed: Arc<AtomicUsize>) -> Self {
        Self {
            blocked: blocked.to_string(),
            gate: Semaphore::new(0),
            completed,
        }
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl PageFetcher for BlockingFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        if url.as_str() == self.blocked {
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| FetchError::Session(e.to_string()))?;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok("<html></html>".to_string())
    }
}

/// Checkpoint store kept in memory, with an optional failing save
#[derive(Default)]
pub struct MemoryStore {
    snapshots: Mutex<HashMap<String, ProductSet>>,
    runs: Mutex<HashMap<String, Vec<RunRecord>>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(domain: &str, products: &[&str]) -> Self {
        let store = Self::new();
        store.snapshots.lock().unwrap().insert(
            domain.to_string(),
            products.iter().map(|p| p.to_string()).collect(),
        );
        store
    }

    pub fn snapshot(&self, domain: &str) -> Option<ProductSet> {
        self.snapshots.lock().unwrap().get(domain).cloned()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }
}

impl CheckpointStore for MemoryStore {
    fn load(&self, domain: &str) -> ProductSet {
        self.snapshot(domain).unwrap_or_default()
    }

    fn save(&self, domain: &str, products: &ProductSet) -> CheckpointResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(CheckpointError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        self.snapshots
            .lock()
            .unwrap()
            .insert(domain.to_string(), products.clone());
        Ok(())
    }

    fn clear(&self, domain: &str) -> CheckpointResult<()> {
        self.snapshots.lock().unwrap().remove(domain);
        self.runs.lock().unwrap().remove(domain);
        Ok(())
    }

    fn begin_run(&self, domain: &str, config_hash: &str) -> CheckpointResult<i64> {
        let mut runs = self.runs.lock().unwrap();
        let entries = runs.entry(domain.to_string()).or_default();
        let id = entries.len() as i64 + 1;
        entries.push(RunRecord {
            id,
            started_at: "start".to_string(),
            finished_at: None,
            config_hash: config_hash.to_string(),
            status: CrawlState::Running,
            pages_fetched: 0,
            fetch_errors: 0,
            products_found: 0,
            failure: None,
        });
        Ok(id)
    }

    fn finish_run(
        &self,
        domain: &str,
        run_id: i64,
        status: CrawlState,
        counters: RunCounters,
        failure: Option<&str>,
    ) -> CheckpointResult<()> {
        let mut runs = self.runs.lock().unwrap();
        let run = runs
            .get_mut(domain)
            .and_then(|entries| entries.iter_mut().find(|r| r.id == run_id))
            .ok_or(CheckpointError::RunNotFound(run_id))?;
        run.finished_at = Some("finish".to_string());
        run.status = status;
        run.pages_fetched = counters.pages_fetched;
        run.fetch_errors = counters.fetch_errors;
        run.products_found = counters.products_found;
        run.failure = failure.map(str::to_string);
        Ok(())
    }

    fn latest_run(&self, domain: &str) -> CheckpointResult<Option<RunRecord>> {
        Ok(self
            .runs
            .lock()
            .unwrap()
            .get(domain)
            .and_then(|entries| entries.last().cloned()))
    }
}
