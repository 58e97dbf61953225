use crate::state::CrawlTarget;
use crate::url::{UrlClassifier, DEFAULT_PRODUCT_PATTERNS};
use crate::{ConfigError, ConfigResult};
use serde::Deserialize;

/// Main configuration structure for pdp-harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default, rename = "target")]
    pub targets: Vec<TargetEntry>,
}

/// Crawl traversal and concurrency configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum BFS depth from each root
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Number of domains crawled at the same time
    #[serde(default = "default_domain_concurrency")]
    pub domain_concurrency: usize,

    /// Number of pages fetched at the same time within one domain
    #[serde(default = "default_page_concurrency")]
    pub page_concurrency: usize,
}

/// Page fetcher configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetcherConfig {
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Delay after each successful page load (milliseconds)
    #[serde(default)]
    pub settle_time_ms: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory holding one checkpoint database per domain
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: String,

    /// Path of the final CSV report
    #[serde(default = "default_report_path")]
    pub report_path: String,
}

/// Product URL rules
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClassifierConfig {
    #[serde(default = "default_product_patterns")]
    pub product_patterns: Vec<PatternEntry>,
}

/// One product URL rule as written in the config file
///
/// A bare string is a regular expression; tables select the rule kind explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PatternEntry {
    Plain(String),
    Literal { literal: String },
    Regex { regex: String },
}

/// A site to crawl
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TargetEntry {
    /// Seed URL, usually the home page
    pub root: String,

    /// Overrides `crawler.max-depth` for this target
    #[serde(default)]
    pub max_depth: Option<u32>,
}

fn default_max_depth() -> u32 {
    3
}

fn default_domain_concurrency() -> usize {
    4
}

fn default_page_concurrency() -> usize {
    8
}

fn default_user_agent() -> String {
    format!("pdp-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_checkpoint_dir() -> String {
    "./data/checkpoints".to_string()
}

fn default_report_path() -> String {
    "./data/output/product_urls.csv".to_string()
}

fn default_product_patterns() -> Vec<PatternEntry> {
    DEFAULT_PRODUCT_PATTERNS
        .iter()
        .map(|p| PatternEntry::Plain(p.to_string()))
        .collect()
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            domain_concurrency: default_domain_concurrency(),
            page_concurrency: default_page_concurrency(),
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            settle_time_ms: 0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: default_checkpoint_dir(),
            report_path: default_report_path(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            product_patterns: default_product_patterns(),
        }
    }
}

impl TargetEntry {
    /// Effective depth limit for this target
    pub fn depth_limit(&self, crawler: &CrawlerConfig) -> u32 {
        self.max_depth.unwrap_or(crawler.max_depth)
    }
}

impl Config {
    /// Builds the crawl targets in configuration order
    pub fn crawl_targets(&self) -> ConfigResult<Vec<CrawlTarget>> {
        self.targets
            .iter()
            .map(|entry| {
                CrawlTarget::new(&entry.root, entry.depth_limit(&self.crawler)).map_err(|e| {
                    ConfigError::InvalidUrl(format!("Invalid target root '{}': {}", entry.root, e))
                })
            })
            .collect()
    }

    /// Compiles the configured product rules
    pub fn url_classifier(&self) -> ConfigResult<UrlClassifier> {
        UrlClassifier::from_entries(&self.classifier.product_patterns)
    }
}
