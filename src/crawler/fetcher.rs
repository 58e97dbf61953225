//! Page fetching
//!
//! This module defines the page fetcher capability used by the dispatcher
//! and its default HTTP implementation:
//! - Building HTTP clients from the `[fetcher]` configuration
//! - GET requests with a bounded redirect policy
//! - Content-Type checks (only HTML is handed to the link extractor)
//! - Error classification into per-page and session failures

use crate::config::FetcherConfig;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum number of redirect hops followed for one page
const MAX_REDIRECTS: usize = 10;

/// Errors reported by a page fetcher
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The page could not be loaded; the item is dropped and the crawl goes on
    #[error("Failed to fetch {url}: {reason}")]
    Page { url: String, reason: String },

    /// The fetch backend itself is unusable; the domain crawl fails
    #[error("Fetch session is unusable: {0}")]
    Session(String),
}

impl FetchError {
    /// Creates a per-page error
    pub fn page(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Page {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error ends the whole domain crawl
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Session(_))
    }
}

/// Loads a URL and returns its rendered markup
///
/// Implementations may wait internally (settle delays, lazy-load
/// triggers) before returning. A fetch that never returns only holds up
/// its own task.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetcher configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use pdp_harvest::config::FetcherConfig;
/// use pdp_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Default page fetcher backed by a pooled reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    settle: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher from the `[fetcher]` configuration
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            settle: Duration::from_millis(config.settle_time_ms),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    /// Fetches a page
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx with HTML body | markup |
    /// | non-2xx status | `Page` error |
    /// | non-HTML Content-Type | `Page` error |
    /// | timeout, connect, redirect or body error | `Page` error |
    /// | request could not be built | `Session` error |
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => return Err(FetchError::Session(e.to_string())),
            Err(e) => {
                let reason = if e.is_timeout() {
                    "request timeout".to_string()
                } else if e.is_connect() {
                    "connection failed".to_string()
                } else if e.is_redirect() {
                    "too many redirects".to_string()
                } else {
                    e.to_string()
                };
                return Err(FetchError::page(url.as_str(), reason));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::page(
                url.as_str(),
                format!("HTTP {}", status.as_u16()),
            ));
        }

        // A missing header is given the benefit of the doubt
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_ascii_lowercase();

        if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
            return Err(FetchError::page(
                url.as_str(),
                format!("not HTML ({})", content_type),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::page(url.as_str(), e.to_string()))?;

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        Ok(body)
    }
}
