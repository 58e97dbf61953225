use crate::config::types::{Config, CrawlerConfig, FetcherConfig, OutputConfig};
use crate::ConfigError;
use std::collections::HashSet;

const MAX_DOMAIN_CONCURRENCY: usize = 64;
const MAX_PAGE_CONCURRENCY: usize = 256;
const MAX_TIMEOUT_SECS: u64 = 600;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_output_config(&config.output)?;
    validate_targets(config)?;
    config.url_classifier()?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.domain_concurrency < 1 || config.domain_concurrency > MAX_DOMAIN_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "domain_concurrency must be between 1 and {}, got {}",
            MAX_DOMAIN_CONCURRENCY, config.domain_concurrency
        )));
    }

    if config.page_concurrency < 1 || config.page_concurrency > MAX_PAGE_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "page_concurrency must be between 1 and {}, got {}",
            MAX_PAGE_CONCURRENCY, config.page_concurrency
        )));
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 || config.timeout_secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and {}, got {}",
            MAX_TIMEOUT_SECS, config.timeout_secs
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.checkpoint_dir.is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint_dir cannot be empty".to_string(),
        ));
    }

    if config.report_path.is_empty() {
        return Err(ConfigError::Validation(
            "report_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates target entries
///
/// Two targets with the same domain key would write the same checkpoint
/// file concurrently, so duplicates are rejected.
fn validate_targets(config: &Config) -> Result<(), ConfigError> {
    if config.targets.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[target]] is required".to_string(),
        ));
    }

    let targets = config.crawl_targets()?;
    let mut seen = HashSet::new();
    for target in &targets {
        if !seen.insert(target.domain_key()) {
            return Err(ConfigError::Validation(format!(
                "domain '{}' is listed more than once",
                target.domain_key()
            )));
        }
    }

    Ok(())
}
