//! pdp-harvest main entry point
//!
//! This is the command-line interface for the pdp-harvest product-page crawler.

use anyhow::{bail, Context};
use clap::Parser;
use pdp_harvest::checkpoint::open_store;
use pdp_harvest::config::{load_config_with_hash, Config};
use pdp_harvest::crawler::crawl;
use pdp_harvest::output::{load_statistics, print_statistics, print_summary, write_report};
use pdp_harvest::state::CrawlState;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// pdp-harvest: product-page discovery for e-commerce sites
///
/// pdp-harvest walks each configured shop breadth-first from its home page,
/// records every URL that looks like a product detail page, checkpoints
/// progress per domain, and writes one deduplicated CSV of product URLs.
#[derive(Parser, Debug)]
#[command(name = "pdp-harvest")]
#[command(version)]
#[command(about = "Discover product-detail-page URLs on e-commerce sites", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Discard existing checkpoints and crawl every domain from scratch
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["fresh", "stats"])]
    dry_run: bool,

    /// Show stored progress per domain and exit
    #[arg(long, conflicts_with_all = ["fresh", "dry_run"])]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(&config, &config_hash, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pdp_harvest=info,warn"),
            1 => EnvFilter::new("pdp_harvest=debug,info"),
            2 => EnvFilter::new("pdp_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let targets = config.crawl_targets()?;
    let classifier = config.url_classifier()?;

    println!("=== pdp-harvest Dry Run ===\n");

    println!("Crawler:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Domains in parallel: {}", config.crawler.domain_concurrency);
    println!("  Pages in parallel per domain: {}", config.crawler.page_concurrency);

    println!("\nFetcher:");
    println!("  User agent: {}", config.fetcher.user_agent);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  Settle time: {}ms", config.fetcher.settle_time_ms);

    println!("\nOutput:");
    println!("  Checkpoints: {}", config.output.checkpoint_dir);
    println!("  Report: {}", config.output.report_path);

    println!("\nProduct patterns: {} rules", classifier.rule_count());

    println!("\nTargets ({}):", targets.len());
    for target in &targets {
        println!(
            "  - {} (depth {}, root {})",
            target.domain_key(),
            target.max_depth(),
            target.root_url()
        );
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --stats mode: shows stored progress per domain
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Checkpoints: {}\n", config.output.checkpoint_dir);

    let store = open_store(Path::new(&config.output.checkpoint_dir))?;
    let stats = load_statistics(&store, &config.crawl_targets()?)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring existing checkpoints)");
    } else {
        tracing::info!("Starting crawl (resuming from checkpoints where present)");
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, saving checkpoints and stopping");
            on_signal.cancel();
        }
    });

    let report = crawl(config, config_hash, fresh, &cancel).await?;

    if report.interrupted() {
        print_summary(&report);
        bail!("crawl interrupted; checkpoints saved, report not written");
    }

    write_report(Path::new(&config.output.report_path), &report.rows)
        .with_context(|| format!("failed to write {}", config.output.report_path))?;
    print_summary(&report);
    println!("Report: {}", config.output.report_path);

    let failed = report
        .results
        .iter()
        .filter(|r| r.state == CrawlState::Failed)
        .count();
    if failed > 0 {
        bail!("{} of {} domains failed", failed, report.results.len());
    }

    Ok(())
}
