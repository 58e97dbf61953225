//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl cycle end-to-end: HTTP fetcher, HTML extractor, SQLite checkpoints
//! and the CSV report.

use pdp_harvest::checkpoint::{open_store, CheckpointStore};
use pdp_harvest::config::{parse_config, Config};
use pdp_harvest::crawler::crawl;
use pdp_harvest::output::{read_report, write_report, ReportRow};
use pdp_harvest::state::{CrawlState, ProductSet};
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the given roots
fn create_test_config(roots: &[String], dir: &Path, max_depth: u32) -> Config {
    let mut toml = format!(
        r#"
[crawler]
max-depth = {max_depth}
domain-concurrency = 2
page-concurrency = 4

[fetcher]
user-agent = "TestHarvester/1.0"
timeout-secs = 5

[output]
checkpoint-dir = '{}'
report-path = '{}'

[classifier]
product-patterns = [{{ literal = "/p/" }}]
"#,
        dir.join("checkpoints").display(),
        dir.join("output").join("product_urls.csv").display(),
    );

    for root in roots {
        toml.push_str(&format!("\n[[target]]\nroot = \"{}\"\n", root));
    }

    parse_config(&toml).expect("test config should be valid")
}

/// Mounts an HTML page whose anchors point at `hrefs`
async fn mount_page(server: &MockServer, page: &str, hrefs: &[String]) {
    let body: String = hrefs
        .iter()
        .map(|href| format!("<a href=\"{}\">link</a>\n", href))
        .collect();

    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!("<html><body>{}</body></html>", body),
            "text/html",
        ))
        .mount(server)
        .await;
}

fn hrefs(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn root_of(server: &MockServer) -> String {
    format!("{}/", server.uri())
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        &hrefs(&[
            "/p/1",
            "/c/shoes",
            "/about",
            "https://elsewhere.invalid/page",
            "mailto:help@shop.example",
        ]),
    )
    .await;
    mount_page(&server, "/c/shoes", &hrefs(&["/p/2", "/p/1", "/c/shoes/page-2"])).await;
    mount_page(&server, "/c/shoes/page-2", &hrefs(&["/p/3"])).await;
    // /about is not mounted and answers 404

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&[root_of(&server)], dir.path(), 2);

    let report = crawl(&config, "hash", false, &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.all_completed());
    let result = &report.results[0];
    assert_eq!(result.domain_key, "127.0.0.1");
    assert_eq!(result.stats.fetch_errors, 1);
    assert_eq!(result.stats.pages_fetched, 3);

    let urls: Vec<&str> = report.rows.iter().map(|r| r.product_url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/p/1", base),
            format!("{}/p/2", base),
            format!("{}/p/3", base),
        ]
    );

    let report_path = Path::new(&config.output.report_path);
    write_report(report_path, &report.rows).unwrap();
    let rows = read_report(report_path).unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.domain == "127.0.0.1"));
}

#[tokio::test]
async fn test_depth_limit_stops_traversal() {
    let server = MockServer::start().await;

    mount_page(&server, "/", &hrefs(&["/c/1"])).await;
    mount_page(&server, "/c/1", &hrefs(&["/c/2", "/p/1"])).await;
    mount_page(&server, "/c/2", &hrefs(&["/p/2"])).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&[root_of(&server)], dir.path(), 1);

    let report = crawl(&config, "hash", false, &CancellationToken::new())
        .await
        .unwrap();

    // /c/2 sits at depth 2 and is never fetched
    assert_eq!(report.rows.len(), 1);
    assert!(report.rows[0].product_url.ends_with("/p/1"));
    assert_eq!(report.results[0].stats.pages_fetched, 2);
}

#[tokio::test]
async fn test_checkpoint_written_and_run_recorded() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &hrefs(&["/p/1", "/p/2"])).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&[root_of(&server)], dir.path(), 2);

    crawl(&config, "config-hash", false, &CancellationToken::new())
        .await
        .unwrap();

    let store = open_store(Path::new(&config.output.checkpoint_dir)).unwrap();
    assert!(store.path_for("127.0.0.1").exists());
    assert_eq!(store.load("127.0.0.1").len(), 2);

    let run = store.latest_run("127.0.0.1").unwrap().unwrap();
    assert_eq!(run.status, CrawlState::Completed);
    assert_eq!(run.config_hash, "config-hash");
    assert_eq!(run.products_found, 2);
    assert_eq!(run.pages_fetched, 1);
}

#[tokio::test]
async fn test_resume_keeps_checkpointed_products() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", &hrefs(&["/p/1"])).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&[root_of(&server)], dir.path(), 2);

    // A previous run found /p/9, which the site no longer links to
    let store = open_store(Path::new(&config.output.checkpoint_dir)).unwrap();
    let previous: ProductSet = [format!("{}/p/9", base)].into_iter().collect();
    store.save("127.0.0.1", &previous).unwrap();

    let report = crawl(&config, "hash", false, &CancellationToken::new())
        .await
        .unwrap();

    let result = &report.results[0];
    assert_eq!(result.stats.resumed_products, 1);
    assert!(result.products.contains(&format!("{}/p/9", base)));
    assert!(result.products.contains(&format!("{}/p/1", base)));
    assert_eq!(report.rows.len(), 2);
}

#[tokio::test]
async fn test_fresh_discards_checkpoint() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", &hrefs(&["/p/1"])).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&[root_of(&server)], dir.path(), 2);

    let store = open_store(Path::new(&config.output.checkpoint_dir)).unwrap();
    let previous: ProductSet = [format!("{}/p/9", base)].into_iter().collect();
    store.save("127.0.0.1", &previous).unwrap();

    let report = crawl(&config, "hash", true, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        report.rows,
        vec![ReportRow {
            domain: "127.0.0.1".to_string(),
            product_url: format!("{}/p/1", base),
        }]
    );
    assert_eq!(report.results[0].stats.resumed_products, 0);
}

#[tokio::test]
async fn test_unreachable_root_completes_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&[root_of(&server)], dir.path(), 2);

    let report = crawl(&config, "hash", false, &CancellationToken::new())
        .await
        .unwrap();

    // A per-page error is not a domain failure
    assert_eq!(report.results[0].state, CrawlState::Completed);
    assert_eq!(report.results[0].stats.fetch_errors, 1);
    assert!(report.rows.is_empty());
}

#[tokio::test]
async fn test_two_domains_dedup_globally() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    // The second server is addressed by name so it gets its own domain key
    let second_port = url::Url::parse(&second.uri()).unwrap().port().unwrap();
    let second_root = format!("http://localhost:{}/", second_port);
    let shared = format!("http://localhost:{}/p/7", second_port);

    mount_page(&first, "/", &[String::from("/p/1"), shared.clone()]).await;
    mount_page(&second, "/", &hrefs(&["/p/7", "/p/8"])).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&[root_of(&first), second_root], dir.path(), 2);

    let report = crawl(&config, "hash", false, &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.all_completed());
    assert_eq!(report.results[0].domain_key, "127.0.0.1");
    assert_eq!(report.results[1].domain_key, "localhost");

    let shared_rows: Vec<&ReportRow> = report
        .rows
        .iter()
        .filter(|r| r.product_url == shared)
        .collect();
    assert_eq!(shared_rows.len(), 1);
    assert_eq!(shared_rows[0].domain, "localhost");
    assert_eq!(report.rows.len(), 3);
}

#[tokio::test]
async fn test_cancelled_crawl_reports_interrupted() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &hrefs(&["/p/1"])).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&[root_of(&server)], dir.path(), 2);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = crawl(&config, "hash", false, &cancel).await.unwrap();

    assert!(report.interrupted());
    assert!(report.rows.is_empty());

    let store = open_store(Path::new(&config.output.checkpoint_dir)).unwrap();
    let run = store.latest_run("127.0.0.1").unwrap().unwrap();
    assert_eq!(run.status, CrawlState::Interrupted);
}
