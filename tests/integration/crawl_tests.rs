//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use campus_crawler::config::{
    Config, CrawlerConfig, OutputConfig, OutputFormat, ScopeConfig, UserAgentConfig,
};
use campus_crawler::crawler::crawl;
use campus_crawler::output::JsonOutput;
use campus_crawler::{CrawlState, Crawler, FailureRecord, HttpFetcher, PageRecord};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the mock server
fn create_test_config(base_url: &str, dir: &Path, max_depth: u32) -> Config {
    let host = url::Url::parse(base_url)
        .expect("Failed to parse base URL")
        .host_str()
        .expect("Failed to extract host")
        .to_string();

    Config {
        crawler: CrawlerConfig {
            max_depth,
            request_delay_ms: 10, // Very short for testing
            request_timeout_secs: 5,
            max_retries: 0,
            retry_backoff_ms: 10,
            obey_robots: true,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: Some("https://example.edu/bot".to_string()),
            contact_email: Some("test@example.edu".to_string()),
        },
        scope: ScopeConfig {
            seed_urls: vec![format!("{}/", base_url)],
            allowed_domains: vec![host],
        },
        output: OutputConfig {
            records_path: dir.join("pages.jsonl").display().to_string(),
            format: OutputFormat::JsonLines,
            failures_path: Some(dir.join("failures.jsonl").display().to_string()),
        },
        section_rules: vec![],
    }
}

fn html_page(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(body))
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, content: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(content))
        .mount(server)
        .await;
}

/// Runs a crawl with the HTTP fetcher and JSON output from `config`
async fn run_crawl(config: Config) -> (Vec<PageRecord>, Vec<FailureRecord>) {
    let records_path = config.output.records_path.clone();
    let failures_path = config.output.failures_path.clone().unwrap();

    let fetcher = HttpFetcher::new(&config).expect("Failed to build fetcher");
    let mut output = JsonOutput::from_config(&config.output).expect("Failed to open output");
    let mut crawler = Crawler::new(config, fetcher);

    crawler.run(&mut output).await.expect("Crawl failed");
    assert_eq!(crawler.state(), CrawlState::Done);

    (read_lines(&records_path), read_lines(&failures_path))
}

fn read_lines<T: serde::de::DeserializeOwned>(path: &str) -> Vec<T> {
    std::fs::read_to_string(path)
        .expect("Failed to read output file")
        .lines()
        .map(|line| serde_json::from_str(line).expect("Invalid JSON line"))
        .collect()
}

fn paths(records: &[PageRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| url::Url::parse(&r.url).unwrap().path().to_string())
        .collect()
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();

    mount_robots(&server, "User-agent: *\nAllow: /").await;

    mount_page(
        &server,
        "/",
        format!(
            r#"<html><head><title>Home</title></head><body>
            <nav><a href="/programs/">Programs</a></nav>
            <main><p>Welcome to campus</p>
            <a href="{}/admissions/apply">Apply</a>
            <a href="about">About</a></main>
            </body></html>"#,
            base_url
        ),
    )
    .await;

    mount_page(
        &server,
        "/programs/",
        r#"<html><head><title>Programs | X</title></head><body>
        <header><h1>Site Banner</h1></header>
        <nav>Menu</nav>
        <main><p>Nursing   and
        Engineering</p></main>
        <footer>Contact us</footer>
        </body></html>"#
            .to_string(),
    )
    .await;

    mount_page(
        &server,
        "/admissions/apply",
        r#"<html><body><article><h1>Apply Now</h1><p>Deadlines</p></article></body></html>"#
            .to_string(),
    )
    .await;

    mount_page(
        &server,
        "/about",
        r#"<html><body><div id="content">About the college</div></body></html>"#.to_string(),
    )
    .await;

    let config = create_test_config(&base_url, dir.path(), 3);
    let (records, failures) = run_crawl(config).await;

    assert!(failures.is_empty(), "unexpected failures: {:?}", failures);
    assert_eq!(
        paths(&records),
        vec!["/", "/programs/", "/admissions/apply", "/about"]
    );

    let home = &records[0];
    assert_eq!(home.page_title, "Home");
    assert_eq!(home.section, "general");
    assert!(home.content.starts_with("Welcome to campus"));
    assert!(!home.content.contains("Programs"));

    let programs = &records[1];
    // h1 wins over title even when it sits in a stripped header
    assert_eq!(programs.page_title, "Site Banner");
    assert_eq!(programs.content, "Nursing and Engineering");
    assert_eq!(programs.section, "programs");

    let apply = &records[2];
    assert_eq!(apply.page_title, "Apply Now");
    assert_eq!(apply.content, "Apply Now Deadlines");
    assert_eq!(apply.section, "admissions");

    let about = &records[3];
    assert_eq!(about.page_title, about.url);
    assert_eq!(about.content, "About the college");
}

#[tokio::test]
async fn test_crawl_respects_robots_txt() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();

    mount_robots(&server, "User-agent: *\nDisallow: /private").await;

    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/private/records">Private</a><a href="/public">Public</a></body></html>"#
            .to_string(),
    )
    .await;

    mount_page(&server, "/public", "<html><body>Public page</body></html>".to_string()).await;

    Mock::given(method("GET"))
        .and(path("/private/records"))
        .respond_with(html_page("<html><body>Secret</body></html>".to_string()))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&base_url, dir.path(), 3);
    let (records, failures) = run_crawl(config).await;

    assert_eq!(paths(&records), vec!["/", "/public"]);
    assert_eq!(failures.len(), 1);
    assert!(failures[0].url.ends_with("/private/records"));
    assert!(failures[0].reason.contains("robots.txt"));
}

#[tokio::test]
async fn test_robots_ignored_when_disabled() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();

    mount_robots(&server, "User-agent: *\nDisallow: /").await;
    mount_page(&server, "/", "<html><body>Home</body></html>".to_string()).await;

    let mut config = create_test_config(&base_url, dir.path(), 3);
    config.crawler.obey_robots = false;
    let (records, _) = run_crawl(config).await;

    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_non_html_and_missing_pages_are_skipped() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        r#"<html><body>
        <a href="/brochure.pdf">Brochure</a>
        <a href="/missing">Missing</a>
        <a href="/services/">Services</a>
        </body></html>"#
            .to_string(),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/brochure.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
        .mount(&server)
        .await;

    mount_page(&server, "/services/", "<html><body>Help desk</body></html>".to_string()).await;

    // No robots.txt and no /missing mock: wiremock answers 404 for both
    let config = create_test_config(&base_url, dir.path(), 3);
    let (records, failures) = run_crawl(config).await;

    assert_eq!(paths(&records), vec!["/", "/services/"]);
    assert_eq!(records[1].section, "services");

    assert_eq!(failures.len(), 2);
    let pdf = failures.iter().find(|f| f.url.ends_with(".pdf")).unwrap();
    assert!(pdf.reason.contains("application/pdf"));
    assert_eq!(pdf.status, None);

    let missing = failures.iter().find(|f| f.url.ends_with("/missing")).unwrap();
    assert_eq!(missing.status, Some(404));
}

#[tokio::test]
async fn test_depth_and_domain_limits() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let port = url::Url::parse(&base_url).unwrap().port().unwrap();
    let dir = TempDir::new().unwrap();

    // Same server under a host name that is not on the allow-list
    mount_page(
        &server,
        "/",
        format!(
            r#"<html><body><a href="/level1">Next</a><a href="http://localhost:{}/offsite">Away</a></body></html>"#,
            port
        ),
    )
    .await;

    mount_page(
        &server,
        "/level1",
        r#"<html><body><a href="/level2">Deeper</a></body></html>"#.to_string(),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/level2"))
        .respond_with(html_page("<html><body>Too deep</body></html>".to_string()))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/offsite"))
        .respond_with(html_page("<html><body>Elsewhere</body></html>".to_string()))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&base_url, dir.path(), 1);
    let fetcher = HttpFetcher::new(&config).unwrap();
    let mut crawler = Crawler::new(config, fetcher);
    let mut records: Vec<PageRecord> = Vec::new();
    let stats = crawler.run(&mut records).await.unwrap();

    assert_eq!(paths(&records), vec!["/", "/level1"]);
    assert_eq!(stats.offsite_links_dropped, 1);
    assert_eq!(stats.depth_limited_links, 1);
}

#[tokio::test]
async fn test_crawl_writes_json_array() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/student-life/clubs">Clubs</a></body></html>"#.to_string(),
    )
    .await;
    mount_page(
        &server,
        "/student-life/clubs",
        "<html><head><title>Clubs</title></head><body>Chess</body></html>".to_string(),
    )
    .await;

    let mut config = create_test_config(&base_url, dir.path(), 3);
    config.output.format = OutputFormat::JsonArray;
    config.output.failures_path = None;
    let records_path = config.output.records_path.clone();

    let stats = crawl(config).await.unwrap();
    assert_eq!(stats.pages_emitted, 2);

    let text = std::fs::read_to_string(records_path).unwrap();
    let records: Vec<PageRecord> = serde_json::from_str(&text).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].section, "student-life");
    assert_eq!(records[1].page_title, "Clubs");

    // Timestamps carry an explicit UTC offset
    let raw: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(raw[0]["crawl_timestamp"]
        .as_str()
        .unwrap()
        .ends_with("+00:00"));
}

#[tokio::test]
async fn test_offsite_redirect_is_never_requested() {
    let server = MockServer::start().await;
    let offsite = MockServer::start().await;
    let offsite_port = url::Url::parse(&offsite.uri()).unwrap().port().unwrap();
    let dir = TempDir::new().unwrap();
    let landing = format!("http://localhost:{}/landing", offsite_port);

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", landing.as_str()))
        .mount(&server)
        .await;

    // Allow-list is 127.0.0.1 only, so "localhost" is off-site
    Mock::given(method("GET"))
        .respond_with(html_page("<html><body>Elsewhere</body></html>".to_string()))
        .expect(0)
        .mount(&offsite)
        .await;

    let config = create_test_config(&server.uri(), dir.path(), 3);
    assert_eq!(config.scope.allowed_domains, vec!["127.0.0.1".to_string()]);
    let (records, failures) = run_crawl(config).await;

    assert!(records.is_empty());
    assert_eq!(failures.len(), 1);
    assert!(failures[0].reason.contains("off-site"));
    assert!(failures[0].reason.contains(&landing));
    assert!(offsite.received_requests().await.unwrap().is_empty());
}
