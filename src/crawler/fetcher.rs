//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - The `Fetcher` seam the crawl controller talks to
//! - Building HTTP clients with proper user agent strings
//! - robots.txt compliance through a per-origin cache
//! - Rejecting non-HTML responses
//! - Error classification (retryable or not)

use crate::config::{Config, UserAgentConfig};
use crate::robots::{fetch_robots, robots_origin, RobotsCache};
use crate::url::AllowedDomains;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

/// HTTP statuses worth another attempt
const RETRYABLE_STATUS: &[u16] = &[408, 429, 500, 502, 503, 504, 522, 524];

/// Redirect hops followed before a request fails
const MAX_REDIRECTS: usize = 10;

/// A successfully retrieved page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// HTTP status code of the final response
    pub status: u16,

    /// Decoded response body
    pub body: String,

    /// URL of the final response, after redirects
    pub final_url: Url,
}

/// Why a fetch produced no page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Not an HTML page (Content-Type: {0})")]
    ContentMismatch(String),

    #[error("Disallowed by robots.txt")]
    RobotsDenied,

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Redirected off-site to {0}")]
    OffsiteRedirect(String),
}

impl FetchError {
    /// Returns true if another attempt might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Connect(_) | FetchError::Body(_) => true,
            FetchError::Status(code) => RETRYABLE_STATUS.contains(code),
            _ => false,
        }
    }

    /// The HTTP status behind this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status(code) => Some(*code),
            _ => None,
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

/// Retrieves one page
///
/// Implementations perform a single attempt; retries, timeouts and politeness
/// are the caller's concern.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Whole-request timeout
/// * `allowed` - Hosts a redirect may lead to; a hop anywhere else is not followed
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use campus_crawler::config::UserAgentConfig;
/// use campus_crawler::crawler::build_http_client;
/// use campus_crawler::url::AllowedDomains;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "CampusCrawler".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: Some("https://example.edu/bot".to_string()),
///     contact_email: None,
/// };
///
/// let allowed = AllowedDomains::new(["example.edu"]);
/// let client = build_http_client(&config, Duration::from_secs(30), &allowed).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
    allowed: &AllowedDomains,
) -> Result<Client, reqwest::Error> {
    let allowed = allowed.clone();
    let redirects = Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if allowed.allows(attempt.url()) {
            attempt.follow()
        } else {
            // The 3xx response is returned to the caller unfollowed
            attempt.stop()
        }
    });

    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(redirects)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by a reqwest client
///
/// When robots compliance is enabled, robots.txt is fetched once per origin and
/// cached; disallowed URLs fail with `FetchError::RobotsDenied` without a request.
/// A page request right after a robots.txt download waits out the request delay.
pub struct HttpFetcher {
    client: Client,
    robots: Option<Mutex<RobotsCache>>,
    robots_agent: String,
    request_delay: Duration,
}

impl HttpFetcher {
    /// Builds a fetcher from the crawl configuration
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(config.crawler.request_timeout_secs);
        let allowed = AllowedDomains::new(&config.scope.allowed_domains);
        let client = build_http_client(&config.user_agent, timeout, &allowed)?;

        Ok(Self::with_client(
            client,
            config.user_agent.crawler_name.clone(),
            config.crawler.obey_robots,
        )
        .with_request_delay(Duration::from_millis(config.crawler.request_delay_ms)))
    }

    /// Wraps an existing client
    ///
    /// # Arguments
    ///
    /// * `client` - The HTTP client to use
    /// * `robots_agent` - Product token matched against robots.txt `User-agent` groups
    /// * `obey_robots` - Whether to consult robots.txt before each request
    pub fn with_client(client: Client, robots_agent: impl Into<String>, obey_robots: bool) -> Self {
        Self {
            client,
            robots: obey_robots.then(|| Mutex::new(RobotsCache::new())),
            robots_agent: robots_agent.into(),
            request_delay: Duration::ZERO,
        }
    }

    /// Spacing between a robots.txt download and the page request that follows it
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Checks robots.txt for `url`
    ///
    /// # Returns
    ///
    /// `(allowed, downloaded)` where `downloaded` is true if robots.txt was just
    /// requested from the host
    async fn robots_allows(&self, url: &Url) -> (bool, bool) {
        let Some(cache) = &self.robots else {
            return (true, false);
        };

        let origin = robots_origin(url);
        let mut cache = cache.lock().await;

        if let Some(entry) = cache.get(&origin) {
            return (entry.is_allowed(url.as_str(), &self.robots_agent), false);
        }

        let robots = fetch_robots(&self.client, url).await;
        let allowed = robots.is_allowed(url.as_str(), &self.robots_agent);
        cache.insert(origin, robots);
        (allowed, true)
    }
}

/// Absolute target of a redirect response that was not followed
fn redirect_target(response: &Response) -> String {
    response
        .headers()
        .get(LOCATION)
        .and_then(|location| location.to_str().ok())
        .and_then(|location| response.url().join(location).ok())
        .map(String::from)
        .unwrap_or_else(|| response.url().to_string())
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let (allowed, robots_downloaded) = self.robots_allows(url).await;
        if !allowed {
            return Err(FetchError::RobotsDenied);
        }
        if robots_downloaded && !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if status.is_redirection() {
            return Err(FetchError::OffsiteRedirect(redirect_target(&response)));
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
            let content_type = content_type.to_str().unwrap_or_default().to_lowercase();
            if !content_type.contains("html") {
                return Err(FetchError::ContentMismatch(content_type));
            }
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        Ok(FetchedPage {
            status: status.as_u16(),
            body,
            final_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: Some("https://example.edu/about".to_string()),
            contact_email: Some("admin@example.edu".to_string()),
        }
    }

    fn create_fetcher(obey_robots: bool) -> HttpFetcher {
        let allowed = AllowedDomains::new(["127.0.0.1"]);
        let client =
            build_http_client(&create_test_config(), Duration::from_secs(5), &allowed).unwrap();
        HttpFetcher::with_client(client, "TestCrawler", obey_robots)
    }

    fn html(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
    }

    #[test]
    fn test_build_http_client() {
        let allowed = AllowedDomains::new(["example.edu"]);
        let client = build_http_client(&create_test_config(), Duration::from_secs(30), &allowed);
        assert!(client.is_ok());
    }

    #[test]
    fn test_retryable_errors() {
        assert!(FetchError::Timeout.is_retryable());
        assert!(FetchError::Connect("refused".into()).is_retryable());
        assert!(FetchError::Body("reset".into()).is_retryable());
        assert!(FetchError::Status(503).is_retryable());
        assert!(FetchError::Status(429).is_retryable());

        assert!(!FetchError::Status(404).is_retryable());
        assert!(!FetchError::Status(403).is_retryable());
        assert!(!FetchError::RobotsDenied.is_retryable());
        assert!(!FetchError::ContentMismatch("application/pdf".into()).is_retryable());
        assert!(!FetchError::OffsiteRedirect("https://x.com/".into()).is_retryable());
    }

    #[test]
    fn test_error_status() {
        assert_eq!(FetchError::Status(500).status(), Some(500));
        assert_eq!(FetchError::Timeout.status(), None);
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/about/"))
            .respond_with(html("<html><body><h1>About</h1></body></html>"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/about/", server.uri())).unwrap();
        let page = create_fetcher(true).fetch(&url).await.unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.final_url, url);
        assert!(page.body.contains("<h1>About</h1>"));
    }

    #[tokio::test]
    async fn test_fetch_non_html_is_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/brochure.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/brochure.pdf", server.uri())).unwrap();
        let err = create_fetcher(false).fetch(&url).await.unwrap_err();

        assert!(matches!(err, FetchError::ContentMismatch(ct) if ct.contains("pdf")));
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let missing = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let err = create_fetcher(false).fetch(&missing).await.unwrap_err();
        assert_eq!(err, FetchError::Status(404));
        assert!(!err.is_retryable());

        let busy = Url::parse(&format!("{}/busy", server.uri())).unwrap();
        let err = create_fetcher(false).fetch(&busy).await.unwrap_err();
        assert_eq!(err, FetchError::Status(503));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_fetch_follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", format!("{}/new", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(html("<p>moved</p>"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/old", server.uri())).unwrap();
        let page = create_fetcher(false).fetch(&url).await.unwrap();

        assert_eq!(page.final_url.path(), "/new");
    }

    #[tokio::test]
    async fn test_offsite_redirect_not_followed() {
        let server = MockServer::start().await;
        let offsite = MockServer::start().await;
        let offsite_port = Url::parse(&offsite.uri()).unwrap().port().unwrap();

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(302).insert_header(
                "location",
                format!("http://localhost:{}/landing", offsite_port).as_str(),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(html("<p>elsewhere</p>"))
            .expect(0)
            .mount(&offsite)
            .await;

        let url = Url::parse(&format!("{}/", server.uri())).unwrap();
        let err = create_fetcher(false).fetch(&url).await.unwrap_err();

        assert_eq!(
            err,
            FetchError::OffsiteRedirect(format!("http://localhost:{}/landing", offsite_port))
        );
        assert!(!err.is_retryable());
        assert!(offsite.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_page_request_spaced_after_robots_download() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html("<p>home</p>"))
            .mount(&server)
            .await;

        let delay = Duration::from_millis(300);
        let fetcher = create_fetcher(true).with_request_delay(delay);
        let home = Url::parse(&format!("{}/", server.uri())).unwrap();

        let start = std::time::Instant::now();
        assert!(fetcher.fetch(&home).await.is_ok());
        assert!(start.elapsed() >= delay);

        // Cached robots.txt: no extra request, no extra wait
        let start = std::time::Instant::now();
        assert!(fetcher.fetch(&home).await.is_ok());
        assert!(start.elapsed() < delay);
    }

    #[tokio::test]
    async fn test_robots_denied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /admin"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html("<p>home</p>"))
            .mount(&server)
            .await;

        let fetcher = create_fetcher(true);

        let admin = Url::parse(&format!("{}/admin", server.uri())).unwrap();
        assert_eq!(fetcher.fetch(&admin).await.unwrap_err(), FetchError::RobotsDenied);

        let home = Url::parse(&format!("{}/", server.uri())).unwrap();
        assert!(fetcher.fetch(&home).await.is_ok());
    }

    #[tokio::test]
    async fn test_robots_ignored_when_disabled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html("<p>home</p>"))
            .mount(&server)
            .await;

        let home = Url::parse(&format!("{}/", server.uri())).unwrap();
        assert!(create_fetcher(false).fetch(&home).await.is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused_is_retryable() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let url = Url::parse(&format!("{}/", uri)).unwrap();
        let err = create_fetcher(false).fetch(&url).await.unwrap_err();

        assert!(err.is_retryable(), "unexpected error: {:?}", err);
    }
}
