use crate::section::SectionRule;
use serde::Deserialize;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub scope: ScopeConfig,
    pub output: OutputConfig,
    /// Ordered section rules; the built-in rule set is used when omitted
    #[serde(rename = "section-rules", default)]
    pub section_rules: Vec<SectionRule>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of link hops from a seed URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Minimum time between requests to the same host (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// How many times a retryable failure is retried before the URL is given up
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Backoff before the first retry, doubled on every further attempt (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Whether robots.txt rules are honored
    #[serde(rename = "obey-robots")]
    pub obey_robots: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            request_delay_ms: 1000,
            request_timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 1000,
            obey_robots: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the token matched against robots.txt groups
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email", default)]
    pub contact_email: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Name/Version (+ContactURL; ContactEmail)`, with the parenthesized
    /// part reduced to whatever contact details are configured.
    pub fn header_value(&self) -> String {
        let contact: Vec<String> = [
            self.contact_url.as_ref().map(|u| format!("+{}", u)),
            self.contact_email.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();

        if contact.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} ({})",
                self.crawler_name,
                self.crawler_version,
                contact.join("; ")
            )
        }
    }
}

/// Which hosts are crawled and where the crawl starts
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeConfig {
    /// Crawl entry points (depth 0)
    #[serde(rename = "seed-urls")]
    pub seed_urls: Vec<String>,

    /// Host patterns eligible for fetch and enqueue ("example.edu" or "*.example.edu")
    #[serde(rename = "allowed-domains")]
    pub allowed_domains: Vec<String>,
}

/// Serialization layout of the records file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    JsonLines,
    /// A single JSON array
    JsonArray,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the page records file
    #[serde(rename = "records-path")]
    pub records_path: String,

    /// Layout of the records file
    #[serde(default)]
    pub format: OutputFormat,

    /// Optional JSON Lines file receiving one entry per failed URL
    #[serde(rename = "failures-path", default)]
    pub failures_path: Option<String>,
}
