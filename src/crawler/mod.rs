//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `Fetcher` trait
//! - Frontier, visited set and politeness scheduling
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod scheduler;

pub use coordinator::Crawler;
pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher, HttpFetcher};
pub use scheduler::{FrontierEntry, Scheduler};

use crate::config::Config;
use crate::output::{CrawlStatistics, JsonOutput};
use crate::Result;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP fetcher
/// 2. Open the configured output files
/// 3. Crawl breadth-first from the seeds
/// 4. Stream records and failures to the output
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Crawl completed successfully
/// * `Err(CrawlerError)` - Crawl could not start or output failed
pub async fn crawl(config: Config) -> Result<CrawlStatistics> {
    let fetcher = HttpFetcher::new(&config)?;
    let mut output = JsonOutput::from_config(&config.output)?;
    Crawler::new(config, fetcher).run(&mut output).await
}
