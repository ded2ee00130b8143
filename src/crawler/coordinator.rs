//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding the frontier and tracking the crawl lifecycle
//! - Politeness, timeouts and retries around each fetch
//! - Parsing, record building and link filtering
//! - Cooperative stop via a cancellation token

use crate::config::{validate, Config};
use crate::crawler::fetcher::{FetchError, FetchedPage, Fetcher};
use crate::crawler::scheduler::{FrontierEntry, Scheduler};
use crate::extract::parse_page;
use crate::output::{CrawlStatistics, FailureRecord, OutputHandler, PageRecord};
use crate::section::SectionClassifier;
use crate::state::CrawlState;
use crate::url::{extract_domain, normalize_url, AllowedDomains};
use crate::{CrawlerError, Result};
use chrono::Utc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// How many records between progress log lines
const PROGRESS_INTERVAL: u64 = 10;

/// Result of fetching one URL with retries
enum FetchOutcome {
    Page { page: FetchedPage, attempts: u32 },
    Failed { error: FetchError, attempts: u32 },
    Cancelled,
}

/// Breadth-first crawl controller
///
/// Drives the fetch, parse, emit, enqueue loop over a single-worker frontier.
/// Records are pulled one at a time with [`Crawler::next_record`], or drained
/// into an [`OutputHandler`] with [`Crawler::run`].
///
/// # Example
///
/// ```no_run
/// use campus_crawler::config::load_config;
/// use campus_crawler::{Crawler, HttpFetcher};
/// use std::path::Path;
///
/// # async fn demo() -> campus_crawler::Result<()> {
/// let config = load_config(Path::new("crawler.toml"))?;
/// let fetcher = HttpFetcher::new(&config)?;
/// let mut crawler = Crawler::new(config, fetcher);
///
/// crawler.start()?;
/// while let Some(record) = crawler.next_record().await {
///     println!("{} [{}]", record.url, record.section);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Crawler<F: Fetcher> {
    config: Config,
    fetcher: F,
    classifier: SectionClassifier,
    allowed: AllowedDomains,
    scheduler: Scheduler,
    state: CrawlState,
    stop: CancellationToken,
    stats: CrawlStatistics,
    failures: Vec<FailureRecord>,
    started_at: Option<Instant>,
}

impl<F: Fetcher> Crawler<F> {
    /// Creates an idle crawler
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fetcher` - Retrieves pages on the crawler's behalf
    pub fn new(config: Config, fetcher: F) -> Self {
        let classifier = SectionClassifier::from_rules_or_default(&config.section_rules);
        let allowed = AllowedDomains::new(&config.scope.allowed_domains);
        let scheduler = Scheduler::new(Duration::from_millis(config.crawler.request_delay_ms));

        Self {
            config,
            fetcher,
            classifier,
            allowed,
            scheduler,
            state: CrawlState::Idle,
            stop: CancellationToken::new(),
            stats: CrawlStatistics::default(),
            failures: Vec::new(),
            started_at: None,
        }
    }

    /// Validates the configuration and seeds the frontier
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The crawler is running
    /// * `Err(CrawlerError)` - Invalid configuration (the crawler stays idle) or
    ///   the crawler was already started
    pub fn start(&mut self) -> Result<()> {
        self.check_transition(CrawlState::Running)?;
        validate(&self.config)?;

        let seeds = self
            .config
            .scope
            .seed_urls
            .iter()
            .map(|seed| normalize_url(seed))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        self.scheduler = Scheduler::new(Duration::from_millis(self.config.crawler.request_delay_ms));
        for seed in seeds {
            self.scheduler.enqueue(seed, 0);
        }

        self.state = CrawlState::Running;
        self.started_at = Some(Instant::now());

        tracing::info!(
            "Starting crawl: {} seeds, max depth {}, {}ms between requests per host",
            self.scheduler.frontier_size(),
            self.config.crawler.max_depth,
            self.config.crawler.request_delay_ms
        );

        Ok(())
    }

    /// Advances the crawl until the next record is produced
    ///
    /// Returns `None` once the crawl is done (frontier exhausted or stop
    /// requested), and also when the crawler has not been started.
    pub async fn next_record(&mut self) -> Option<PageRecord> {
        while self.state == CrawlState::Running {
            if self.stop.is_cancelled() {
                tracing::info!(
                    "Stop requested, {} URLs left in frontier",
                    self.scheduler.frontier_size()
                );
                self.finish_crawl();
                break;
            }

            let Some(entry) = self.scheduler.pop() else {
                tracing::info!("Frontier is empty, crawl complete");
                self.finish_crawl();
                break;
            };

            if self.scheduler.is_fetched(&entry.url) {
                tracing::debug!("Skipping already fetched URL: {}", entry.url);
                continue;
            }

            if let Some(record) = self.process_entry(entry).await {
                return Some(record);
            }
        }

        None
    }

    /// Runs the whole crawl into `sink`
    ///
    /// Starts the crawler, writes every record and failure as it is produced,
    /// then finishes the sink.
    pub async fn run(&mut self, sink: &mut impl OutputHandler) -> Result<CrawlStatistics> {
        self.start()?;

        while let Some(record) = self.next_record().await {
            sink.write_page(&record)?;
            self.drain_failures(sink)?;
        }
        self.drain_failures(sink)?;
        sink.finish()?;

        let stats = self.statistics();
        tracing::info!(
            "Crawl completed: {} pages extracted, {} failed in {:?}",
            stats.pages_emitted,
            stats.pages_failed,
            stats.elapsed
        );

        Ok(stats)
    }

    fn drain_failures(&mut self, sink: &mut impl OutputHandler) -> Result<()> {
        for failure in self.take_failures() {
            sink.write_failure(&failure)?;
        }
        Ok(())
    }

    /// Fetches, parses and emits one frontier entry
    async fn process_entry(&mut self, entry: FrontierEntry) -> Option<PageRecord> {
        let FrontierEntry { url, depth } = entry;
        tracing::debug!("Processing URL: {} (depth {})", url, depth);

        let (page, attempts) = match self.fetch_with_retry(&url).await {
            FetchOutcome::Page { page, attempts } => (page, attempts),
            FetchOutcome::Failed { error, attempts } => {
                self.scheduler.mark_fetched(&url);
                self.record_failure(&url, &error, attempts);
                return None;
            }
            FetchOutcome::Cancelled => return None,
        };

        self.scheduler.mark_fetched(&url);
        let final_url = page.final_url;

        if final_url != url {
            if !self.allowed.allows(&final_url) {
                let error = FetchError::OffsiteRedirect(final_url.to_string());
                self.record_failure(&url, &error, attempts);
                return None;
            }

            if self.scheduler.is_fetched(&final_url) {
                tracing::debug!("{} redirected to already fetched {}", url, final_url);
                self.stats.duplicates_skipped += 1;
                return None;
            }

            tracing::debug!("{} redirected to {}", url, final_url);
            self.scheduler.mark_fetched(&final_url);
        }

        let parsed = parse_page(&page.body, &final_url);
        let section = self.classifier.classify(final_url.as_str()).to_string();

        let record = PageRecord::new(
            final_url.as_str(),
            parsed.title,
            parsed.content,
            section,
            Utc::now(),
        );

        self.enqueue_links(parsed.links, depth);
        self.stats.record_page(&record.section);

        if self.stats.pages_emitted % PROGRESS_INTERVAL == 0 {
            let elapsed = self.elapsed();
            tracing::info!(
                "Progress: {} pages extracted, {} in frontier, {:.2} pages/sec",
                self.stats.pages_emitted,
                self.scheduler.frontier_size(),
                self.stats.pages_emitted as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
            );
        }

        Some(record)
    }

    /// Filters extracted links and pushes the survivors onto the frontier
    fn enqueue_links(&mut self, links: Vec<Url>, depth: u32) {
        let next_depth = depth + 1;

        for link in links {
            let canonical = match normalize_url(link.as_str()) {
                Ok(canonical) => canonical,
                Err(e) => {
                    tracing::trace!("Dropping link {}: {}", link, e);
                    continue;
                }
            };

            if !self.allowed.allows(&canonical) {
                tracing::trace!("Dropping off-site link {}", link);
                self.stats.offsite_links_dropped += 1;
                continue;
            }

            if next_depth > self.config.crawler.max_depth {
                tracing::trace!("Dropping link beyond max depth: {}", link);
                self.stats.depth_limited_links += 1;
                continue;
            }

            if !self.scheduler.enqueue(link, next_depth) {
                self.stats.duplicates_skipped += 1;
            }
        }
    }

    /// Fetches `url` under the politeness delay, the request timeout and the
    /// retry policy
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Timeout, connection or body error | Retry |
    /// | HTTP 408, 429, 500, 502, 503, 504, 522, 524 | Retry |
    /// | Any other failure | Give up |
    ///
    /// Retries are capped at `max_retries`; the wait doubles from `retry_backoff_ms`.
    async fn fetch_with_retry(&mut self, url: &Url) -> FetchOutcome {
        let host = extract_domain(url).unwrap_or_default();
        let timeout = Duration::from_secs(self.config.crawler.request_timeout_secs);
        let max_retries = self.config.crawler.max_retries;
        let mut backoff = Duration::from_millis(self.config.crawler.retry_backoff_ms);
        let mut attempts = 0;

        loop {
            if !self.scheduler.wait_turn(&host, &self.stop).await {
                return FetchOutcome::Cancelled;
            }
            attempts += 1;

            let result = match tokio::time::timeout(timeout, self.fetcher.fetch(url)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout),
            };
            let result = result.and_then(|page| {
                if (200..300).contains(&page.status) {
                    Ok(page)
                } else {
                    Err(FetchError::Status(page.status))
                }
            });

            match result {
                Ok(page) => return FetchOutcome::Page { page, attempts },
                Err(error) if error.is_retryable() && attempts <= max_retries => {
                    tracing::debug!(
                        "Attempt {} for {} failed ({}), retrying in {:?}",
                        attempts,
                        url,
                        error,
                        backoff
                    );
                    self.stats.retries += 1;

                    tokio::select! {
                        _ = self.stop.cancelled() => return FetchOutcome::Cancelled,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = backoff.saturating_mul(2);
                }
                Err(error) => return FetchOutcome::Failed { error, attempts },
            }
        }
    }

    fn record_failure(&mut self, url: &Url, error: &FetchError, attempts: u32) {
        tracing::warn!("Failed to fetch {} after {} attempt(s): {}", url, attempts, error);

        self.stats.pages_failed += 1;
        self.failures.push(FailureRecord {
            url: url.to_string(),
            reason: error.to_string(),
            status: error.status(),
            attempts,
            timestamp: Utc::now(),
        });
    }

    fn check_transition(&self, to: CrawlState) -> Result<()> {
        if self.state.can_transition_to(to) {
            Ok(())
        } else {
            Err(CrawlerError::InvalidTransition {
                from: self.state,
                to,
            })
        }
    }

    fn finish_crawl(&mut self) {
        if self.check_transition(CrawlState::Done).is_ok() {
            self.stats.elapsed = self.elapsed();
            self.state = CrawlState::Done;
        }
    }

    fn elapsed(&self) -> Duration {
        self.started_at
            .map(|started| started.elapsed())
            .unwrap_or_default()
    }

    /// Returns a token that stops the crawl when cancelled
    ///
    /// The fetch in flight completes; no further URL is fetched.
    pub fn stop_handle(&self) -> CancellationToken {
        self.stop.clone()
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Statistics so far (elapsed time is live while running)
    pub fn statistics(&self) -> CrawlStatistics {
        let mut stats = self.stats.clone();
        if self.state == CrawlState::Running {
            stats.elapsed = self.elapsed();
        }
        stats
    }

    /// Removes and returns the failures recorded since the last call
    pub fn take_failures(&mut self) -> Vec<FailureRecord> {
        std::mem::take(&mut self.failures)
    }

    pub fn frontier_size(&self) -> usize {
        self.scheduler.frontier_size()
    }

    pub fn visited_count(&self) -> usize {
        self.scheduler.visited_count()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
