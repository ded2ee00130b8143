//! Crawl statistics
//!
//! Counters are accumulated by the crawler as it runs and rendered at the end
//! of a CLI run.

use std::collections::BTreeMap;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Number of page records produced
    pub pages_emitted: u64,

    /// Number of URLs given up after all attempts
    pub pages_failed: u64,

    /// Number of retried fetch attempts
    pub retries: u64,

    /// Links skipped because the URL was already visited
    pub duplicates_skipped: u64,

    /// Links dropped because their host is not allowed
    pub offsite_links_dropped: u64,

    /// Links dropped because they would exceed the maximum depth
    pub depth_limited_links: u64,

    /// Records per section label
    pub pages_by_section: BTreeMap<String, u64>,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,
}

impl CrawlStatistics {
    /// Counts one emitted record in `section`
    pub fn record_page(&mut self, section: &str) {
        self.pages_emitted += 1;
        *self.pages_by_section.entry(section.to_string()).or_insert(0) += 1;
    }

    /// Total URLs that reached a terminal outcome
    pub fn total_processed(&self) -> u64 {
        self.pages_emitted + self.pages_failed
    }

    /// Percentage of processed URLs that produced a record
    pub fn success_rate(&self) -> f64 {
        let total = self.total_processed();
        if total == 0 {
            return 0.0;
        }
        (self.pages_emitted as f64 / total as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages emitted: {}", stats.pages_emitted);
    println!("  Pages failed: {}", stats.pages_failed);
    println!("  Retries: {}", stats.retries);
    println!("  Elapsed: {:.1}s", stats.elapsed.as_secs_f64());
    println!();

    println!("Links Skipped:");
    println!("  Already visited: {}", stats.duplicates_skipped);
    println!("  Off-site: {}", stats.offsite_links_dropped);
    println!("  Beyond max depth: {}", stats.depth_limited_links);
    println!();

    if !stats.pages_by_section.is_empty() {
        println!("Pages by Section:");
        let mut sections: Vec<_> = stats.pages_by_section.iter().collect();
        sections.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (section, count) in sections {
            let percentage = if stats.pages_emitted > 0 {
                (*count as f64 / stats.pages_emitted as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", section, count, percentage);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages successfully extracted)",
        stats.success_rate(),
        stats.pages_emitted,
        stats.total_processed()
    );
}
