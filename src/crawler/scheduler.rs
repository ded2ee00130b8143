//! Scheduler for managing the crawl frontier and politeness
//!
//! This module handles:
//! - The breadth-first frontier queue
//! - The visited set that keeps every URL to a single fetch
//! - Per-host request spacing

use crate::state::DomainState;
use crate::url::normalize_url;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// The URL to fetch (fragment removed)
    pub url: Url,

    /// Link distance from the nearest seed
    pub depth: u32,
}

/// Owns the frontier, the visited set and per-host timing
///
/// Entries come out in the order they went in. A URL is visited from the
/// moment it is enqueued, so the same canonical URL is never queued twice.
#[derive(Debug)]
pub struct Scheduler {
    /// Frontier queue of URLs to fetch
    frontier: VecDeque<FrontierEntry>,

    /// Canonical keys of every URL enqueued or fetched
    visited: HashSet<String>,

    /// Canonical keys of fetched URLs (including redirect targets)
    fetched: HashSet<String>,

    /// Per-host timing
    domain_states: HashMap<String, DomainState>,

    /// Minimum spacing between requests to one host
    request_delay: Duration,
}

/// Canonical visited-set key for a URL
fn visit_key(url: &Url) -> String {
    normalize_url(url.as_str())
        .map(String::from)
        .unwrap_or_else(|_| url.to_string())
}

impl Scheduler {
    /// Creates an empty scheduler
    ///
    /// # Arguments
    ///
    /// * `request_delay` - Minimum time between requests to the same host
    pub fn new(request_delay: Duration) -> Self {
        Self {
            frontier: VecDeque::new(),
            visited: HashSet::new(),
            fetched: HashSet::new(),
            domain_states: HashMap::new(),
            request_delay,
        }
    }

    /// Adds a URL to the back of the frontier
    ///
    /// # Returns
    ///
    /// `false` if the URL was already visited (nothing is queued)
    pub fn enqueue(&mut self, mut url: Url, depth: u32) -> bool {
        url.set_fragment(None);

        if !self.visited.insert(visit_key(&url)) {
            return false;
        }

        self.frontier.push_back(FrontierEntry { url, depth });
        true
    }

    /// Takes the next entry from the front of the frontier
    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.frontier.pop_front()
    }

    /// Records that `url` has been fetched
    ///
    /// Also marks it visited so a later link to it is not queued.
    pub fn mark_fetched(&mut self, url: &Url) {
        let key = visit_key(url);
        self.visited.insert(key.clone());
        self.fetched.insert(key);
    }

    /// Returns true if `url` has already been fetched
    pub fn is_fetched(&self, url: &Url) -> bool {
        self.fetched.contains(&visit_key(url))
    }

    /// Returns true if `url` has been enqueued or fetched
    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(&visit_key(url))
    }

    /// Waits until a request to `host` is allowed, then records it
    ///
    /// # Returns
    ///
    /// `false` if `cancel` fired before the slot opened (nothing is recorded)
    pub async fn wait_turn(&mut self, host: &str, cancel: &CancellationToken) -> bool {
        let state = self.domain_states.entry(host.to_string()).or_default();

        if let Some(wait) = state.time_until_next_request(self.request_delay, Instant::now()) {
            tracing::debug!("Waiting {:?} before next request to {}", wait, host);
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(wait) => {}
            }
        }

        if cancel.is_cancelled() {
            return false;
        }

        state.record_request(Instant::now());
        true
    }

    /// Returns the number of URLs in the frontier
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    /// Returns whether the frontier is empty
    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty()
    }

    /// Returns the number of visited URLs
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Gets the timing state for a host
    pub fn domain_state(&self, host: &str) -> Option<&DomainState> {
        self.domain_states.get(host)
    }
}
