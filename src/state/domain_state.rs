use std::time::Duration;
use tokio::time::Instant;

/// Tracks the request timing of one host during a crawl
///
/// Used to enforce the per-host politeness delay: consecutive requests to the
/// same host are spaced at least `delay` apart.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Number of requests made to this host in the current crawl
    pub request_count: u32,

    /// When the last request to this host was started
    pub last_request_time: Option<Instant>,
}

impl DomainState {
    /// Creates a new DomainState with no requests recorded
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if a request can be made to this host now
    pub fn can_request(&self, delay: Duration, now: Instant) -> bool {
        self.time_until_next_request(delay, now).is_none()
    }

    /// Records that a request was made to this host
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < delay {
            Some(delay - elapsed)
        } else {
            None
        }
    }
}
