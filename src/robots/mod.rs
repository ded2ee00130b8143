//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt
//! files. It is used by the HTTP fetcher so that every page request honors the
//! site's exclusion rules.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::ParsedRobots;

use reqwest::Client;
use url::Url;

/// Returns the cache key for a URL's robots.txt (`scheme://host:port`)
pub fn robots_origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Fetches robots.txt for the origin of `url`
///
/// # Failure Handling
///
/// | Outcome | Result |
/// |---------|--------|
/// | 2xx | Parsed content |
/// | 4xx (missing, forbidden) | Allow all |
/// | 5xx, network error, unreadable body | Allow all (logged) |
pub async fn fetch_robots(client: &Client, url: &Url) -> ParsedRobots {
    let robots_url = match url.join("/robots.txt") {
        Ok(u) => u,
        Err(e) => {
            tracing::debug!("Cannot build robots.txt URL for {}: {}", url, e);
            return ParsedRobots::allow_all();
        }
    };

    tracing::debug!("Fetching {}", robots_url);

    let response = match client.get(robots_url.clone()).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}; allowing all", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    let status = response.status();
    if !status.is_success() {
        if status.is_server_error() {
            tracing::warn!("{} returned HTTP {}; allowing all", robots_url, status);
        } else {
            tracing::debug!("{} returned HTTP {}; allowing all", robots_url, status);
        }
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => ParsedRobots::from_content(&body),
        Err(e) => {
            tracing::warn!("Failed to read {}: {}; allowing all", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}
