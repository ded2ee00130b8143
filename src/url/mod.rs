//! URL handling module
//!
//! This module provides URL canonicalization, host extraction, wildcard matching,
//! and the host allow-list that bounds a crawl.

mod domain;
mod matcher;
mod normalize;

pub use domain::extract_domain;
pub use matcher::matches_wildcard;
pub use normalize::normalize_url;

use ::url::Url;

/// The set of hosts a crawl may fetch from or enqueue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedDomains {
    patterns: Vec<String>,
}

impl AllowedDomains {
    /// Builds the allow-list; patterns are lowercased
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// Returns true if `host` matches any pattern
    pub fn allows_host(&self, host: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| matches_wildcard(pattern, host))
    }

    /// Returns true if the URL's host matches any pattern
    ///
    /// URLs without a host are never allowed.
    pub fn allows(&self, url: &Url) -> bool {
        extract_domain(url).is_some_and(|host| self.allows_host(&host))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}
