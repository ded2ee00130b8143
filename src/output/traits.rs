//! Output handler traits and record types
//!
//! This module defines the records a crawl produces and the trait interface
//! that receives them.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output already finished")]
    Finished,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One extracted page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Final URL of the fetched page
    pub url: String,

    /// Page title, or the URL when the page has none
    pub page_title: String,

    /// Whitespace-normalized main-content text; may be empty
    pub content: String,

    /// Section label assigned from the URL
    pub section: String,

    /// When the page was extracted
    #[serde(serialize_with = "serialize_timestamp")]
    pub crawl_timestamp: DateTime<Utc>,
}

impl PageRecord {
    /// Builds a record, substituting the URL for an empty title
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        section: impl Into<String>,
        crawl_timestamp: DateTime<Utc>,
    ) -> Self {
        let url = url.into();
        let title = title.into();
        let page_title = if title.is_empty() { url.clone() } else { title };

        Self {
            url,
            page_title,
            content: content.into(),
            section: section.into(),
            crawl_timestamp,
        }
    }
}

/// A URL that produced no record, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// The URL that failed
    pub url: String,

    /// Human-readable failure reason
    pub reason: String,

    /// HTTP status code, when the failure was a response
    pub status: Option<u16>,

    /// Number of fetch attempts made
    pub attempts: u32,

    /// When the URL was given up
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Serializes as RFC 3339 with an explicit `+00:00` offset
fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, false))
}

/// Receives crawl output as it is produced
pub trait OutputHandler {
    /// Writes one page record
    fn write_page(&mut self, record: &PageRecord) -> OutputResult<()>;

    /// Writes one failure entry; ignored unless the handler keeps a failure log
    fn write_failure(&mut self, _failure: &FailureRecord) -> OutputResult<()> {
        Ok(())
    }

    /// Flushes and closes the output
    fn finish(&mut self) -> OutputResult<()> {
        Ok(())
    }
}

impl OutputHandler for Vec<PageRecord> {
    fn write_page(&mut self, record: &PageRecord) -> OutputResult<()> {
        self.push(record.clone());
        Ok(())
    }
}
