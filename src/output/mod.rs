//! Output module for crawl records and reports
//!
//! This module handles:
//! - The page and failure record types
//! - Streaming records to JSON sinks
//! - Recording crawl statistics

mod json;
pub mod stats;
mod traits;

pub use json::{JsonOutput, JsonWriter};
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{FailureRecord, OutputError, OutputHandler, OutputResult, PageRecord};
