//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: lifecycle of a crawl run (idle, running, done)
//! - `DomainState`: per-host request timing for the politeness delay

mod crawl_state;
mod domain_state;

pub use crawl_state::CrawlState;
pub use domain_state::DomainState;
