//! Page extraction
//!
//! Everything here is a pure function of the HTML it is given:
//! - `document`: the parsed-page abstraction with typed element queries
//! - `content`: main-content text and title extraction
//! - `links`: followable link extraction

mod content;
mod document;
mod links;

pub use content::{extract_content, extract_title, NON_CONTENT_TAGS};
pub use document::{collapsed_text, PageDocument};
pub use links::extract_links;

use url::Url;

/// Everything extracted from one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    /// Title from `<h1>` or `<title>`; empty when neither exists
    pub title: String,

    /// Normalized main-content text
    pub content: String,

    /// Absolute links in document order, without duplicates
    pub links: Vec<Url>,
}

/// Parses `html` once and runs every extractor on it
///
/// Title and links read the document as parsed; content extraction works on its
/// own stripped copy.
pub fn parse_page(html: &str, base_url: &Url) -> ParsedPage {
    let document = PageDocument::parse(html);

    ParsedPage {
        title: extract_title(&document),
        content: extract_content(&document),
        links: extract_links(&document, base_url),
    }
}
