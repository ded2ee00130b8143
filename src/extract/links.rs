//! Link extraction

use crate::extract::document::PageDocument;
use std::collections::HashSet;
use url::Url;

/// Extracts every followable link on the page as an absolute URL
///
/// # Link Extraction Rules
///
/// **Include:** `<a href="...">` anywhere in the document, resolved against `base_url`
///
/// **Exclude** (after trimming the href):
/// - empty hrefs
/// - fragment-only links (`#section`)
/// - `mailto:` and `tel:` links
/// - hrefs that cannot be resolved to a URL
///
/// Duplicates collapse to their first occurrence, so the result keeps document
/// order. Host and scheme filtering is left to the caller.
///
/// # Example
///
/// ```
/// use campus_crawler::extract::{extract_links, PageDocument};
/// use url::Url;
///
/// let doc = PageDocument::parse(r##"<a href="/about">About</a><a href="#top">Top</a>"##);
/// let base = Url::parse("https://example.com/x/y").unwrap();
/// let links = extract_links(&doc, &base);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.com/about");
/// ```
pub fn extract_links(document: &PageDocument, base_url: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();

    document
        .anchors()
        .filter_map(|(_, href)| resolve_link(href, base_url))
        .filter(|url| seen.insert(url.as_str().to_owned()))
        .collect()
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::trace!("Dropping unresolvable href {:?}: {}", href, e);
            None
        }
    }
}
