//! Main content and title extraction

use crate::extract::document::{collapsed_text, PageDocument};

/// Elements that never contribute to page content
pub const NON_CONTENT_TAGS: &[&str] = &["nav", "footer", "script", "style", "header"];

/// Extracts the normalized visible text of the page's main content region
///
/// # Extraction Rules
///
/// 1. Work on a copy with `nav`, `footer`, `script`, `style` and `header` removed
/// 2. Pick the first of `<main>`, `<article>`, `id="content"`, `<body>`
/// 3. Join its text nodes with single spaces, collapse whitespace, trim
///
/// Returns an empty string when no container exists or it holds no text.
///
/// # Example
///
/// ```
/// use campus_crawler::extract::{extract_content, PageDocument};
///
/// let doc = PageDocument::parse(
///     "<body><nav>Menu</nav><main><p>Hello</p>\n<p>world</p></main></body>",
/// );
/// assert_eq!(extract_content(&doc), "Hello world");
/// ```
pub fn extract_content(document: &PageDocument) -> String {
    let working = document.without_elements(NON_CONTENT_TAGS);

    let container = working
        .first_element("main")
        .or_else(|| working.first_element("article"))
        .or_else(|| working.element_by_id("content"))
        .or_else(|| working.body());

    container.map(collapsed_text).unwrap_or_default()
}

/// Extracts a human-readable title: the first `<h1>`, else `<title>`, else ""
///
/// Reads the document as given, so headings inside `<header>` or `<nav>` count.
pub fn extract_title(document: &PageDocument) -> String {
    document
        .first_element("h1")
        .or_else(|| document.first_element("title"))
        .map(collapsed_text)
        .unwrap_or_default()
}
