//! Typed queries over a parsed HTML document

use scraper::{ElementRef, Html};

/// A parsed HTML page
///
/// All lookups walk the attached document tree in document order, so elements
/// removed by [`PageDocument::without_elements`] are never returned from the copy.
#[derive(Debug, Clone)]
pub struct PageDocument {
    html: Html,
}

impl PageDocument {
    /// Parses an HTML document
    ///
    /// html5ever recovers from any malformed input, so parsing itself cannot fail.
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// The `<html>` element
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// All elements in document order
    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.root().descendants().filter_map(ElementRef::wrap)
    }

    /// First element with the given tag name
    pub fn first_element(&self, tag: &str) -> Option<ElementRef<'_>> {
        self.elements().find(|el| el.value().name() == tag)
    }

    /// First element whose `id` attribute equals `id`
    pub fn element_by_id(&self, id: &str) -> Option<ElementRef<'_>> {
        self.elements().find(|el| el.value().id() == Some(id))
    }

    /// The `<body>` element, if any
    pub fn body(&self) -> Option<ElementRef<'_>> {
        self.first_element("body")
    }

    /// Every `<a>` element carrying an `href` attribute, paired with that attribute
    pub fn anchors(&self) -> impl Iterator<Item = (ElementRef<'_>, &str)> {
        self.elements()
            .filter(|el| el.value().name() == "a")
            .filter_map(|el| el.value().attr("href").map(|href| (el, href)))
    }

    /// Returns a copy with every element of the given tag names detached
    ///
    /// Descendants of a removed element go with it. `self` is left untouched.
    pub fn without_elements(&self, tags: &[&str]) -> PageDocument {
        let mut html = self.html.clone();

        let doomed: Vec<_> = html
            .tree
            .root()
            .descendants()
            .filter(|node| {
                node.value()
                    .as_element()
                    .is_some_and(|el| tags.contains(&el.name()))
            })
            .map(|node| node.id())
            .collect();

        for id in doomed {
            if let Some(mut node) = html.tree.get_mut(id) {
                node.detach();
            }
        }

        PageDocument { html }
    }
}

/// Joins the text nodes under `element` and collapses whitespace
///
/// Adjacent text runs are separated by a space before collapsing, so the result
/// never holds two consecutive spaces or leading/trailing whitespace.
pub fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
