//! Section classification
//!
//! Maps a page URL to a coarse topical section using an ordered list of
//! substring rules. The first rule whose pattern occurs anywhere in the URL wins;
//! URLs matching no rule fall back to [`FALLBACK_SECTION`].
//!
//! Matching is literal: no case folding, no trailing-slash handling.

use serde::Deserialize;

/// Label returned when no rule matches
pub const FALLBACK_SECTION: &str = "general";

/// Built-in rules, checked in this order
const DEFAULT_RULES: &[(&str, &str)] = &[
    ("/programs/", "programs"),
    ("/admissions/", "admissions"),
    ("/student-life/", "student-life"),
    ("/services/", "services"),
];

/// A single `pattern -> label` rule
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SectionRule {
    /// Substring searched for in the URL
    pub pattern: String,

    /// Section assigned when the pattern occurs
    pub label: String,
}

impl SectionRule {
    pub fn new(pattern: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            label: label.into(),
        }
    }
}

/// Ordered rule set used to label pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionClassifier {
    rules: Vec<SectionRule>,
}

impl SectionClassifier {
    /// Creates a classifier from rules in priority order
    pub fn new(rules: Vec<SectionRule>) -> Self {
        Self { rules }
    }

    /// Uses `rules` when non-empty, otherwise the built-in rule set
    pub fn from_rules_or_default(rules: &[SectionRule]) -> Self {
        if rules.is_empty() {
            Self::default()
        } else {
            Self::new(rules.to_vec())
        }
    }

    /// Returns the label of the first rule whose pattern occurs in `url`
    ///
    /// # Examples
    ///
    /// ```
    /// use campus_crawler::SectionClassifier;
    ///
    /// let classifier = SectionClassifier::default();
    /// assert_eq!(classifier.classify("https://x.edu/programs/nursing"), "programs");
    /// // Rule order decides overlaps.
    /// assert_eq!(classifier.classify("https://x.edu/admissions/programs/"), "admissions");
    /// assert_eq!(classifier.classify("https://x.edu/about"), "general");
    /// ```
    pub fn classify(&self, url: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| url.contains(rule.pattern.as_str()))
            .map(|rule| rule.label.as_str())
            .unwrap_or(FALLBACK_SECTION)
    }

    /// The rules in the order they are evaluated
    pub fn rules(&self) -> &[SectionRule] {
        &self.rules
    }
}

impl Default for SectionClassifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_RULES
                .iter()
                .map(|(pattern, label)| SectionRule::new(*pattern, *label))
                .collect(),
        )
    }
}

/// Classifies `url` with the built-in rule set
pub fn classify_section(url: &str) -> &'static str {
    DEFAULT_RULES
        .iter()
        .find(|(pattern, _)| url.contains(pattern))
        .map(|(_, label)| *label)
        .unwrap_or(FALLBACK_SECTION)
}
