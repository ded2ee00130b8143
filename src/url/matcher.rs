/// Checks if a host matches an allow-list pattern
///
/// Two kinds of pattern are supported:
/// 1. Exact: "example.edu" matches only "example.edu"
/// 2. Subdomain alias: "*.example.edu" matches "example.edu" itself and any
///    subdomain of it, however deep
///
/// Hosts are expected in lowercase; the comparison itself is case-sensitive.
///
/// # Examples
///
/// ```
/// use campus_crawler::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.edu", "example.edu"));
/// assert!(!matches_wildcard("example.edu", "www.example.edu"));
///
/// assert!(matches_wildcard("*.example.edu", "example.edu"));
/// assert!(matches_wildcard("*.example.edu", "www.example.edu"));
/// assert!(!matches_wildcard("*.example.edu", "notexample.edu"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}
