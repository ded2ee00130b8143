use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use campus_crawler::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Example.edu:8443/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.example.edu".to_string()));
///
/// let url = Url::parse("mailto:someone@example.edu").unwrap();
/// assert_eq!(extract_domain(&url), None);
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
