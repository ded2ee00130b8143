use crate::UrlError;
use url::Url;

/// Canonicalizes a URL for use as a visited-set key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only http:// and https://
/// 3. Require a host (the `url` crate lowercases it and resolves dot segments)
/// 4. Remove the fragment (everything after #)
/// 5. Sort query parameters, keeping duplicates in their original relative order
/// 6. Remove an empty query string (trailing ?)
///
/// Paths are otherwise left alone: `/a` and `/a/` stay distinct, since servers
/// are free to treat them differently.
///
/// # Examples
///
/// ```
/// use campus_crawler::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.edu/a/../b?z=1&a=2#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.edu/b?a=2&z=1");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if params.is_empty() {
            url.set_query(None);
        } else {
            params.sort_by(|a, b| a.0.cmp(&b.0));
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}
