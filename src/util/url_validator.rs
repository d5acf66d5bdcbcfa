use url::Url;

/// Query parameters added by mail and ad platforms for click tracking.
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_cid", "mc_eid"];

/// Checks whether a string is a syntactically valid absolute URL.
///
/// This is a plain syntax test: the host is never resolved and no request is
/// made. Only `http` and `https` URLs count as valid, since those are the
/// only ones a feed can be retrieved from or link to meaningfully.
///
/// # Examples
///
/// ```
/// use feedex::util::is_valid_url;
///
/// assert!(is_valid_url("https://example.com/feed.xml"));
/// assert!(!is_valid_url("/relative/path"));
/// assert!(!is_valid_url("file:///etc/passwd"));
/// ```
pub fn is_valid_url(s: &str) -> bool {
    parse_http_url(s).is_some()
}

/// Parses `s` as an absolute `http`/`https` URL with a host.
pub fn parse_http_url(s: &str) -> Option<Url> {
    let url = Url::parse(s.trim()).ok()?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(url),
        _ => None,
    }
}

/// Removes tracking query parameters (`utm_*`, `fbclid`, ...) from a URL.
///
/// The query string is only rebuilt when something was removed, so URLs
/// without tracking parameters keep their original encoding.
pub fn purify(mut url: Url) -> Url {
    let is_tracking = |key: &str| key.starts_with("utm_") || TRACKING_PARAMS.contains(&key);

    if !url.query_pairs().any(|(key, _)| is_tracking(&key)) {
        return url;
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urls() {
        assert!(is_valid_url("https://example.com/feed.xml"));
        assert!(is_valid_url("http://news.example.org"));
        assert!(is_valid_url("  https://example.com/padded  "));
    }

    #[test]
    fn test_localhost_is_valid_syntax() {
        // Syntax check only: loopback hosts are not rejected
        assert!(is_valid_url("http://127.0.0.1:8080/feed"));
        assert!(is_valid_url("http://localhost/feed"));
    }

    #[test]
    fn test_invalid_urls() {
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("/blog/post"));
        assert!(!is_valid_url("file:///etc/passwd"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("mailto:someone@example.com"));
    }

    #[test]
    fn test_purify_drops_tracking_params() {
        let url = Url::parse("https://example.com/a?id=7&utm_source=rss&utm_medium=feed").unwrap();
        assert_eq!(purify(url).as_str(), "https://example.com/a?id=7");
    }

    #[test]
    fn test_purify_removes_empty_query() {
        let url = Url::parse("https://example.com/a?fbclid=abc").unwrap();
        assert_eq!(purify(url).as_str(), "https://example.com/a");
    }

    #[test]
    fn test_purify_keeps_untracked_url_untouched() {
        let url = Url::parse("https://example.com/search?q=a%20b").unwrap();
        assert_eq!(purify(url).as_str(), "https://example.com/search?q=a%20b");
    }
}
