//! URL resolution utilities.
//!
//! [URL Standard § 4.4 URL parsing](https://url.spec.whatwg.org/#url-parsing)
//!
//! Attribute values such as `href` and `src` are frequently relative. They are
//! resolved against the base URI a node was parsed with.

use url::Url;

/// Resolve a potentially relative URL against a base URL.
///
/// # Algorithm
///
/// STEP 1: "If url is an absolute URL, return url." An absolute `href` is
/// returned in its serialized form even when the base is unusable.
///
/// STEP 2: "Otherwise, resolve url relative to base."
///
/// Returns `None` when neither the base nor the `href` alone yields a valid
/// URL.
///
/// # Example
/// ```
/// use broth_common::url::resolve_url;
///
/// assert_eq!(
///     resolve_url("../img.png", "http://example.com/a/b/page.html").as_deref(),
///     Some("http://example.com/a/img.png")
/// );
/// assert_eq!(resolve_url("img.png", "not a base"), None);
/// ```
#[must_use]
pub fn resolve_url(href: &str, base: &str) -> Option<String> {
    // STEP 1: the base is unusable, but the attribute may be absolute on its own.
    let Ok(base) = Url::parse(base.trim()) else {
        return Url::parse(href.trim()).ok().map(String::from);
    };

    // STEP 2: join relative references, including query-only (`?q=1`) and
    // protocol-relative (`//host/path`) forms.
    base.join(href.trim()).ok().map(String::from)
}

/// Returns true if `href` parses as an absolute URL without needing a base.
#[must_use]
pub fn is_absolute(href: &str) -> bool {
    Url::parse(href.trim()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_href_wins() {
        assert_eq!(
            resolve_url("https://other.org/x", "http://example.com/").as_deref(),
            Some("https://other.org/x")
        );
    }

    #[test]
    fn test_query_only_keeps_file() {
        assert_eq!(
            resolve_url("?foo=bar", "http://example.com/path/file").as_deref(),
            Some("http://example.com/path/file?foo=bar")
        );
    }

    #[test]
    fn test_protocol_relative() {
        assert_eq!(
            resolve_url("//cdn.example.com/a.js", "https://example.com/").as_deref(),
            Some("https://cdn.example.com/a.js")
        );
    }

    #[test]
    fn test_absolute_path() {
        assert_eq!(
            resolve_url("/root.css", "http://example.com/a/b/c.html").as_deref(),
            Some("http://example.com/root.css")
        );
    }

    #[test]
    fn test_bad_base_and_relative_href() {
        assert_eq!(resolve_url("page.html", ""), None);
        assert!(!is_absolute("page.html"));
        assert!(is_absolute("mailto:someone@example.com"));
    }
}
