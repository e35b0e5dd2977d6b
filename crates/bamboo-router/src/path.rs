//! Path normalisation shared by pattern parsing and resolution.

/// Splits a raw path into raw (still percent-encoded) segments.
///
/// The leading separator is optional and trailing separators are dropped, so
/// `/a/`, `/a` and `a` all yield `["a"]`. An empty path (or `/`) yields the
/// single root segment `[""]`.
pub(crate) fn raw_segments(path: &str) -> impl Iterator<Item = &str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    trimmed.trim_end_matches('/').split('/')
}

/// Splits a request path into percent-decoded segments.
///
/// Decoding happens per segment, after splitting, so an encoded separator
/// (`%2F`) stays inside its segment. Returns `None` when a segment does not
/// decode to valid UTF-8.
///
/// # Example
///
/// ```rust
/// use bamboo_router::split_path;
///
/// assert_eq!(split_path("/a/b/").unwrap(), vec!["a", "b"]);
/// assert_eq!(split_path("").unwrap(), vec![""]);
/// assert_eq!(split_path("/hello%20world").unwrap(), vec!["hello world"]);
/// assert_eq!(split_path("/a%2Fb").unwrap(), vec!["a/b"]);
/// assert!(split_path("/%FF").is_none());
/// ```
pub fn split_path(path: &str) -> Option<Vec<String>> {
    raw_segments(path)
        .map(|segment| {
            urlencoding::decode(segment)
                .ok()
                .map(std::borrow::Cow::into_owned)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_variants() {
        assert_eq!(split_path("/").unwrap(), vec![""]);
        assert_eq!(split_path("").unwrap(), vec![""]);
        assert_eq!(split_path("//").unwrap(), vec![""]);
    }

    #[test]
    fn test_trailing_separator_ignored() {
        assert_eq!(split_path("/users/").unwrap(), split_path("/users").unwrap());
    }

    #[test]
    fn test_inner_empty_segment_kept() {
        assert_eq!(split_path("/a//b").unwrap(), vec!["a", "", "b"]);
    }

    #[test]
    fn test_plus_is_not_space() {
        assert_eq!(split_path("/a+b").unwrap(), vec!["a+b"]);
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        assert!(split_path("/ok/%C3%28").is_none());
    }
}
