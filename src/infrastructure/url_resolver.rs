//! Resolution of page references against the URL of the page that contains them
//!
//! Handles absolute, protocol-relative, root-relative, path-relative and
//! fragment-only references. Absolute references keep their own host.

use url::{ParseError, Url};

use super::reader_error::{ReaderError, ReaderResult};

/// Resolve `candidate` against `base`, producing an absolute URL.
pub fn resolve(base: &Url, candidate: &str) -> ReaderResult<Url> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return Err(ReaderError::malformed_url(candidate, "empty reference"));
    }

    match Url::parse(candidate) {
        Ok(absolute) => Ok(absolute),
        Err(ParseError::RelativeUrlWithoutBase) => base
            .join(candidate)
            .map_err(|e| ReaderError::malformed_url(candidate, format!("cannot join with {base}: {e}"))),
        Err(e) => Err(ReaderError::malformed_url(candidate, e.to_string())),
    }
}

/// Resolve against a base given as text
pub fn resolve_str(base: &str, candidate: &str) -> ReaderResult<Url> {
    let base = Url::parse(base).map_err(|e| ReaderError::malformed_url(base, format!("invalid base URL: {e}")))?;
    resolve(&base, candidate)
}

/// True when the reference carries its own scheme
pub fn is_absolute(candidate: &str) -> bool {
    Url::parse(candidate.trim()).is_ok()
}

/// True for references that only point inside the current page
pub fn is_fragment_only(candidate: &str) -> bool {
    candidate.trim_start().starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn base() -> Url {
        Url::parse("https://site/mod/unit2/").unwrap()
    }

    #[rstest]
    #[case("../media/pic.png", "https://site/mod/media/pic.png")]
    #[case("./media/pic.png", "https://site/mod/unit2/media/pic.png")]
    #[case("media/pic.png", "https://site/mod/unit2/media/pic.png")]
    #[case("/root.png", "https://site/root.png")]
    #[case("#overview", "https://site/mod/unit2/#overview")]
    #[case("//cdn.example.com/x.js", "https://cdn.example.com/x.js")]
    #[case("https://other.example.com/a?b=1", "https://other.example.com/a?b=1")]
    #[case("  ../media/pic.png  ", "https://site/mod/media/pic.png")]
    fn test_resolve_cases(#[case] candidate: &str, #[case] expected: &str) {
        assert_eq!(resolve(&base(), candidate).unwrap().as_str(), expected);
    }

    #[test]
    fn test_external_host_is_preserved() {
        let resolved = resolve(&base(), "http://example.org/page").unwrap();
        assert_eq!(resolved.host_str(), Some("example.org"));
        assert_eq!(resolved.scheme(), "http");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("http://[::1")]
    #[case("https://example.com:99999/")]
    #[case("//[bad/host")]
    fn test_malformed_references(#[case] candidate: &str) {
        let err = resolve(&base(), candidate).unwrap_err();
        assert!(matches!(err, ReaderError::MalformedUrl { .. }), "{err:?}");
    }

    #[test]
    fn test_resolve_str_rejects_bad_base() {
        assert!(matches!(
            resolve_str("not a url", "x.png"),
            Err(ReaderError::MalformedUrl { .. })
        ));
        assert_eq!(
            resolve_str("https://site/mod/unit2/", "../x").unwrap().as_str(),
            "https://site/mod/x"
        );
    }

    #[test]
    fn test_reference_predicates() {
        assert!(is_absolute("mailto:someone@example.com"));
        assert!(!is_absolute("../x"));
        assert!(is_fragment_only("#top"));
        assert!(!is_fragment_only("page#top"));
    }

    proptest! {
        #[test]
        fn prop_absolute_candidates_round_trip(
            host in "[a-z]{1,12}\\.(com|org|net)",
            segments in proptest::collection::vec("[a-z0-9-]{1,8}", 0..4),
            query in proptest::option::of("[a-z]{1,5}=[a-z0-9]{1,5}"),
        ) {
            let mut raw = format!("https://{host}/{}", segments.join("/"));
            if let Some(q) = query {
                raw.push('?');
                raw.push_str(&q);
            }
            let absolute = Url::parse(&raw).unwrap();
            let resolved = resolve(&base(), absolute.as_str()).unwrap();
            prop_assert_eq!(resolved, absolute);
        }

        #[test]
        fn prop_relative_candidates_stay_on_base_host(
            segments in proptest::collection::vec("[a-z0-9]{1,8}", 1..4),
            ups in 0usize..4,
        ) {
            let candidate = format!("{}{}", "../".repeat(ups), segments.join("/"));
            let resolved = resolve(&base(), &candidate).unwrap();
            prop_assert_eq!(resolved.host_str(), Some("site"));
            prop_assert_eq!(resolved.scheme(), "https");
        }
    }
}
