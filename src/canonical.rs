//! URL canonicalization (§6): a bit-exact rule used for dedupe across the
//! frontier, the index, and direct-navigation domain checks.
//!
//! Rule, applied once: lowercase the host, strip a leading `www.`, strip the
//! default port for the scheme, strip the `#fragment`, keep the path's case
//! as-is, and keep the query string as-is if present. Two URLs compare equal
//! for dedupe purposes iff their canonical forms are byte-equal.

use url::Url;

/// Canonicalize a URL string per the rule above. Returns `None` for inputs
/// that don't parse as absolute URLs.
pub fn canonicalize(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    url.set_fragment(None);

    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    url.set_host(Some(&host)).ok()?;

    let default_port = match url.scheme() {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    };
    if url.port() == default_port {
        url.set_port(None).ok()?;
    }

    Some(url.to_string())
}

/// Extract the canonical (lowercased, `www.`-stripped) host from a URL
/// string, without requiring the rest of the canonicalization.
pub fn host_of(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// Resolve a possibly-relative link against a base URL, then canonicalize.
pub fn resolve(base: &str, link: &str) -> Option<String> {
    let base_url = Url::parse(base).ok()?;
    let joined = base_url.join(link).ok()?;
    canonicalize(joined.as_str())
}

/// Extract the path (plus query string, if any) a `robots.txt` rule set
/// should be checked against.
pub fn path_of(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    Some(match url.query() {
        Some(q) => format!("{}?{q}", url.path()),
        None => url.path().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_www_default_port_and_fragment() {
        let got = canonicalize("https://WWW.Example.SE:443/Path?q=1#frag").unwrap();
        assert_eq!(got, "https://example.se/Path?q=1");
    }

    #[test]
    fn idempotent() {
        let once = canonicalize("https://WWW.Example.SE:443/Path?q=1#frag").unwrap();
        let twice = canonicalize(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn non_default_port_is_kept() {
        let got = canonicalize("http://example.se:8080/x").unwrap();
        assert_eq!(got, "http://example.se:8080/x");
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert!(canonicalize("ftp://example.se/x").is_none());
        assert!(canonicalize("not a url").is_none());
    }

    #[test]
    fn relative_links_resolve_against_base() {
        let got = resolve("https://www.example.se/a/b", "../c?x=1").unwrap();
        assert_eq!(got, "https://example.se/c?x=1");
    }

    #[test]
    fn path_of_includes_the_query_string() {
        assert_eq!(path_of("https://example.se/a/b?x=1").as_deref(), Some("/a/b?x=1"));
        assert_eq!(path_of("https://example.se").as_deref(), Some("/"));
    }

    proptest::proptest! {
        #[test]
        fn canonical_is_idempotent_on_any_https_url(host in "[a-z]{3,10}\\.se", path in "[a-z/]{0,10}") {
            let raw = format!("https://www.{host}/{path}");
            if let Some(once) = canonicalize(&raw) {
                let twice = canonicalize(&once).unwrap();
                proptest::prop_assert_eq!(once, twice);
            }
        }
    }
}
