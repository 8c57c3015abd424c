//! URL canonicalization for cross-source deduplication
//!
//! Newsletters link the same story through different tracking wrappers and
//! campaign parameters. This module reduces a URL to a stable comparison key:
//!
//! - Embedded redirect destinations are decoded (pure string transform, no network)
//! - Scheme is forced to `https` and the host lowercased
//! - Tracking query parameters are stripped, all others kept in order
//! - Fragments are dropped
//!
//! None of the functions here fail: input that does not parse as a web URL is
//! returned trimmed but otherwise unchanged.

use url::Url;

/// Maximum number of nested redirect wrappers decoded before giving up
pub const MAX_REDIRECT_HOPS: usize = 5;

/// Query parameter prefixes used by marketing and analytics tools
const TRACKING_PARAM_PREFIXES: &[&str] = &[
    "utm_", "mc_", "_hs", "hsa_", "pk_", "mtm_", "oly_", "vero_", "ga_", "ss_",
];

/// Exact tracking parameter names
const TRACKING_PARAMS: &[&str] = &[
    "fbclid",
    "gclid",
    "dclid",
    "gbraid",
    "wbraid",
    "msclkid",
    "yclid",
    "twclid",
    "rdt_cid",
    "li_fat_id",
    "igshid",
    "mkt_tok",
    "_ga",
    "_gl",
    "s_cid",
    "ck_subscriber_id",
];

/// Query keys that redirect services use to carry the destination URL
const REDIRECT_QUERY_KEYS: &[&str] = &[
    "url",
    "u",
    "redirect",
    "redirect_url",
    "redirect_uri",
    "target",
    "dest",
    "destination",
    "link",
];

/// Check if a query parameter key is a tracking parameter
///
/// # Examples
///
/// ```
/// use mailbrief::canonical::is_tracking_param;
///
/// assert!(is_tracking_param("utm_source"));
/// assert!(is_tracking_param("MC_EID"));
/// assert!(!is_tracking_param("id"));
/// ```
pub fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    TRACKING_PARAMS.contains(&key.as_str())
        || TRACKING_PARAM_PREFIXES
            .iter()
            .any(|prefix| key.starts_with(prefix))
}

/// Canonicalize a URL into a stable form
///
/// # Examples
///
/// ```
/// use mailbrief::canonical::canonicalize;
///
/// assert_eq!(
///     canonicalize("http://Example.COM/a?utm_source=x&id=1#top"),
///     "https://example.com/a?id=1"
/// );
/// ```
pub fn canonicalize(url: &str) -> String {
    let trimmed = url.trim();
    let resolved = resolve_tracking_url(trimmed);

    let Some(mut parsed) = parse_web_url(&resolved) else {
        return trimmed.to_string();
    };

    if parsed.scheme() == "http" {
        // http -> https is always permitted between special schemes
        let _ = parsed.set_scheme("https");
    }

    if let Some(host) = parsed.host_str() {
        let lower = host.to_ascii_lowercase();
        if lower != host {
            let _ = parsed.set_host(Some(&lower));
        }
    }

    parsed.set_fragment(None);

    let query = parsed.query().map(strip_tracking_params);
    parsed.set_query(query.as_deref().filter(|q| !q.is_empty()));

    parsed.to_string()
}

/// Build the deduplication key for a URL
///
/// Applies [`canonicalize`], then drops every leading `www.` label from the
/// host and trailing slashes from non-root paths. Pure: never touches the network.
///
/// # Examples
///
/// ```
/// use mailbrief::canonical::normalize_url;
///
/// assert_eq!(
///     normalize_url("http://www.example.com/post/?utm_medium=email"),
///     normalize_url("https://example.com/post")
/// );
/// ```
pub fn normalize_url(url: &str) -> String {
    let canonical = canonicalize(url);

    let Some(mut parsed) = parse_web_url(&canonical) else {
        return canonical;
    };

    if let Some(host) = parsed.host_str().map(strip_www) {
        if parsed.host_str() != Some(host.as_str()) {
            let _ = parsed.set_host(Some(&host));
        }
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    parsed.to_string()
}

// `www.www.example.com` and `www.example.com` share one key; a bare `www.com` stays
fn strip_www(host: &str) -> String {
    let mut host = host;
    while let Some(rest) = host.strip_prefix("www.").filter(|rest| rest.contains('.')) {
        host = rest;
    }
    host.to_string()
}

/// Decode redirect/tracking wrappers down to the embedded destination
///
/// Recognizes a percent-encoded `http(s)://` destination carried as one path
/// segment (`https://tracking.example.net/CL0/https:%2F%2Fsite.com%2Fa/1/xyz`)
/// or as the value of a known redirect query key (`?url=`, `?u=`, ...).
/// Returns the input unchanged when nothing is embedded, decoding fails, or
/// more than [`MAX_REDIRECT_HOPS`] wrappers are nested.
///
/// # Examples
///
/// ```
/// use mailbrief::canonical::resolve_tracking_url;
///
/// let wrapped = "https://tracking.example.net/CL0/https:%2F%2Fsite.com%2Fstory/1/abc";
/// assert_eq!(resolve_tracking_url(wrapped), "https://site.com/story");
/// ```
pub fn resolve_tracking_url(url: &str) -> String {
    let original = url.trim();
    let mut current = original.to_string();

    for _ in 0..MAX_REDIRECT_HOPS {
        match embedded_destination(&current) {
            Some(next) => current = next,
            None => return current,
        }
    }

    if embedded_destination(&current).is_some() {
        tracing::debug!(url = %original, "Redirect chain exceeds hop limit, keeping original");
        return original.to_string();
    }

    current
}

/// Check if a URL wraps another destination
pub fn is_tracking_redirect(url: &str) -> bool {
    embedded_destination(url.trim()).is_some()
}

/// Find the destination embedded in a single redirect wrapper
fn embedded_destination(url: &str) -> Option<String> {
    let parsed = parse_web_url(url)?;

    if let Some(segments) = parsed.path_segments() {
        for segment in segments.filter(|s| s.contains('%')) {
            if let Some(destination) = decode_destination(segment) {
                return Some(destination);
            }
        }
    }

    parsed
        .query_pairs()
        .find(|(key, value)| {
            REDIRECT_QUERY_KEYS.contains(&key.to_ascii_lowercase().as_str())
                && parse_web_url(value).is_some()
                && has_web_scheme(value)
        })
        .map(|(_, value)| value.trim().to_string())
}

/// Percent-decode a path segment (at most twice) into an absolute web URL
fn decode_destination(segment: &str) -> Option<String> {
    let mut decoded = urlencoding::decode(segment).ok()?.into_owned();

    if !has_web_scheme(&decoded) || decoded.contains("%2F") || decoded.contains("%2f") {
        decoded = urlencoding::decode(&decoded).ok()?.into_owned();
    }

    (has_web_scheme(&decoded) && parse_web_url(&decoded).is_some()).then_some(decoded)
}

fn has_web_scheme(value: &str) -> bool {
    let lower = value.trim_start().to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

/// Parse an absolute http(s) URL with a host, accepting bare and protocol-relative hosts
fn parse_web_url(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    let parsed = match Url::parse(raw) {
        Ok(parsed) => parsed,
        Err(url::ParseError::RelativeUrlWithoutBase) if raw.starts_with("//") => {
            Url::parse(&format!("https:{raw}")).ok()?
        }
        Err(url::ParseError::RelativeUrlWithoutBase) if looks_like_bare_host(raw) => {
            Url::parse(&format!("https://{raw}")).ok()?
        }
        Err(_) => return None,
    };

    let is_web = matches!(parsed.scheme(), "http" | "https")
        && parsed.host_str().is_some_and(|h| !h.is_empty());
    is_web.then_some(parsed)
}

fn looks_like_bare_host(raw: &str) -> bool {
    let host = raw.split(['/', '?', '#']).next().unwrap_or("");
    host.contains('.')
        && !host.starts_with('.')
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

/// Drop tracking pairs from a raw query string, preserving the rest verbatim
fn strip_tracking_params(query: &str) -> String {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split_once('=').map_or(*pair, |(k, _)| k);
            let key = urlencoding::decode(key)
                .map(|k| k.into_owned())
                .unwrap_or_else(|_| key.to_string());
            !is_tracking_param(&key)
        })
        .collect::<Vec<_>>()
        .join("&")
}
