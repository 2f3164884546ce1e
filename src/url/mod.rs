//! URL handling module for Site-Research
//!
//! This module provides URL normalization, traversal canonicalization and
//! same-origin comparison. Every place that compares URLs or uses one as a
//! dedup key goes through these functions.

mod normalize;

pub use normalize::{canonical_url, normalize_url};

use url::Url;

/// Checks whether two URLs share scheme, host and port
///
/// Ports are compared after default-port resolution, so `https://a.com` and
/// `https://a.com:443/x` are the same origin. Paths, queries and fragments are
/// ignored.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_research::url::same_origin;
///
/// let a = Url::parse("https://example.com/pricing").unwrap();
/// let b = Url::parse("https://EXAMPLE.com:443/about").unwrap();
/// assert!(same_origin(&a, &b));
/// ```
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && host_key(a) == host_key(b)
        && a.port_or_known_default() == b.port_or_known_default()
}

/// String form of [`same_origin`]; unparseable inputs are never same-origin
pub fn same_origin_str(a: &str, b: &str) -> bool {
    match (normalize_url(a), normalize_url(b)) {
        (Ok(a), Ok(b)) => same_origin(&a, &b),
        _ => false,
    }
}

/// Serializes the origin of a URL as `scheme://host[:port]`
///
/// Default ports are omitted.
pub fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

fn host_key(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
