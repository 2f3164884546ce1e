use crate::UrlError;
use url::Url;

/// Normalizes a URL according to Site-Research's normalization rules
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not absolute
/// 2. Reject schemes other than `http` and `https`
/// 3. Lowercase the host
/// 4. Remove fragment (everything after #)
/// 5. Drop default ports (80 for http, 443 for https)
/// 6. Collapse repeated path separators
///
/// The query string is kept verbatim.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use site_research::url::normalize_url;
///
/// let url = normalize_url("HTTP://Example.COM:80//a//b#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/a/b");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(UrlError::MissingHost)?
        .to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;

    url.set_fragment(None);

    // The parser already elides known default ports; this covers explicit ones
    // that slip through on re-serialization.
    if url.port().is_some() && url.port() == default_port(url.scheme()) {
        url.set_port(None)
            .map_err(|_| UrlError::Parse("Failed to strip default port".to_string()))?;
    }

    let collapsed = collapse_separators(url.path());
    if collapsed != url.path() {
        url.set_path(&collapsed);
    }

    Ok(url)
}

/// Normalizes a URL for use as a traversal dedup key
///
/// Applies [`normalize_url`] and then strips a single trailing path separator,
/// except for the root path.
///
/// # Examples
///
/// ```
/// use site_research::url::canonical_url;
///
/// assert_eq!(canonical_url("https://example.com/about/").unwrap().as_str(), "https://example.com/about");
/// assert_eq!(canonical_url("https://example.com").unwrap().as_str(), "https://example.com/");
/// ```
pub fn canonical_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = normalize_url(url_str)?;

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path[..path.len() - 1].to_string();
        url.set_path(&trimmed);
    }

    Ok(url)
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

/// Replaces every run of `/` in a path with a single `/`
fn collapse_separators(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_slash = false;

    for c in path.chars() {
        if c == '/' {
            if !previous_slash {
                out.push(c);
            }
            previous_slash = true;
        } else {
            out.push(c);
            previous_slash = false;
        }
    }

    if out.is_empty() {
        out.push('/');
    }
    out
}
