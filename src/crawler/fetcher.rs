//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Timeout-bounded GET requests that follow redirects
//! - Reporting the post-redirect URL
//! - Splitting HTML payloads from binary ones by Content-Type

use crate::config::UserAgentConfig;
use reqwest::{header, redirect::Policy, Client};
use std::collections::HashMap;
use std::time::Duration;

/// Accept header sent with page requests
pub const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Payload of a successful fetch
#[derive(Debug, Clone, PartialEq)]
pub enum FetchBody {
    /// `text/html` or `application/xhtml+xml`, decoded as text
    Html(String),
    /// Any other content type, kept as raw bytes
    Bytes(Vec<u8>),
}

/// Result of a fetch operation
///
/// Failures are values, not errors: `ok == false` with `status == 0` means the
/// request never produced a response (transport failure or timeout).
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub ok: bool,
    pub status: u16,
    /// Final URL after redirects
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Option<FetchBody>,
    /// Response headers, lower-cased names
    pub headers: HashMap<String, String>,
    pub error: Option<String>,
}

impl FetchResult {
    fn failed(url: &str, status: u16, error: String) -> Self {
        Self {
            ok: false,
            status,
            final_url: url.to_string(),
            content_type: None,
            body: None,
            headers: HashMap::new(),
            error: Some(error),
        }
    }

    /// Returns the HTML body, if this fetch produced one
    pub fn html(&self) -> Option<&str> {
        match &self.body {
            Some(FetchBody::Html(html)) => Some(html),
            _ => None,
        }
    }

    /// Returns true if the response Content-Type is HTML or XHTML
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(is_html_content_type)
            .unwrap_or(false)
    }
}

/// Checks whether a Content-Type header value denotes an HTML document
pub fn is_html_content_type(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    lower.contains("text/html") || lower.contains("application/xhtml+xml")
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed by reqwest (up to 10 hops); timeouts are applied
/// per request by [`fetch_url`].
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use site_research::config::UserAgentConfig;
/// use site_research::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent_string())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL with a hard timeout
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `timeout` - Aborts the in-flight request when exceeded
///
/// # Returns
///
/// A `FetchResult`; non-2xx responses carry `error = "HTTP {status}"`, and
/// transport failures carry `status = 0` with the underlying message.
pub async fn fetch_url(client: &Client, url: &str, timeout: Duration) -> FetchResult {
    let response = match client
        .get(url)
        .header(header::ACCEPT, HTML_ACCEPT)
        .timeout(timeout)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            let error = if e.is_timeout() {
                format!("Request timed out after {}ms", timeout.as_millis())
            } else {
                e.to_string()
            };
            return FetchResult::failed(url, 0, error);
        }
    };

    let status = response.status();
    let final_url = response.url().to_string();
    let headers: HashMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect();
    let content_type = headers.get("content-type").cloned();

    if !status.is_success() {
        return FetchResult {
            ok: false,
            status: status.as_u16(),
            final_url,
            content_type,
            body: None,
            headers,
            error: Some(format!("HTTP {}", status.as_u16())),
        };
    }

    let html = content_type
        .as_deref()
        .map(is_html_content_type)
        .unwrap_or(false);

    let body = if html {
        response.text().await.map(FetchBody::Html)
    } else {
        response
            .bytes()
            .await
            .map(|bytes| FetchBody::Bytes(bytes.to_vec()))
    };

    match body {
        Ok(body) => FetchResult {
            ok: true,
            status: status.as_u16(),
            final_url,
            content_type,
            body: Some(body),
            headers,
            error: None,
        },
        Err(e) => FetchResult {
            ok: false,
            status: status.as_u16(),
            final_url,
            content_type,
            body: None,
            headers,
            error: Some(e.to_string()),
        },
    }
}
