//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! Every failure path fails open: a site without a readable robots.txt is crawlable.

mod cache;
mod parser;

pub use cache::{RobotsCache, DEFAULT_ROBOTS_TTL_HOURS};
pub use parser::{parse_disallow_rules, RobotsPolicy};

use reqwest::Client;
use std::time::Duration;

/// Fetches `{origin}/robots.txt`
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `origin` - The origin (`scheme://host[:port]`) to fetch from
/// * `user_agent` - The user agent string to send
/// * `timeout` - Hard timeout for the request
///
/// # Returns
///
/// * `Some(String)` - The robots.txt body (possibly empty)
/// * `None` - Non-2xx status, transport failure or timeout
pub async fn fetch_robots(
    client: &Client,
    origin: &str,
    user_agent: &str,
    timeout: Duration,
) -> Option<String> {
    let robots_url = format!("{}/robots.txt", origin.trim_end_matches('/'));

    let response = match client
        .get(&robots_url)
        .header(reqwest::header::USER_AGENT, user_agent)
        .header(reqwest::header::ACCEPT, "text/plain,*/*;q=0.1")
        .timeout(timeout)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("robots.txt fetch failed for {}: {}", origin, e);
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!(
            "robots.txt for {} returned HTTP {}",
            origin,
            response.status().as_u16()
        );
        return None;
    }

    match response.text().await {
        Ok(body) => Some(body),
        Err(e) => {
            tracing::debug!("robots.txt body unreadable for {}: {}", origin, e);
            None
        }
    }
}
