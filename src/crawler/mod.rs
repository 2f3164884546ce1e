//! Crawler module for bounded same-origin research crawls
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with timeouts and redirect reporting
//! - HTML content extraction and link discovery
//! - Heuristic page classification
//! - Breadth-first scheduling under page and depth budgets
//! - Overall crawl coordination

mod classifier;
mod coordinator;
mod extractor;
mod fetcher;
mod scheduler;

pub use classifier::{
    classify, Classification, PageType, Rule, RuleSource, DEFAULT_CONFIDENCE, RULES,
    TEXT_PREFIX_CHARS,
};
pub use coordinator::Crawler;
pub use extractor::{
    collapse_whitespace, extract, extract_image_alts, extract_visible_text, ExtractedContent,
};
pub use fetcher::{build_http_client, fetch_url, is_html_content_type, FetchBody, FetchResult};
pub use scheduler::{QueueItem, Scheduler};

use crate::config::{Config, UserAgentConfig};
use crate::findings::Findings;
use crate::url::canonical_url;
use crate::{ResearchError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Hard ceiling on pages per crawl
pub const MAX_PAGES_CAP: u32 = 200;

/// Hard ceiling on link depth
pub const MAX_DEPTH_CAP: u32 = 3;

pub const DEFAULT_MAX_PAGES: u32 = 30;
pub const DEFAULT_MAX_DEPTH: u32 = 2;

/// Error string recorded for URLs disallowed by robots.txt
pub const ROBOTS_BLOCKED_REASON: &str = "Blocked by robots.txt";

/// A request to research one website
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlRequest {
    pub start_url: String,
    pub max_pages: u32,
    pub max_depth: u32,
    pub include_sitemap: bool,
}

impl CrawlRequest {
    /// Creates a request with the default budget (30 pages, depth 2)
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            max_pages: DEFAULT_MAX_PAGES,
            max_depth: DEFAULT_MAX_DEPTH,
            include_sitemap: true,
        }
    }

    /// Sets the page budget, clamped to [`MAX_PAGES_CAP`]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.min(MAX_PAGES_CAP);
        self
    }

    /// Sets the depth budget, clamped to [`MAX_DEPTH_CAP`]
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth.min(MAX_DEPTH_CAP);
        self
    }

    pub fn with_sitemap(mut self, include_sitemap: bool) -> Self {
        self.include_sitemap = include_sitemap;
        self
    }

    /// Returns a copy with both budgets clamped to their hard caps
    ///
    /// Requests built as struct literals or deserialized bypass the
    /// `with_max_*` builders, so the crawler clamps again before traversal.
    pub fn clamped(&self) -> Self {
        Self {
            max_pages: self.max_pages.min(MAX_PAGES_CAP),
            max_depth: self.max_depth.min(MAX_DEPTH_CAP),
            ..self.clone()
        }
    }

    /// Checks the request and returns the canonical start URL
    ///
    /// # Returns
    ///
    /// * `Ok(Url)` - The canonical start URL
    /// * `Err(ResearchError::InvalidUrl)` - The start URL is not absolute http(s)
    /// * `Err(ResearchError::EmptyBudget)` - `max_pages` is zero
    pub fn validate(&self) -> Result<Url> {
        let start = canonical_url(&self.start_url)?;
        if self.max_pages == 0 {
            return Err(ResearchError::EmptyBudget);
        }
        Ok(start)
    }
}

/// Crawler settings shared by all crawls of one process
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub user_agent: UserAgentConfig,
    /// Politeness delay between successive requests
    pub request_delay: Duration,
    pub fetch_timeout: Duration,
    pub robots_timeout: Duration,
    pub robots_ttl: chrono::Duration,
}

impl CrawlSettings {
    /// Builds settings from the `[crawler]` and `[user-agent]` sections
    pub fn from_config(config: &Config) -> Self {
        let crawler = &config.crawler;
        Self {
            user_agent: config.user_agent.clone(),
            request_delay: Duration::from_millis(crawler.request_delay_ms),
            fetch_timeout: Duration::from_secs(crawler.fetch_timeout_secs),
            robots_timeout: Duration::from_secs(crawler.robots_timeout_secs),
            robots_ttl: chrono::Duration::hours(crawler.robots_ttl_hours),
        }
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// One successfully fetched, allowed HTML page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Canonical URL after redirects
    pub url: String,
    pub parent_url: Option<String>,
    pub depth: u32,
    pub http_status: u16,
    pub content_type: String,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub language: Option<String>,
    /// Visible text, whitespace collapsed
    pub text: String,
    pub raw_html: String,
    pub outbound_links: Vec<String>,
    pub fetched_at: DateTime<Utc>,
    pub classification: Classification,
}

/// Why a queue item produced no page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlErrorKind {
    RobotsBlocked,
    FetchFailed,
}

impl CrawlErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrawlErrorKind::RobotsBlocked => "robots_blocked",
            CrawlErrorKind::FetchFailed => "fetch_failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "robots_blocked" => Some(CrawlErrorKind::RobotsBlocked),
            "fetch_failed" => Some(CrawlErrorKind::FetchFailed),
            _ => None,
        }
    }
}

/// A queue item that could not produce a page record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlError {
    pub url: String,
    pub depth: u32,
    pub kind: CrawlErrorKind,
    pub error: String,
}

impl CrawlError {
    pub fn robots_blocked(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
            kind: CrawlErrorKind::RobotsBlocked,
            error: ROBOTS_BLOCKED_REASON.to_string(),
        }
    }

    pub fn fetch_failed(url: impl Into<String>, depth: u32, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth,
            kind: CrawlErrorKind::FetchFailed,
            error: reason.into(),
        }
    }
}

impl fmt::Display for CrawlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (depth {}): {}", self.url, self.depth, self.error)
    }
}

/// Outcome of one crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    /// Pages in breadth-first order
    pub pages: Vec<PageRecord>,
    pub errors: Vec<CrawlError>,
    pub findings: Findings,
}

/// Runs a complete research crawl
///
/// This is the main entry point for a crawl. It will:
/// 1. Validate the request and canonicalize the start URL
/// 2. Build the HTTP client and robots.txt cache
/// 3. Traverse the site breadth-first under the page and depth budgets
/// 4. Aggregate findings from the collected pages
///
/// # Arguments
///
/// * `request` - Start URL and budgets
/// * `settings` - Pacing, timeouts and user agent
///
/// # Returns
///
/// * `Ok(CrawlResult)` - Pages, per-page errors and findings; partial success is normal
/// * `Err(ResearchError)` - Malformed start URL, zero page budget, or client setup failure
pub async fn research_site(request: &CrawlRequest, settings: &CrawlSettings) -> Result<CrawlResult> {
    let crawler = Crawler::new(settings.clone())?;
    crawler.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = CrawlRequest::new("https://example.com");
        assert_eq!(request.max_pages, 30);
        assert_eq!(request.max_depth, 2);
        assert!(request.include_sitemap);
    }

    #[test]
    fn test_request_budget_is_clamped() {
        let request = CrawlRequest::new("https://example.com")
            .with_max_pages(1000)
            .with_max_depth(9);
        assert_eq!(request.max_pages, MAX_PAGES_CAP);
        assert_eq!(request.max_depth, MAX_DEPTH_CAP);
    }

    #[test]
    fn test_deserialized_request_is_clamped() {
        let request: CrawlRequest = serde_json::from_str(
            r#"{"start_url":"https://example.com","max_pages":1000,"max_depth":9,"include_sitemap":false}"#,
        )
        .unwrap();
        assert_eq!(request.max_pages, 1000);

        let clamped = request.clamped();
        assert_eq!(clamped.max_pages, MAX_PAGES_CAP);
        assert_eq!(clamped.max_depth, MAX_DEPTH_CAP);
        assert!(!clamped.include_sitemap);

        let small = CrawlRequest::new("https://example.com").with_max_depth(1);
        assert_eq!(small.clamped(), small);
    }

    #[test]
    fn test_validate_returns_canonical_start() {
        let request = CrawlRequest::new("HTTPS://Example.com:443/about/#team");
        assert_eq!(request.validate().unwrap().as_str(), "https://example.com/about");
    }

    #[test]
    fn test_validate_rejects_bad_start_url() {
        for start in ["not a url", "/relative/path", "ftp://example.com/file"] {
            let result = CrawlRequest::new(start).validate();
            assert!(matches!(result, Err(ResearchError::InvalidUrl(_))), "{}", start);
        }
    }

    #[test]
    fn test_validate_rejects_empty_budget() {
        let result = CrawlRequest::new("https://example.com").with_max_pages(0).validate();
        assert!(matches!(result, Err(ResearchError::EmptyBudget)));
    }

    #[test]
    fn test_settings_from_default_config() {
        let settings = CrawlSettings::default();
        assert_eq!(settings.request_delay, Duration::from_millis(2000));
        assert_eq!(settings.fetch_timeout, Duration::from_secs(15));
        assert_eq!(settings.robots_ttl, chrono::Duration::hours(6));
    }

    #[test]
    fn test_crawl_error_constructors() {
        let blocked = CrawlError::robots_blocked("https://example.com/x", 1);
        assert_eq!(blocked.error, "Blocked by robots.txt");
        assert_eq!(blocked.kind, CrawlErrorKind::RobotsBlocked);

        let failed = CrawlError::fetch_failed("https://example.com/y", 2, "HTTP 500");
        assert_eq!(failed.kind, CrawlErrorKind::FetchFailed);
        assert_eq!(CrawlErrorKind::parse(failed.kind.as_str()), Some(failed.kind));
    }
}
