//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the breadth-first crawl loop that coordinates:
//! - robots.txt checks through the shared policy cache
//! - Politeness pacing between requests
//! - Fetching, extraction and classification
//! - Link discovery under the depth budget
//! - Findings aggregation once traversal ends
//!
//! Each dequeued item ends in one [`PageState`] outcome: `Accepted` items
//! become page records, `RobotsBlocked` and `FetchFailed` items become crawl
//! errors, and `NonHtmlSkipped` items leave no trace.

use crate::crawler::scheduler::{QueueItem, Scheduler};
use crate::crawler::{
    build_http_client, classify, extract, fetch_url, CrawlError, CrawlRequest, CrawlResult,
    CrawlSettings, PageRecord,
};
use crate::findings::aggregate_findings;
use crate::robots::RobotsCache;
use crate::state::PageState;
use crate::url::{canonical_url, same_origin};
use crate::Result;
use chrono::Utc;
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use url::Url;

/// Runs research crawls with a shared HTTP client and robots.txt cache
pub struct Crawler {
    client: Client,
    robots: Arc<RobotsCache>,
    settings: CrawlSettings,
}

/// Mutable state of a single crawl run
struct CrawlRun {
    start: Url,
    scheduler: Scheduler,
    pages: Vec<PageRecord>,
    errors: Vec<CrawlError>,
}

impl Crawler {
    /// Creates a crawler with its own robots.txt cache
    ///
    /// # Arguments
    ///
    /// * `settings` - Pacing, timeouts and user agent
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run crawls
    /// * `Err(ResearchError)` - The HTTP client could not be built
    pub fn new(settings: CrawlSettings) -> Result<Self> {
        let client = build_http_client(&settings.user_agent)?;
        let robots = Arc::new(RobotsCache::new(
            client.clone(),
            settings.user_agent.user_agent_string(),
            settings.robots_timeout,
            settings.robots_ttl,
        ));

        Ok(Self {
            client,
            robots,
            settings,
        })
    }

    /// Creates a crawler that shares an existing robots.txt cache
    pub fn with_robots_cache(settings: CrawlSettings, robots: Arc<RobotsCache>) -> Result<Self> {
        let client = build_http_client(&settings.user_agent)?;
        Ok(Self {
            client,
            robots,
            settings,
        })
    }

    pub fn robots_cache(&self) -> Arc<RobotsCache> {
        Arc::clone(&self.robots)
    }

    /// Runs one crawl to completion
    ///
    /// The loop ends when the queue is empty or the page budget is reached.
    /// No single page failure aborts the crawl.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlResult)` - Pages in BFS order, per-page errors and findings
    /// * `Err(ResearchError)` - Invalid start URL or empty page budget
    pub async fn run(&self, request: &CrawlRequest) -> Result<CrawlResult> {
        let start = request.validate()?;
        let request = request.clamped();
        let max_pages = request.max_pages as usize;

        tracing::info!(
            "Starting crawl of {} (max_pages={}, max_depth={})",
            start,
            request.max_pages,
            request.max_depth
        );

        let mut run = CrawlRun {
            scheduler: Scheduler::new(
                QueueItem::root(start.as_str()),
                request.max_depth,
                self.settings.request_delay,
            ),
            start,
            pages: Vec::new(),
            errors: Vec::new(),
        };

        let started = std::time::Instant::now();
        let mut outcomes: BTreeMap<PageState, usize> = BTreeMap::new();

        while run.pages.len() < max_pages {
            let Some(item) = run.scheduler.next_item() else {
                tracing::debug!("Queue is empty, crawl complete");
                break;
            };

            tracing::debug!("Processing {} (depth {})", item.url, item.depth);
            let url = item.url.clone();
            if let Some(state) = self.process_item(&mut run, item).await {
                tracing::trace!("{} -> {}", url, state);
                *outcomes.entry(state).or_default() += 1;
            }
        }

        let findings = aggregate_findings(&run.pages);

        let breakdown: Vec<String> = outcomes
            .iter()
            .map(|(state, count)| format!("{}={}", state, count))
            .collect();
        let failed: usize = outcomes
            .iter()
            .filter(|(state, _)| state.is_error())
            .map(|(_, count)| count)
            .sum();
        debug_assert_eq!(failed, run.errors.len());

        tracing::info!(
            "Crawl of {} finished in {:.1}s: {} pages, {} errors, {} still queued [{}]",
            run.start,
            started.elapsed().as_secs_f64(),
            run.pages.len(),
            failed,
            run.scheduler.queue_len(),
            breakdown.join(", ")
        );

        Ok(CrawlResult {
            pages: run.pages,
            errors: run.errors,
            findings,
        })
    }

    /// Processes one dequeued item
    ///
    /// Returns the terminal state, or None when the item was dropped because
    /// its redirect target had already been visited.
    async fn process_item(&self, run: &mut CrawlRun, item: QueueItem) -> Option<PageState> {
        let url = match Url::parse(&item.url) {
            Ok(url) => url,
            Err(e) => {
                run.errors
                    .push(CrawlError::fetch_failed(&item.url, item.depth, e.to_string()));
                return Some(PageState::FetchFailed);
            }
        };

        if !self.robots.is_allowed(&url).await {
            tracing::debug!("Blocked by robots.txt: {}", item.url);
            run.errors
                .push(CrawlError::robots_blocked(&item.url, item.depth));
            return Some(PageState::RobotsBlocked);
        }

        run.scheduler.wait_for_turn().await;
        let fetched = fetch_url(&self.client, &item.url, self.settings.fetch_timeout).await;

        if !fetched.ok {
            let reason = fetched
                .error
                .unwrap_or_else(|| format!("HTTP {}", fetched.status));
            tracing::debug!("Fetch failed for {}: {}", item.url, reason);
            run.errors
                .push(CrawlError::fetch_failed(&item.url, item.depth, reason));
            return Some(PageState::FetchFailed);
        }

        let final_url = match canonical_url(&fetched.final_url) {
            Ok(final_url) => final_url,
            Err(_) => url.clone(),
        };

        if final_url.as_str() != item.url {
            if item.depth == 0 && !same_origin(&final_url, &run.start) {
                tracing::info!("Start URL redirected to {}; crawling that origin", final_url);
                run.start = final_url.clone();

                if !self.robots.is_allowed(&final_url).await {
                    run.errors
                        .push(CrawlError::robots_blocked(&item.url, item.depth));
                    return Some(PageState::RobotsBlocked);
                }
            }

            if !same_origin(&final_url, &run.start) {
                tracing::debug!("{} redirected off-origin to {}", item.url, final_url);
                run.errors.push(CrawlError::fetch_failed(
                    &item.url,
                    item.depth,
                    format!("Redirected to another origin: {}", final_url),
                ));
                return Some(PageState::FetchFailed);
            }

            if !run.scheduler.mark_visited(final_url.as_str()) {
                tracing::debug!("{} redirected to already visited {}", item.url, final_url);
                return None;
            }
        }

        if !fetched.is_html() {
            tracing::debug!(
                "Skipping non-HTML {} ({})",
                final_url,
                fetched.content_type.as_deref().unwrap_or("no content type")
            );
            return Some(PageState::NonHtmlSkipped);
        }

        let html = fetched.html().unwrap_or_default().to_string();
        let content = extract(&html, &final_url);
        if content.title.is_none() && content.text.is_empty() {
            tracing::warn!("No title or text extracted from {}", final_url);
        }

        let classification = classify(
            final_url.as_str(),
            content.title.as_deref().unwrap_or_default(),
            &content.text,
        );

        let added = run
            .scheduler
            .enqueue_links(&content.outbound_links, item.depth, final_url.as_str());
        tracing::trace!("{} new links queued from {}", added, final_url);

        run.pages.push(PageRecord {
            url: final_url.to_string(),
            parent_url: item.parent_url,
            depth: item.depth,
            http_status: fetched.status,
            content_type: fetched.content_type.unwrap_or_default(),
            title: content.title,
            meta_description: content.meta_description,
            language: content.language,
            text: content.text,
            raw_html: html,
            outbound_links: content.outbound_links,
            fetched_at: Utc::now(),
            classification,
        });

        Some(PageState::Accepted)
    }
}
