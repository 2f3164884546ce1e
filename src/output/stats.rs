//! Statistics of stored crawls
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::crawler::CrawlErrorKind;
use crate::output::OutputResult;
use crate::storage::{CrawlRecord, Storage};
use std::collections::BTreeMap;

/// Statistics of one stored crawl
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    pub crawl: CrawlRecord,

    /// Number of stored pages
    pub total_pages: u64,

    /// Count of pages by page type
    pub pages_by_type: BTreeMap<String, u64>,

    /// Count of pages by depth
    pub pages_by_depth: BTreeMap<u32, u64>,

    pub robots_blocked: u64,
    pub fetch_failed: u64,

    /// Number of pages carrying an enrichment summary
    pub summarized_pages: u64,

    pub entities: u64,
    pub has_findings: bool,
}

/// Loads statistics of a crawl from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `crawl_id` - The crawl to report on
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(OutputError)` - Unknown crawl or failed query
pub fn load_statistics<S: Storage>(storage: &S, crawl_id: i64) -> OutputResult<CrawlStatistics> {
    let crawl = storage.get_crawl(crawl_id)?;
    let total_pages = storage.count_pages(crawl_id)?;
    let pages = storage.get_pages(crawl_id)?;
    let errors = storage.get_errors(crawl_id)?;

    let mut pages_by_type = BTreeMap::new();
    let mut pages_by_depth = BTreeMap::new();
    for page in &pages {
        *pages_by_type
            .entry(page.page_type.as_str().to_string())
            .or_insert(0) += 1;
        *pages_by_depth.entry(page.depth).or_insert(0) += 1;
    }

    let robots_blocked = errors
        .iter()
        .filter(|e| e.kind == CrawlErrorKind::RobotsBlocked)
        .count() as u64;

    Ok(CrawlStatistics {
        crawl,
        total_pages,
        pages_by_type,
        pages_by_depth,
        robots_blocked,
        fetch_failed: errors.len() as u64 - robots_blocked,
        summarized_pages: pages.iter().filter(|p| p.summary.is_some()).count() as u64,
        entities: storage.get_entities(crawl_id)?.len() as u64,
        has_findings: storage.get_findings(crawl_id)?.is_some(),
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    let crawl = &stats.crawl;
    println!("=== Crawl {} Statistics ===\n", crawl.id);

    println!("Crawl:");
    println!("  Start URL: {}", crawl.start_url);
    println!("  Status: {}", crawl.status.to_db_string());
    println!("  Started: {}", crawl.started_at);
    if let Some(finished) = &crawl.finished_at {
        println!("  Finished: {}", finished);
    }
    println!(
        "  Budget: {} pages, depth {}, sitemap {}",
        crawl.max_pages,
        crawl.max_depth,
        if crawl.include_sitemap { "on" } else { "off" }
    );
    println!("  Config hash: {}", crawl.config_hash);
    println!();

    println!("Pages: {}", stats.total_pages);
    for (page_type, count) in &stats.pages_by_type {
        println!("  {}: {}", page_type, count);
    }
    println!();

    println!("Pages by Depth:");
    for (depth, count) in &stats.pages_by_depth {
        println!("  {}: {}", depth, count);
    }
    println!();

    println!("Errors:");
    println!("  Blocked by robots.txt: {}", stats.robots_blocked);
    println!("  Fetch failed: {}", stats.fetch_failed);
    println!();

    println!("Enrichment:");
    println!("  Summarized pages: {}", stats.summarized_pages);
    println!("  Entities: {}", stats.entities);
    println!(
        "Findings: {}",
        if stats.has_findings { "stored" } else { "missing" }
    );
}
