//! Storage module for persisting research crawls
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Crawl tracking with the config hash used for each run
//! - Idempotent page and error persistence keyed by (crawl, url)
//! - Enrichment summaries and entities
//! - Findings snapshots

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::crawler::{CrawlRequest, CrawlResult, PageType};
use crate::enrich::{Entity, PageEnrichment};
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(ResearchError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> crate::Result<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Represents a crawl in the database
#[derive(Debug, Clone)]
pub struct CrawlRecord {
    pub id: i64,
    pub start_url: String,
    pub max_pages: u32,
    pub max_depth: u32,
    pub include_sitemap: bool,
    pub config_hash: String,
    pub status: CrawlStatus,
    pub started_at: String,
    pub finished_at: Option<String>,
}

/// Represents a stored page, without its HTML
#[derive(Debug, Clone)]
pub struct StoredPage {
    pub url: String,
    pub parent_url: Option<String>,
    pub depth: u32,
    pub http_status: u16,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub language: Option<String>,
    pub page_type: PageType,
    pub confidence: f32,
    pub fetched_at: String,
    pub summary: Option<String>,
}

/// An entity together with the page it was found on
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntity {
    pub url: String,
    pub entity: Entity,
}

/// Status of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStatus {
    Running,
    Completed,
    Failed,
}

impl CrawlStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Persists a whole crawl result
///
/// Creates the crawl record, writes pages, errors and findings, then marks the
/// crawl completed. If any write fails the crawl is marked failed and the
/// error is returned.
///
/// # Returns
///
/// The ID of the new crawl
pub fn persist_result<S: Storage>(
    storage: &mut S,
    request: &CrawlRequest,
    config_hash: &str,
    result: &CrawlResult,
) -> StorageResult<i64> {
    let crawl_id = storage.create_crawl(request, config_hash)?;

    let written = write_result(storage, crawl_id, result);
    match written {
        Ok(()) => {
            storage.complete_crawl(crawl_id, CrawlStatus::Completed)?;
            tracing::info!(
                "Persisted crawl {}: {} pages, {} errors",
                crawl_id,
                result.pages.len(),
                result.errors.len()
            );
            Ok(crawl_id)
        }
        Err(e) => {
            tracing::error!("Failed to persist crawl {}: {}", crawl_id, e);
            storage.complete_crawl(crawl_id, CrawlStatus::Failed)?;
            Err(e)
        }
    }
}

fn write_result<S: Storage>(storage: &mut S, crawl_id: i64, result: &CrawlResult) -> StorageResult<()> {
    for page in &result.pages {
        storage.upsert_page(crawl_id, page)?;
    }
    for error in &result.errors {
        storage.upsert_error(crawl_id, error)?;
    }
    storage.save_findings(crawl_id, &result.findings)
}

/// Stores page summaries and entities produced by enrichment
pub fn persist_enrichment<S: Storage>(
    storage: &mut S,
    crawl_id: i64,
    enrichments: &[PageEnrichment],
) -> StorageResult<()> {
    for enrichment in enrichments {
        if let Some(summary) = &enrichment.summary {
            storage.set_page_summary(crawl_id, &enrichment.url, summary)?;
        }
        for entity in &enrichment.entities {
            storage.insert_entity(crawl_id, &enrichment.url, entity)?;
        }
    }
    Ok(())
}
