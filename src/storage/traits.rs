//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::crawler::{CrawlError, CrawlRequest, PageRecord};
use crate::enrich::Entity;
use crate::findings::Findings;
use crate::storage::{CrawlRecord, CrawlStatus, StoredEntity, StoredPage};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Crawl not found: {0}")]
    CrawlNotFound(i64),

    #[error("Page not found in crawl {crawl_id}: {url}")]
    PageNotFound { crawl_id: i64, url: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Per-page writes are upserts keyed by (crawl_id, url): writing the same
/// page twice overwrites the first write.
pub trait Storage {
    // ===== Crawl Management =====

    /// Creates a new crawl record in the `running` state
    ///
    /// # Arguments
    ///
    /// * `request` - The crawl request being persisted
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created crawl
    fn create_crawl(&mut self, request: &CrawlRequest, config_hash: &str) -> StorageResult<i64>;

    /// Marks a crawl finished with the given status
    fn complete_crawl(&mut self, crawl_id: i64, status: CrawlStatus) -> StorageResult<()>;

    /// Gets a crawl by ID
    fn get_crawl(&self, crawl_id: i64) -> StorageResult<CrawlRecord>;

    /// Finds the most recent crawl of a start URL
    ///
    /// Tries an exact match first, then any crawl whose start URL begins with
    /// `start_url`.
    fn latest_crawl_for(&self, start_url: &str) -> StorageResult<Option<CrawlRecord>>;

    // ===== Pages and Errors =====

    /// Inserts or replaces a page
    fn upsert_page(&mut self, crawl_id: i64, page: &PageRecord) -> StorageResult<()>;

    /// Inserts or replaces a crawl error
    fn upsert_error(&mut self, crawl_id: i64, error: &CrawlError) -> StorageResult<()>;

    /// Sets the enrichment summary of a stored page
    fn set_page_summary(&mut self, crawl_id: i64, url: &str, summary: &str) -> StorageResult<()>;

    /// Gets the pages of a crawl ordered by depth, then URL
    fn get_pages(&self, crawl_id: i64) -> StorageResult<Vec<StoredPage>>;

    /// Gets the errors of a crawl ordered by depth, then URL
    fn get_errors(&self, crawl_id: i64) -> StorageResult<Vec<CrawlError>>;

    fn count_pages(&self, crawl_id: i64) -> StorageResult<u64>;

    // ===== Entities and Findings =====

    /// Records an entity; duplicates are ignored
    fn insert_entity(&mut self, crawl_id: i64, url: &str, entity: &Entity) -> StorageResult<()>;

    fn get_entities(&self, crawl_id: i64) -> StorageResult<Vec<StoredEntity>>;

    /// Inserts or replaces the findings of a crawl
    fn save_findings(&mut self, crawl_id: i64, findings: &Findings) -> StorageResult<()>;

    fn get_findings(&self, crawl_id: i64) -> StorageResult<Option<Findings>>;
}
