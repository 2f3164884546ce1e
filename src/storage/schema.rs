//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the research database.
//! Every per-page table is keyed by (crawl_id, url) so re-persisting a crawl
//! overwrites instead of duplicating.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per research crawl
CREATE TABLE IF NOT EXISTS crawls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    start_url TEXT NOT NULL,
    max_pages INTEGER NOT NULL,
    max_depth INTEGER NOT NULL,
    include_sitemap INTEGER NOT NULL,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_crawls_start_url ON crawls(start_url);

-- Pages accepted by a crawl
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crawl_id INTEGER NOT NULL REFERENCES crawls(id),
    url TEXT NOT NULL,
    parent_url TEXT,
    depth INTEGER NOT NULL,
    http_status INTEGER NOT NULL,
    content_type TEXT NOT NULL,
    title TEXT,
    meta_description TEXT,
    language TEXT,
    page_type TEXT NOT NULL,
    confidence REAL NOT NULL,
    text TEXT NOT NULL,
    raw_html TEXT NOT NULL,
    outbound_links TEXT NOT NULL,
    fetched_at TEXT NOT NULL,
    summary TEXT,
    UNIQUE(crawl_id, url)
);

CREATE INDEX IF NOT EXISTS idx_pages_crawl ON pages(crawl_id);

-- Queue items that produced no page
CREATE TABLE IF NOT EXISTS crawl_errors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crawl_id INTEGER NOT NULL REFERENCES crawls(id),
    url TEXT NOT NULL,
    depth INTEGER NOT NULL,
    kind TEXT NOT NULL,
    error TEXT NOT NULL,
    UNIQUE(crawl_id, url)
);

-- Entities extracted during enrichment
CREATE TABLE IF NOT EXISTS page_entities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crawl_id INTEGER NOT NULL REFERENCES crawls(id),
    url TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    entity_value TEXT NOT NULL,
    confidence REAL,
    UNIQUE(crawl_id, url, entity_type, entity_value)
);

-- Aggregated findings, one JSON document per crawl
CREATE TABLE IF NOT EXISTS findings (
    crawl_id INTEGER PRIMARY KEY REFERENCES crawls(id),
    findings_json TEXT NOT NULL,
    computed_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// Safe to call on an existing database.
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
