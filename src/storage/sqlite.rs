//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::{CrawlError, CrawlErrorKind, CrawlRequest, PageRecord, PageType};
use crate::enrich::Entity;
use crate::findings::Findings;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{CrawlRecord, CrawlStatus, StoredEntity, StoredPage};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

const CRAWL_COLUMNS: &str = "id, start_url, max_pages, max_depth, include_sitemap, config_hash, status, started_at, finished_at";

fn crawl_from_row(row: &Row<'_>) -> rusqlite::Result<CrawlRecord> {
    Ok(CrawlRecord {
        id: row.get(0)?,
        start_url: row.get(1)?,
        max_pages: row.get(2)?,
        max_depth: row.get(3)?,
        include_sitemap: row.get(4)?,
        config_hash: row.get(5)?,
        status: CrawlStatus::from_db_string(&row.get::<_, String>(6)?)
            .unwrap_or(CrawlStatus::Running),
        started_at: row.get(7)?,
        finished_at: row.get(8)?,
    })
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(ResearchError)` - Failed to open database
    pub fn new(path: &Path) -> crate::Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> crate::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn find_latest(&self, sql: &str, param: &str) -> StorageResult<Option<CrawlRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        Ok(stmt.query_row(params![param], crawl_from_row).optional()?)
    }
}

impl Storage for SqliteStorage {
    // ===== Crawl Management =====

    fn create_crawl(&mut self, request: &CrawlRequest, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO crawls (start_url, max_pages, max_depth, include_sitemap, config_hash, status, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                request.start_url,
                request.max_pages,
                request.max_depth,
                request.include_sitemap,
                config_hash,
                CrawlStatus::Running.to_db_string(),
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn complete_crawl(&mut self, crawl_id: i64, status: CrawlStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE crawls SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, crawl_id],
        )?;
        if updated == 0 {
            return Err(StorageError::CrawlNotFound(crawl_id));
        }
        Ok(())
    }

    fn get_crawl(&self, crawl_id: i64) -> StorageResult<CrawlRecord> {
        let sql = format!("SELECT {} FROM crawls WHERE id = ?1", CRAWL_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        stmt.query_row(params![crawl_id], crawl_from_row)
            .optional()?
            .ok_or(StorageError::CrawlNotFound(crawl_id))
    }

    fn latest_crawl_for(&self, start_url: &str) -> StorageResult<Option<CrawlRecord>> {
        let exact = format!(
            "SELECT {} FROM crawls WHERE start_url = ?1 ORDER BY id DESC LIMIT 1",
            CRAWL_COLUMNS
        );
        if let Some(crawl) = self.find_latest(&exact, start_url)? {
            return Ok(Some(crawl));
        }

        let prefix = format!(
            "SELECT {} FROM crawls WHERE substr(start_url, 1, length(?1)) = ?1 ORDER BY id DESC LIMIT 1",
            CRAWL_COLUMNS
        );
        self.find_latest(&prefix, start_url)
    }

    // ===== Pages and Errors =====

    fn upsert_page(&mut self, crawl_id: i64, page: &PageRecord) -> StorageResult<()> {
        let outbound_links = serde_json::to_string(&page.outbound_links)?;
        self.conn.execute(
            "INSERT INTO pages (crawl_id, url, parent_url, depth, http_status, content_type, title,
                                meta_description, language, page_type, confidence, text, raw_html,
                                outbound_links, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
             ON CONFLICT (crawl_id, url) DO UPDATE SET
                parent_url = excluded.parent_url,
                depth = excluded.depth,
                http_status = excluded.http_status,
                content_type = excluded.content_type,
                title = excluded.title,
                meta_description = excluded.meta_description,
                language = excluded.language,
                page_type = excluded.page_type,
                confidence = excluded.confidence,
                text = excluded.text,
                raw_html = excluded.raw_html,
                outbound_links = excluded.outbound_links,
                fetched_at = excluded.fetched_at",
            params![
                crawl_id,
                page.url,
                page.parent_url,
                page.depth,
                page.http_status,
                page.content_type,
                page.title,
                page.meta_description,
                page.language,
                page.classification.page_type.as_str(),
                page.classification.confidence as f64,
                page.text,
                page.raw_html,
                outbound_links,
                page.fetched_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn upsert_error(&mut self, crawl_id: i64, error: &CrawlError) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO crawl_errors (crawl_id, url, depth, kind, error)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (crawl_id, url) DO UPDATE SET
                depth = excluded.depth,
                kind = excluded.kind,
                error = excluded.error",
            params![crawl_id, error.url, error.depth, error.kind.as_str(), error.error],
        )?;
        Ok(())
    }

    fn set_page_summary(&mut self, crawl_id: i64, url: &str, summary: &str) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE pages SET summary = ?1 WHERE crawl_id = ?2 AND url = ?3",
            params![summary, crawl_id, url],
        )?;
        if updated == 0 {
            return Err(StorageError::PageNotFound {
                crawl_id,
                url: url.to_string(),
            });
        }
        Ok(())
    }

    fn get_pages(&self, crawl_id: i64) -> StorageResult<Vec<StoredPage>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, parent_url, depth, http_status, title, meta_description, language,
                    page_type, confidence, fetched_at, summary
             FROM pages WHERE crawl_id = ?1 ORDER BY depth, url",
        )?;

        let rows = stmt.query_map(params![crawl_id], |row| {
            Ok((
                StoredPage {
                    url: row.get(0)?,
                    parent_url: row.get(1)?,
                    depth: row.get(2)?,
                    http_status: row.get(3)?,
                    title: row.get(4)?,
                    meta_description: row.get(5)?,
                    language: row.get(6)?,
                    page_type: PageType::Other,
                    confidence: row.get::<_, f64>(8)? as f32,
                    fetched_at: row.get(9)?,
                    summary: row.get(10)?,
                },
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut pages = Vec::new();
        for row in rows {
            let (mut page, page_type) = row?;
            page.page_type = PageType::parse(&page_type)
                .ok_or_else(|| StorageError::CorruptRow(format!("unknown page type '{}'", page_type)))?;
            pages.push(page);
        }
        Ok(pages)
    }

    fn get_errors(&self, crawl_id: i64) -> StorageResult<Vec<CrawlError>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, depth, kind, error FROM crawl_errors
             WHERE crawl_id = ?1 ORDER BY depth, url",
        )?;

        let rows = stmt.query_map(params![crawl_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut errors = Vec::new();
        for row in rows {
            let (url, depth, kind, error) = row?;
            let kind = CrawlErrorKind::parse(&kind)
                .ok_or_else(|| StorageError::CorruptRow(format!("unknown error kind '{}'", kind)))?;
            errors.push(CrawlError {
                url,
                depth,
                kind,
                error,
            });
        }
        Ok(errors)
    }

    fn count_pages(&self, crawl_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE crawl_id = ?1",
            params![crawl_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Entities and Findings =====

    fn insert_entity(&mut self, crawl_id: i64, url: &str, entity: &Entity) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO page_entities (crawl_id, url, entity_type, entity_value, confidence)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (crawl_id, url, entity_type, entity_value) DO NOTHING",
            params![crawl_id, url, entity.entity_type, entity.value, entity.confidence],
        )?;
        Ok(())
    }

    fn get_entities(&self, crawl_id: i64) -> StorageResult<Vec<StoredEntity>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, entity_type, entity_value, confidence FROM page_entities
             WHERE crawl_id = ?1 ORDER BY url, entity_type, entity_value",
        )?;

        let entities = stmt
            .query_map(params![crawl_id], |row| {
                Ok(StoredEntity {
                    url: row.get(0)?,
                    entity: Entity {
                        entity_type: row.get(1)?,
                        value: row.get(2)?,
                        confidence: row.get(3)?,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entities)
    }

    fn save_findings(&mut self, crawl_id: i64, findings: &Findings) -> StorageResult<()> {
        let json = serde_json::to_string(findings)?;
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO findings (crawl_id, findings_json, computed_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (crawl_id) DO UPDATE SET
                findings_json = excluded.findings_json,
                computed_at = excluded.computed_at",
            params![crawl_id, json, now],
        )?;
        Ok(())
    }

    fn get_findings(&self, crawl_id: i64) -> StorageResult<Option<Findings>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT findings_json FROM findings WHERE crawl_id = ?1",
                params![crawl_id],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{Classification, CrawlResult};
    use crate::enrich::PageEnrichment;
    use crate::storage::{persist_enrichment, persist_result};

    fn page(url: &str, depth: u32, title: &str) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            parent_url: None,
            depth,
            http_status: 200,
            content_type: "text/html".to_string(),
            title: Some(title.to_string()),
            meta_description: None,
            language: Some("en".to_string()),
            text: "Some text".to_string(),
            raw_html: "<p>Some text</p>".to_string(),
            outbound_links: vec!["https://example.com/a".to_string()],
            fetched_at: Utc::now(),
            classification: Classification {
                page_type: PageType::Pricing,
                confidence: 0.92,
            },
        }
    }

    fn request() -> CrawlRequest {
        CrawlRequest::new("https://example.com/")
    }

    #[test]
    fn test_create_crawl() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let crawl_id = storage.create_crawl(&request(), "test_hash").unwrap();
        assert!(crawl_id > 0);

        let crawl = storage.get_crawl(crawl_id).unwrap();
        assert_eq!(crawl.start_url, "https://example.com/");
        assert_eq!(crawl.max_pages, 30);
        assert!(crawl.include_sitemap);
        assert_eq!(crawl.status, CrawlStatus::Running);

        storage.complete_crawl(crawl_id, CrawlStatus::Completed).unwrap();
        let crawl = storage.get_crawl(crawl_id).unwrap();
        assert_eq!(crawl.status, CrawlStatus::Completed);
        assert!(crawl.finished_at.is_some());
    }

    #[test]
    fn test_missing_crawl() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(storage.get_crawl(42), Err(StorageError::CrawlNotFound(42))));
        assert!(storage.complete_crawl(42, CrawlStatus::Failed).is_err());
    }

    #[test]
    fn test_upsert_page_overwrites() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let crawl_id = storage.create_crawl(&request(), "h").unwrap();

        storage.upsert_page(crawl_id, &page("https://example.com/pricing", 1, "Old")).unwrap();
        storage.upsert_page(crawl_id, &page("https://example.com/pricing", 1, "New")).unwrap();

        assert_eq!(storage.count_pages(crawl_id).unwrap(), 1);
        let pages = storage.get_pages(crawl_id).unwrap();
        assert_eq!(pages[0].title.as_deref(), Some("New"));
        assert_eq!(pages[0].page_type, PageType::Pricing);
    }

    #[test]
    fn test_same_url_in_different_crawls() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let first = storage.create_crawl(&request(), "h").unwrap();
        let second = storage.create_crawl(&request(), "h").unwrap();

        storage.upsert_page(first, &page("https://example.com/", 0, "Home")).unwrap();
        storage.upsert_page(second, &page("https://example.com/", 0, "Home")).unwrap();

        assert_eq!(storage.count_pages(first).unwrap(), 1);
        assert_eq!(storage.count_pages(second).unwrap(), 1);
    }

    #[test]
    fn test_pages_ordered_by_depth_then_url() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let crawl_id = storage.create_crawl(&request(), "h").unwrap();

        storage.upsert_page(crawl_id, &page("https://example.com/z", 1, "Z")).unwrap();
        storage.upsert_page(crawl_id, &page("https://example.com/a", 1, "A")).unwrap();
        storage.upsert_page(crawl_id, &page("https://example.com/", 0, "Home")).unwrap();

        let urls: Vec<String> = storage
            .get_pages(crawl_id)
            .unwrap()
            .into_iter()
            .map(|p| p.url)
            .collect();
        assert_eq!(
            urls,
            vec!["https://example.com/", "https://example.com/a", "https://example.com/z"]
        );
    }

    #[test]
    fn test_upsert_error_overwrites() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let crawl_id = storage.create_crawl(&request(), "h").unwrap();

        storage
            .upsert_error(crawl_id, &CrawlError::fetch_failed("https://example.com/x", 1, "HTTP 500"))
            .unwrap();
        storage
            .upsert_error(crawl_id, &CrawlError::robots_blocked("https://example.com/x", 1))
            .unwrap();

        let errors = storage.get_errors(crawl_id).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, CrawlErrorKind::RobotsBlocked);
        assert_eq!(errors[0].error, "Blocked by robots.txt");
    }

    #[test]
    fn test_summary_requires_existing_page() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let crawl_id = storage.create_crawl(&request(), "h").unwrap();
        storage.upsert_page(crawl_id, &page("https://example.com/", 0, "Home")).unwrap();

        storage
            .set_page_summary(crawl_id, "https://example.com/", "Two sentences. Done.")
            .unwrap();
        assert_eq!(
            storage.get_pages(crawl_id).unwrap()[0].summary.as_deref(),
            Some("Two sentences. Done.")
        );

        let missing = storage.set_page_summary(crawl_id, "https://example.com/nope", "x");
        assert!(matches!(missing, Err(StorageError::PageNotFound { .. })));
    }

    #[test]
    fn test_entities_are_deduplicated() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let crawl_id = storage.create_crawl(&request(), "h").unwrap();
        let entity = Entity {
            entity_type: "integration".to_string(),
            value: "Shopify".to_string(),
            confidence: Some(0.8),
        };

        storage.insert_entity(crawl_id, "https://example.com/", &entity).unwrap();
        storage.insert_entity(crawl_id, "https://example.com/", &entity).unwrap();

        let entities = storage.get_entities(crawl_id).unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].entity, entity);
    }

    #[test]
    fn test_latest_crawl_for_exact_then_prefix() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let exact = storage.create_crawl(&CrawlRequest::new("https://example.com"), "h").unwrap();
        let longer = storage
            .create_crawl(&CrawlRequest::new("https://example.com/shop"), "h")
            .unwrap();

        assert_eq!(
            storage.latest_crawl_for("https://example.com").unwrap().map(|c| c.id),
            Some(exact)
        );
        assert_eq!(
            storage.latest_crawl_for("https://example.com/sh").unwrap().map(|c| c.id),
            Some(longer)
        );
        assert!(storage.latest_crawl_for("https://other.com").unwrap().is_none());
    }

    #[test]
    fn test_persist_result_and_enrichment() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let result = CrawlResult {
            pages: vec![page("https://example.com/", 0, "Home")],
            errors: vec![CrawlError::fetch_failed("https://example.com/gone", 1, "HTTP 404")],
            findings: Findings {
                mentions_pricing: true,
                ..Findings::default()
            },
        };

        let crawl_id = persist_result(&mut storage, &request(), "h", &result).unwrap();
        assert_eq!(storage.get_crawl(crawl_id).unwrap().status, CrawlStatus::Completed);
        assert_eq!(storage.count_pages(crawl_id).unwrap(), 1);
        assert_eq!(storage.get_errors(crawl_id).unwrap().len(), 1);
        assert_eq!(storage.get_findings(crawl_id).unwrap(), Some(result.findings.clone()));

        let enrichment = PageEnrichment {
            url: "https://example.com/".to_string(),
            summary: Some("Summary.".to_string()),
            entities: vec![Entity {
                entity_type: "plan".to_string(),
                value: "Pro".to_string(),
                confidence: None,
            }],
        };
        persist_enrichment(&mut storage, crawl_id, &[enrichment]).unwrap();
        assert_eq!(storage.get_entities(crawl_id).unwrap().len(), 1);
        assert_eq!(
            storage.get_pages(crawl_id).unwrap()[0].summary.as_deref(),
            Some("Summary.")
        );
    }
}
