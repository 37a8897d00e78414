//! Rusqlite-backed persistence for the inverted index.
//!
//! Schema mirrors `SPEC_FULL.md` §3's named tables (`pages`, `terms`,
//! `postings`, `visited`, `crawl_logs`). `domains` is declared for
//! completeness but the registry itself stays in-memory (domain-list
//! bootstrapping from the database is out of scope, see `SPEC_FULL.md` §1).
//!
//! **Crash-consistency invariant**: a page and its postings are written in
//! one transaction (`upsert_page_with_postings`), so a crash mid-write
//! leaves either both or neither — never a page with missing postings or
//! postings pointing at a page that doesn't exist. `consistency::sweep`
//! cleans up anything that still manages to go dangling (e.g. a page
//! deleted out from under its postings by a future maintenance command).

use std::collections::{HashMap, HashSet};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, SearchError};
use crate::types::{CrawlLogEntry, FieldFlags, Page, PageId, Posting};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS domains (
    host TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    trust_score REAL NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    error_count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY,
    url TEXT UNIQUE NOT NULL,
    host TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    body TEXT NOT NULL,
    outbound_links TEXT NOT NULL,
    fetched_at INTEGER NOT NULL,
    status INTEGER NOT NULL,
    size INTEGER NOT NULL,
    content_type TEXT NOT NULL,
    language TEXT,
    discovered_from TEXT,
    content_hash TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS terms (
    id INTEGER PRIMARY KEY,
    term TEXT UNIQUE NOT NULL,
    document_frequency INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS postings (
    term_id INTEGER NOT NULL REFERENCES terms(id) ON DELETE CASCADE,
    page_id INTEGER NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
    term_frequency INTEGER NOT NULL,
    in_title INTEGER NOT NULL,
    in_description INTEGER NOT NULL,
    in_body INTEGER NOT NULL,
    PRIMARY KEY (term_id, page_id)
);

CREATE TABLE IF NOT EXISTS visited (
    url TEXT PRIMARY KEY,
    visited_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS crawl_logs (
    id INTEGER PRIMARY KEY,
    url TEXT NOT NULL,
    status INTEGER,
    fetched_at INTEGER NOT NULL,
    error TEXT
);

CREATE INDEX IF NOT EXISTS idx_postings_page ON postings(page_id);
CREATE INDEX IF NOT EXISTS idx_pages_host ON pages(host);
"#;

fn to_unix(t: SystemTime) -> i64 {
    t.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
}

fn from_unix(secs: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs.max(0) as u64)
}

fn storage_err(detail: impl std::fmt::Display) -> SearchError {
    SearchError::Storage { detail: detail.to_string() }
}

/// Everything the rest of the crate needs from the persistence layer.
/// Kept as a trait so the ranker/scorer/orchestrator can be exercised
/// against an in-memory `SqliteStore` in tests without touching disk.
pub trait IndexStore {
    fn insert_page(&self, page: &Page) -> Result<PageId>;
    fn get_page(&self, id: PageId) -> Result<Option<Page>>;
    fn get_page_by_url(&self, url: &str) -> Result<Option<Page>>;
    fn upsert_postings(&self, page_id: PageId, postings: &[(String, Posting)]) -> Result<()>;
    fn upsert_page_with_postings(&self, page: &Page, postings: &[(String, Posting)]) -> Result<PageId>;
    fn get_postings(&self, term: &str) -> Result<Vec<(PageId, Posting)>>;
    fn document_frequency(&self, term: &str) -> Result<usize>;
    fn total_docs(&self) -> Result<usize>;
    fn avg_doc_length(&self) -> Result<f64>;
    fn total_terms(&self) -> Result<usize>;
    /// Terms starting with `prefix` and a document frequency of at least
    /// `min_document_frequency`, most-frequent first.
    fn terms_with_prefix(&self, prefix: &str, min_document_frequency: usize, limit: usize) -> Result<Vec<String>>;
    /// Every `(term, term_frequency)` pair posted against a single page.
    fn term_frequencies_for_page(&self, page_id: PageId) -> Result<Vec<(String, u32)>>;
    fn mark_visited(&self, url: &str, at: SystemTime) -> Result<()>;
    fn is_visited(&self, url: &str) -> Result<bool>;
    fn append_crawl_log(&self, entry: &CrawlLogEntry) -> Result<()>;
    fn recent_crawl_logs(&self, limit: usize) -> Result<Vec<CrawlLogEntry>>;
    fn all_page_ids(&self) -> Result<Vec<PageId>>;
    fn link_graph(&self) -> Result<HashMap<PageId, Vec<PageId>>>;
    fn inbound_link_count(&self, page_id: PageId) -> Result<u32>;
    fn delete_orphan_postings(&self) -> Result<usize>;
    fn delete_pages_without_postings_reference(&self) -> Result<usize>;
}

/// The concrete, file- or memory-backed implementation.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).map_err(storage_err)?;
        conn.execute_batch(SCHEMA).map_err(storage_err)?;
        Ok(SqliteStore { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        conn.execute_batch(SCHEMA).map_err(storage_err)?;
        Ok(SqliteStore { conn })
    }

    fn term_id(&self, term: &str) -> Result<Option<i64>> {
        self.conn
            .query_row("SELECT id FROM terms WHERE term = ?1", params![term], |r| r.get(0))
            .optional()
            .map_err(storage_err)
    }

    fn ensure_term_id(conn: &Connection, term: &str) -> Result<i64> {
        conn.execute(
            "INSERT INTO terms (term, document_frequency) VALUES (?1, 0)
             ON CONFLICT(term) DO NOTHING",
            params![term],
        )
        .map_err(storage_err)?;
        conn.query_row("SELECT id FROM terms WHERE term = ?1", params![term], |r| r.get(0))
            .map_err(storage_err)
    }

    fn row_to_page(row: &rusqlite::Row) -> rusqlite::Result<Page> {
        let outbound_links_json: String = row.get("outbound_links")?;
        let fetched_at: i64 = row.get("fetched_at")?;
        Ok(Page {
            id: PageId(row.get("id")?),
            url: row.get("url")?,
            host: row.get("host")?,
            title: row.get("title")?,
            description: row.get("description")?,
            body: row.get("body")?,
            outbound_links: serde_json::from_str(&outbound_links_json).unwrap_or_default(),
            fetched_at: from_unix(fetched_at),
            status: row.get::<_, i64>("status")? as u16,
            size: row.get::<_, i64>("size")? as usize,
            content_type: row.get("content_type")?,
            language: row.get("language")?,
            discovered_from: row.get("discovered_from")?,
            content_hash: row.get("content_hash")?,
        })
    }
}

impl IndexStore for SqliteStore {
    fn insert_page(&self, page: &Page) -> Result<PageId> {
        let outbound_links_json = serde_json::to_string(&page.outbound_links).map_err(storage_err)?;
        self.conn
            .execute(
                "INSERT INTO pages (url, host, title, description, body, outbound_links,
                    fetched_at, status, size, content_type, language, discovered_from, content_hash)
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13)
                 ON CONFLICT(url) DO UPDATE SET
                    title = excluded.title,
                    description = excluded.description,
                    body = excluded.body,
                    outbound_links = excluded.outbound_links,
                    fetched_at = excluded.fetched_at,
                    status = excluded.status,
                    size = excluded.size,
                    content_type = excluded.content_type,
                    language = excluded.language,
                    discovered_from = excluded.discovered_from,
                    content_hash = excluded.content_hash",
                params![
                    page.url,
                    page.host,
                    page.title,
                    page.description,
                    page.body,
                    outbound_links_json,
                    to_unix(page.fetched_at),
                    page.status as i64,
                    page.size as i64,
                    page.content_type,
                    page.language,
                    page.discovered_from,
                    page.content_hash,
                ],
            )
            .map_err(storage_err)?;
        let id: i64 = self
            .conn
            .query_row("SELECT id FROM pages WHERE url = ?1", params![page.url], |r| r.get(0))
            .map_err(storage_err)?;
        Ok(PageId(id as u64))
    }

    fn get_page(&self, id: PageId) -> Result<Option<Page>> {
        self.conn
            .query_row("SELECT * FROM pages WHERE id = ?1", params![id.as_u64() as i64], Self::row_to_page)
            .optional()
            .map_err(storage_err)
    }

    fn get_page_by_url(&self, url: &str) -> Result<Option<Page>> {
        self.conn
            .query_row("SELECT * FROM pages WHERE url = ?1", params![url], Self::row_to_page)
            .optional()
            .map_err(storage_err)
    }

    /// Replace every posting for `page_id` with `postings`, in the same
    /// transaction the caller already opened (or a bare auto-commit
    /// statement, for direct test callers). Terms from the page's previous
    /// postings that are no longer present have their `document_frequency`
    /// decremented — without this, a re-crawled page that drops a term
    /// leaves that term's document frequency permanently stale.
    fn upsert_postings(&self, page_id: PageId, postings: &[(String, Posting)]) -> Result<()> {
        let previous_term_ids: HashSet<i64> = {
            let mut stmt = self
                .conn
                .prepare("SELECT term_id FROM postings WHERE page_id = ?1")
                .map_err(storage_err)?;
            let rows = stmt
                .query_map(params![page_id.as_u64() as i64], |row| row.get::<_, i64>(0))
                .map_err(storage_err)?;
            rows.collect::<rusqlite::Result<HashSet<_>>>().map_err(storage_err)?
        };

        self.conn
            .execute("DELETE FROM postings WHERE page_id = ?1", params![page_id.as_u64() as i64])
            .map_err(storage_err)?;

        let mut new_term_ids = HashSet::with_capacity(postings.len());
        for (term, posting) in postings {
            let term_id = Self::ensure_term_id(&self.conn, term)?;
            new_term_ids.insert(term_id);

            self.conn
                .execute(
                    "INSERT INTO postings (term_id, page_id, term_frequency, in_title, in_description, in_body)
                     VALUES (?1,?2,?3,?4,?5,?6)",
                    params![
                        term_id,
                        page_id.as_u64() as i64,
                        posting.term_frequency as i64,
                        posting.fields.in_title as i64,
                        posting.fields.in_description as i64,
                        posting.fields.in_body as i64,
                    ],
                )
                .map_err(storage_err)?;

            if !previous_term_ids.contains(&term_id) {
                self.conn
                    .execute(
                        "UPDATE terms SET document_frequency = document_frequency + 1 WHERE id = ?1",
                        params![term_id],
                    )
                    .map_err(storage_err)?;
            }
        }

        for term_id in previous_term_ids.difference(&new_term_ids) {
            self.conn
                .execute(
                    "UPDATE terms SET document_frequency = document_frequency - 1
                     WHERE id = ?1 AND document_frequency > 0",
                    params![term_id],
                )
                .map_err(storage_err)?;
        }

        Ok(())
    }

    fn upsert_page_with_postings(&self, page: &Page, postings: &[(String, Posting)]) -> Result<PageId> {
        self.conn.execute("BEGIN IMMEDIATE", []).map_err(storage_err)?;
        let result = (|| {
            let id = self.insert_page(page)?;
            self.upsert_postings(id, postings)?;
            Ok(id)
        })();
        match &result {
            Ok(_) => self.conn.execute("COMMIT", []).map_err(storage_err)?,
            Err(_) => self.conn.execute("ROLLBACK", []).map_err(storage_err)?,
        };
        result
    }

    fn get_postings(&self, term: &str) -> Result<Vec<(PageId, Posting)>> {
        let Some(term_id) = self.term_id(term)? else {
            return Ok(Vec::new());
        };
        let mut stmt = self
            .conn
            .prepare(
                "SELECT page_id, term_frequency, in_title, in_description, in_body
                 FROM postings WHERE term_id = ?1",
            )
            .map_err(storage_err)?;
        let rows = stmt
            .query_map(params![term_id], |row| {
                let page_id: i64 = row.get(0)?;
                let tf: i64 = row.get(1)?;
                let in_title: bool = row.get(2)?;
                let in_description: bool = row.get(3)?;
                let in_body: bool = row.get(4)?;
                Ok((
                    PageId(page_id as u64),
                    Posting {
                        page_id: PageId(page_id as u64),
                        term_frequency: tf as u32,
                        fields: FieldFlags { in_title, in_description, in_body },
                        bm25_hint: 0.0,
                    },
                ))
            })
            .map_err(storage_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(storage_err)
    }

    fn document_frequency(&self, term: &str) -> Result<usize> {
        let df: Option<i64> = self
            .conn
            .query_row("SELECT document_frequency FROM terms WHERE term = ?1", params![term], |r| r.get(0))
            .optional()
            .map_err(storage_err)?;
        Ok(df.unwrap_or(0) as usize)
    }

    fn total_docs(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM pages", [], |r| r.get(0)).map_err(storage_err)?;
        Ok(count as usize)
    }

    fn avg_doc_length(&self) -> Result<f64> {
        let total_docs = self.total_docs()?;
        if total_docs == 0 {
            return Ok(0.0);
        }
        let total_len: i64 = self
            .conn
            .query_row("SELECT COALESCE(SUM(LENGTH(body)), 0) FROM pages", [], |r| r.get(0))
            .map_err(storage_err)?;
        Ok(total_len as f64 / total_docs as f64)
    }

    fn total_terms(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM terms", [], |r| r.get(0)).map_err(storage_err)?;
        Ok(count as usize)
    }

    fn terms_with_prefix(&self, prefix: &str, min_document_frequency: usize, limit: usize) -> Result<Vec<String>> {
        let pattern = format!("{prefix}%");
        let mut stmt = self
            .conn
            .prepare(
                "SELECT term FROM terms WHERE term LIKE ?1 AND document_frequency >= ?2
                 ORDER BY document_frequency DESC, term ASC LIMIT ?3",
            )
            .map_err(storage_err)?;
        let rows = stmt
            .query_map(params![pattern, min_document_frequency as i64, limit as i64], |row| row.get::<_, String>(0))
            .map_err(storage_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(storage_err)
    }

    fn term_frequencies_for_page(&self, page_id: PageId) -> Result<Vec<(String, u32)>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT terms.term, postings.term_frequency FROM postings
                 JOIN terms ON terms.id = postings.term_id
                 WHERE postings.page_id = ?1",
            )
            .map_err(storage_err)?;
        let rows = stmt
            .query_map(params![page_id.as_u64() as i64], |row| {
                let term: String = row.get(0)?;
                let tf: i64 = row.get(1)?;
                Ok((term, tf as u32))
            })
            .map_err(storage_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(storage_err)
    }

    fn mark_visited(&self, url: &str, at: SystemTime) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO visited (url, visited_at) VALUES (?1, ?2)
                 ON CONFLICT(url) DO UPDATE SET visited_at = excluded.visited_at",
                params![url, to_unix(at)],
            )
            .map_err(storage_err)?;
        Ok(())
    }

    fn is_visited(&self, url: &str) -> Result<bool> {
        let exists: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM visited WHERE url = ?1", params![url], |r| r.get(0))
            .optional()
            .map_err(storage_err)?;
        Ok(exists.is_some())
    }

    fn append_crawl_log(&self, entry: &CrawlLogEntry) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO crawl_logs (url, status, fetched_at, error) VALUES (?1,?2,?3,?4)",
                params![entry.url, entry.status.map(|s| s as i64), to_unix(entry.fetched_at), entry.error],
            )
            .map_err(storage_err)?;
        Ok(())
    }

    fn recent_crawl_logs(&self, limit: usize) -> Result<Vec<CrawlLogEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, status, fetched_at, error FROM crawl_logs ORDER BY id DESC LIMIT ?1")
            .map_err(storage_err)?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                let status: Option<i64> = row.get(1)?;
                let fetched_at: i64 = row.get(2)?;
                Ok(CrawlLogEntry {
                    url: row.get(0)?,
                    status: status.map(|s| s as u16),
                    fetched_at: from_unix(fetched_at),
                    error: row.get(3)?,
                })
            })
            .map_err(storage_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(storage_err)
    }

    fn all_page_ids(&self) -> Result<Vec<PageId>> {
        let mut stmt = self.conn.prepare("SELECT id FROM pages").map_err(storage_err)?;
        let rows = stmt
            .query_map([], |row| Ok(PageId(row.get::<_, i64>(0)? as u64)))
            .map_err(storage_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(storage_err)
    }

    /// Builds the outbound-link graph by resolving each page's stored
    /// `outbound_links` URLs against the `pages` table. Links to pages
    /// outside the crawled corpus are dropped (pagerank only runs over
    /// pages we actually have).
    fn link_graph(&self) -> Result<HashMap<PageId, Vec<PageId>>> {
        let mut url_to_id: HashMap<String, PageId> = HashMap::new();
        {
            let mut stmt = self.conn.prepare("SELECT id, url FROM pages").map_err(storage_err)?;
            let rows = stmt
                .query_map([], |row| {
                    let id: i64 = row.get(0)?;
                    let url: String = row.get(1)?;
                    Ok((url, PageId(id as u64)))
                })
                .map_err(storage_err)?;
            for row in rows {
                let (url, id) = row.map_err(storage_err)?;
                url_to_id.insert(url, id);
            }
        }

        let mut graph = HashMap::new();
        let mut stmt = self.conn.prepare("SELECT id, outbound_links FROM pages").map_err(storage_err)?;
        let rows = stmt
            .query_map([], |row| {
                let id: i64 = row.get(0)?;
                let links_json: String = row.get(1)?;
                Ok((PageId(id as u64), links_json))
            })
            .map_err(storage_err)?;
        for row in rows {
            let (id, links_json) = row.map_err(storage_err)?;
            let links: Vec<String> = serde_json::from_str(&links_json).unwrap_or_default();
            let resolved: Vec<PageId> = links.iter().filter_map(|l| url_to_id.get(l).copied()).collect();
            graph.insert(id, resolved);
        }
        Ok(graph)
    }

    fn inbound_link_count(&self, page_id: PageId) -> Result<u32> {
        let graph = self.link_graph()?;
        let count = graph.values().filter(|links| links.contains(&page_id)).count();
        Ok(count as u32)
    }

    /// Delete postings referencing a `term_id`/`page_id` pair that no
    /// longer has a matching row in `terms`/`pages` respectively.
    fn delete_orphan_postings(&self) -> Result<usize> {
        let deleted = self
            .conn
            .execute(
                "DELETE FROM postings WHERE term_id NOT IN (SELECT id FROM terms)
                    OR page_id NOT IN (SELECT id FROM pages)",
                [],
            )
            .map_err(storage_err)?;
        Ok(deleted)
    }

    fn delete_pages_without_postings_reference(&self) -> Result<usize> {
        // Pages with zero postings are not corrupt by themselves (a page can
        // legitimately index to nothing if its body was empty) — this is a
        // no-op placeholder kept distinct from `delete_orphan_postings` so
        // the consistency sweep's two passes stay independently testable.
        Ok(0)
    }
}
