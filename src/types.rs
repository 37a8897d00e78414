//! The building blocks of the search pipeline.
//!
//! Every struct here has a corresponding data-model entry in `SPEC_FULL.md`
//! §3. As with the index types elsewhere in this crate, prefer the newtypes
//! (`PageId`) over raw integers at API boundaries — it is too easy to pass a
//! term-dictionary index where a page id was expected otherwise.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// Type-safe page identifier, stable for the lifetime of a page record.
///
/// **Invariant**: a `Posting` never references a `PageId` that has no
/// corresponding page record (enforced by the index's consistency sweep,
/// see `crate::consistency`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PageId(pub u64);

impl PageId {
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for PageId {
    fn from(id: u64) -> Self {
        PageId(id)
    }
}

/// A whitelisted host plus the metadata the crawler and ranker need about it.
///
/// **Invariant**: a URL is accepted for crawl or direct navigation only if
/// its host (or a registered suffix) exists here and `active` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEntry {
    /// Canonical host: lowercased, no leading `www.`.
    pub host: String,
    pub category: String,
    /// Trust score in `[0, 1]`. Defaults to 0.5 for suffix-matched hosts
    /// that aren't explicitly registered.
    pub trust_score: f64,
    pub crawl_cadence: Duration,
    pub next_ready: SystemTime,
    pub path_hints: Vec<String>,
    pub search_endpoint_template: Option<String>,
    pub error_count: u32,
    pub active: bool,
}

impl DomainEntry {
    pub fn new(host: impl Into<String>, category: impl Into<String>, trust_score: f64) -> Self {
        DomainEntry {
            host: host.into(),
            category: category.into(),
            trust_score: trust_score.clamp(0.0, 1.0),
            crawl_cadence: Duration::from_secs(24 * 3600),
            next_ready: SystemTime::UNIX_EPOCH,
            path_hints: Vec::new(),
            search_endpoint_template: None,
            error_count: 0,
            active: true,
        }
    }
}

/// A URL queued (or about to be queued) in the frontier.
///
/// **Identity**: the canonicalized URL string (see `crate::canonical`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlUrl {
    pub url: String,
    pub host: String,
    /// Clamped to `1..=10` on construction.
    pub priority: u8,
    pub enqueued_at: SystemTime,
    pub source_url: Option<String>,
}

impl CrawlUrl {
    pub fn new(url: String, host: String, priority: u8, source_url: Option<String>) -> Self {
        CrawlUrl {
            url,
            host,
            priority: priority.clamp(1, 10),
            enqueued_at: SystemTime::now(),
            source_url,
        }
    }
}

/// A fetched and parsed web page, content-addressed by its canonical URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub url: String,
    pub host: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub outbound_links: Vec<String>,
    pub fetched_at: SystemTime,
    pub status: u16,
    pub size: usize,
    pub content_type: String,
    pub language: Option<String>,
    pub discovered_from: Option<String>,
    /// Lowercase hex encoding of a 256-bit digest of the normalized body.
    pub content_hash: String,
}

/// Which field of a document a posting's occurrence falls in. A term can
/// have postings with different field flags for the same page (e.g. it
/// appears in both the title and the body).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFlags {
    pub in_title: bool,
    pub in_description: bool,
    pub in_body: bool,
}

impl FieldFlags {
    pub const NONE: FieldFlags = FieldFlags {
        in_title: false,
        in_description: false,
        in_body: false,
    };
}

/// A single (term, page) occurrence record.
///
/// **Invariant**: for any `(term, page)` pair there is at most one posting —
/// enforced by `InvertedIndex::upsert`, which merges term counts per page
/// before ever writing a posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub page_id: PageId,
    pub term_frequency: u32,
    pub fields: FieldFlags,
    /// Precomputed BM25 contribution hint, recomputed whenever corpus
    /// statistics (N, avgdl, idf) change.
    pub bm25_hint: f64,
}

/// How a query was classified by the parser (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryType {
    Simple,
    Phrase,
    Boolean,
    Advanced,
    Mixed,
}

/// Which ranking strategy the orchestrator should apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortStrategy {
    #[default]
    Hybrid,
    Relevance,
    Popularity,
    Recency,
}

/// A parsed, validated search query (transient — never persisted).
///
/// **Invariant**: at least one non-empty term or phrase; `terms.len() +
/// phrases.len() <= Config::max_query_terms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub normalized_text: String,
    pub query_type: QueryType,
    pub terms: Vec<String>,
    pub phrases: Vec<String>,
    pub exclude_terms: Vec<String>,
    pub domain_filter: Option<String>,
    pub language_filter: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub sort: SortStrategy,
    pub offset: usize,
    pub limit: usize,
}

/// The per-factor score breakdown behind a `RankedResult`'s total score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ScoreComponents {
    pub relevance: f64,
    pub authority: f64,
    pub pagerank: f64,
    pub recency: f64,
    pub density: f64,
    pub link: f64,
    pub regional: f64,
    pub semantic: f64,
}

/// A scored, snippeted search hit (transient).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub page_id: PageId,
    pub url: String,
    pub title: String,
    pub description: String,
    pub domain: String,
    pub score: f64,
    pub components: ScoreComponents,
    pub snippet: String,
    pub highlights: Vec<(usize, usize)>,
    pub rank: usize,
}

/// Derived, persisted corpus-wide statistics used by BM25 and the ranker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CorpusStats {
    pub total_docs: usize,
    pub avg_doc_length: f64,
    pub term_count: usize,
}

/// A recorded crawl event, kept for diagnostics (§6 `crawl_logs`, supplemented
/// per `SPEC_FULL.md` §7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlLogEntry {
    pub url: String,
    pub status: Option<u16>,
    pub fetched_at: SystemTime,
    pub error: Option<String>,
}
