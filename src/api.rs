//! External interface DTOs (§6).
//!
//! HTTP server framing is out of scope here — these types define the JSON
//! shapes an eventual `/api/*` binding would serialize, and nothing more.
//! No listener is started from this crate.

use serde::{Deserialize, Serialize};

use crate::analytics::TopQuery;
use crate::cache::CacheStats;
use crate::types::{CorpusStats, RankedResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultDto {
    pub url: String,
    pub title: String,
    pub description: String,
    pub domain: String,
    pub score: f64,
    pub snippet: String,
    pub highlights: Vec<(usize, usize)>,
}

impl From<&RankedResult> for SearchResultDto {
    fn from(result: &RankedResult) -> Self {
        SearchResultDto {
            url: result.url.clone(),
            title: result.title.clone(),
            description: result.description.clone(),
            domain: result.domain.clone(),
            score: result.score,
            snippet: result.snippet.clone(),
            highlights: result.highlights.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub execution_time_ms: u64,
    pub cached: bool,
    pub results: Vec<SearchResultDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub query: String,
    pub suggestions: Vec<String>,
}

impl SuggestionsResponse {
    pub fn new(query: impl Into<String>, suggestions: Vec<String>) -> Self {
        SuggestionsResponse { query: query.into(), suggestions }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedResponse {
    pub term: String,
    pub related: Vec<String>,
}

impl RelatedResponse {
    pub fn new(term: impl Into<String>, related: Vec<String>) -> Self {
        RelatedResponse { term: term.into(), related }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub puts: u64,
    pub evictions: u64,
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        CacheStatsResponse {
            hits: stats.hits,
            misses: stats.misses,
            puts: stats.puts,
            evictions: stats.evictions,
            hit_rate: stats.hit_rate(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HealthStatus {
    Ok,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub indexed_pages: usize,
    pub registered_domains: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexInfoResponse {
    pub total_docs: usize,
    pub avg_doc_length: f64,
    pub term_count: usize,
    pub total_searches: u64,
    pub unique_queries: usize,
    pub top_queries: Vec<TopQueryDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopQueryDto {
    pub query: String,
    pub count: u64,
}

impl From<&TopQuery> for TopQueryDto {
    fn from(t: &TopQuery) -> Self {
        TopQueryDto { query: t.query.clone(), count: t.count }
    }
}

impl IndexInfoResponse {
    pub fn new(stats: CorpusStats, total_searches: u64, unique_queries: usize, top_queries: &[TopQuery]) -> Self {
        IndexInfoResponse {
            total_docs: stats.total_docs,
            avg_doc_length: stats.avg_doc_length,
            term_count: stats.term_count,
            total_searches,
            unique_queries,
            top_queries: top_queries.iter().map(TopQueryDto::from).collect(),
        }
    }
}

/// The shared error-response shape: `{"error": "...", "code": "...",
/// "details": ...}` (`details` omitted entirely when absent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&crate::error::SearchError> for ErrorResponse {
    fn from(err: &crate::error::SearchError) -> Self {
        use crate::error::SearchError::*;
        let code = match err {
            DomainNotAllowed { .. } => "domain_not_allowed",
            FetchTimeout { .. } => "fetch_timeout",
            FetchTransport { .. } => "fetch_transport",
            FetchHttp { .. } => "fetch_http",
            FetchParse { .. } => "fetch_parse",
            QueryInvalid { .. } => "query_invalid",
            IndexCorrupt { .. } => "index_corrupt",
            Config { .. } => "config_error",
            Storage { .. } => "storage_error",
        };
        ErrorResponse {
            error: err.to_string(),
            code: code.to_string(),
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;

    #[test]
    fn error_response_carries_a_stable_code() {
        let err = SearchError::QueryInvalid { reason: "empty".to_string() };
        let dto = ErrorResponse::from(&err);
        assert_eq!(dto.code, "query_invalid");
        assert!(dto.details.is_none());
    }

    #[test]
    fn search_result_dto_round_trips_through_json() {
        let dto = SearchResultDto {
            url: "https://example.se".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            domain: "example.se".to_string(),
            score: 1.0,
            snippet: "s".to_string(),
            highlights: vec![(0, 2)],
        };
        let json = serde_json::to_string(&dto).unwrap();
        let parsed: SearchResultDto = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.url, dto.url);
    }
}
