//! C10: Search Orchestrator.
//!
//! Ties every other component into the seven-step search flow (§4.10):
//! cache probe, parse, analyze, retrieve candidates, score+rank, paginate
//! and snippet, then assemble+cache+record. Holds the index, domain
//! registry, cache, and analytics counter each behind their own lock so a
//! slow ranking pass on one query never blocks another query's cache
//! lookup (§5).

use std::collections::HashMap;
use std::time::{Instant, SystemTime};

use parking_lot::{Mutex, RwLock};

use crate::analysis::{self, classify_intent};
use crate::cache::Cache;
use crate::config::Config;
use crate::domain::DomainRegistry;
use crate::error::Result;
use crate::index::{IndexStore, InvertedIndex};
use crate::query::{self};
use crate::ranker::{self, RankingContext, RankingWeights};
use crate::scoring::{self, TermMatch};
use crate::snippet;
use crate::types::{Page, PageId, RankedResult, SearchQuery};

pub struct SearchOutcome {
    pub results: Vec<RankedResult>,
    pub total: usize,
    pub cached: bool,
    pub execution_time: std::time::Duration,
}

pub struct SearchOrchestrator<S: IndexStore> {
    index: Mutex<InvertedIndex<S>>,
    domains: RwLock<DomainRegistry>,
    cache: Mutex<Cache<Vec<RankedResult>>>,
    analytics: Mutex<crate::analytics::Analytics>,
    config: Config,
}

struct Candidate {
    page: Page,
    matches: Vec<TermMatch>,
    expansion_overlap: bool,
}

impl<S: IndexStore> SearchOrchestrator<S> {
    pub fn new(store: S, domains: DomainRegistry, config: Config) -> Self {
        let cache = Cache::new(config.cache_capacity, config.cache_ttl());
        SearchOrchestrator {
            index: Mutex::new(InvertedIndex::new(store)),
            domains: RwLock::new(domains),
            cache: Mutex::new(cache),
            analytics: Mutex::new(crate::analytics::Analytics::new()),
            config,
        }
    }

    pub fn search(&self, raw_query: &str) -> Result<SearchOutcome> {
        let started = Instant::now();

        if let Some(cached_results) = self.cache.lock().get(raw_query) {
            let total = cached_results.len();
            self.record_analytics(raw_query, started.elapsed());
            return Ok(SearchOutcome {
                results: cached_results,
                total,
                cached: true,
                execution_time: started.elapsed(),
            });
        }

        let parsed = query::parse(raw_query, self.config.max_query_terms)?;
        let intent = classify_intent(raw_query);

        let candidates = self.collect_candidates(&parsed)?;
        let scored = self.score_candidates(candidates, &parsed, intent)?;

        let total = scored.len();
        let page_slice: Vec<_> = scored.into_iter().skip(parsed.offset).take(parsed.limit).collect();

        let mut results = Vec::with_capacity(page_slice.len());
        for (rank, (page, total_score, components)) in page_slice.into_iter().enumerate() {
            let snippet = snippet::generate(&page.title, &page.description, &page.body, &parsed.terms, self.config.snippet_max_length);
            results.push(RankedResult {
                page_id: page.id,
                url: page.url,
                title: page.title,
                description: page.description,
                domain: page.host,
                score: total_score,
                components,
                snippet: snippet.text,
                highlights: snippet.highlights,
                rank: parsed.offset + rank,
            });
        }

        self.cache.lock().put(raw_query, results.clone());
        self.record_analytics(raw_query, started.elapsed());

        Ok(SearchOutcome {
            results,
            total,
            cached: false,
            execution_time: started.elapsed(),
        })
    }

    fn record_analytics(&self, raw_query: &str, elapsed: std::time::Duration) {
        let normalized = analysis::normalize(raw_query);
        self.analytics.lock().record(&normalized, elapsed);
    }

    fn collect_candidates(&self, parsed: &SearchQuery) -> Result<Vec<Candidate>> {
        let index = self.index.lock();
        let mut per_page: HashMap<PageId, Candidate> = HashMap::new();
        let n = index.stats()?.total_docs;

        let mut query_terms: Vec<(String, bool)> = Vec::new();
        for term in &parsed.terms {
            for analyzed in analysis::analyze(term) {
                query_terms.push((analyzed.term, analyzed.is_expansion));
            }
        }
        for phrase in &parsed.phrases {
            for analyzed in analysis::analyze(phrase) {
                query_terms.push((analyzed.term, false));
            }
        }

        for (term, is_expansion) in &query_terms {
            let df = index.document_frequency(term)?;
            for (page_id, posting) in index.get_postings(term)? {
                let entry = match per_page.get_mut(&page_id) {
                    Some(entry) => entry,
                    None => {
                        let Some(page) = index.get_page(page_id)? else { continue };
                        per_page.insert(page_id, Candidate { page, matches: Vec::new(), expansion_overlap: false });
                        per_page.get_mut(&page_id).unwrap()
                    }
                };
                entry.matches.push(TermMatch { tf: posting.term_frequency, df, is_expansion: *is_expansion });
                if *is_expansion {
                    entry.expansion_overlap = true;
                }
            }
        }
        let _ = n;

        let mut candidates: Vec<Candidate> = per_page.into_values().collect();

        if let Some(domain_filter) = &parsed.domain_filter {
            candidates.retain(|c| c.page.host == *domain_filter || c.page.host.ends_with(&format!(".{domain_filter}")));
        }
        if let Some(language_filter) = &parsed.language_filter {
            candidates.retain(|c| c.page.language.as_deref() == Some(language_filter.as_str()));
        }
        for exclude in &parsed.exclude_terms {
            candidates.retain(|c| {
                let haystack = format!("{} {} {}", c.page.title, c.page.description, c.page.body).to_lowercase();
                !haystack.contains(exclude)
            });
        }
        for phrase in &parsed.phrases {
            candidates.retain(|c| {
                let haystack = format!("{} {} {}", c.page.title, c.page.description, c.page.body).to_lowercase();
                haystack.contains(phrase)
            });
        }

        Ok(candidates)
    }

    fn score_candidates(&self, candidates: Vec<Candidate>, parsed: &SearchQuery, intent: crate::analysis::Intent) -> Result<Vec<(Page, f64, crate::types::ScoreComponents)>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let index = self.index.lock();
        let domains = self.domains.read();
        let avgdl = index.stats()?.avg_doc_length;
        let n = index.stats()?.total_docs;

        let link_graph = index.link_graph()?;
        let pagerank = ranker::pagerank_scores(&link_graph);
        let max_pagerank = pagerank.values().cloned().fold(0.0_f64, f64::max).max(1e-9);

        let raw_scores: Vec<f64> = candidates
            .iter()
            .map(|c| scoring::score_document(&c.matches, n, c.page.body.chars().count(), avgdl, self.config.bm25_k1, self.config.bm25_b, self.config.synonym_expansion_weight))
            .collect();
        let bm25_min = raw_scores.iter().cloned().fold(f64::INFINITY, f64::min);
        let bm25_max = raw_scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        let weights = ranker::strategy_weights(&self.config.ranking_weights, parsed.sort);

        let mut scored = Vec::with_capacity(candidates.len());
        for (candidate, raw_bm25) in candidates.into_iter().zip(raw_scores) {
            let inbound_links = index.inbound_link_count(candidate.page.id)?;
            let outbound_links = candidate.page.outbound_links.len() as u32;
            let page_pagerank = pagerank.get(&candidate.page.id).copied().unwrap_or(0.0) / max_pagerank;
            let ctx = RankingContext {
                page: &candidate.page,
                raw_bm25,
                bm25_min,
                bm25_max,
                trust_score: domains.trust_score(&candidate.page.host),
                pagerank: page_pagerank,
                inbound_links,
                outbound_links,
                query_intent: intent,
                semantic_overlap: if candidate.expansion_overlap { 0.7 } else { 0.5 },
                now: SystemTime::now(),
                recency_horizon_days: self.config.recency_horizon_days,
                is_registered_host: domains.resolve(&candidate.page.host).is_some(),
            };
            let components = ranker::score(&ctx, &weights, &parsed.terms);
            let total = components.total();
            let Candidate { page, .. } = candidate;
            scored.push((page, total, components));
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored)
    }

    pub fn cache_stats(&self) -> crate::cache::CacheStats {
        self.cache.lock().stats()
    }

    pub fn index_stats(&self) -> Result<crate::types::CorpusStats> {
        self.index.lock().stats()
    }

    pub fn registered_domains(&self) -> usize {
        self.domains.read().len()
    }

    pub fn analytics_snapshot(&self) -> (u64, usize, Vec<crate::analytics::TopQuery>) {
        let analytics = self.analytics.lock();
        (analytics.total_searches(), analytics.unique_queries(), analytics.top_queries_default())
    }

    pub fn weights(&self) -> RankingWeights {
        self.config.ranking_weights
    }

    /// Term-dictionary completions for a query prefix (§6 `/api/suggestions`).
    pub fn suggest(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        self.index.lock().suggest_prefix(prefix, limit)
    }

    /// Top-K highest-TF-IDF terms for an already-indexed page (§6 `/api/related`).
    pub fn related(&self, page_id: PageId, limit: usize) -> Result<Vec<String>> {
        self.index.lock().related_terms(page_id, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SqliteStore;
    use std::time::SystemTime;

    fn page(url: &str, host: &str, title: &str, body: &str) -> Page {
        Page {
            id: PageId(0),
            url: url.to_string(),
            host: host.to_string(),
            title: title.to_string(),
            description: String::new(),
            body: body.to_string(),
            outbound_links: vec![],
            fetched_at: SystemTime::now(),
            status: 200,
            size: body.len(),
            content_type: "text/html".to_string(),
            language: Some("sv".to_string()),
            discovered_from: None,
            content_hash: "hash".to_string(),
        }
    }

    fn orchestrator() -> SearchOrchestrator<SqliteStore> {
        let store = SqliteStore::open_in_memory().unwrap();
        let index = InvertedIndex::new(store);
        index
            .upsert(&page(
                "https://smhi.se/vader-stockholm",
                "smhi.se",
                "Väder Stockholm",
                "Prognos för väder i Stockholm idag: soligt.",
            ))
            .unwrap();
        index
            .upsert(&page(
                "https://dn.se/artikel",
                "dn.se",
                "Annan nyhet",
                "Detta handlar om något helt annat.",
            ))
            .unwrap();
        let store = index.into_store();

        let mut domains = DomainRegistry::default_swedish_news();
        domains.record_success("smhi.se");
        SearchOrchestrator::new(store, domains, Config::default())
    }

    #[test]
    fn finds_the_matching_page_and_ranks_it_first() {
        let orchestrator = orchestrator();
        let outcome = orchestrator.search("väder stockholm").unwrap();
        assert_eq!(outcome.total, 1);
        assert_eq!(outcome.results[0].domain, "smhi.se");
    }

    #[test]
    fn unmatched_query_returns_no_results() {
        let orchestrator = orchestrator();
        let outcome = orchestrator.search("bergsklättring").unwrap();
        assert_eq!(outcome.total, 0);
        assert!(!outcome.cached);
    }

    #[test]
    fn repeated_identical_query_hits_the_cache() {
        let orchestrator = orchestrator();
        let first = orchestrator.search("väder").unwrap();
        assert!(!first.cached);
        let second = orchestrator.search("väder").unwrap();
        assert!(second.cached);
    }

    #[test]
    fn invalid_query_surfaces_as_query_invalid() {
        let orchestrator = orchestrator();
        let err = orchestrator.search("   ").unwrap_err();
        assert!(matches!(err, crate::error::SearchError::QueryInvalid { .. }));
    }

    #[test]
    fn domain_filter_excludes_other_hosts() {
        let orchestrator = orchestrator();
        let outcome = orchestrator.search("väder site:dn.se").unwrap();
        assert_eq!(outcome.total, 0);
    }

    #[test]
    fn suggest_and_related_delegate_to_the_index() {
        let orchestrator = orchestrator();
        let outcome = orchestrator.search("väder stockholm").unwrap();
        let page_id = outcome.results[0].page_id;
        // "stockholm" only appears on one page here, below the suggestion
        // floor — the related-term lookup should still find it directly.
        let related = orchestrator.related(page_id, 5).unwrap();
        assert!(related.iter().any(|t| t == "stockholm"));
    }
}
