//! C5: Inverted Index.
//!
//! Owns the term→postings mapping and corpus statistics BM25 needs
//! (document count, average document length, per-term document
//! frequency). Backed by `store::SqliteStore`; callers serialize access
//! through a single `Mutex<InvertedIndex>` (§5).

mod store;

pub use store::{IndexStore, SqliteStore};

use std::collections::HashMap;
use std::time::SystemTime;

use crate::analysis::{self, AnalyzedTerm};
use crate::error::Result;
use crate::types::{CorpusStats, FieldFlags, Page, PageId, Posting};

/// The inverted index, generic over its storage backend so tests can run
/// against an in-memory `SqliteStore` without touching disk.
pub struct InvertedIndex<S: IndexStore> {
    store: S,
}

impl<S: IndexStore> InvertedIndex<S> {
    pub fn new(store: S) -> Self {
        InvertedIndex { store }
    }

    /// Unwrap back to the underlying store. Mainly useful for tests that
    /// build an index, then hand the same store to something else that
    /// wants to own it directly (e.g. `SearchOrchestrator::new`).
    pub fn into_store(self) -> S {
        self.store
    }

    /// Analyze and index a freshly-fetched page. Runs the C2 analysis
    /// chain separately over the title, description, and body so each
    /// posting's `FieldFlags` reflect which field(s) it actually occurred
    /// in, then writes the page and its postings in one transaction.
    pub fn upsert(&self, page: &Page) -> Result<PageId> {
        let mut term_stats: HashMap<String, (u32, FieldFlags)> = HashMap::new();

        let mut accumulate = |text: &str, mark: fn(&mut FieldFlags)| {
            for AnalyzedTerm { term, .. } in analysis::analyze(text) {
                let entry = term_stats.entry(term).or_insert((0, FieldFlags::NONE));
                entry.0 += 1;
                mark(&mut entry.1);
            }
        };

        accumulate(&page.title, |f| f.in_title = true);
        accumulate(&page.description, |f| f.in_description = true);
        accumulate(&page.body, |f| f.in_body = true);

        let postings: Vec<(String, Posting)> = term_stats
            .into_iter()
            .map(|(term, (tf, fields))| {
                (
                    term,
                    Posting {
                        page_id: PageId(0),
                        term_frequency: tf,
                        fields,
                        bm25_hint: 0.0,
                    },
                )
            })
            .collect();

        self.store.upsert_page_with_postings(page, &postings)
    }

    pub fn get_page(&self, id: PageId) -> Result<Option<Page>> {
        self.store.get_page(id)
    }

    pub fn get_page_by_url(&self, url: &str) -> Result<Option<Page>> {
        self.store.get_page_by_url(url)
    }

    /// Every `(page, posting)` pair for a single already-analyzed term.
    pub fn get_postings(&self, term: &str) -> Result<Vec<(PageId, Posting)>> {
        self.store.get_postings(term)
    }

    pub fn document_frequency(&self, term: &str) -> Result<usize> {
        self.store.document_frequency(term)
    }

    /// IDF for `term` against the current corpus. Recomputed on every
    /// call rather than cached on the struct: `document_frequency` and
    /// `total_docs` are already backed by an indexed SQL lookup, and a
    /// process-level cache would need its own invalidation story on every
    /// `upsert` — not worth it until profiling says otherwise.
    pub fn idf(&self, term: &str) -> Result<f64> {
        let n = self.store.total_docs()?;
        let df = self.store.document_frequency(term)?;
        Ok(crate::scoring::idf(n, df))
    }

    pub fn stats(&self) -> Result<CorpusStats> {
        Ok(CorpusStats {
            total_docs: self.store.total_docs()?,
            avg_doc_length: self.store.avg_doc_length()?,
            term_count: self.store.total_terms()?,
        })
    }

    pub fn mark_visited(&self, url: &str, at: SystemTime) -> Result<()> {
        self.store.mark_visited(url, at)
    }

    pub fn is_visited(&self, url: &str) -> Result<bool> {
        self.store.is_visited(url)
    }

    pub fn link_graph(&self) -> Result<HashMap<PageId, Vec<PageId>>> {
        self.store.link_graph()
    }

    pub fn inbound_link_count(&self, page_id: PageId) -> Result<u32> {
        self.store.inbound_link_count(page_id)
    }

    pub fn append_crawl_log(&self, entry: &crate::types::CrawlLogEntry) -> Result<()> {
        self.store.append_crawl_log(entry)
    }

    pub fn recent_crawl_logs(&self, limit: usize) -> Result<Vec<crate::types::CrawlLogEntry>> {
        self.store.recent_crawl_logs(limit)
    }

    pub fn all_page_ids(&self) -> Result<Vec<PageId>> {
        self.store.all_page_ids()
    }

    /// Drop postings left dangling by partial writes or external
    /// tampering. Returns the number of rows removed.
    pub fn sweep_consistency(&self) -> Result<usize> {
        self.store.delete_orphan_postings()
    }

    /// Term-dictionary completions for a query prefix (§6
    /// `/api/suggestions`). Terms seen in only a handful of documents are
    /// excluded so a misspelling or a one-off proper noun doesn't show up
    /// ahead of genuinely common completions.
    pub fn suggest_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let prefix = prefix.to_ascii_lowercase();
        if prefix.is_empty() {
            return Ok(Vec::new());
        }
        self.store.terms_with_prefix(&prefix, SUGGESTION_MIN_DOCUMENT_FREQUENCY, limit)
    }

    /// Top-K highest-TF-IDF terms for an already-indexed page (§6
    /// `/api/related`), used as a lightweight "more like this" term set.
    pub fn related_terms(&self, page_id: PageId, limit: usize) -> Result<Vec<String>> {
        let n = self.store.total_docs()?;
        let mut scored: Vec<(String, f64)> = self
            .store
            .term_frequencies_for_page(page_id)?
            .into_iter()
            .map(|(term, tf)| {
                let df = self.store.document_frequency(&term).unwrap_or(0);
                let weight = tf as f64 * crate::scoring::idf(n, df);
                (term, weight)
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);
        Ok(scored.into_iter().map(|(term, _)| term).collect())
    }
}

/// A term must appear in at least this many documents to be offered as a
/// suggestion — keeps rare terms and one-off proper nouns out of the
/// autocomplete list.
const SUGGESTION_MIN_DOCUMENT_FREQUENCY: usize = 2;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn page(url: &str, title: &str, body: &str) -> Page {
        Page {
            id: PageId(0),
            url: url.to_string(),
            host: "example.se".to_string(),
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

    #[test]
    fn upsert_makes_terms_retrievable() {
        let index = InvertedIndex::new(SqliteStore::open_in_memory().unwrap());
        let id = index
            .upsert(&page("https://example.se/a", "Väder i Stockholm", "Det blir soligt i Stockholm idag."))
            .unwrap();
        let postings = index.get_postings("stockholm").unwrap();
        assert!(postings.iter().any(|(p, _)| *p == id));
    }

    #[test]
    fn stopwords_never_become_indexable_terms() {
        let index = InvertedIndex::new(SqliteStore::open_in_memory().unwrap());
        index.upsert(&page("https://example.se/a", "En titel", "Det är och för att med")).unwrap();
        assert_eq!(index.document_frequency("och").unwrap(), 0);
    }

    #[test]
    fn title_hits_are_flagged_separately_from_body_hits() {
        let index = InvertedIndex::new(SqliteStore::open_in_memory().unwrap());
        index.upsert(&page("https://example.se/a", "Stockholm", "ingenting relevant")).unwrap();
        let postings = index.get_postings("stockholm").unwrap();
        assert!(postings[0].1.fields.in_title);
        assert!(!postings[0].1.fields.in_body);
    }

    #[test]
    fn idf_decreases_as_more_documents_contain_the_term() {
        let index = InvertedIndex::new(SqliteStore::open_in_memory().unwrap());
        index.upsert(&page("https://example.se/a", "Stockholm", "stockholm")).unwrap();
        let idf_one_doc = index.idf("stockholm").unwrap();
        index.upsert(&page("https://example.se/b", "Stockholm igen", "stockholm")).unwrap();
        let idf_two_docs = index.idf("stockholm").unwrap();
        assert!(idf_two_docs <= idf_one_doc);
    }

    #[test]
    fn suggest_prefix_excludes_terms_below_the_document_frequency_floor() {
        let index = InvertedIndex::new(SqliteStore::open_in_memory().unwrap());
        index.upsert(&page("https://example.se/a", "Stockholm", "stockholm")).unwrap();
        index.upsert(&page("https://example.se/b", "Storm", "storm")).unwrap();
        // "stockholm" appears in 1 doc, below the floor of 2 — excluded.
        assert_eq!(index.suggest_prefix("sto", 10).unwrap(), Vec::<String>::new());
        index.upsert(&page("https://example.se/c", "Stockholm igen", "stockholm")).unwrap();
        assert_eq!(index.suggest_prefix("sto", 10).unwrap(), vec!["stockholm".to_string()]);
    }

    #[test]
    fn related_terms_ranks_by_tf_idf_descending() {
        let index = InvertedIndex::new(SqliteStore::open_in_memory().unwrap());
        let id = index
            .upsert(&page("https://example.se/a", "Väder", "stockholm stockholm stockholm och det är"))
            .unwrap();
        index.upsert(&page("https://example.se/b", "Väder", "det är")).unwrap();
        let related = index.related_terms(id, 1).unwrap();
        assert_eq!(related, vec!["stockholm".to_string()]);
    }
}
