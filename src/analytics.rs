//! C12: Analytics Counter.
//!
//! Pure in-memory bookkeeping — no I/O, no persistence. Tracks total
//! search volume, distinct query count, a rolling average execution time,
//! and the top-K most frequent (normalized) queries.

use std::collections::HashMap;
use std::time::Duration;

const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct TopQuery {
    pub query: String,
    pub count: u64,
}

pub struct Analytics {
    total_searches: u64,
    query_counts: HashMap<String, u64>,
    total_execution_time: Duration,
}

impl Default for Analytics {
    fn default() -> Self {
        Analytics {
            total_searches: 0,
            query_counts: HashMap::new(),
            total_execution_time: Duration::ZERO,
        }
    }
}

impl Analytics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed search. `normalized_query` should already be
    /// through `analysis::normalize` so distinct capitalizations/spacing
    /// of the same query count once.
    pub fn record(&mut self, normalized_query: &str, execution_time: Duration) {
        self.total_searches += 1;
        self.total_execution_time += execution_time;
        *self.query_counts.entry(normalized_query.to_string()).or_insert(0) += 1;
    }

    pub fn total_searches(&self) -> u64 {
        self.total_searches
    }

    pub fn unique_queries(&self) -> usize {
        self.query_counts.len()
    }

    pub fn query_count(&self, normalized_query: &str) -> u64 {
        self.query_counts.get(normalized_query).copied().unwrap_or(0)
    }

    pub fn average_execution_time(&self) -> Duration {
        if self.total_searches == 0 {
            Duration::ZERO
        } else {
            self.total_execution_time / self.total_searches as u32
        }
    }

    /// Most-frequent queries, ties broken lexicographically so repeated
    /// calls with identical counts are deterministic.
    pub fn top_queries(&self, k: usize) -> Vec<TopQuery> {
        let mut entries: Vec<TopQuery> = self
            .query_counts
            .iter()
            .map(|(query, &count)| TopQuery { query: query.clone(), count })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.query.cmp(&b.query)));
        entries.truncate(k);
        entries
    }

    pub fn top_queries_default(&self) -> Vec<TopQuery> {
        self.top_queries(DEFAULT_TOP_K)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_total_and_unique_searches() {
        let mut analytics = Analytics::new();
        analytics.record("väder stockholm", Duration::from_millis(10));
        analytics.record("väder stockholm", Duration::from_millis(20));
        analytics.record("nyheter", Duration::from_millis(5));
        assert_eq!(analytics.total_searches(), 3);
        assert_eq!(analytics.unique_queries(), 2);
        assert_eq!(analytics.query_count("väder stockholm"), 2);
    }

    #[test]
    fn average_execution_time_is_a_mean() {
        let mut analytics = Analytics::new();
        analytics.record("a", Duration::from_millis(10));
        analytics.record("b", Duration::from_millis(30));
        assert_eq!(analytics.average_execution_time(), Duration::from_millis(20));
    }

    #[test]
    fn top_queries_orders_by_frequency_then_lexicographically() {
        let mut analytics = Analytics::new();
        analytics.record("b", Duration::ZERO);
        analytics.record("a", Duration::ZERO);
        analytics.record("a", Duration::ZERO);
        analytics.record("c", Duration::ZERO);
        let top = analytics.top_queries(2);
        assert_eq!(top[0].query, "a");
        assert_eq!(top[1].query, "b");
    }

    #[test]
    fn empty_analytics_has_zero_average() {
        let analytics = Analytics::new();
        assert_eq!(analytics.average_execution_time(), Duration::ZERO);
    }
}
