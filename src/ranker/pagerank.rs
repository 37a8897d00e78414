//! Damped power-iteration PageRank over the crawled link graph.
//!
//! Kept in its own small module rather than folded into the caller, same
//! split as the other numeric-algorithm modules in this crate. Runs a
//! fixed 20 iterations rather than iterating to convergence — bounded
//! cost matters more than the last few bits of precision for a ranking
//! signal.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::types::PageId;

const ITERATIONS: u32 = 20;
const DAMPING: f64 = 0.85;

/// `graph[page] = outbound links from page (as page ids already resolved
/// within the corpus)`. Pages with no outbound links distribute their mass
/// evenly across the whole corpus (the standard "dangling node" handling).
pub fn compute_pagerank(
    graph: &HashMap<PageId, Vec<PageId>>,
    damping: f64,
    iterations: u32,
) -> HashMap<PageId, f64> {
    let n = graph.len();
    if n == 0 {
        return HashMap::new();
    }
    let initial = 1.0 / n as f64;
    let mut scores: HashMap<PageId, f64> = graph.keys().map(|&id| (id, initial)).collect();
    let ids: Vec<PageId> = graph.keys().copied().collect();

    for _ in 0..iterations.max(1) {
        let dangling_mass: f64 = ids
            .par_iter()
            .filter(|id| graph.get(id).map(|links| links.is_empty()).unwrap_or(true))
            .map(|id| scores[id])
            .sum();

        let mut next: HashMap<PageId, f64> = ids
            .iter()
            .map(|&id| (id, (1.0 - damping) / n as f64 + damping * dangling_mass / n as f64))
            .collect();

        for &id in &ids {
            let Some(outbound) = graph.get(&id) else { continue };
            if outbound.is_empty() {
                continue;
            }
            let share = damping * scores[&id] / outbound.len() as f64;
            for target in outbound {
                if let Some(entry) = next.get_mut(target) {
                    *entry += share;
                }
            }
        }

        scores = next;
    }

    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(id: u64) -> PageId {
        PageId(id)
    }

    #[test]
    fn empty_graph_yields_empty_scores() {
        let graph = HashMap::new();
        assert!(compute_pagerank(&graph, DAMPING, ITERATIONS).is_empty());
    }

    #[test]
    fn scores_sum_to_roughly_one() {
        let mut graph = HashMap::new();
        graph.insert(page(1), vec![page(2)]);
        graph.insert(page(2), vec![page(1), page(3)]);
        graph.insert(page(3), vec![page(1)]);
        let scores = compute_pagerank(&graph, DAMPING, ITERATIONS);
        let total: f64 = scores.values().sum();
        assert!((total - 1.0).abs() < 0.05, "total was {total}");
    }

    #[test]
    fn a_page_linked_by_everyone_outranks_an_isolated_one() {
        let mut graph = HashMap::new();
        graph.insert(page(1), vec![page(3)]);
        graph.insert(page(2), vec![page(3)]);
        graph.insert(page(3), vec![]);
        graph.insert(page(4), vec![]);
        let scores = compute_pagerank(&graph, DAMPING, ITERATIONS);
        assert!(scores[&page(3)] > scores[&page(4)]);
    }

    #[test]
    fn dangling_nodes_do_not_leak_mass() {
        let mut graph = HashMap::new();
        graph.insert(page(1), vec![]);
        graph.insert(page(2), vec![]);
        let scores = compute_pagerank(&graph, DAMPING, ITERATIONS);
        let total: f64 = scores.values().sum();
        assert!((total - 1.0).abs() < 0.05, "total was {total}");
    }
}
