//! C6: BM25 Scorer.
//!
//! `idf(t) * (tf(t)*(k1+1)) / (tf(t) + k1*(1 - b + b*dl/avgdl))`, with
//! `idf(t) = ln((N - df(t) + 0.5) / (df(t) + 0.5) + 1)`. Defaults `k1 =
//! 1.5`, `b = 0.75` (§4.6), configurable via `Config`.
//!
//! Terms the analyzer added as expansions (compound halves, synonyms)
//! contribute at `synonym_expansion_weight` (default 0.5) rather than full
//! weight, so a synonym match never outranks a literal one.

/// IDF for a term given corpus size `n` and document frequency `df`. Never
/// negative: `df <= n` always holds for terms actually present in the
/// index, and the `+1` inside the log keeps the floor at 0 even at `df = n`.
pub fn idf(n: usize, df: usize) -> f64 {
    if n == 0 || df == 0 {
        return 0.0;
    }
    let n = n as f64;
    let df = df as f64;
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// BM25 contribution of a single term occurring `tf` times in a document of
/// length `dl`, given corpus-wide `avgdl`.
pub fn bm25_term_score(n: usize, df: usize, tf: u32, dl: usize, avgdl: f64, k1: f64, b: f64) -> f64 {
    if tf == 0 || avgdl <= 0.0 {
        return 0.0;
    }
    let tf = tf as f64;
    let dl = dl as f64;
    let numerator = tf * (k1 + 1.0);
    let denominator = tf + k1 * (1.0 - b + b * dl / avgdl);
    idf(n, df) * (numerator / denominator)
}

/// One scored query term against one document: `(term, tf, df, is_expansion)`.
pub struct TermMatch {
    pub tf: u32,
    pub df: usize,
    pub is_expansion: bool,
}

/// Sum BM25 contributions across all matched query terms for a document,
/// discounting expansion-only matches by `expansion_weight`.
pub fn score_document(
    matches: &[TermMatch],
    n: usize,
    dl: usize,
    avgdl: f64,
    k1: f64,
    b: f64,
    expansion_weight: f64,
) -> f64 {
    matches
        .iter()
        .map(|m| {
            let raw = bm25_term_score(n, m.df, m.tf, dl, avgdl, k1, b);
            if m.is_expansion {
                raw * expansion_weight
            } else {
                raw
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_the_worked_example() {
        // N=2, df=1, tf=3, dl=100, avgdl=100, k1=1.5, b=0.75 -> ~1.155
        let score = bm25_term_score(2, 1, 3, 100, 100.0, 1.5, 0.75);
        assert!((score - 1.155).abs() < 0.001, "got {score}");
    }

    #[test]
    fn zero_term_frequency_yields_zero() {
        assert_eq!(bm25_term_score(10, 2, 0, 100, 100.0, 1.5, 0.75), 0.0);
    }

    #[test]
    fn idf_is_never_negative_for_valid_df() {
        for df in 1..=50 {
            assert!(idf(50, df) >= 0.0, "df={df}");
        }
    }

    #[test]
    fn rarer_terms_score_higher_than_common_ones_at_equal_tf() {
        let rare = bm25_term_score(1000, 2, 3, 100, 100.0, 1.5, 0.75);
        let common = bm25_term_score(1000, 500, 3, 100, 100.0, 1.5, 0.75);
        assert!(rare > common);
    }

    #[test]
    fn expansion_matches_are_discounted() {
        let matches = vec![
            TermMatch { tf: 3, df: 1, is_expansion: false },
            TermMatch { tf: 3, df: 1, is_expansion: true },
        ];
        let full = score_document(&matches[..1], 2, 100, 100.0, 1.5, 0.75, 0.5);
        let with_expansion = score_document(&matches, 2, 100, 100.0, 1.5, 0.75, 0.5);
        assert!(with_expansion > full);
        assert!(with_expansion < full * 2.0);
    }

    proptest::proptest! {
        #[test]
        fn bm25_is_never_negative(n in 1usize..1000, df in 1usize..1000, tf in 1u32..50, dl in 1usize..2000) {
            let df = df.min(n);
            let score = bm25_term_score(n, df, tf, dl, 150.0, 1.5, 0.75);
            proptest::prop_assert!(score >= -1e-9);
        }
    }
}
