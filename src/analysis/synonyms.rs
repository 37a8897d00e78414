//! Synonym / concept-cluster expansion.
//!
//! A fixed anchor-term → related-terms mapping. Expansion is additive: the
//! original query term is always emitted first by the caller (`analyze`),
//! these are extras appended at reduced weight downstream in BM25.

const CLUSTERS: &[(&str, &[&str])] = &[
    ("nyhet", &["artikel", "rapport", "notis"]),
    ("regering", &["myndighet", "departement", "riksdag"]),
    ("handel", &["butik", "köp", "affär"]),
    ("hälsa", &["sjukvård", "vård", "patient"]),
    ("väder", &["prognos", "temperatur", "klimat"]),
    ("jobb", &["arbete", "tjänst", "karriär"]),
    ("skola", &["utbildning", "universitet", "kurs"]),
    ("sport", &["match", "tävling", "turnering"]),
];

/// Related terms for `term`, or an empty vec if it isn't a recognized
/// anchor. Lookup is by stem, so callers should pass an already-stemmed
/// term.
pub fn expand_term(term: &str) -> Vec<String> {
    CLUSTERS
        .iter()
        .find(|(anchor, _)| *anchor == term)
        .map(|(_, related)| related.iter().map(|s| s.to_string()).collect())
        .unwrap_or_default()
}

/// All anchor terms, used by the query expander to recognize which query
/// terms are expandable.
pub fn anchors() -> impl Iterator<Item = &'static str> {
    CLUSTERS.iter().map(|(anchor, _)| *anchor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_known_anchor() {
        let related = expand_term("nyhet");
        assert!(related.contains(&"artikel".to_string()));
    }

    #[test]
    fn unknown_term_expands_to_nothing() {
        assert!(expand_term("stockholm").is_empty());
    }

    #[test]
    fn expansion_never_contains_the_anchor_itself() {
        for anchor in anchors() {
            assert!(!expand_term(anchor).contains(&anchor.to_string()));
        }
    }
}
