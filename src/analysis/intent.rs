//! Query intent classification.
//!
//! Pattern-matches a normalized query against an ordered list of Swedish
//! question frames. Ordering is by specificity — the first matching frame
//! wins, so a query matching several patterns is still deterministic.

use super::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// `vem är ...` — person lookup.
    PersonLookup,
    /// `vad är ...` — definition lookup.
    Definition,
    /// `var ligger ...` — location lookup.
    Location,
    /// `när ...` — temporal lookup.
    Temporal,
    /// `hur ...` — how-to lookup.
    HowTo,
    /// Recency-sensitive query (news/recent/trend keywords), used by the
    /// ranker's recency boost (§4.8).
    News,
    General,
}

const FRAMES: &[(&str, Intent)] = &[
    ("vem ar", Intent::PersonLookup),
    ("vad ar", Intent::Definition),
    ("var ligger", Intent::Location),
    ("nar", Intent::Temporal),
    ("hur", Intent::HowTo),
];

const NEWS_KEYWORDS: &[&str] = &["nyheter", "senaste", "trend", "idag", "just nu"];

/// Classify intent for a (not-yet-analyzed) query string. Applies `fold` so
/// that `å ä ö` variants of the frames still match (`når`/`nar` etc. are
/// equivalent for matching purposes, though indexing never folds).
pub fn classify_intent(query: &str) -> Intent {
    let folded = super::fold(&normalize(query));

    for (frame, intent) in FRAMES {
        if folded.starts_with(frame) {
            return *intent;
        }
    }

    if NEWS_KEYWORDS.iter().any(|kw| folded.contains(&super::fold(kw))) {
        return Intent::News;
    }

    Intent::General
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_listed_pattern_wins_when_multiple_match() {
        // "vem ar hur" matches both PersonLookup and HowTo; PersonLookup is
        // listed first (more specific) and must win.
        assert_eq!(classify_intent("vem ar hur man gor det"), Intent::PersonLookup);
    }

    #[test]
    fn recognizes_location_frame() {
        assert_eq!(classify_intent("var ligger stockholm"), Intent::Location);
    }

    #[test]
    fn recognizes_news_keywords() {
        assert_eq!(classify_intent("senaste nyheterna"), Intent::News);
    }

    #[test]
    fn default_is_general() {
        assert_eq!(classify_intent("stockholm karta"), Intent::General);
    }

    #[test]
    fn deterministic_across_repeated_calls() {
        let q = "vad ar ett bolag";
        assert_eq!(classify_intent(q), classify_intent(q));
    }
}
