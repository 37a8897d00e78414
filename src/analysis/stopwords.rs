//! Fixed Swedish stopword set (~50 entries).
//!
//! Enumerated by hand from the reference list named in §4.2; adding or
//! removing an entry is a deliberate config change, not something the
//! analyzer infers at runtime.

const STOPWORDS: &[&str] = &[
    "och", "det", "att", "i", "en", "jag", "hon", "som", "han", "på", "den",
    "med", "var", "sig", "för", "så", "till", "är", "men", "ett", "om",
    "hade", "de", "av", "icke", "mig", "du", "henne", "då", "sin", "nu",
    "har", "inte", "hans", "kunde", "tillbaka", "mot", "upp", "blev",
    "efter", "dem", "vid", "kunne", "in", "man", "skulle", "vid", "vara",
    "sedan", "eller", "ut", "kan", "här", "denna", "vi", "när", "vilken",
    "detta", "också", "från", "vart",
];

/// Membership test against the fixed stopword set.
pub fn is_stopword(term: &str) -> bool {
    STOPWORDS.contains(&term)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_common_words() {
        assert!(is_stopword("och"));
        assert!(is_stopword("det"));
        assert!(!is_stopword("stockholm"));
    }

    #[test]
    fn set_has_roughly_fifty_entries() {
        let unique: std::collections::HashSet<&str> = STOPWORDS.iter().copied().collect();
        assert!(unique.len() >= 40 && unique.len() <= 70);
    }
}
