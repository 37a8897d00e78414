//! Light Swedish stemming: suffix-stripping for common inflections.
//!
//! Strips plural (`-ar`, `-er`, `-or`), definite (`-en`, `-et`, `-na`,
//! `-arna`, `-erna`), and past-tense (`-ade`) endings. Suffixes are tried
//! longest-first and stripped repeatedly until none apply or the remaining
//! stem would drop to length <= 3 — which is exactly what makes the
//! operation idempotent: a second pass finds nothing left to strip.

const SUFFIXES: &[&str] = &["arna", "erna", "orna", "ade", "ar", "er", "or", "en", "et", "na"];

/// Words of length <= 3 are returned unchanged.
pub fn stem(word: &str) -> String {
    let mut current = word.to_string();
    while current.chars().count() > 3 {
        match strip_one(&current) {
            Some(next) => current = next,
            None => break,
        }
    }
    current
}

fn strip_one(word: &str) -> Option<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut best: Option<&str> = None;
    for suffix in SUFFIXES {
        let suffix_len = suffix.chars().count();
        if chars.len() <= suffix_len {
            continue;
        }
        if word.ends_with(suffix) {
            let remaining = chars.len() - suffix_len;
            if remaining < 2 {
                continue;
            }
            if best.map(|b| suffix_len > b.chars().count()).unwrap_or(true) {
                best = Some(suffix);
            }
        }
    }
    best.map(|suffix| {
        let keep = chars.len() - suffix.chars().count();
        chars[..keep].iter().collect()
    })
}
