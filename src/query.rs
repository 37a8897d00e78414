//! C7: Query Parser.
//!
//! Parses raw query text into a `SearchQuery` in a fixed order: quoted
//! phrases first, then `key:value` filters, then `-excluded` terms, then
//! whatever free text remains becomes the term list (after dropping
//! `AND`/`OR` noise words and stripping punctuation). Running filters
//! before free terms means `site:github.com` is never accidentally
//! swallowed as a literal search term.

use crate::error::{Result, SearchError};
use crate::types::{QueryType, SearchQuery, SortStrategy};

const DEFAULT_LIMIT: usize = 20;

/// Parse `raw` into a validated query. `max_terms` bounds `terms.len() +
/// phrases.len()` (§4.7, "at least one term"); exceeding it is a hard
/// error rather than a silent truncation.
pub fn parse(raw: &str, max_terms: usize) -> Result<SearchQuery> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SearchError::QueryInvalid {
            reason: "query must not be empty".to_string(),
        });
    }

    let (phrases, remainder) = extract_phrases(trimmed);

    let mut domain_filter = None;
    let mut language_filter = None;
    let mut date_from = None;
    let mut date_to = None;
    let mut sort = SortStrategy::default();
    let mut limit = DEFAULT_LIMIT;
    let mut exclude_terms = Vec::new();
    let mut terms = Vec::new();
    let mut saw_boolean_operator = false;
    let mut saw_filter = false;

    for token in remainder.split_whitespace() {
        if let Some(value) = strip_filter(token, "site:") {
            domain_filter = Some(value.to_ascii_lowercase());
            saw_filter = true;
        } else if let Some(value) = strip_filter(token, "lang:") {
            language_filter = Some(value.to_ascii_lowercase());
            saw_filter = true;
        } else if let Some(value) = strip_filter(token, "after:") {
            date_from = Some(value.to_string());
            saw_filter = true;
        } else if let Some(value) = strip_filter(token, "before:") {
            date_to = Some(value.to_string());
            saw_filter = true;
        } else if let Some(value) = strip_filter(token, "sort:") {
            sort = match value.to_ascii_lowercase().as_str() {
                "relevance" => SortStrategy::Relevance,
                "popularity" => SortStrategy::Popularity,
                "recency" => SortStrategy::Recency,
                _ => SortStrategy::Hybrid,
            };
            saw_filter = true;
        } else if let Some(value) = strip_filter(token, "limit=").or_else(|| strip_filter(token, "limit:")) {
            if let Ok(parsed) = value.parse::<usize>() {
                limit = parsed;
            }
            saw_filter = true;
        } else if let Some(excluded) = token.strip_prefix('-') {
            let cleaned = clean_term(excluded);
            if !cleaned.is_empty() {
                exclude_terms.push(cleaned);
            }
        } else if token.eq_ignore_ascii_case("and") || token.eq_ignore_ascii_case("or") {
            saw_boolean_operator = true;
        } else {
            let cleaned = clean_term(token);
            if !cleaned.is_empty() {
                terms.push(cleaned);
            }
        }
    }

    if terms.is_empty() && phrases.is_empty() {
        return Err(SearchError::QueryInvalid {
            reason: "query must contain at least one term or phrase".to_string(),
        });
    }

    if terms.len() + phrases.len() > max_terms {
        return Err(SearchError::QueryInvalid {
            reason: format!("query exceeds the maximum of {max_terms} terms"),
        });
    }

    let query_type = classify(saw_filter, !phrases.is_empty(), terms.len(), !exclude_terms.is_empty(), saw_boolean_operator);

    Ok(SearchQuery {
        normalized_text: crate::analysis::normalize(trimmed),
        query_type,
        terms,
        phrases,
        exclude_terms,
        domain_filter,
        language_filter,
        date_from,
        date_to,
        sort,
        offset: 0,
        limit,
    })
}

fn strip_filter<'a>(token: &'a str, prefix: &str) -> Option<&'a str> {
    token.strip_prefix(prefix).filter(|v| !v.is_empty())
}

fn clean_term(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, 'å' | 'ä' | 'ö'))
        .collect::<String>()
        .to_lowercase()
}

/// Pull out `"quoted phrases"`, returning them alongside the remaining
/// text with each phrase removed (so later stages never re-tokenize it).
fn extract_phrases(text: &str) -> (Vec<String>, String) {
    let mut phrases = Vec::new();
    let mut remainder = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            let mut phrase = String::new();
            for next in chars.by_ref() {
                if next == '"' {
                    break;
                }
                phrase.push(next);
            }
            let cleaned = phrase.trim().to_lowercase();
            if !cleaned.is_empty() {
                phrases.push(cleaned);
            }
            remainder.push(' ');
        } else {
            remainder.push(c);
        }
    }
    (phrases, remainder)
}

/// Classify per §4.7's ordering: a filter always wins (`Advanced`); a
/// phrase with no free terms is `Phrase`, a phrase alongside free terms is
/// `Mixed`; an exclusion or boolean noise word with no phrase is
/// `Boolean`; otherwise it comes down to term count — one term is
/// `Simple`, more than one is `Mixed`.
fn classify(saw_filter: bool, has_phrases: bool, term_count: usize, has_exclusions: bool, saw_boolean: bool) -> QueryType {
    if saw_filter {
        return QueryType::Advanced;
    }
    if has_phrases {
        return if term_count > 0 { QueryType::Mixed } else { QueryType::Phrase };
    }
    if has_exclusions || saw_boolean {
        return QueryType::Boolean;
    }
    if term_count > 1 {
        return QueryType::Mixed;
    }
    QueryType::Simple
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_the_advanced_query_scenario_from_the_spec() {
        let q = parse("python site:github.com -java limit=5", 32).unwrap();
        assert_eq!(q.terms, vec!["python"]);
        assert!(q.phrases.is_empty());
        assert_eq!(q.exclude_terms, vec!["java"]);
        assert_eq!(q.domain_filter.as_deref(), Some("github.com"));
        assert_eq!(q.query_type, QueryType::Advanced);
        assert_eq!(q.limit, 5);
    }

    #[test]
    fn single_term_query_is_simple() {
        let q = parse("stockholm", 32).unwrap();
        assert_eq!(q.query_type, QueryType::Simple);
        assert_eq!(q.terms, vec!["stockholm"]);
    }

    #[test]
    fn multi_term_free_text_query_is_mixed() {
        let q = parse("väder stockholm", 32).unwrap();
        assert_eq!(q.query_type, QueryType::Mixed);
        assert_eq!(q.terms, vec!["väder", "stockholm"]);
    }

    #[test]
    fn phrase_query_preserves_the_quoted_text() {
        let q = parse("\"öppettider systembolaget\"", 32).unwrap();
        assert_eq!(q.phrases, vec!["öppettider systembolaget"]);
        assert_eq!(q.query_type, QueryType::Phrase);
    }

    #[test]
    fn mixed_query_has_both_phrase_and_terms() {
        let q = parse("\"öppettider\" systembolaget", 32).unwrap();
        assert_eq!(q.query_type, QueryType::Mixed);
    }

    #[test]
    fn boolean_operators_are_dropped_as_noise_words() {
        let q = parse("stockholm AND väder", 32).unwrap();
        assert_eq!(q.terms, vec!["stockholm", "väder"]);
        assert_eq!(q.query_type, QueryType::Boolean);
    }

    #[test]
    fn empty_query_is_rejected() {
        assert!(parse("   ", 32).is_err());
    }

    #[test]
    fn exceeding_max_terms_is_rejected() {
        assert!(parse("a b c d e", 3).is_err());
    }
}
