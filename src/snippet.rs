//! C11: Snippet Generator.
//!
//! Picks a window around the first query-term match (falling back to
//! description, then title, when the body has no match at all), trims it
//! to `max_length` characters at word boundaries, and reports the
//! highlight ranges so callers can bold the matched terms without
//! re-running the search themselves.

const CONTEXT_MARGIN_CHARS: usize = 40;

/// A generated snippet plus the `(start, end)` char-index ranges within
/// it that matched a query term, case-insensitively.
pub struct Snippet {
    pub text: String,
    pub highlights: Vec<(usize, usize)>,
}

/// `title`/`description`/`body` are tried in that priority for *which
/// field to window into* only when the body itself has no match; once a
/// source field is chosen the window is always centered on its first
/// match.
pub fn generate(title: &str, description: &str, body: &str, terms: &[String], max_length: usize) -> Snippet {
    if let Some(snippet) = window_around_match(body, terms, max_length) {
        return snippet;
    }
    if let Some(snippet) = window_around_match(description, terms, max_length) {
        return snippet;
    }
    if let Some(snippet) = window_around_match(title, terms, max_length) {
        return snippet;
    }

    let fallback = if !description.is_empty() { description } else { title };
    Snippet {
        text: truncate_at_word_boundary(fallback, max_length),
        highlights: Vec::new(),
    }
}

fn window_around_match(text: &str, terms: &[String], max_length: usize) -> Option<Snippet> {
    if text.is_empty() || terms.is_empty() {
        return None;
    }
    let chars: Vec<char> = text.chars().collect();
    let lower: Vec<char> = text.to_lowercase().chars().collect();

    let match_pos = terms.iter().filter(|t| !t.is_empty()).find_map(|term| {
        let needle: Vec<char> = term.to_lowercase().chars().collect();
        find_subsequence(&lower, &needle)
    })?;

    let start = match_pos.saturating_sub(CONTEXT_MARGIN_CHARS);
    let end = (match_pos + CONTEXT_MARGIN_CHARS).min(chars.len());
    let start = extend_to_word_start(&chars, start);
    let end = extend_to_word_end(&chars, end);

    let window: String = chars[start..end].iter().collect();
    let trimmed = truncate_at_word_boundary(&window, max_length);

    let highlights = find_all_highlights(&trimmed, terms);
    Some(Snippet { text: trimmed, highlights })
}

fn find_subsequence(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn extend_to_word_start(chars: &[char], mut index: usize) -> usize {
    while index > 0 && !chars[index - 1].is_whitespace() {
        index -= 1;
    }
    index
}

fn extend_to_word_end(chars: &[char], mut index: usize) -> usize {
    while index < chars.len() && !chars[index].is_whitespace() {
        index += 1;
    }
    index
}

fn truncate_at_word_boundary(text: &str, max_length: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_length {
        return text.trim().to_string();
    }
    let mut cut = max_length;
    while cut > 0 && !chars[cut].is_whitespace() {
        cut -= 1;
    }
    if cut == 0 {
        cut = max_length;
    }
    let truncated: String = chars[..cut].iter().collect();
    format!("{}…", truncated.trim())
}

fn find_all_highlights(text: &str, terms: &[String]) -> Vec<(usize, usize)> {
    let lower: Vec<char> = text.to_lowercase().chars().collect();
    let mut ranges = Vec::new();
    for term in terms.iter().filter(|t| !t.is_empty()) {
        let needle: Vec<char> = term.to_lowercase().chars().collect();
        let mut offset = 0;
        while offset + needle.len() <= lower.len() {
            if lower[offset..offset + needle.len()] == needle[..] {
                ranges.push((offset, offset + needle.len()));
                offset += needle.len();
            } else {
                offset += 1;
            }
        }
    }
    ranges.sort_unstable();
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_around_the_first_match() {
        let body = "Detta är en lång text om väder i Stockholm som fortsätter ett bra tag till efteråt.";
        let terms = vec!["stockholm".to_string()];
        let snippet = generate("Titel", "", body, &terms, 150);
        assert!(snippet.text.to_lowercase().contains("stockholm"));
        assert!(!snippet.highlights.is_empty());
    }

    #[test]
    fn falls_back_to_title_when_nothing_matches() {
        let terms = vec!["nonexistent".to_string()];
        let snippet = generate("Titel här", "En beskrivning", "", &terms, 150);
        assert_eq!(snippet.text, "En beskrivning");
        assert!(snippet.highlights.is_empty());
    }

    #[test]
    fn respects_max_length() {
        let body = "ord ".repeat(100);
        let terms = vec!["ord".to_string()];
        let snippet = generate("", "", &body, &terms, 50);
        assert!(snippet.text.chars().count() <= 51);
    }

    #[test]
    fn highlights_are_case_insensitive() {
        let body = "Stockholm är Sveriges huvudstad.";
        let terms = vec!["stockholm".to_string()];
        let snippet = generate("", "", body, &terms, 150);
        assert_eq!(snippet.highlights[0], (0, 9));
    }
}
