//! C2: Swedish-aware text analysis chain.
//!
//! `tokenize → stopword filter → light stem → compound split → synonym
//! expansion` — each stage is a pure function over `&str`/`Vec<String>` so
//! the pipeline can be tested stage by stage. Nothing here allocates a
//! thread or touches I/O; empty input returns empty output at every stage
//! (§4.2 "Failure mode").

mod compound;
mod intent;
mod stem;
mod stopwords;
mod synonyms;

pub use compound::split_compound;
pub use intent::{classify_intent, Intent};
pub use stem::stem;
pub use stopwords::is_stopword;
pub use synonyms::expand_term;

use unicode_normalization::UnicodeNormalization;

/// A token produced by `tokenize`, with its classification as a side datum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Numeric,
    Mixed,
}

/// Lowercase, collapse whitespace, strip control characters. Preserves
/// `å ä ö` in composed form — `fold` (below) is the only place diacritics
/// are stripped, and only for approximate matching, never for indexing.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for ch in text.chars() {
        if ch.is_control() {
            continue;
        }
        let ch = ch.to_lowercase().next().unwrap_or(ch);
        if ch.is_whitespace() {
            if !last_was_space && !out.is_empty() {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Diacritic-folded form of `text`, used only for approximate/fuzzy
/// matching — never for indexing, per §4.2.
pub fn fold(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F)
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, 'å' | 'ä' | 'ö' | 'é' | 'ü')
}

/// Split on non-letter/digit boundaries; keep runs of length >= 2 built from
/// `a-z 0-9 å ä ö é ü`.
pub fn tokenize(text: &str) -> Vec<Token> {
    let normalized = normalize(text);
    let mut tokens = Vec::new();
    let mut current = String::new();

    let mut flush = |current: &mut String, tokens: &mut Vec<Token>| {
        if current.chars().count() >= 2 {
            let has_alpha = current.chars().any(|c| c.is_alphabetic());
            let has_digit = current.chars().any(|c| c.is_ascii_digit());
            let kind = match (has_alpha, has_digit) {
                (true, true) => TokenKind::Mixed,
                (false, true) => TokenKind::Numeric,
                _ => TokenKind::Word,
            };
            tokens.push(Token {
                text: std::mem::take(current),
                kind,
            });
        } else {
            current.clear();
        }
    };

    for ch in normalized.chars() {
        if is_token_char(ch) {
            current.push(ch);
        } else {
            flush(&mut current, &mut tokens);
        }
    }
    flush(&mut current, &mut tokens);
    tokens
}

/// One term emerging from the analysis chain, with provenance so downstream
/// BM25/ranking can weight expansions lower than the original query term.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedTerm {
    pub term: String,
    pub is_expansion: bool,
}

/// Run the full chain over free text: tokenize, drop stopwords, stem, split
/// compounds (additively), then expand with synonyms (additively, original
/// first). Used both to analyze document bodies at index time and to expand
/// query terms at search time.
pub fn analyze(text: &str) -> Vec<AnalyzedTerm> {
    let mut out = Vec::new();
    for token in tokenize(text) {
        if token.kind != TokenKind::Word && token.kind != TokenKind::Mixed {
            out.push(AnalyzedTerm {
                term: token.text,
                is_expansion: false,
            });
            continue;
        }
        if is_stopword(&token.text) {
            continue;
        }
        let stemmed = stem(&token.text);
        out.push(AnalyzedTerm {
            term: stemmed.clone(),
            is_expansion: false,
        });

        if let Some((head, tail)) = split_compound(&token.text) {
            out.push(AnalyzedTerm {
                term: stem(&head),
                is_expansion: true,
            });
            out.push(AnalyzedTerm {
                term: stem(&tail),
                is_expansion: true,
            });
        }

        for synonym in expand_term(&stemmed) {
            out.push(AnalyzedTerm {
                term: synonym,
                is_expansion: true,
            });
        }
    }
    out
}
