//! Swedish compound splitting.
//!
//! Swedish famously concatenates nouns (`jäRNVÄGSSTATION` = `järnväg` +
//! `s` + `station`). If a token longer than 8 characters contains a
//! connector (`s` or `e`) that splits it into two halves of length >= 3
//! each, emit both halves *in addition to* the original token — the
//! original always stays in the index too.

const MIN_TOKEN_LEN: usize = 8;
const MIN_HALF_LEN: usize = 3;

/// Returns `Some((head, tail))` when `token` splits into two valid halves
/// around a Swedish connector; `None` otherwise (the caller keeps the
/// original token unconditionally).
pub fn split_compound(token: &str) -> Option<(String, String)> {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= MIN_TOKEN_LEN {
        return None;
    }

    for connector in ['s', 'e'] {
        for i in MIN_HALF_LEN..chars.len().saturating_sub(MIN_HALF_LEN) {
            if chars[i] == connector {
                let head: String = chars[..i].iter().collect();
                let tail: String = chars[i + 1..].iter().collect();
                if head.chars().count() >= MIN_HALF_LEN && tail.chars().count() >= MIN_HALF_LEN {
                    return Some((head, tail));
                }
            }
        }
    }
    None
}
