//! Order-insensitive move comparison.
//!
//! `"13/7 8/7"` and `"8/7 13/7"` describe the same play; `"13/7 13/7"` and
//! `"13/7"` do not, so tokens are compared as a multiset.

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize(move_text: &str) -> String {
    move_text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Tokens sorted lexicographically, duplicates kept.
pub fn token_multiset(move_text: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = move_text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens
}

pub fn moves_equal(a: &str, b: &str) -> bool {
    token_multiset(a) == token_multiset(b)
}
