//! Conversion between match-log move notation and engine command notation.
//!
//! The match log numbers the bar as point 25 and bearing off as point 0;
//! the engine spells those `bar` and `off`. Conversion is best-effort:
//! anything that does not look like a `from/to` token passes through.

pub const BAR: &str = "bar";
pub const OFF: &str = "off";

const HIT_MARKER: char = '*';
const LOG_BAR_POINT: &str = "25";
const LOG_OFF_POINT: &str = "0";

/// Convert one match-log token, e.g. `"25/18*"` -> `"bar/18*"`.
pub fn to_engine_token(token: &str) -> String {
    map_token(token, |from, to| {
        let from = if from == LOG_BAR_POINT { BAR } else { from };
        let to = if to == LOG_OFF_POINT { OFF } else { to };
        (from, to)
    })
}

/// Convert one engine token back to match-log notation, e.g. `"6/off"` -> `"6/0"`.
pub fn from_engine_token(token: &str) -> String {
    map_token(token, |from, to| {
        let from = if from.eq_ignore_ascii_case(BAR) { LOG_BAR_POINT } else { from };
        let to = if to.eq_ignore_ascii_case(OFF) { LOG_OFF_POINT } else { to };
        (from, to)
    })
}

/// Convert a space-separated match-log move. Empty tokens are dropped.
pub fn to_engine_move(move_text: &str) -> String {
    map_move(move_text, to_engine_token)
}

/// Convert a space-separated engine move back to match-log notation.
pub fn from_engine_move(move_text: &str) -> String {
    map_move(move_text, from_engine_token)
}

fn map_token<'a, F>(token: &'a str, convert: F) -> String
where
    F: Fn(&'a str, &'a str) -> (&'a str, &'a str),
{
    let (body, hit) = match token.strip_suffix(HIT_MARKER) {
        Some(body) => (body, "*"),
        None => (token, ""),
    };
    match body.split_once('/') {
        Some((from, to)) => {
            let (from, to) = convert(from, to);
            format!("{from}/{to}{hit}")
        }
        None => token.to_string(),
    }
}

fn map_move(move_text: &str, convert: fn(&str) -> String) -> String {
    move_text
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(convert)
        .collect::<Vec<_>>()
        .join(" ")
}
