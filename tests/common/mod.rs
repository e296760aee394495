use serde_json::{json, Value};
use std::path::PathBuf;

/// A `move` action from `"13/7 8/7*"`-style text (bar = 25, off = 0).
pub fn checker_play(die1: u8, die2: u8, text: &str) -> Value {
    let parts: Vec<Value> = text
        .split_whitespace()
        .map(|token| {
            let hit = token.ends_with('*');
            let (from, to) = token.trim_end_matches('*').split_once('/').expect("from/to token");
            json!({
                "from": from.parse::<u8>().expect("from point"),
                "to": to.parse::<u8>().expect("to point"),
                "hit": hit,
            })
        })
        .collect();
    json!({ "type": "move", "dice": { "die1": die1, "die2": die2 }, "moves": parts })
}

/// A gnubg-style hint listing, ranks starting at 1.
pub fn hint_listing(candidates: &[(&str, f64)]) -> String {
    let mut text = String::from("    Position ID: 4HPwATDgc/ABMA\n");
    for (i, (mv, equity)) in candidates.iter().enumerate() {
        text.push_str(&format!("    {}. {:<28} {:+.3}\n", i + 1, mv, equity));
    }
    text
}

/// Unique scratch file path for this test process.
pub fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("gammon-review-{}-{name}.json", std::process::id()))
}
