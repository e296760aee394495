//! Parsing of the engine's `hint` listing into ranked candidates.
//!
//! Two layouts are understood:
//!
//! ```text
//!     1. 13/7 8/7                 +0.123
//!     2) 24/18 13/12             (-0.045)
//!     1. Equity: +0.123  13/7 8/7
//! ```
//!
//! The second (equity-first) layout is only tried when no line matches the
//! first one.

use std::sync::LazyLock;

use gammon_core::move_text::moves_equal;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static MOVE_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)[.)]\s+(\S.*?)\s+\(?\s*([+-]?\d+\.\d+)\s*\)?")
        .expect("move-first hint pattern is valid")
});

static EQUITY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)[.)]\s+Equity\s*[:=]\s*([+-]?\d+\.\d+)\s+(\S.*)")
        .expect("equity-first hint pattern is valid")
});

/// One engine-ranked alternative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub rank: u32,
    #[serde(rename = "move")]
    pub move_text: String,
    pub equity: f64,
}

/// Parse at most `max_candidates` candidates, sorted by ascending rank.
pub fn parse_candidates(hint_text: &str, max_candidates: usize) -> Vec<Candidate> {
    let mut candidates = scan(hint_text, max_candidates, &MOVE_FIRST, move_first);
    if candidates.is_empty() {
        candidates = scan(hint_text, max_candidates, &EQUITY_FIRST, equity_first);
    }
    candidates.sort_by_key(|c| c.rank);
    candidates
}

/// First candidate whose move equals `move_text` as a token multiset.
pub fn find_candidate<'a>(candidates: &'a [Candidate], move_text: &str) -> Option<&'a Candidate> {
    candidates.iter().find(|c| moves_equal(&c.move_text, move_text))
}

/// First `max_lines` lines of raw engine output, for diagnostics.
pub fn preview(text: &str, max_lines: usize) -> String {
    let mut lines: Vec<&str> = text.lines().collect();
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        lines.push("... (truncated)");
    }
    lines.join("\n")
}

fn scan(
    hint_text: &str,
    max_candidates: usize,
    pattern: &Regex,
    extract: fn(&Captures) -> Option<Candidate>,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    if max_candidates == 0 {
        return out;
    }
    for line in hint_text.lines() {
        let Some(caps) = pattern.captures(line) else {
            continue;
        };
        // Lines whose numbers don't parse are skipped, not fatal
        if let Some(candidate) = extract(&caps) {
            out.push(candidate);
            if out.len() >= max_candidates {
                break;
            }
        }
    }
    out
}

fn move_first(caps: &Captures) -> Option<Candidate> {
    Some(Candidate {
        rank: caps[1].parse().ok()?,
        move_text: caps[2].trim().to_string(),
        equity: caps[3].parse().ok()?,
    })
}

fn equity_first(caps: &Captures) -> Option<Candidate> {
    Some(Candidate {
        rank: caps[1].parse().ok()?,
        equity: caps[2].parse().ok()?,
        move_text: caps[3].trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HINT: &str = "\
Position ID: 4HPwATDgc/ABMA
    1. 13/7 8/7                      +0.123
    2) 24/18 13/12                   (-0.045)
    3. 24/23 13/7                    -0.201
";

    #[test]
    fn test_parse_move_first_layout() {
        let candidates = parse_candidates(HINT, 8);
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].rank, 1);
        assert_eq!(candidates[0].move_text, "13/7 8/7");
        assert!((candidates[0].equity - 0.123).abs() < 1e-9);
        assert_eq!(candidates[1].move_text, "24/18 13/12");
        assert!((candidates[1].equity + 0.045).abs() < 1e-9);
        assert!((candidates[2].equity + 0.201).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_order_lines_sorted_by_rank() {
        let text = "3. 24/23 13/7 -0.201\n1. 13/7 8/7 +0.123\n2. 24/18 13/12 -0.045\n";
        let ranks: Vec<u32> = parse_candidates(text, 8).iter().map(|c| c.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_max_candidates_respected() {
        assert_eq!(parse_candidates(HINT, 2).len(), 2);
        assert!(parse_candidates(HINT, 0).is_empty());
    }

    #[test]
    fn test_equity_first_fallback() {
        let text = "header\n  1. Equity: +0.300  13/7 8/7\n  2) Equity= -0.100 24/18 13/12\n";
        let candidates = parse_candidates(text, 8);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].move_text, "13/7 8/7");
        assert!((candidates[0].equity - 0.3).abs() < 1e-9);
        assert_eq!(candidates[1].rank, 2);
        assert_eq!(candidates[1].move_text, "24/18 13/12");
    }

    #[test]
    fn test_fallback_not_used_when_primary_matches() {
        // The second line would only match the equity-first layout
        let text = "1. 13/7 8/7 +0.123\n2. Equity: +0.050 24/18 13/12\n";
        let candidates = parse_candidates(text, 8);
        assert!(candidates.iter().all(|c| c.move_text != "24/18 13/12"));
        assert_eq!(candidates[0].move_text, "13/7 8/7");
    }

    #[test]
    fn test_unparseable_rank_skipped() {
        let text = "99999999999999999999. 13/7 8/7 +0.100\n2. 24/18 13/12 -0.045\n";
        let candidates = parse_candidates(text, 8);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].rank, 2);
    }

    #[test]
    fn test_no_candidates_in_noise() {
        assert!(parse_candidates("You must roll first.\n", 8).is_empty());
        assert!(parse_candidates("", 8).is_empty());
    }

    #[test]
    fn test_find_candidate_ignores_order() {
        let candidates = parse_candidates(HINT, 8);
        let found = find_candidate(&candidates, "13/12 24/18").unwrap();
        assert_eq!(found.rank, 2);
        assert!(find_candidate(&candidates, "13/7 13/7").is_none());
    }

    #[test]
    fn test_preview_truncates() {
        let text = (1..=10).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let p = preview(&text, 8);
        assert_eq!(p.lines().count(), 9);
        assert!(p.ends_with("... (truncated)"));
        assert_eq!(preview("a\nb", 8), "a\nb");
    }
}
