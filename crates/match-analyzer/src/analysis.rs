//! Mistake detection and report assembly, pure functions only
//! (no engine or file dependencies)

use gammon_core::match_log::{Dice, PlayerSlot};
use serde::{Deserialize, Serialize};

use crate::hint::{find_candidate, Candidate};

/// Equity comparison for a single checker play.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityLoss {
    pub best: f64,
    pub player: f64,
    pub diff: f64,
}

/// Compare the best candidate with the player's move.
///
/// Returns `None` when the ply cannot be judged: no candidates, or the
/// player's move is not among them.
pub fn equity_loss(candidates: &[Candidate], player_move: &str) -> Option<EquityLoss> {
    let best = candidates.first()?.equity;
    let player = find_candidate(candidates, player_move)?.equity;
    Some(EquityLoss {
        best,
        player,
        diff: best - player,
    })
}

pub fn is_mistake(loss: &EquityLoss, threshold: f64) -> bool {
    loss.diff >= threshold
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MistakeRecord {
    pub game_number: Option<u32>,
    pub ply_index: Option<u32>,
    pub player: PlayerSlot,
    pub dice: Dice,
    /// Player's move in match-log notation.
    pub player_move: String,
    pub candidates: Vec<Candidate>,
    pub best_equity: f64,
    pub player_equity: f64,
    pub equity_diff: f64,
    pub position_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub engine_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    pub mistakes: Vec<MistakeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Report {
    /// Finished analysis, worst mistakes first.
    pub fn completed(threshold: f64, mut mistakes: Vec<MistakeRecord>) -> Self {
        sort_worst_first(&mut mistakes);
        Self {
            engine_available: true,
            threshold: Some(threshold),
            mistakes,
            error: None,
        }
    }

    /// Run that could not analyze anything.
    pub fn failed(
        engine_available: bool,
        threshold: Option<f64>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            engine_available,
            threshold,
            mistakes: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Stable sort by descending equity difference; ties keep discovery order.
pub fn sort_worst_first(mistakes: &mut [MistakeRecord]) {
    mistakes.sort_by(|a, b| b.equity_diff.total_cmp(&a.equity_diff));
}
