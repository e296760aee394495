//! Single-position hint analysis.
//!
//! Loads a position by its gnubg identifier (or starts from the opening
//! position), sets or rolls dice, and returns the engine's ranked moves
//! together with a few diagnostics captured along the way.

use gammon_core::match_log::Dice;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::DEFAULT_MAX_CANDIDATES;
use crate::hint::parse_candidates;
use crate::oracle::{attempt, prepare_session, Oracle};

fn default_max_candidates() -> usize {
    DEFAULT_MAX_CANDIDATES
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRequest {
    /// `"<positionId>:<matchId>"`, or anything else to use the opening position.
    /// Echoed back as given.
    #[serde(default)]
    pub match_id: Option<Value>,
    /// Opaque caller reference, echoed back.
    #[serde(default)]
    pub position_index: Option<Value>,
    #[serde(default)]
    pub dice: Option<Dice>,
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

impl Default for PositionRequest {
    fn default() -> Self {
        Self {
            match_id: None,
            position_index: None,
            dice: None,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMove {
    #[serde(rename = "move")]
    pub move_text: String,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionReport {
    pub match_id: Option<Value>,
    pub position_index: Option<Value>,
    pub engine_available: bool,
    pub moves: Vec<RankedMove>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_board_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_ascii: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PositionReport {
    pub fn failed(
        match_id: Option<Value>,
        position_index: Option<Value>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            match_id,
            position_index,
            engine_available: false,
            moves: Vec::new(),
            raw_hint: None,
            current_board_id: None,
            board_ascii: None,
            error: Some(error.into()),
        }
    }
}

/// Run the position analysis on an opened engine session.
pub fn analyze_position<O: Oracle + ?Sized>(
    oracle: &mut O,
    threads: u32,
    request: &PositionRequest,
) -> PositionReport {
    prepare_session(oracle, threads);
    for cmd in ["set rng mersenne", "set dice manual off", "set automatic roll on"] {
        attempt(oracle, cmd);
    }
    attempt(oracle, "new game");

    let combined_id = request
        .match_id
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|id| id.split_once(':'));
    if let Some((position_id, match_id)) = combined_id {
        attempt(oracle, &format!("set matchid {match_id}"));
        attempt(oracle, &format!("set board {position_id}"));
    }

    let current_board_id = attempt(oracle, "show gnubgid")
        .or_else(|| attempt(oracle, "show matchid"))
        .map(|id| id.trim().to_string());
    let board_ascii = attempt(oracle, "show board");

    match request.dice {
        Some(dice) => {
            attempt(oracle, &format!("set dice {} {}", dice.die1, dice.die2));
        }
        None => {
            if attempt(oracle, "roll").is_none() {
                attempt(oracle, "set dice 1 1");
            }
        }
    }

    let raw_hint = attempt(oracle, "hint").unwrap_or_default();
    let moves = parse_candidates(&raw_hint, request.max_candidates)
        .into_iter()
        .map(|c| RankedMove {
            move_text: c.move_text,
            equity: c.equity,
        })
        .collect();

    PositionReport {
        match_id: request.match_id.clone(),
        position_index: request.position_index.clone(),
        engine_available: true,
        moves,
        raw_hint: Some(raw_hint),
        current_board_id,
        board_ascii,
        error: None,
    }
}
