//! Match log data model.
//!
//! Mirrors the JSON produced upstream: a match is a list of games, a game is
//! a list of plies, and each ply carries up to one action per player slot.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Either a full match or a bare game, which is treated as a one-game match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchLog {
    Match(Match),
    Game(Game),
}

impl MatchLog {
    /// Games in play order.
    pub fn games(&self) -> &[Game] {
        match self {
            MatchLog::Match(m) => &m.games,
            MatchLog::Game(g) => std::slice::from_ref(g),
        }
    }

    pub fn match_id(&self) -> Option<&str> {
        match self {
            MatchLog::Match(m) => m.match_id.as_deref(),
            MatchLog::Game(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    #[serde(default)]
    pub match_id: Option<String>,
    pub games: Vec<Game>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    #[serde(default)]
    pub game_number: Option<u32>,
    pub moves: Vec<Ply>,
}

/// One decision point; either slot may be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ply {
    #[serde(default)]
    pub move_number: Option<u32>,
    #[serde(default)]
    pub player1: Option<Action>,
    #[serde(default)]
    pub player2: Option<Action>,
}

impl Ply {
    /// Present actions, always `player1` before `player2`.
    pub fn actions(&self) -> impl Iterator<Item = (PlayerSlot, &Action)> + '_ {
        [
            (PlayerSlot::Player1, self.player1.as_ref()),
            (PlayerSlot::Player2, self.player2.as_ref()),
        ]
        .into_iter()
        .filter_map(|(slot, action)| action.map(|a| (slot, a)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerSlot {
    Player1,
    Player2,
}

impl PlayerSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerSlot::Player1 => "player1",
            PlayerSlot::Player2 => "player2",
        }
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Action {
    /// Checker play. `dice` is `None` when missing or malformed in the log;
    /// malformed parts are dropped.
    Move {
        #[serde(default, deserialize_with = "valid_or_none")]
        dice: Option<Dice>,
        #[serde(default, deserialize_with = "valid_parts")]
        moves: Vec<MovePart>,
    },
    Double,
    Take,
    Drop,
    /// Any action type the replay does not understand.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dice {
    pub die1: u8,
    pub die2: u8,
}

/// A single checker movement. Point 25 is the bar, point 0 is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePart {
    pub from: u8,
    pub to: u8,
    #[serde(default)]
    pub hit: bool,
}

impl fmt::Display for MovePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)?;
        if self.hit {
            f.write_str("*")?;
        }
        Ok(())
    }
}

fn valid_or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| T::deserialize(v).ok()))
}

fn valid_parts<'de, D>(deserializer: D) -> Result<Vec<MovePart>, D::Error>
where
    D: Deserializer<'de>,
{
    let parts = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(parts)) => parts,
        _ => return Ok(Vec::new()),
    };
    Ok(parts
        .into_iter()
        .filter_map(|part| MovePart::deserialize(part).ok())
        .collect())
}

/// Render move parts as match-log move text, e.g. `"13/7 8/7*"`.
pub fn move_text(parts: &[MovePart]) -> String {
    parts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
