//! Match replay against the engine.
//!
//! Walks games, plies and player slots in log order. Before each checker
//! play the engine is asked for its ranked candidates; afterwards the
//! recorded play is applied so the engine's board follows the real game.
//! Engine failures are logged and skipped, never fatal.

use gammon_core::match_log::{
    move_text, Action, Dice, Game, MatchLog, MovePart, PlayerSlot, Ply,
};
use gammon_core::notation::{from_engine_move, to_engine_move};
use tracing::{debug, info, info_span, warn};

use crate::analysis::{equity_loss, is_mistake, MistakeRecord, Report};
use crate::document::AnalysisRequest;
use crate::hint::{parse_candidates, preview};
use crate::oracle::{attempt, issue, prepare_session, Oracle};

const PREVIEW_LINES: usize = 8;

/// Replays a match on a single engine session.
pub struct MatchAnalyzer<'o, O: Oracle + ?Sized> {
    oracle: &'o mut O,
    threshold: f64,
    max_candidates: usize,
    mistakes: Vec<MistakeRecord>,
}

impl<'o, O: Oracle + ?Sized> MatchAnalyzer<'o, O> {
    pub fn new(oracle: &'o mut O, threshold: f64, max_candidates: usize) -> Self {
        Self {
            oracle,
            threshold,
            max_candidates,
            mistakes: Vec::new(),
        }
    }

    /// Replay every game and return mistakes in discovery order.
    pub fn run(mut self, log: &MatchLog) -> Vec<MistakeRecord> {
        info!(
            match_id = log.match_id().unwrap_or("-"),
            games = log.games().len(),
            threshold = self.threshold,
            "Starting analysis"
        );
        for game in log.games() {
            self.replay_game(game);
        }
        info!(mistakes = self.mistakes.len(), "Analysis finished");
        self.mistakes
    }

    fn replay_game(&mut self, game: &Game) {
        let _game_span = info_span!("game", game = game.game_number).entered();

        issue(self.oracle, "new game");
        debug!(plies = game.moves.len(), "New game");

        for ply in &game.moves {
            for (slot, action) in ply.actions() {
                let _ply_span =
                    info_span!("ply", ply = ply.move_number, player = slot.as_str()).entered();
                self.replay_action(game, ply, slot, action);
            }
        }
    }

    fn replay_action(&mut self, game: &Game, ply: &Ply, slot: PlayerSlot, action: &Action) {
        match action {
            Action::Move {
                dice: Some(dice),
                moves,
            } => self.replay_checker_play(game, ply, slot, *dice, moves),
            Action::Move { dice: None, .. } => debug!("Skipping move without dice"),
            Action::Double => self.cube("double"),
            Action::Take => self.cube("take"),
            Action::Drop => self.cube("drop"),
            Action::Unknown => debug!("Skipping unknown action"),
        }
    }

    fn cube(&mut self, command: &str) {
        if issue(self.oracle, command).is_some() {
            debug!(command, "Cube action");
        }
    }

    fn replay_checker_play(
        &mut self,
        game: &Game,
        ply: &Ply,
        slot: PlayerSlot,
        dice: Dice,
        parts: &[MovePart],
    ) {
        issue(self.oracle, &format!("set dice {} {}", dice.die1, dice.die2));
        issue(self.oracle, "roll");
        let hint_text = issue(self.oracle, "hint").unwrap_or_default();

        let candidates = parse_candidates(&hint_text, self.max_candidates);
        debug!(count = candidates.len(), "Candidates parsed");
        if candidates.is_empty() {
            info!(
                hint = preview(&hint_text, PREVIEW_LINES).as_str(),
                "No candidates parsed"
            );
        }

        let player_move = move_text(parts);
        let engine_move = to_engine_move(&player_move);
        debug!(raw = player_move.as_str(), engine = engine_move.as_str(), "Player move");

        match equity_loss(&candidates, &engine_move) {
            Some(loss) if is_mistake(&loss, self.threshold) => {
                let position_id = attempt(self.oracle, "board id")
                    .map(|id| id.trim().to_string())
                    .unwrap_or_default();
                info!(
                    diff = format!("{:.3}", loss.diff).as_str(),
                    best = from_engine_move(&candidates[0].move_text).as_str(),
                    played = player_move.as_str(),
                    "Mistake recorded"
                );
                self.mistakes.push(MistakeRecord {
                    game_number: game.game_number,
                    ply_index: ply.move_number,
                    player: slot,
                    dice,
                    player_move: player_move.clone(),
                    candidates,
                    best_equity: loss.best,
                    player_equity: loss.player,
                    equity_diff: loss.diff,
                    position_id,
                });
            }
            Some(_) => {}
            None if !candidates.is_empty() => {
                info!(played = player_move.as_str(), "Player's move not among candidates");
            }
            None => {}
        }

        // Advance the engine's board to the position actually reached
        if !engine_move.is_empty() && issue(self.oracle, &format!("move {engine_move}")).is_none() {
            warn!(engine = engine_move.as_str(), "Board may now diverge from the game");
        }
    }
}

/// Analyze a request on an engine session that has already been opened.
pub fn analyze<O: Oracle + ?Sized>(
    oracle: &mut O,
    threads: u32,
    request: &AnalysisRequest,
) -> Report {
    prepare_session(oracle, threads);
    let analyzer = MatchAnalyzer::new(oracle, request.threshold, request.max_candidates);
    let mistakes = analyzer.run(&request.match_log);
    Report::completed(request.threshold, mistakes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use crate::oracle::ScriptedOracle;

    fn request(json: &str) -> AnalysisRequest {
        parse_document(json.as_bytes()).unwrap()
    }

    const ONE_PLY: &str = r#"{
        "threshold": 0.1,
        "match": {"gameNumber": 1, "moves": [{
            "moveNumber": 4,
            "player1": {"type": "move", "dice": {"die1": 6, "die2": 5},
                        "moves": [{"from": 25, "to": 19}, {"from": 19, "to": 14, "hit": true}]}
        }]}
    }"#;

    #[test]
    fn test_checker_play_command_sequence() {
        let mut oracle = ScriptedOracle::new();
        let req = request(ONE_PLY);
        MatchAnalyzer::new(&mut oracle, req.threshold, req.max_candidates).run(&req.match_log);
        assert_eq!(
            oracle.issued(),
            [
                "new game",
                "set dice 6 5",
                "roll",
                "hint",
                "move bar/19 19/14*",
            ]
        );
    }

    #[test]
    fn test_mistake_captures_position_id() {
        let hint = "1. 24/13 +0.412\n2. 19/14* bar/19 +0.102\n";
        let mut oracle = ScriptedOracle::new()
            .reply("hint", hint)
            .reply("board id", "  sGfwATDgc/ABMA \n");
        let req = request(ONE_PLY);
        let mistakes =
            MatchAnalyzer::new(&mut oracle, req.threshold, req.max_candidates).run(&req.match_log);

        assert_eq!(mistakes.len(), 1);
        let m = &mistakes[0];
        assert_eq!(m.game_number, Some(1));
        assert_eq!(m.ply_index, Some(4));
        assert_eq!(m.player, PlayerSlot::Player1);
        assert_eq!(m.player_move, "25/19 19/14*");
        assert_eq!(m.position_id, "sGfwATDgc/ABMA");
        assert_eq!(m.candidates.len(), 2);
        assert!((m.equity_diff - 0.31).abs() < 1e-9);

        // Position is captured before the recorded move is applied
        let issued = oracle.issued();
        assert_eq!(issued[issued.len() - 2], "board id");
        assert_eq!(issued[issued.len() - 1], "move bar/19 19/14*");
    }

    #[test]
    fn test_position_id_failure_leaves_it_empty() {
        let hint = "1. 24/13 +0.412\n2. bar/19 19/14* +0.102\n";
        let mut oracle = ScriptedOracle::new()
            .reply("hint", hint)
            .fail("board id", "unknown keyword");
        let req = request(ONE_PLY);
        let mistakes =
            MatchAnalyzer::new(&mut oracle, req.threshold, req.max_candidates).run(&req.match_log);
        assert_eq!(mistakes.len(), 1);
        assert_eq!(mistakes[0].position_id, "");
    }

    #[test]
    fn test_failed_commands_do_not_stop_replay() {
        let json = r#"{
            "threshold": 0.0,
            "match": {"games": [{"gameNumber": 1, "moves": [
                {"moveNumber": 1,
                 "player1": {"type": "move", "dice": {"die1": 3, "die2": 1},
                             "moves": [{"from": 8, "to": 5}, {"from": 6, "to": 5}]},
                 "player2": {"type": "move", "dice": {"die1": 4, "die2": 2},
                             "moves": [{"from": 8, "to": 4}, {"from": 6, "to": 4}]}}
            ]}]}
        }"#;
        let mut oracle = ScriptedOracle::new()
            .fail("new game", "engine busy")
            .fail("hint", "engine crashed")
            .reply("hint", "1. 8/4 6/4 +0.050\n");
        let req = request(json);
        let mistakes =
            MatchAnalyzer::new(&mut oracle, req.threshold, req.max_candidates).run(&req.match_log);

        // First hint failed, second play matches the top candidate at threshold 0
        assert_eq!(mistakes.len(), 1);
        assert_eq!(mistakes[0].player, PlayerSlot::Player2);
        assert_eq!(mistakes[0].equity_diff, 0.0);
        assert!(oracle.issued().contains(&"move 8/5 6/5".to_string()));
        assert!(oracle.issued().contains(&"move 8/4 6/4".to_string()));
    }

    #[test]
    fn test_cube_actions_issue_single_commands() {
        let json = r#"{
            "threshold": 0.1,
            "match": {"games": [{"gameNumber": 2, "moves": [
                {"moveNumber": 7, "player1": {"type": "double"}, "player2": {"type": "take"}},
                {"moveNumber": 8, "player2": {"type": "drop"}},
                {"moveNumber": 9, "player1": {"type": "resign"}}
            ]}]}
        }"#;
        let mut oracle = ScriptedOracle::new();
        let req = request(json);
        let mistakes =
            MatchAnalyzer::new(&mut oracle, req.threshold, req.max_candidates).run(&req.match_log);
        assert!(mistakes.is_empty());
        assert_eq!(oracle.issued(), ["new game", "double", "take", "drop"]);
    }

    #[test]
    fn test_empty_move_is_not_applied() {
        let json = r#"{
            "threshold": 0.1,
            "match": {"moves": [
                {"moveNumber": 1, "player2": {"type": "move", "dice": {"die1": 6, "die2": 6}, "moves": []}}
            ]}
        }"#;
        let mut oracle = ScriptedOracle::new();
        let req = request(json);
        MatchAnalyzer::new(&mut oracle, req.threshold, req.max_candidates).run(&req.match_log);
        assert_eq!(oracle.issued(), ["new game", "set dice 6 6", "roll", "hint"]);
    }

    #[test]
    fn test_move_without_dice_skipped_and_replay_continues() {
        let json = r#"{
            "threshold": 0.1,
            "match": {"games": [{"gameNumber": 1, "moves": [
                {"moveNumber": 1,
                 "player1": {"type": "move", "moves": [{"from": 13, "to": 7}]}},
                {"moveNumber": 2,
                 "player2": {"type": "move", "dice": {"die1": 4, "die2": 2},
                             "moves": [{"from": 8, "to": 4}, {"from": "bar"}, {"from": 6, "to": 4}]}}
            ]}]}
        }"#;
        let mut oracle =
            ScriptedOracle::new().reply("hint", "1. 13/9 13/11 +0.300
2. 8/4 6/4 +0.100
");
        let req = request(json);
        let mistakes =
            MatchAnalyzer::new(&mut oracle, req.threshold, req.max_candidates).run(&req.match_log);

        assert_eq!(
            oracle.issued(),
            ["new game", "set dice 4 2", "roll", "hint", "move 8/4 6/4"]
        );
        assert_eq!(mistakes.len(), 1);
        assert_eq!(mistakes[0].ply_index, Some(2));
        assert_eq!(mistakes[0].player_move, "8/4 6/4");
    }

    #[test]
    fn test_analyze_prepares_session_first() {
        let mut oracle = ScriptedOracle::new();
        let report = analyze(&mut oracle, 2, &request(ONE_PLY));
        assert!(report.engine_available);
        assert_eq!(report.threshold, Some(0.1));
        assert_eq!(oracle.issued()[0], "set threads 2");
        assert_eq!(oracle.issued()[4], "new game");
    }
}
