//! Engine command boundary.
//!
//! Everything the analyzer knows about the evaluation engine goes through
//! [`Oracle::command`]. The engine is stateful, so commands must be issued
//! in program order by a single owner.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, warn};

use crate::error::AnalyzerError;

/// A text-command evaluation engine.
pub trait Oracle {
    /// Issue one command and return whatever text the engine printed.
    fn command(&mut self, text: &str) -> Result<String, AnalyzerError>;
}

impl<O: Oracle + ?Sized> Oracle for &mut O {
    fn command(&mut self, text: &str) -> Result<String, AnalyzerError> {
        (**self).command(text)
    }
}

impl<O: Oracle + ?Sized> Oracle for Box<O> {
    fn command(&mut self, text: &str) -> Result<String, AnalyzerError> {
        (**self).command(text)
    }
}

/// Issue a command whose failure is worth reporting but not fatal.
///
/// The warning is emitted inside the caller's current span, so game/ply
/// context is attached automatically.
pub fn issue<O: Oracle + ?Sized>(oracle: &mut O, text: &str) -> Option<String> {
    match oracle.command(text) {
        Ok(out) => Some(out),
        Err(e) => {
            warn!(command = text, error = %e, "Engine command failed");
            None
        }
    }
}

/// Issue a purely diagnostic command; failures are discarded.
pub fn attempt<O: Oracle + ?Sized>(oracle: &mut O, text: &str) -> Option<String> {
    match oracle.command(text) {
        Ok(out) => Some(out),
        Err(e) => {
            debug!(command = text, error = %e, "Best-effort command failed");
            None
        }
    }
}

/// Put a fresh session into analysis mode: both seats human, raw output.
pub fn prepare_session<O: Oracle + ?Sized>(oracle: &mut O, threads: u32) {
    let setup = [
        format!("set threads {threads}"),
        "set output raw on".to_string(),
        "set player 0 human".to_string(),
        "set player 1 human".to_string(),
    ];
    for cmd in &setup {
        issue(oracle, cmd);
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

/// In-memory engine that answers from per-command queues.
///
/// Unscripted commands succeed with empty output. Every command is recorded
/// so tests can assert the exact sequence the analyzer produced.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    replies: HashMap<String, VecDeque<Reply>>,
    issued: Vec<String>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply for the next `command`.
    pub fn reply(mut self, command: &str, text: &str) -> Self {
        self.push(command, Reply::Text(text.to_string()));
        self
    }

    /// Queue a failure for the next `command`.
    pub fn fail(mut self, command: &str, reason: &str) -> Self {
        self.push(command, Reply::Fail(reason.to_string()));
        self
    }

    /// Commands in the order they were received.
    pub fn issued(&self) -> &[String] {
        &self.issued
    }

    fn push(&mut self, command: &str, reply: Reply) {
        self.replies
            .entry(command.to_string())
            .or_default()
            .push_back(reply);
    }
}

impl Oracle for ScriptedOracle {
    fn command(&mut self, text: &str) -> Result<String, AnalyzerError> {
        self.issued.push(text.to_string());
        let reply = self.replies.get_mut(text).and_then(VecDeque::pop_front);
        match reply {
            Some(Reply::Text(out)) => Ok(out),
            Some(Reply::Fail(reason)) => Err(AnalyzerError::Command {
                command: text.to_string(),
                reason,
            }),
            None => Ok(String::new()),
        }
    }
}
