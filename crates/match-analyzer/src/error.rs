//! Analyzer error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Failed to read input: {0}")]
    Input(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Command `{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
