//! Input and output JSON documents.

use std::path::Path;

use gammon_core::match_log::MatchLog;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::AnalyzerError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Default candidate cap when the caller does not send one.
pub const DEFAULT_MAX_CANDIDATES: usize = 8;

fn default_max_candidates() -> usize {
    DEFAULT_MAX_CANDIDATES
}

/// Match analysis request. `threshold` is mandatory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[serde(rename = "match")]
    pub match_log: MatchLog,
    pub threshold: f64,
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

/// Parse a JSON document, tolerating a leading byte-order mark.
pub fn parse_document<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AnalyzerError> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    serde_json::from_slice(body).map_err(|e| AnalyzerError::Input(e.to_string()))
}

pub async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, AnalyzerError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AnalyzerError::Input(format!("{}: {e}", path.display())))?;
    parse_document(&bytes)
}

pub async fn write_document<T: Serialize>(path: &Path, doc: &T) -> Result<(), AnalyzerError> {
    let json = serde_json::to_vec(doc)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}
