//! Single-position analysis
//!
//! Asks gnubg for the ranked moves of one position, identified by a gnubg
//! position/match id, and writes them with a few board diagnostics.

use std::process::ExitCode;

use tokio::runtime::Handle;
use tracing::{error, info};

use match_analyzer::config::{AnalyzerConfig, IoPaths};
use match_analyzer::document::{read_document, write_document};
use match_analyzer::gnubg::GnubgOracle;
use match_analyzer::position::{analyze_position, PositionReport, PositionRequest};

const USAGE: &str = "Usage: analyze-position <input_json> <output_json> \
                     (or set GNUBG_INPUT_JSON and GNUBG_OUTPUT_JSON)";

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let _ = dotenvy::dotenv();

    let paths = match IoPaths::from_process() {
        Ok(paths) => paths,
        Err(missing) => {
            eprintln!("{USAGE}");
            if let Some(output) = missing.output {
                let report = PositionReport::failed(None, None, "Input/output paths not provided");
                if let Err(e) = write_document(&output, &report).await {
                    error!(error = %e, "Failed to write error report");
                }
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    let request: PositionRequest = match read_document(&paths.input).await {
        Ok(request) => request,
        Err(e) => {
            error!(input = %paths.input.display(), error = %e, "Unreadable request");
            let report = PositionReport::failed(None, None, e.to_string());
            write_document(&paths.output, &report).await?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    let config = AnalyzerConfig::load();
    let (match_id, position_index) = (request.match_id.clone(), request.position_index.clone());
    let runtime = Handle::current();
    let report = tokio::task::spawn_blocking(move || run(&config, &request, runtime))
        .await
        .unwrap_or_else(|e| {
            PositionReport::failed(match_id, position_index, format!("Engine error: {e}"))
        });

    write_document(&paths.output, &report).await?;
    info!(moves = report.moves.len(), "Position report written");
    Ok(ExitCode::SUCCESS)
}

fn run(config: &AnalyzerConfig, request: &PositionRequest, runtime: Handle) -> PositionReport {
    match GnubgOracle::spawn(config, runtime) {
        Ok(mut engine) => analyze_position(&mut engine, config.threads, request),
        Err(e) => {
            error!(error = %e, "Engine unavailable");
            PositionReport::failed(
                request.match_id.clone(),
                request.position_index.clone(),
                e.to_string(),
            )
        }
    }
}
