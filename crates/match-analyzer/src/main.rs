//! Match mistake analyzer
//!
//! Replays a recorded match against gnubg and reports every checker play
//! that gave up at least `threshold` equity against gnubg's best move.
//! Always writes the output document when an output path is known.

use std::process::ExitCode;

use tokio::runtime::Handle;
use tracing::{error, info};

use match_analyzer::analysis::Report;
use match_analyzer::analyzer;
use match_analyzer::config::{AnalyzerConfig, IoPaths};
use match_analyzer::document::{read_document, write_document, AnalysisRequest};
use match_analyzer::gnubg::GnubgOracle;

const USAGE: &str = "Usage: match-analyzer <input_json> <output_json> \
                     (or set GNUBG_INPUT_JSON and GNUBG_OUTPUT_JSON)";

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let paths = match IoPaths::from_process() {
        Ok(paths) => paths,
        Err(missing) => {
            eprintln!("{USAGE}");
            if let Some(output) = missing.output {
                let report = Report::failed(false, None, "Input/output paths not provided");
                if let Err(e) = write_document(&output, &report).await {
                    error!(error = %e, "Failed to write error report");
                }
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    let request: AnalysisRequest = match read_document(&paths.input).await {
        Ok(request) => request,
        Err(e) => {
            error!(input = %paths.input.display(), error = %e, "Unreadable request");
            write_document(&paths.output, &Report::failed(false, None, e.to_string())).await?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    let config = AnalyzerConfig::load();
    info!(
        gnubg_path = %config.gnubg_path,
        threads = config.threads,
        "Analyzer config loaded"
    );

    // The engine session is blocking and strictly sequential
    let threshold = request.threshold;
    let runtime = Handle::current();
    let report = tokio::task::spawn_blocking(move || run(&config, &request, runtime))
        .await
        .unwrap_or_else(|e| Report::failed(false, Some(threshold), format!("Engine error: {e}")));

    write_document(&paths.output, &report).await?;
    info!(
        output = %paths.output.display(),
        mistakes = report.mistakes.len(),
        "Report written"
    );
    Ok(ExitCode::SUCCESS)
}

fn run(config: &AnalyzerConfig, request: &AnalysisRequest, runtime: Handle) -> Report {
    match GnubgOracle::spawn(config, runtime) {
        Ok(mut engine) => {
            info!("gnubg engine ready");
            analyzer::analyze(&mut engine, config.threads, request)
        }
        Err(e) => {
            error!(error = %e, "Engine unavailable");
            Report::failed(false, Some(request.threshold), e.to_string())
        }
    }
}
