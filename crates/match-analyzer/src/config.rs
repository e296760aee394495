//! Analyzer configuration from environment variables

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the input document path.
pub const INPUT_ENV: &str = "GNUBG_INPUT_JSON";
/// Environment variable holding the output document path.
pub const OUTPUT_ENV: &str = "GNUBG_OUTPUT_JSON";

#[derive(Clone, Debug)]
pub struct AnalyzerConfig {
    /// Path to the gnubg executable
    pub gnubg_path: String,

    /// Arguments passed to gnubg (text mode, quiet by default)
    pub gnubg_args: Vec<String>,

    /// Evaluation threads requested from the engine
    pub threads: u32,

    /// How long to wait for the engine to answer one command
    pub command_timeout: Duration,
}

impl AnalyzerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Self {
        let gnubg_path = env::var("GNUBG_PATH").unwrap_or_else(|_| "gnubg".to_string());

        let gnubg_args = env::var("GNUBG_ARGS")
            .unwrap_or_else(|_| "-t -q".to_string())
            .split_whitespace()
            .map(String::from)
            .collect();

        let threads = env::var("GNUBG_THREADS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2);

        let timeout_secs = env::var("GNUBG_COMMAND_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Self {
            gnubg_path,
            gnubg_args,
            threads,
            command_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

/// Where to read the request and write the result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IoPaths {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Paths could not be fully determined. `output` is kept when known so an
/// error document can still be written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingPaths {
    pub output: Option<PathBuf>,
}

impl IoPaths {
    /// Positional `<input> <output>` win; otherwise both come from the
    /// environment. `args` excludes the program name.
    pub fn resolve<F>(args: &[String], lookup: F) -> Result<Self, MissingPaths>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (input, output) = if args.len() >= 2 {
            (Some(args[0].clone()), Some(args[1].clone()))
        } else {
            (lookup(INPUT_ENV), lookup(OUTPUT_ENV))
        };
        let input = input.filter(|p| !p.is_empty()).map(PathBuf::from);
        let output = output.filter(|p| !p.is_empty()).map(PathBuf::from);
        match (input, output) {
            (Some(input), Some(output)) => Ok(Self { input, output }),
            (_, output) => Err(MissingPaths { output }),
        }
    }

    /// Resolve from the real process arguments and environment.
    pub fn from_process() -> Result<Self, MissingPaths> {
        let args: Vec<String> = env::args().skip(1).collect();
        Self::resolve(&args, |key| env::var(key).ok())
    }
}
