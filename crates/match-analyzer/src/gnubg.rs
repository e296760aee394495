//! gnubg engine wrapper over a child process (async I/O behind a blocking API)
//!
//! gnubg has no end-of-response marker in text mode, so every command is
//! followed by a numbered keyword gnubg does not know. Its "Unknown keyword"
//! complaint echoes the keyword back, which marks the end of the response.
//! Echoes carrying an older number belong to a command that already timed
//! out, so they and everything before them are discarded.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::oracle::Oracle;

const SYNC_KEYWORD: &str = "gammonreviewsync";

/// gnubg engine instance
pub struct GnubgOracle {
    runtime: Handle,
    process: Child,
    stdin: ChildStdin,
    lines: UnboundedReceiver<String>,
    timeout: Duration,
    serial: u64,
}

impl GnubgOracle {
    /// Spawn gnubg and wait until it answers a first sync round-trip.
    ///
    /// Must be called from outside the runtime's worker threads (e.g. inside
    /// `spawn_blocking`), since every command blocks on `runtime`.
    pub fn spawn(config: &AnalyzerConfig, runtime: Handle) -> Result<Self, AnalyzerError> {
        let mut process = {
            let _guard = runtime.enter();
            Command::new(&config.gnubg_path)
                .args(&config.gnubg_args)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| AnalyzerError::Engine(format!("Failed to spawn gnubg: {e}")))?
        };

        let stdin = process.stdin.take();
        let stdout = process.stdout.take();
        let stderr = process.stderr.take();
        let (Some(stdin), Some(stdout), Some(stderr)) = (stdin, stdout, stderr) else {
            let _ = process.start_kill();
            return Err(AnalyzerError::Engine("gnubg stdio not captured".into()));
        };

        let (tx, lines) = mpsc::unbounded_channel();
        runtime.spawn(forward_lines(stdout, tx.clone()));
        runtime.spawn(forward_lines(stderr, tx));

        let mut engine = Self {
            runtime: runtime.clone(),
            process,
            stdin,
            lines,
            timeout: config.command_timeout,
            serial: 0,
        };

        // Startup banner ends up in the first response
        runtime
            .block_on(engine.sync())
            .map_err(|e| AnalyzerError::Engine(format!("gnubg did not respond: {}", describe(e))))?;

        Ok(engine)
    }

    /// Write one line to gnubg
    async fn send(&mut self, cmd: &str) -> Result<(), AnalyzerError> {
        debug!(cmd, "gnubg <");
        self.stdin.write_all(format!("{cmd}\n").as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Send the next sync keyword and collect everything printed before its echo
    async fn sync(&mut self) -> Result<String, AnalyzerError> {
        self.serial += 1;
        let serial = self.serial;
        self.send(&format!("{SYNC_KEYWORD}{serial}")).await?;

        let limit = self.timeout;
        tokio::time::timeout(limit, self.read_until_sync(serial))
            .await
            .map_err(|_| AnalyzerError::Engine(format!("no response within {}s", limit.as_secs())))?
    }

    async fn read_until_sync(&mut self, serial: u64) -> Result<String, AnalyzerError> {
        let mut response = Vec::new();
        while let Some(line) = self.lines.recv().await {
            debug!(line = line.as_str(), "gnubg >");
            match sync_serial(&line) {
                Some(n) if n == serial => return Ok(response.join("\n")),
                Some(n) => {
                    trace!(stale = n, discarded = response.len(), "Late sync echo");
                    response.clear();
                }
                None => response.push(line),
            }
        }
        Err(AnalyzerError::Engine("gnubg exited".into()))
    }

    async fn exchange(&mut self, cmd: &str) -> Result<String, AnalyzerError> {
        self.drain_stale();
        self.send(cmd).await?;
        self.sync().await
    }

    /// Discard output that arrived after the previous sync
    fn drain_stale(&mut self) {
        while let Ok(line) = self.lines.try_recv() {
            trace!(line = line.as_str(), "gnubg > (stale)");
        }
    }
}

impl Oracle for GnubgOracle {
    fn command(&mut self, text: &str) -> Result<String, AnalyzerError> {
        let runtime = self.runtime.clone();
        runtime
            .block_on(self.exchange(text))
            .map_err(|e| AnalyzerError::Command {
                command: text.to_string(),
                reason: describe(e),
            })
    }
}

impl Drop for GnubgOracle {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

fn describe(e: AnalyzerError) -> String {
    match e {
        AnalyzerError::Engine(msg) => msg,
        other => other.to_string(),
    }
}

/// Serial number of a sync keyword echoed somewhere in `line`.
fn sync_serial(line: &str) -> Option<u64> {
    let (_, rest) = line.split_once(SYNC_KEYWORD)?;
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// Forward each line of `stream` into `tx` until EOF or the receiver is gone
async fn forward_lines<R>(stream: R, tx: UnboundedSender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).is_err() {
            break;
        }
    }
}
