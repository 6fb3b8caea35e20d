//! UCI engine wrapper (async I/O) and the query trait the review core
//! consumes, so the orchestrator can run against a scripted engine in tests.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::debug;

use crate::config::SearchLimits;
use crate::error::ReviewError;

/// Scheduling slack allowed on top of a query's movetime budget. An
/// exceeded bound is a failed query, never a hang.
const QUERY_SLACK: Duration = Duration::from_secs(2);

/// A single PV line from analysis. Scores are raw UCI output, from the
/// side to move's perspective.
#[derive(Debug, Clone, Default)]
pub struct EngineLine {
    /// Principal variation moves (UCI notation)
    pub pv: Vec<String>,
    /// Centipawn score
    pub cp: Option<i32>,
    /// Mate in N
    pub mate: Option<i32>,
}

/// The synchronous query protocol offered by the external analysis engine.
/// `&mut self` makes the endpoint non-reentrant: one outstanding query per
/// handle, serialized by the borrow checker.
pub trait UciEngine {
    /// Bounded-effort analysis returning the top `multipv` candidate lines
    /// in engine preference order.
    fn analyse(
        &mut self,
        fen: &str,
        limits: SearchLimits,
        multipv: u32,
    ) -> impl std::future::Future<Output = Result<Vec<EngineLine>, ReviewError>> + Send;

    /// Minimal best-move query, the degraded fallback when full analysis
    /// fails.
    fn play(
        &mut self,
        fen: &str,
        limits: SearchLimits,
    ) -> impl std::future::Future<Output = Result<String, ReviewError>> + Send;
}

/// Stockfish engine instance
pub struct Stockfish {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Stockfish {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(path: &str) -> Result<Self, ReviewError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| ReviewError::EngineUnavailable(format!("Failed to spawn engine: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| ReviewError::EngineUnavailable("No stdin pipe".to_string()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| ReviewError::EngineUnavailable("No stdout pipe".to_string()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
        };

        // Initialize UCI
        engine.handshake().await.map_err(|e| match e {
            ReviewError::EngineQuery(msg) => ReviewError::EngineUnavailable(msg),
            other => other,
        })?;

        Ok(engine)
    }

    async fn handshake(&mut self) -> Result<(), ReviewError> {
        self.send("uci").await?;
        self.wait_for("uciok").await?;

        self.send("setoption name Threads value 1").await?;
        self.send("setoption name Hash value 256").await?;
        self.send("setoption name UCI_AnalyseMode value true").await?;
        self.send("isready").await?;
        self.wait_for("readyok").await?;
        Ok(())
    }

    /// Send a command to the engine
    async fn send(&mut self, cmd: &str) -> Result<(), ReviewError> {
        debug!(cmd, "UCI <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| ReviewError::EngineQuery(format!("Failed to write to engine: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| ReviewError::EngineQuery(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Wait for a specific response line (handshake only, fixed bound)
    async fn wait_for(&mut self, expected: &str) -> Result<(), ReviewError> {
        let deadline = Duration::from_secs(10);
        let wait = async {
            let mut line = String::new();
            loop {
                line.clear();
                self.stdout
                    .read_line(&mut line)
                    .await
                    .map_err(|e| ReviewError::EngineQuery(format!("Failed to read from engine: {e}")))?;
                let trimmed = line.trim();
                debug!(line = trimmed, "UCI >");
                if trimmed == expected {
                    return Ok(());
                }
                if trimmed.is_empty() && line.is_empty() {
                    return Err(ReviewError::EngineQuery("Engine closed its pipe".to_string()));
                }
            }
        };
        timeout(deadline, wait)
            .await
            .map_err(|_| ReviewError::EngineQuery(format!("Timed out waiting for '{expected}'")))?
    }

    /// Read info/bestmove lines until `bestmove`, collecting `multipv` lines.
    async fn collect_lines(&mut self, multipv: u32) -> Result<Vec<EngineLine>, ReviewError> {
        let mut lines: Vec<EngineLine> = vec![EngineLine::default(); multipv as usize];
        let mut line = String::new();

        loop {
            line.clear();
            let n = self
                .stdout
                .read_line(&mut line)
                .await
                .map_err(|e| ReviewError::EngineQuery(format!("Failed to read from engine: {e}")))?;
            if n == 0 {
                return Err(ReviewError::EngineQuery("Engine closed its pipe".to_string()));
            }
            let trimmed = line.trim();

            if trimmed.starts_with("info") && trimmed.contains(" pv ") {
                let pv_idx = parse_multipv_index(trimmed).unwrap_or(1) - 1;
                if (pv_idx as usize) < lines.len() {
                    let entry = &mut lines[pv_idx as usize];
                    entry.cp = parse_cp(trimmed);
                    entry.mate = parse_mate(trimmed);
                    entry.pv = parse_pv(trimmed);
                }
            } else if trimmed.starts_with("bestmove") {
                break;
            }
        }

        // Drop trailing slots the engine never filled (fewer legal moves
        // than requested lines)
        lines.retain(|l| !l.pv.is_empty());
        Ok(lines)
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl UciEngine for Stockfish {
    async fn analyse(
        &mut self,
        fen: &str,
        limits: SearchLimits,
        multipv: u32,
    ) -> Result<Vec<EngineLine>, ReviewError> {
        if multipv > 1 {
            self.send(&format!("setoption name MultiPV value {multipv}"))
                .await?;
        }
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!(
            "go depth {} movetime {}",
            limits.depth, limits.movetime_ms
        ))
        .await?;

        let budget = Duration::from_millis(limits.movetime_ms) + QUERY_SLACK;
        let result = timeout(budget, self.collect_lines(multipv))
            .await
            .map_err(|_| {
                ReviewError::EngineQuery(format!(
                    "Query exceeded budget ({} ms + slack)",
                    limits.movetime_ms
                ))
            })?;

        if multipv > 1 {
            self.send("setoption name MultiPV value 1").await?;
        }

        result
    }

    async fn play(&mut self, fen: &str, limits: SearchLimits) -> Result<String, ReviewError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!(
            "go depth {} movetime {}",
            limits.depth, limits.movetime_ms
        ))
        .await?;

        let budget = Duration::from_millis(limits.movetime_ms) + QUERY_SLACK;
        let read_best = async {
            let mut line = String::new();
            loop {
                line.clear();
                let n = self
                    .stdout
                    .read_line(&mut line)
                    .await
                    .map_err(|e| ReviewError::EngineQuery(format!("Failed to read from engine: {e}")))?;
                if n == 0 {
                    return Err(ReviewError::EngineQuery("Engine closed its pipe".to_string()));
                }
                let trimmed = line.trim();
                if trimmed.starts_with("bestmove") {
                    let parts: Vec<&str> = trimmed.split_whitespace().collect();
                    return match parts.get(1) {
                        Some(&mv) if mv != "(none)" => Ok(mv.to_string()),
                        _ => Err(ReviewError::EngineQuery("Engine returned no move".to_string())),
                    };
                }
            }
        };

        timeout(budget, read_best).await.map_err(|_| {
            ReviewError::EngineQuery(format!(
                "Query exceeded budget ({} ms + slack)",
                limits.movetime_ms
            ))
        })?
    }
}

impl Drop for Stockfish {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "cp" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "mate" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse multipv index from info line
fn parse_multipv_index(line: &str) -> Option<u32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "multipv" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse PV moves from info line
fn parse_pv(line: &str) -> Vec<String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let mut in_pv = false;
    let mut moves = Vec::new();

    for part in parts {
        if part == "pv" {
            in_pv = true;
            continue;
        }
        if in_pv {
            // PV ends at next keyword or end of line
            if part.starts_with("bmc") || part == "string" {
                break;
            }
            moves.push(part.to_string());
        }
    }

    moves
}
