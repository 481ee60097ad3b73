//! Search oracle: an external UCI engine driven over stdin/stdout.
//!
//! `UciOracle` owns the child process. A reader task forwards stdout lines
//! into an mpsc channel so that `best_move` can be awaited, raced against a
//! timeout and dropped without losing track of the protocol. Every `go` that
//! was sent owes exactly one `bestmove`; replies owed to abandoned searches
//! are discarded before the current one is returned.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::uci::{SearchBudget, UciCommand, UciReply};
use crate::engine::types::Difficulty;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
/// How long a stopped search gets to deliver its `bestmove`.
const STOP_GRACE: Duration = Duration::from_millis(500);
const LINE_BUFFER: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("failed to start engine `{path}`: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine process exited")]
    Exited,

    #[error("engine did not answer `{0}` in time")]
    Handshake(&'static str),
}

/// Search budget for a difficulty level. `None` means no search at all:
/// the random selector plays instead.
pub fn budget_for(difficulty: Difficulty) -> Option<SearchBudget> {
    match difficulty {
        Difficulty::Harmless => None,
        Difficulty::Easy => Some(SearchBudget::Depth(1)),
        Difficulty::Medium => Some(SearchBudget::Depth(5)),
        Difficulty::Hard => Some(SearchBudget::Depth(10)),
        Difficulty::Expert => Some(SearchBudget::MoveTimeMs(1000)),
        Difficulty::Godlike => Some(SearchBudget::MoveTimeMs(2000)),
    }
}

/// Asynchronous request/response access to a move-searching engine.
#[async_trait]
pub trait SearchOracle: Send {
    /// Tell the engine a new game starts.
    async fn new_game(&mut self) -> Result<(), OracleError>;

    /// Search the given FEN position and return the raw best-move token
    /// (e.g. `e2e4`, `e7e8q`, `(none)`).
    async fn best_move(&mut self, fen: &str, budget: SearchBudget) -> Result<String, OracleError>;

    /// Ask the engine to cut a running search short. Advisory.
    async fn stop(&mut self) -> Result<(), OracleError>;

    /// Release the engine. Searching afterwards is an error.
    async fn shutdown(&mut self) -> Result<(), OracleError> {
        Ok(())
    }

    fn name(&self) -> &str;
}

/// A UCI engine reachable over a pair of byte streams, usually a child
/// process.
pub struct UciOracle {
    name: String,
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    lines: mpsc::Receiver<String>,
    /// `bestmove` replies still owed by the engine.
    owed: usize,
    child: Option<Child>,
}

impl UciOracle {
    /// Spawn the engine binary at `path` and complete the UCI handshake.
    pub async fn spawn(path: &str) -> Result<Self, OracleError> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| OracleError::Spawn {
                path: path.to_string(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(OracleError::Exited)?;
        let stdout = child.stdout.take().ok_or(OracleError::Exited)?;

        let mut oracle = UciOracle::from_io(stdout, stdin);
        oracle.child = Some(child);
        oracle.handshake().await?;
        info!(engine = %oracle.name, path, "search oracle ready");
        Ok(oracle)
    }

    /// Wrap an already connected engine. Call [`UciOracle::handshake`] before
    /// searching.
    pub fn from_io<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        UciOracle {
            name: "uci engine".to_string(),
            writer: Box::new(writer),
            lines: spawn_reader(reader),
            owed: 0,
            child: None,
        }
    }

    /// `uci` / `uciok`, then `isready` / `readyok`.
    pub async fn handshake(&mut self) -> Result<(), OracleError> {
        self.send(&UciCommand::Uci).await?;
        tokio::time::timeout(HANDSHAKE_TIMEOUT, self.wait_for(UciReply::UciOk))
            .await
            .map_err(|_| OracleError::Handshake("uci"))??;
        self.ready().await
    }

    async fn ready(&mut self) -> Result<(), OracleError> {
        self.send(&UciCommand::IsReady).await?;
        tokio::time::timeout(HANDSHAKE_TIMEOUT, self.wait_for(UciReply::ReadyOk))
            .await
            .map_err(|_| OracleError::Handshake("isready"))?
    }

    async fn send(&mut self, command: &UciCommand) -> Result<(), OracleError> {
        debug!(%command, "-> engine");
        let line = format!("{command}\n");
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Drain `bestmove` replies owed to stopped searches. A `go` that was
    /// counted but never reached the engine owes nothing, so the count is
    /// cleared once the grace period runs out.
    async fn settle(&mut self) -> Result<(), OracleError> {
        let drained = tokio::time::timeout(STOP_GRACE, async {
            while self.owed > 0 {
                if let UciReply::BestMove(token) = self.next_reply().await? {
                    self.owed -= 1;
                    debug!(%token, "discarding stale bestmove");
                }
            }
            Ok::<_, OracleError>(())
        })
        .await;
        match drained {
            Ok(result) => result,
            Err(_) => {
                warn!(owed = self.owed, "stopped search never answered");
                self.owed = 0;
                Ok(())
            }
        }
    }

    async fn next_reply(&mut self) -> Result<UciReply, OracleError> {
        let line = self.lines.recv().await.ok_or(OracleError::Exited)?;
        Ok(UciReply::parse(&line))
    }

    /// Read until `expected` arrives. A `bestmove` seen on the way settles
    /// an abandoned search.
    async fn wait_for(&mut self, expected: UciReply) -> Result<(), OracleError> {
        loop {
            let reply = self.next_reply().await?;
            if reply == expected {
                return Ok(());
            }
            match reply {
                UciReply::Id(id) => {
                    if let Some(name) = id.strip_prefix("name ") {
                        self.name = name.trim().to_string();
                    }
                }
                UciReply::BestMove(token) => {
                    self.owed = self.owed.saturating_sub(1);
                    debug!(%token, "discarding stale bestmove");
                }
                _ => {}
            }
        }
    }
}

#[async_trait]
impl SearchOracle for UciOracle {
    async fn new_game(&mut self) -> Result<(), OracleError> {
        self.send(&UciCommand::UciNewGame).await?;
        self.ready().await
    }

    async fn best_move(&mut self, fen: &str, budget: SearchBudget) -> Result<String, OracleError> {
        if self.owed > 0 {
            self.send(&UciCommand::Stop).await?;
            self.settle().await?;
        }
        self.send(&UciCommand::Position {
            fen: fen.to_string(),
        })
        .await?;

        // Counted before writing: a search dropped mid-send may still have
        // reached the engine.
        self.owed += 1;
        if let Err(err) = self.send(&UciCommand::Go(budget)).await {
            self.owed -= 1;
            return Err(err);
        }

        loop {
            if let UciReply::BestMove(token) = self.next_reply().await? {
                self.owed -= 1;
                if self.owed == 0 {
                    return Ok(token);
                }
                debug!(%token, owed = self.owed, "discarding stale bestmove");
            }
        }
    }

    async fn stop(&mut self) -> Result<(), OracleError> {
        if self.owed > 0 {
            self.send(&UciCommand::Stop).await?;
        }
        Ok(())
    }

    /// Send `quit` and reap the process.
    async fn shutdown(&mut self) -> Result<(), OracleError> {
        self.send(&UciCommand::Quit).await?;
        if let Some(mut child) = self.child.take() {
            let status = child.wait().await?;
            debug!(%status, "engine exited");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn spawn_reader<R>(reader: R) -> mpsc::Receiver<String>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    debug!("engine closed stdout");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "engine read failed");
                    break;
                }
            }
        }
    });
    rx
}
