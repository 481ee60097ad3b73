//! UCI (Universal Chess Interface) commands and replies.
//!
//! Only the subset the search oracle needs: handshake, new game, set a FEN
//! position, search by depth or move time, stop and quit.

use std::fmt;

/// How long a single search may run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchBudget {
    Depth(u32),
    MoveTimeMs(u64),
}

/// Commands sent to the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    /// Set the position from a FEN string.
    Position { fen: String },
    Go(SearchBudget),
    Stop,
    Quit,
}

impl fmt::Display for UciCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UciCommand::Uci => write!(f, "uci"),
            UciCommand::IsReady => write!(f, "isready"),
            UciCommand::UciNewGame => write!(f, "ucinewgame"),
            UciCommand::Position { fen } => write!(f, "position fen {fen}"),
            UciCommand::Go(SearchBudget::Depth(depth)) => write!(f, "go depth {depth}"),
            UciCommand::Go(SearchBudget::MoveTimeMs(ms)) => write!(f, "go movetime {ms}"),
            UciCommand::Stop => write!(f, "stop"),
            UciCommand::Quit => write!(f, "quit"),
        }
    }
}

/// A classified line of engine output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UciReply {
    UciOk,
    ReadyOk,
    /// The first token after `bestmove` (`ponder …` is dropped).
    BestMove(String),
    Info(String),
    Id(String),
    Other(String),
}

impl UciReply {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line == "uciok" {
            UciReply::UciOk
        } else if line == "readyok" {
            UciReply::ReadyOk
        } else if let Some(rest) = line.strip_prefix("bestmove") {
            let token = rest.split_whitespace().next().unwrap_or("(none)");
            UciReply::BestMove(token.to_string())
        } else if let Some(rest) = line.strip_prefix("info ") {
            UciReply::Info(rest.to_string())
        } else if let Some(rest) = line.strip_prefix("id ") {
            UciReply::Id(rest.to_string())
        } else {
            UciReply::Other(line.to_string())
        }
    }
}
