pub mod attacks;
pub mod board;
pub mod clock;
pub mod executor;
pub mod fen;
pub mod game;
pub mod history;
pub mod movegen;
pub mod pgn;
pub mod rules;
pub mod san;
pub mod types;

pub use board::{Board, Position};
pub use game::{Game, GameSnapshot, MoveApplied};
pub use history::MoveRecord;
pub use movegen::{is_legal_move, legal_destinations, legal_moves};
pub use types::*;
