//! Local move selectors.
//!
//! `AiEngine` is the synchronous interface for choosing a move without the
//! external search oracle. `RandomAi` plays a uniformly random legal move; it
//! is the whole of "harmless" difficulty and the fallback whenever the
//! oracle is absent, slow or wrong.

use rand::seq::SliceRandom;

use crate::engine::board::Position;
use crate::engine::movegen::legal_moves;
use crate::engine::types::{ChessError, Move};

pub trait AiEngine: Send + Sync {
    /// Select a move for the side to move in `pos`.
    fn best_move(&self, pos: &Position) -> Result<Move, ChessError>;

    /// Human-readable name for this engine.
    fn name(&self) -> &str;
}

/// Picks a random legal move.
pub struct RandomAi;

impl AiEngine for RandomAi {
    fn best_move(&self, pos: &Position) -> Result<Move, ChessError> {
        let moves = legal_moves(pos);
        moves
            .choose(&mut rand::thread_rng())
            .copied()
            .ok_or_else(|| ChessError::GameOver("no legal moves".to_string()))
    }

    fn name(&self) -> &str {
        "RandomAi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fen::decode_position;

    #[test]
    fn random_returns_legal_move() {
        let pos = Position::starting();
        let legal = legal_moves(&pos);
        for _ in 0..20 {
            let mv = RandomAi.best_move(&pos).unwrap();
            assert!(legal.contains(&mv));
        }
    }

    #[test]
    fn random_finds_the_only_move() {
        // White king on c7 covers b7 and b8; only Ka7 is legal.
        let pos = decode_position("k7/2K5/8/8/8/8/8/8 b - - 0 1")
            .unwrap()
            .position;
        let legal = legal_moves(&pos);
        assert_eq!(legal.len(), 1);
        assert_eq!(RandomAi.best_move(&pos).unwrap(), legal[0]);
    }

    #[test]
    fn random_errors_when_no_moves() {
        let pos = decode_position("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1")
            .unwrap()
            .position;
        assert!(matches!(
            RandomAi.best_move(&pos),
            Err(ChessError::GameOver(_))
        ));
    }

    #[test]
    fn name() {
        assert_eq!(RandomAi.name(), "RandomAi");
    }
}
