//! The computer player: one awaitable call that always yields a move.
//!
//! The oracle is raced against a timeout. Whatever it answers is decoded
//! and re-checked against the current position before use; on any failure
//! the random selector plays instead.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::engine::{AiEngine, RandomAi};
use super::oracle::{SearchOracle, budget_for};
use crate::engine::board::Position;
use crate::engine::executor::needs_promotion;
use crate::engine::fen::decode_best_move;
use crate::engine::movegen;
use crate::engine::types::{ChessError, Difficulty, Move, PieceType};

/// Where a computer move came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveSource {
    Oracle,
    Random,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChosenMove {
    pub mv: Move,
    pub source: MoveSource,
}

pub struct ComputerPlayer {
    timeout: Duration,
    think_delay: Duration,
    fallback: RandomAi,
}

impl ComputerPlayer {
    pub fn new(timeout: Duration, think_delay: Duration) -> Self {
        ComputerPlayer {
            timeout,
            think_delay,
            fallback: RandomAi,
        }
    }

    /// Pick the computer's move after the thinking delay.
    ///
    /// Errors only when the side to move has no legal move at all.
    pub async fn choose(
        &self,
        position: &Position,
        fen: &str,
        difficulty: Difficulty,
        oracle: Option<&mut (dyn SearchOracle + '_)>,
    ) -> Result<ChosenMove, ChessError> {
        if !self.think_delay.is_zero() {
            tokio::time::sleep(self.think_delay).await;
        }
        self.select(position, fen, difficulty, oracle).await
    }

    /// Suggest a move for the side to move. Same path as [`choose`] without
    /// the delay; nothing is applied.
    ///
    /// [`choose`]: ComputerPlayer::choose
    pub async fn hint(
        &self,
        position: &Position,
        fen: &str,
        difficulty: Difficulty,
        oracle: Option<&mut (dyn SearchOracle + '_)>,
    ) -> Result<ChosenMove, ChessError> {
        self.select(position, fen, difficulty, oracle).await
    }

    async fn select(
        &self,
        position: &Position,
        fen: &str,
        difficulty: Difficulty,
        oracle: Option<&mut (dyn SearchOracle + '_)>,
    ) -> Result<ChosenMove, ChessError> {
        if !movegen::has_legal_moves(position.side_to_move, &position.board, position.en_passant)
        {
            return Err(ChessError::GameOver("no legal moves".to_string()));
        }

        if let (Some(budget), Some(oracle)) = (budget_for(difficulty), oracle) {
            let reply = tokio::time::timeout(self.timeout, oracle.best_move(fen, budget)).await;
            match reply {
                Ok(Ok(token)) => match self.accept(position, &token) {
                    Some(mv) => {
                        debug!(%mv, engine = oracle.name(), "oracle move accepted");
                        return Ok(ChosenMove {
                            mv,
                            source: MoveSource::Oracle,
                        });
                    }
                    None => warn!(%token, "oracle move unusable, falling back"),
                },
                Ok(Err(err)) => warn!(%err, "oracle failed, falling back"),
                Err(_) => {
                    warn!(timeout_ms = self.timeout.as_millis() as u64, "oracle timed out");
                    if let Err(err) = oracle.stop().await {
                        warn!(%err, "could not stop oracle search");
                    }
                }
            }
        }

        let mv = self.fallback.best_move(position)?;
        info!(%mv, engine = self.fallback.name(), "random move chosen");
        Ok(ChosenMove {
            mv,
            source: MoveSource::Random,
        })
    }

    /// Decode a reply token and keep it only if it is legal here. A pawn
    /// reaching the last rank without a letter becomes a queen.
    fn accept(&self, position: &Position, token: &str) -> Option<Move> {
        let mut mv = decode_best_move(token)?;
        let piece = position.board.get(mv.from)?;
        if mv.promotion.is_none() && needs_promotion(piece, mv.to) {
            mv.promotion = Some(PieceType::Queen);
        }
        movegen::is_legal(position, mv).then_some(mv)
    }
}
