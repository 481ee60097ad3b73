//! Move history and replay.
//!
//! `Progress` is the state that can be derived from a start position plus a
//! list of moves: the position itself, captured pieces and score. Live play
//! and undo both advance it one validated move at a time, so replaying a
//! history reproduces exactly the state live play produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::board::{Played, Position};
use crate::engine::executor;
use crate::engine::movegen;
use crate::engine::types::{ChessError, Color, Move, Piece, PieceType, Pos};

// =========================================================================
// MoveRecord
// =========================================================================

/// One entry of the append-only move history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    pub from: Pos,
    pub to: Pos,
    pub piece: Piece,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured: Option<Piece>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceType>,
    /// SAN, computed when the move was played.
    pub notation: String,
    pub timestamp: DateTime<Utc>,
}

impl MoveRecord {
    pub fn new(mv: Move, piece: Piece, captured: Option<Piece>, notation: String) -> Self {
        MoveRecord {
            from: mv.from,
            to: mv.to,
            piece,
            captured,
            promotion: mv.promotion,
            notation,
            timestamp: Utc::now(),
        }
    }

    pub fn as_move(&self) -> Move {
        Move {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }
}

// =========================================================================
// Captures and score
// =========================================================================

/// Captured pieces, keyed by the color that captured them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Captures {
    pub white: Vec<Piece>,
    pub black: Vec<Piece>,
}

impl Captures {
    pub fn by(&self, color: Color) -> &[Piece] {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    fn push(&mut self, color: Color, piece: Piece) {
        match color {
            Color::White => self.white.push(piece),
            Color::Black => self.black.push(piece),
        }
    }
}

/// Material won by each color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub white: u32,
    pub black: u32,
}

impl Score {
    pub fn of(&self, color: Color) -> u32 {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    fn add(&mut self, color: Color, points: u32) {
        match color {
            Color::White => self.white += points,
            Color::Black => self.black += points,
        }
    }
}

// =========================================================================
// Progress
// =========================================================================

/// Position plus capture bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub position: Position,
    pub captured: Captures,
    pub score: Score,
}

impl Progress {
    pub fn new(position: Position) -> Self {
        Progress {
            position,
            captured: Captures::default(),
            score: Score::default(),
        }
    }

    /// Validate and play one complete move.
    ///
    /// A pawn reaching the last rank must carry its promotion choice here;
    /// suspending for a choice is the caller's concern.
    pub fn advance(&mut self, mv: Move) -> Result<Played, ChessError> {
        if !movegen::is_legal(&self.position, mv) {
            return Err(ChessError::invalid_move(mv.from, mv.to, "illegal move"));
        }
        let played = self
            .position
            .play(mv)
            .ok_or_else(|| ChessError::invalid_move(mv.from, mv.to, "no piece on square"))?;
        if mv.promotion.is_none() && executor::needs_promotion(played.piece, mv.to) {
            return Err(ChessError::InvalidPromotion(format!(
                "{mv} needs a promotion piece"
            )));
        }

        let mover = played.piece.color;
        if let Some(victim) = played.captured {
            self.captured.push(mover, victim);
            self.score.add(mover, victim.value());
        }
        self.position = played.position;
        Ok(played)
    }

    /// Rebuild from `start` by replaying `moves` through [`Progress::advance`].
    ///
    /// Fails with [`ChessError::CorruptState`] on the first move that is not
    /// legal where it is played.
    pub fn replay<I>(start: Position, moves: I) -> Result<Self, ChessError>
    where
        I: IntoIterator<Item = Move>,
    {
        let mut progress = Progress::new(start);
        for (ply, mv) in moves.into_iter().enumerate() {
            progress.advance(mv).map_err(|e| {
                ChessError::CorruptState(format!("history ply {} ({mv}): {e}", ply + 1))
            })?;
        }
        Ok(progress)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(from: &str, to: &str) -> Move {
        Move::new(
            Pos::from_algebraic(from).unwrap(),
            Pos::from_algebraic(to).unwrap(),
        )
    }

    #[test]
    fn advance_tracks_captures_and_score() {
        let mut p = Progress::new(Position::starting());
        for m in [mv("e2", "e4"), mv("d7", "d5"), mv("e4", "d5"), mv("d8", "d5")] {
            p.advance(m).unwrap();
        }
        assert_eq!(p.captured.by(Color::White), &[Piece::new(PieceType::Pawn, Color::Black)]);
        assert_eq!(p.captured.by(Color::Black), &[Piece::new(PieceType::Pawn, Color::White)]);
        assert_eq!(p.score.of(Color::White), 1);
        assert_eq!(p.score.of(Color::Black), 1);
    }

    #[test]
    fn advance_rejects_illegal_without_change() {
        let mut p = Progress::new(Position::starting());
        let before = p.clone();
        assert!(p.advance(mv("e2", "e5")).is_err());
        assert_eq!(p, before);
    }

    #[test]
    fn advance_requires_promotion_choice() {
        let setup = crate::engine::fen::decode_position("7k/4P3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let mut p = Progress::new(setup.position);
        let before = p.clone();
        assert!(matches!(
            p.advance(mv("e7", "e8")),
            Err(ChessError::InvalidPromotion(_))
        ));
        assert_eq!(p, before);

        let promo = Move::with_promotion(mv("e7", "e8").from, mv("e7", "e8").to, PieceType::Queen);
        p.advance(promo).unwrap();
        assert_eq!(
            p.position.board.get(promo.to),
            Some(Piece::new(PieceType::Queen, Color::White))
        );
    }

    #[test]
    fn replay_matches_live_play() {
        let moves = [mv("e2", "e4"), mv("e7", "e5"), mv("g1", "f3"), mv("b8", "c6")];
        let mut live = Progress::new(Position::starting());
        for m in moves {
            live.advance(m).unwrap();
        }
        let replayed = Progress::replay(Position::starting(), moves).unwrap();
        assert_eq!(replayed, live);
    }

    #[test]
    fn replay_reports_corrupt_history() {
        let err = Progress::replay(Position::starting(), [mv("e2", "e4"), mv("e4", "e5")])
            .unwrap_err();
        assert!(matches!(err, ChessError::CorruptState(_)));
    }

    #[test]
    fn record_round_trips_move() {
        let m = Move::with_promotion(mv("a7", "a8").from, mv("a7", "a8").to, PieceType::Knight);
        let r = MoveRecord::new(m, Piece::new(PieceType::Pawn, Color::White), None, "a8=N".into());
        assert_eq!(r.as_move(), m);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["promotion"], "knight");
        assert!(json.get("captured").is_none());
    }
}
