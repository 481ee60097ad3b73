//! Move execution.
//!
//! [`execute_move`] applies an already-validated move to a copy of the board.
//! Bookkeeping that depends on game history (captures, castling flags, the
//! en-passant target, turn order) belongs to the caller.

use crate::engine::board::Board;
use crate::engine::rules;
use crate::engine::types::{Piece, PieceType, Pos};

/// Result of playing one move on a board copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Executed {
    pub board: Board,
    /// Piece removed from the board by this move, if any.
    pub captured: Option<Piece>,
    /// Square the captured piece stood on. Differs from `to` for en passant.
    pub captured_at: Option<Pos>,
}

/// Play `from → to` on a copy of `board`.
///
/// - An ordinary capture records the piece on `to` before it is overwritten.
/// - A pawn moving diagonally onto the empty en-passant target removes the
///   enemy pawn beside it and reports that pawn as the capture.
/// - With `is_castling`, the rook also moves to the square the king crossed.
/// - With `promotion`, the pawn on `to` becomes the chosen piece. Without
///   one, a pawn reaching the last rank stays a pawn and the caller must
///   resolve the promotion.
///
/// An empty `from` square returns the board unchanged.
pub fn execute_move(
    from: Pos,
    to: Pos,
    board: &Board,
    en_passant: Option<Pos>,
    is_castling: bool,
    promotion: Option<PieceType>,
) -> Executed {
    let mut next = *board;
    let Some(piece) = next.take(from) else {
        return Executed {
            board: next,
            captured: None,
            captured_at: None,
        };
    };

    let mut captured = next.get(to);
    let mut captured_at = captured.map(|_| to);

    if is_en_passant_capture(piece, from, to, board, en_passant) {
        let victim = Pos::new(from.row, to.col);
        captured = next.take(victim);
        captured_at = Some(victim);
    }

    next.set(to, Some(piece));

    if is_castling {
        let rook_from = rules::castling_rook_origin(from, to);
        let rook = next.take(rook_from);
        next.set(rules::castling_rook_target(from, to), rook);
    }

    if let Some(kind) = promotion
        && piece.kind == PieceType::Pawn
    {
        next.set(to, Some(Piece::new(kind, piece.color)));
    }

    Executed {
        board: next,
        captured,
        captured_at,
    }
}

/// Is this a pawn's diagonal step onto the empty en-passant target?
pub fn is_en_passant_capture(
    piece: Piece,
    from: Pos,
    to: Pos,
    board: &Board,
    en_passant: Option<Pos>,
) -> bool {
    piece.kind == PieceType::Pawn
        && from.col != to.col
        && board.is_empty_at(to)
        && en_passant == Some(to)
}

/// Does a pawn landing on `to` need a promotion choice?
pub fn needs_promotion(piece: Piece, to: Pos) -> bool {
    piece.kind == PieceType::Pawn && to.row == piece.color.promotion_row()
}

/// Square skipped by a pawn double step, if `from → to` is one.
pub fn double_step_target(piece: Piece, from: Pos, to: Pos) -> Option<Pos> {
    if piece.kind != PieceType::Pawn || from.col != to.col {
        return None;
    }
    if (to.row as i8 - from.row as i8).abs() != 2 {
        return None;
    }
    Some(Pos::new((from.row + to.row) / 2, from.col))
}
