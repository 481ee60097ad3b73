//! Check detection.
//!
//! Attack tests scan the attacker's pieces and ask [`rules::attacks_square`]
//! whether each one reaches the target. Simulations run on a scratch copy of
//! the board; the caller's board is never touched.

use crate::engine::board::Board;
use crate::engine::executor;
use crate::engine::rules;
use crate::engine::types::{Color, PieceType, Pos};

/// Is `pos` attacked by any piece of `attacker`?
pub fn is_square_under_attack(pos: Pos, attacker: Color, board: &Board) -> bool {
    board
        .pieces_of(attacker)
        .any(|(from, piece)| rules::attacks_square(piece, from, pos, board))
}

/// Is `color`'s king attacked?
///
/// A board without that king reports `false`. That never happens in a real
/// game and should be treated as a corrupted position, not a verdict.
pub fn is_in_check(color: Color, board: &Board) -> bool {
    match board.king_pos(color) {
        Some(king) => is_square_under_attack(king, !color, board),
        None => false,
    }
}

/// Would moving the piece on `from` to `to` leave its own king in check?
///
/// The move is played on a copy through the executor, so en-passant captures
/// remove the captured pawn and castling moves the rook before the test.
/// An empty `from` square reports `false`.
pub fn would_be_in_check(from: Pos, to: Pos, board: &Board, en_passant: Option<Pos>) -> bool {
    let Some(piece) = board.get(from) else {
        return false;
    };
    let castling =
        piece.kind == PieceType::King && rules::is_castling_candidate(piece.color, from, to);
    let after = executor::execute_move(from, to, board, en_passant, castling, None);
    is_in_check(piece.color, &after.board)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
