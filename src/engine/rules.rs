//! Per-piece movement rules.
//!
//! Everything here is geometry plus occupancy: whether a path exists from
//! `from` to `to` for the piece standing on `from`. Whether the move would
//! leave the mover's own king in check is layered on top by
//! [`attacks::would_be_in_check`](crate::engine::attacks::would_be_in_check).

use crate::engine::board::Board;
use crate::engine::types::{Color, HasMoved, Piece, PieceType, Pos};

/// Column the king starts on for both colors.
pub const KING_HOME_COL: u8 = 4;

/// Is `from → to` a valid move for the piece on `from`, ignoring self-check?
///
/// Rejects moves from an empty square, null moves, and moves onto a piece of
/// the mover's own color. A king stepping two squares sideways from its home
/// square is accepted as a castling *candidate*; full castling legality is
/// [`is_valid_castling`].
pub fn is_valid_move(from: Pos, to: Pos, board: &Board, en_passant: Option<Pos>) -> bool {
    let Some(piece) = board.get(from) else {
        return false;
    };
    if from == to {
        return false;
    }
    if let Some(target) = board.get(to)
        && target.color == piece.color
    {
        return false;
    }

    match piece.kind {
        PieceType::Pawn => is_valid_pawn_move(piece.color, from, to, board, en_passant),
        PieceType::Knight => is_knight_step(from, to),
        PieceType::Bishop => is_diagonal(from, to) && path_clear(from, to, board),
        PieceType::Rook => is_straight(from, to) && path_clear(from, to, board),
        PieceType::Queen => {
            (is_straight(from, to) || is_diagonal(from, to)) && path_clear(from, to, board)
        }
        PieceType::King => is_king_step(from, to) || is_castling_candidate(piece.color, from, to),
    }
}

/// Full castling check for a king move `from → to`: same row, two columns,
/// king and the relevant rook unmoved, rook physically present on its origin
/// square, and every square strictly between them empty.
///
/// Attack safety (not castling out of, through or into check) is applied by
/// the legality layer in [`movegen`](crate::engine::movegen).
pub fn is_valid_castling(from: Pos, to: Pos, board: &Board, has_moved: &HasMoved) -> bool {
    let Some(king) = board.get(from) else {
        return false;
    };
    if king.kind != PieceType::King || !is_castling_candidate(king.color, from, to) {
        return false;
    }

    let flags = has_moved.get(king.color);
    if flags.king {
        return false;
    }

    let kingside = to.col > from.col;
    let rook_moved = if kingside {
        flags.rook_right
    } else {
        flags.rook_left
    };
    if rook_moved {
        return false;
    }

    let rook_from = castling_rook_origin(from, to);
    match board.get(rook_from) {
        Some(rook) if rook.is(PieceType::Rook, king.color) => {}
        _ => return false,
    }

    let (lo, hi) = if kingside {
        (from.col + 1, rook_from.col)
    } else {
        (rook_from.col + 1, from.col)
    };
    (lo..hi).all(|col| board.is_empty_at(Pos::new(from.row, col)))
}

/// Brute-force list of destinations that pass [`is_valid_move`] from
/// `(row, col)`. Does not filter self-check.
pub fn valid_moves(row: u8, col: u8, board: &Board, en_passant: Option<Pos>) -> Vec<Pos> {
    let from = Pos::new(row, col);
    Pos::all()
        .filter(|&to| is_valid_move(from, to, board, en_passant))
        .collect()
}

/// Does `piece` standing on `from` attack `target`?
///
/// Same geometry as [`is_valid_move`] except that pawns attack only their two
/// forward diagonals, kings never castle, and the occupant of `target` is
/// irrelevant.
pub fn attacks_square(piece: Piece, from: Pos, target: Pos, board: &Board) -> bool {
    if from == target {
        return false;
    }
    match piece.kind {
        PieceType::Pawn => {
            let dr = target.row as i8 - from.row as i8;
            let dc = (target.col as i8 - from.col as i8).abs();
            dr == piece.color.pawn_direction() && dc == 1
        }
        PieceType::Knight => is_knight_step(from, target),
        PieceType::Bishop => is_diagonal(from, target) && path_clear(from, target, board),
        PieceType::Rook => is_straight(from, target) && path_clear(from, target, board),
        PieceType::Queen => {
            (is_straight(from, target) || is_diagonal(from, target))
                && path_clear(from, target, board)
        }
        PieceType::King => is_king_step(from, target),
    }
}

/// Origin square of the rook that castles with a king moving `from → to`.
pub fn castling_rook_origin(from: Pos, to: Pos) -> Pos {
    let col = if to.col > from.col { 7 } else { 0 };
    Pos::new(from.row, col)
}

/// Square the castling rook lands on: next to the king, on the inner side.
pub fn castling_rook_target(from: Pos, to: Pos) -> Pos {
    let col = if to.col > from.col { to.col - 1 } else { to.col + 1 };
    Pos::new(from.row, col)
}

/// Is `from → to` a two-square sideways step from the king's home square?
pub fn is_castling_candidate(color: Color, from: Pos, to: Pos) -> bool {
    from.row == color.back_row()
        && from.col == KING_HOME_COL
        && to.row == from.row
        && (to.col as i8 - from.col as i8).abs() == 2
}

// ---------------------------------------------------------------------------
// Piece geometry
// ---------------------------------------------------------------------------

fn is_valid_pawn_move(
    color: Color,
    from: Pos,
    to: Pos,
    board: &Board,
    en_passant: Option<Pos>,
) -> bool {
    let dir = color.pawn_direction();
    let dr = to.row as i8 - from.row as i8;
    let dc = to.col as i8 - from.col as i8;

    // Straight pushes never capture.
    if dc == 0 {
        if dr == dir {
            return board.is_empty_at(to);
        }
        if dr == 2 * dir && from.row == color.pawn_start_row() {
            let Some(skipped) = from.offset(dir, 0) else {
                return false;
            };
            return board.is_empty_at(skipped) && board.is_empty_at(to);
        }
        return false;
    }

    if dr != dir || dc.abs() != 1 {
        return false;
    }

    match board.get(to) {
        Some(target) => target.color != color,
        None => {
            // En passant: the target must be this exact square and the pawn
            // being captured must sit beside us.
            en_passant == Some(to)
                && board
                    .get(Pos::new(from.row, to.col))
                    .is_some_and(|p| p.is(PieceType::Pawn, !color))
        }
    }
}

#[inline]
fn is_knight_step(from: Pos, to: Pos) -> bool {
    let dr = (to.row as i8 - from.row as i8).abs();
    let dc = (to.col as i8 - from.col as i8).abs();
    (dr, dc) == (2, 1) || (dr, dc) == (1, 2)
}

#[inline]
fn is_king_step(from: Pos, to: Pos) -> bool {
    let dr = (to.row as i8 - from.row as i8).abs();
    let dc = (to.col as i8 - from.col as i8).abs();
    dr <= 1 && dc <= 1 && (dr, dc) != (0, 0)
}

#[inline]
fn is_straight(from: Pos, to: Pos) -> bool {
    (from.row == to.row) != (from.col == to.col)
}

#[inline]
fn is_diagonal(from: Pos, to: Pos) -> bool {
    let dr = (to.row as i8 - from.row as i8).abs();
    let dc = (to.col as i8 - from.col as i8).abs();
    dr == dc && dr != 0
}

/// Every square strictly between `from` and `to` is empty. The two squares
/// must share a line or a diagonal.
fn path_clear(from: Pos, to: Pos, board: &Board) -> bool {
    let step_r = (to.row as i8 - from.row as i8).signum();
    let step_c = (to.col as i8 - from.col as i8).signum();
    let mut cur = from;
    loop {
        let Some(next) = cur.offset(step_r, step_c) else {
            return false;
        };
        if next == to {
            return true;
        }
        if !board.is_empty_at(next) {
            return false;
        }
        cur = next;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
