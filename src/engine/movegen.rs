//! Legal move generation and game-over detection.
//!
//! Pipeline for a candidate `from → to`:
//!   1. Geometry and occupancy ([`rules::is_valid_move`]).
//!   2. Castling rules and castling safety for two-square king moves.
//!   3. Self-check filter ([`attacks::would_be_in_check`]).
//!
//! Every move that reaches the board goes through [`is_legal_move`], whether
//! it came from a player, the computer, a hint or history replay.

use crate::engine::attacks;
use crate::engine::board::{Board, Position};
use crate::engine::executor;
use crate::engine::rules;
use crate::engine::types::{Color, Move, PieceType, Pos};

// =========================================================================
// Legality
// =========================================================================

/// Is `from → to` legal for the side to move in `pos`?
pub fn is_legal_move(pos: &Position, from: Pos, to: Pos) -> bool {
    let board = &pos.board;
    let Some(piece) = board.get(from) else {
        return false;
    };
    if piece.color != pos.side_to_move {
        return false;
    }
    if !rules::is_valid_move(from, to, board, pos.en_passant) {
        return false;
    }

    if piece.kind == PieceType::King && rules::is_castling_candidate(piece.color, from, to) {
        if !rules::is_valid_castling(from, to, board, &pos.has_moved) {
            return false;
        }
        // No castling out of or through check.
        if attacks::is_in_check(piece.color, board) {
            return false;
        }
        let transit = Pos::new(from.row, (from.col + to.col) / 2);
        if attacks::is_square_under_attack(transit, !piece.color, board) {
            return false;
        }
    }

    !attacks::would_be_in_check(from, to, board, pos.en_passant)
}

/// Is `mv` legal, including its promotion choice?
///
/// A pawn reaching the last rank may carry a promotion piece or none (the
/// choice is then made later); any other move must not carry one.
pub fn is_legal(pos: &Position, mv: Move) -> bool {
    if !is_legal_move(pos, mv.from, mv.to) {
        return false;
    }
    match (mv.promotion, pos.board.get(mv.from)) {
        (None, _) => true,
        (Some(kind), Some(piece)) => {
            executor::needs_promotion(piece, mv.to) && PieceType::PROMOTIONS.contains(&kind)
        }
        (Some(_), None) => false,
    }
}

// =========================================================================
// Enumeration
// =========================================================================

/// All legal moves for the side to move. Promotions expand to one entry per
/// choice (queen, rook, bishop, knight).
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    for (from, piece) in pos.board.pieces_of(pos.side_to_move) {
        for to in Pos::all() {
            if !is_legal_move(pos, from, to) {
                continue;
            }
            if executor::needs_promotion(piece, to) {
                for kind in PieceType::PROMOTIONS {
                    moves.push(Move::with_promotion(from, to, kind));
                }
            } else {
                moves.push(Move::new(from, to));
            }
        }
    }
    moves
}

/// Legal destination squares for the piece on `from`. Empty when the square
/// is empty or holds a piece of the side not to move.
pub fn legal_destinations(pos: &Position, from: Pos) -> Vec<Pos> {
    Pos::all()
        .filter(|&to| is_legal_move(pos, from, to))
        .collect()
}

// =========================================================================
// Game-over detection
// =========================================================================

/// Does `color` have at least one move that passes the rules and does not
/// leave its king in check?
///
/// Castling is not considered: whenever castling is legal the one-square king
/// step toward the rook is legal too, so the answer is unchanged.
pub fn has_legal_moves(color: Color, board: &Board, en_passant: Option<Pos>) -> bool {
    board.pieces_of(color).any(|(from, piece)| {
        Pos::all().any(|to| {
            if piece.kind == PieceType::King && rules::is_castling_candidate(color, from, to) {
                return false;
            }
            rules::is_valid_move(from, to, board, en_passant)
                && !attacks::would_be_in_check(from, to, board, en_passant)
        })
    })
}

pub fn is_checkmate(color: Color, board: &Board, en_passant: Option<Pos>) -> bool {
    attacks::is_in_check(color, board) && !has_legal_moves(color, board, en_passant)
}

pub fn is_stalemate(color: Color, board: &Board, en_passant: Option<Pos>) -> bool {
    !attacks::is_in_check(color, board) && !has_legal_moves(color, board, en_passant)
}

// =========================================================================
// Tests
// =========================================================================
