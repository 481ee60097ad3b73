//! 8×8 board representation.
//!
//! `Board` is a plain grid of `Option<Piece>`: row 0 is rank 8 (black's back
//! rank), row 7 is rank 1, col 0 is file a. Boards are small `Copy` values, so
//! move simulation works on scratch copies and never touches the live board.
//!
//! `Position` adds the rest of what legality depends on: side to move,
//! castling flags and the en-passant target.

use serde::{Deserialize, Serialize};

use crate::engine::attacks;
use crate::engine::executor;
use crate::engine::rules;
use crate::engine::types::{Color, HasMoved, Move, Piece, PieceType, Pos};

/// Standard back-rank order, file a to file h.
const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

/// An 8×8 grid of cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    cells: [[Option<Piece>; 8]; 8],
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl Board {
    /// A board with no pieces.
    pub fn empty() -> Self {
        Board {
            cells: [[None; 8]; 8],
        }
    }

    /// Standard starting position.
    pub fn starting() -> Self {
        let mut board = Self::empty();
        for (col, kind) in BACK_RANK.iter().enumerate() {
            let col = col as u8;
            board.set(Pos::new(0, col), Some(Piece::new(*kind, Color::Black)));
            board.set(Pos::new(1, col), Some(Piece::new(PieceType::Pawn, Color::Black)));
            board.set(Pos::new(6, col), Some(Piece::new(PieceType::Pawn, Color::White)));
            board.set(Pos::new(7, col), Some(Piece::new(*kind, Color::White)));
        }
        board
    }

    /// Build a board from a sparse list of placements, e.g. `[("e1", 'K')]`.
    /// Symbols go through [`piece_info`](crate::engine::types::piece_info);
    /// unknown squares or symbols are skipped.
    pub fn from_placements(placements: &[(&str, char)]) -> Self {
        let mut board = Self::empty();
        for (square, symbol) in placements {
            if let (Some(pos), Some(piece)) = (
                Pos::from_algebraic(square),
                crate::engine::types::piece_info(*symbol),
            ) {
                board.set(pos, Some(piece));
            }
        }
        board
    }
}

// ---------------------------------------------------------------------------
// Cell access
// ---------------------------------------------------------------------------

impl Board {
    #[inline]
    pub fn get(&self, pos: Pos) -> Option<Piece> {
        self.cells[pos.row as usize][pos.col as usize]
    }

    #[inline]
    pub fn set(&mut self, pos: Pos, cell: Option<Piece>) {
        self.cells[pos.row as usize][pos.col as usize] = cell;
    }

    /// Clear a cell, returning what was there.
    #[inline]
    pub fn take(&mut self, pos: Pos) -> Option<Piece> {
        self.cells[pos.row as usize][pos.col as usize].take()
    }

    #[inline]
    pub fn is_empty_at(&self, pos: Pos) -> bool {
        self.get(pos).is_none()
    }

    /// Raw rows, rank 8 first.
    pub fn rows(&self) -> &[[Option<Piece>; 8]; 8] {
        &self.cells
    }

    /// All occupied cells with their pieces.
    pub fn pieces(&self) -> impl Iterator<Item = (Pos, Piece)> + '_ {
        Pos::all().filter_map(move |pos| self.get(pos).map(|piece| (pos, piece)))
    }

    /// Occupied cells belonging to `color`.
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Pos, Piece)> + '_ {
        self.pieces().filter(move |(_, piece)| piece.color == color)
    }

    /// Location of `color`'s king, if present.
    pub fn king_pos(&self, color: Color) -> Option<Pos> {
        self.pieces()
            .find(|(_, piece)| piece.is(PieceType::King, color))
            .map(|(pos, _)| pos)
    }

    /// Number of pieces of a given kind and color.
    pub fn count(&self, kind: PieceType, color: Color) -> usize {
        self.pieces().filter(|(_, p)| p.is(kind, color)).count()
    }

    // -----------------------------------------------------------------------
    // Board display (8×8 text grid)
    // -----------------------------------------------------------------------

    /// Render the board as an 8-line string (rank 8 at top), useful for debugging.
    pub fn board_string(&self) -> String {
        let mut s = String::with_capacity(200);
        for row in 0..8u8 {
            s.push((b'8' - row) as char);
            s.push(' ');
            for col in 0..8u8 {
                let ch = match self.get(Pos::new(row, col)) {
                    Some(piece) => piece.fen_char(),
                    None => '.',
                };
                s.push(ch);
                if col < 7 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::starting()
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.board_string())
    }
}

// =========================================================================
// Position
// =========================================================================

/// Board plus the state needed to reconstruct the exact legal-move set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub board: Board,
    pub side_to_move: Color,
    pub has_moved: HasMoved,
    /// Square skipped by a pawn double step on the previous ply.
    pub en_passant: Option<Pos>,
}

/// Outcome of [`Position::play`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Played {
    pub position: Position,
    /// The piece that moved, as it stood on `from`.
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub castling: bool,
}

impl Position {
    pub fn starting() -> Self {
        Position {
            board: Board::starting(),
            side_to_move: Color::White,
            has_moved: HasMoved::default(),
            en_passant: None,
        }
    }

    /// Play a move that has already been validated and do the bookkeeping:
    /// castling flags, en-passant target refresh, turn switch.
    ///
    /// Returns `None` when `from` is empty.
    pub fn play(&self, mv: Move) -> Option<Played> {
        let piece = self.board.get(mv.from)?;
        let castling = piece.kind == PieceType::King
            && rules::is_castling_candidate(piece.color, mv.from, mv.to);
        let executed = executor::execute_move(
            mv.from,
            mv.to,
            &self.board,
            self.en_passant,
            castling,
            mv.promotion,
        );

        let mut has_moved = self.has_moved;
        has_moved.record_departure(piece, mv.from);

        Some(Played {
            position: Position {
                board: executed.board,
                side_to_move: !self.side_to_move,
                has_moved,
                en_passant: executor::double_step_target(piece, mv.from, mv.to),
            },
            piece,
            captured: executed.captured,
            castling,
        })
    }

    /// Is the side to move in check?
    pub fn is_in_check(&self) -> bool {
        attacks::is_in_check(self.side_to_move, &self.board)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
