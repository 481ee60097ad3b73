//! FEN encoding and decoding, plus decoding of engine best-move tokens.
//!
//! The encoder derives castling letters from the `HasMoved` flags *and* the
//! pieces actually standing on their home squares, and counts the half-move
//! clock backward through the move history.

use crate::engine::attacks;
use crate::engine::board::{Board, Position};
use crate::engine::history::MoveRecord;
use crate::engine::types::{
    CastlingFlags, ChessError, Color, HasMoved, Move, PieceType, Pos, piece_info,
};

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A position together with its move counters, as found in a full FEN.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    pub position: Position,
    pub halfmove: u32,
    pub fullmove: u32,
}

impl Setup {
    pub fn standard() -> Self {
        Setup {
            position: Position::starting(),
            halfmove: 0,
            fullmove: 1,
        }
    }
}

impl Default for Setup {
    fn default() -> Self {
        Self::standard()
    }
}

/// Everything besides the board that goes into an encoded position.
pub struct EncodeContext<'a> {
    pub current_player: Color,
    pub has_moved: &'a HasMoved,
    pub en_passant: Option<Pos>,
    /// Moves played since `start`.
    pub history: &'a [MoveRecord],
    pub start: &'a Setup,
}

// =========================================================================
// Encoding
// =========================================================================

/// Encode a position as a six-field FEN string.
pub fn encode_position(board: &Board, ctx: &EncodeContext<'_>) -> String {
    let mut fen = placement(board);

    fen.push(' ');
    fen.push(match ctx.current_player {
        Color::White => 'w',
        Color::Black => 'b',
    });

    fen.push(' ');
    fen.push_str(&castling_field(board, ctx.has_moved));

    fen.push(' ');
    match ctx.en_passant {
        Some(pos) => fen.push_str(&pos.to_algebraic()),
        None => fen.push('-'),
    }

    let fullmove = fullmove_number(ctx.start, ctx.history.len());
    fen.push_str(&format!(
        " {} {}",
        halfmove_clock(ctx.start, ctx.history),
        fullmove
    ));
    fen
}

/// Encode a bare `Position` with counters taken from `start` and `history`.
pub fn encode(pos: &Position, history: &[MoveRecord], start: &Setup) -> String {
    encode_position(
        &pos.board,
        &EncodeContext {
            current_player: pos.side_to_move,
            has_moved: &pos.has_moved,
            en_passant: pos.en_passant,
            history,
            start,
        },
    )
}

/// Piece placement field: ranks 8 to 1, runs of empty cells as digits.
fn placement(board: &Board) -> String {
    let mut out = String::with_capacity(72);
    for (r, row) in board.rows().iter().enumerate() {
        let mut empty = 0;
        for cell in row {
            match cell {
                Some(piece) => {
                    if empty > 0 {
                        out.push(char::from(b'0' + empty));
                        empty = 0;
                    }
                    out.push(piece.fen_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            out.push(char::from(b'0' + empty));
        }
        if r < 7 {
            out.push('/');
        }
    }
    out
}

fn castling_field(board: &Board, has_moved: &HasMoved) -> String {
    let mut out = String::with_capacity(4);
    for color in [Color::White, Color::Black] {
        let flags = has_moved.get(color);
        let row = color.back_row();
        let king_home = board
            .get(Pos::new(row, 4))
            .is_some_and(|p| p.is(PieceType::King, color));
        if flags.king || !king_home {
            continue;
        }
        let rook_at = |col| {
            board
                .get(Pos::new(row, col))
                .is_some_and(|p| p.is(PieceType::Rook, color))
        };
        let (kingside, queenside) = match color {
            Color::White => ('K', 'Q'),
            Color::Black => ('k', 'q'),
        };
        if !flags.rook_right && rook_at(7) {
            out.push(kingside);
        }
        if !flags.rook_left && rook_at(0) {
            out.push(queenside);
        }
    }
    if out.is_empty() {
        out.push('-');
    }
    out
}

/// Consecutive plies since the last pawn move or capture, counted backward
/// from the end of `history`. Runs into the start position's own clock when
/// no such move exists.
pub fn halfmove_clock(start: &Setup, history: &[MoveRecord]) -> u32 {
    let mut count = 0;
    for record in history.iter().rev() {
        if record.piece.kind == PieceType::Pawn || record.captured.is_some() {
            return count;
        }
        count += 1;
    }
    count.saturating_add(start.halfmove)
}

/// Full-move number after `plies` half-moves from `start`.
pub fn fullmove_number(start: &Setup, plies: usize) -> u32 {
    let offset = usize::from(start.position.side_to_move == Color::Black);
    let moves = u32::try_from(plies.saturating_add(offset) / 2).unwrap_or(u32::MAX);
    start.fullmove.saturating_add(moves)
}

/// Reject boards no game can reach: a king count other than one per color,
/// or the side that just moved still in check.
pub fn check_position(position: &Position) -> Result<(), String> {
    for color in [Color::White, Color::Black] {
        let kings = position.board.count(PieceType::King, color);
        if kings != 1 {
            return Err(format!("expected one {color} king, found {kings}"));
        }
    }
    let waiting = !position.side_to_move;
    if attacks::is_in_check(waiting, &position.board) {
        return Err(format!("{waiting} is in check but it is not their move"));
    }
    Ok(())
}

// =========================================================================
// Decoding
// =========================================================================

/// Parse a FEN string. The board must hold exactly one king per color and
/// the side not to move must not be in check.
///
/// Castling letters are turned back into `HasMoved` flags: a missing letter
/// marks that rook as moved, and a side with no letters has a moved king.
/// The two counter fields are optional and default to `0 1`.
pub fn decode_position(fen: &str) -> Result<Setup, ChessError> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() < 4 || fields.len() > 6 {
        return Err(ChessError::InvalidFen(format!(
            "expected 4-6 fields, got {}",
            fields.len()
        )));
    }

    let board = parse_placement(fields[0])?;

    let side_to_move = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => {
            return Err(ChessError::InvalidFen(format!(
                "invalid side to move: {other}"
            )));
        }
    };

    let has_moved = parse_castling(fields[2])?;

    let en_passant = match fields[3] {
        "-" => None,
        sq => Some(
            Pos::from_algebraic(sq)
                .ok_or_else(|| ChessError::InvalidFen(format!("invalid en passant: {sq}")))?,
        ),
    };

    let halfmove: u32 = match fields.get(4) {
        Some(s) => s
            .parse()
            .map_err(|_| ChessError::InvalidFen(format!("invalid halfmove clock: {s}")))?,
        None => 0,
    };
    let fullmove: u32 = match fields.get(5) {
        Some(s) => s
            .parse()
            .map_err(|_| ChessError::InvalidFen(format!("invalid fullmove number: {s}")))?,
        None => 1,
    };

    let position = Position {
        board,
        side_to_move,
        has_moved,
        en_passant,
    };
    check_position(&position).map_err(ChessError::InvalidFen)?;

    Ok(Setup {
        position,
        halfmove,
        fullmove: fullmove.max(1),
    })
}

fn parse_placement(field: &str) -> Result<Board, ChessError> {
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 8 {
        return Err(ChessError::InvalidFen(format!(
            "expected 8 ranks, got {}",
            ranks.len()
        )));
    }

    let mut board = Board::empty();
    for (row, rank) in ranks.iter().enumerate() {
        let mut col = 0u8;
        for ch in rank.chars() {
            if let Some(skip) = ch.to_digit(10) {
                if !(1..=8).contains(&skip) {
                    return Err(ChessError::InvalidFen(format!("invalid run length: {ch}")));
                }
                col += skip as u8;
            } else {
                let piece = piece_info(ch)
                    .filter(|_| ch.is_ascii_alphabetic())
                    .ok_or_else(|| ChessError::InvalidFen(format!("invalid piece: {ch}")))?;
                if col >= 8 {
                    return Err(ChessError::InvalidFen(format!("rank {} too long", 8 - row)));
                }
                board.set(Pos::new(row as u8, col), Some(piece));
                col += 1;
            }
            if col > 8 {
                return Err(ChessError::InvalidFen(format!("rank {} too long", 8 - row)));
            }
        }
        if col != 8 {
            return Err(ChessError::InvalidFen(format!("rank {} too short", 8 - row)));
        }
    }
    Ok(board)
}

fn parse_castling(field: &str) -> Result<HasMoved, ChessError> {
    if field != "-" && !field.chars().all(|c| "KQkq".contains(c)) {
        return Err(ChessError::InvalidFen(format!("invalid castling: {field}")));
    }
    let flags = |kingside: char, queenside: char| {
        let k = field.contains(kingside);
        let q = field.contains(queenside);
        CastlingFlags {
            king: !k && !q,
            rook_left: !q,
            rook_right: !k,
        }
    };
    Ok(HasMoved {
        white: flags('K', 'Q'),
        black: flags('k', 'q'),
    })
}

// =========================================================================
// Best-move tokens
// =========================================================================

/// Decode an engine reply token such as `e2e4` or `e7e8q`.
///
/// Returns `None` for the no-move sentinels (`(none)`, `0000`) and for
/// anything malformed. A missing promotion letter is left as `None`.
pub fn decode_best_move(token: &str) -> Option<Move> {
    let token = token.trim();
    if token == "(none)" || token == "0000" || !token.is_ascii() {
        return None;
    }
    if token.len() != 4 && token.len() != 5 {
        return None;
    }
    let from = Pos::from_algebraic(&token[0..2])?;
    let to = Pos::from_algebraic(&token[2..4])?;
    let promotion = match token[4..].chars().next() {
        Some(c) => Some(PieceType::from_promotion_letter(c)?),
        None => None,
    };
    Some(Move { from, to, promotion })
}

// =========================================================================
// Tests
// =========================================================================
