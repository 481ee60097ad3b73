//! Standard Algebraic Notation (SAN) generation and parsing.
//!
//! SAN examples: `e4`, `Nf3`, `Bxe5`, `O-O`, `e8=Q+`, `Raxd1#`.

use crate::engine::attacks;
use crate::engine::board::Position;
use crate::engine::movegen;
use crate::engine::rules;
use crate::engine::types::{ChessError, Move, PieceType, Pos};

// =========================================================================
// SAN generation
// =========================================================================

/// SAN for `mv` played in `pos`, including the `+` / `#` suffix.
///
/// `mv` must be legal in `pos`.
pub fn notation(pos: &Position, mv: Move) -> String {
    let legal = movegen::legal_moves(pos);
    let mut san = move_to_san(pos, mv, &legal);
    if let Some(played) = pos.play(mv) {
        let after = played.position;
        let defender = after.side_to_move;
        if movegen::is_checkmate(defender, &after.board, after.en_passant) {
            san.push('#');
        } else if attacks::is_in_check(defender, &after.board) {
            san.push('+');
        }
    }
    san
}

/// SAN for `mv` without the check suffix.
///
/// `legal_moves` is the full list of legal moves in `pos`, used for
/// disambiguation.
pub fn move_to_san(pos: &Position, mv: Move, legal_moves: &[Move]) -> String {
    let Some(piece) = pos.board.get(mv.from) else {
        return mv.to_string();
    };

    if piece.kind == PieceType::King && rules::is_castling_candidate(piece.color, mv.from, mv.to) {
        return if mv.to.col > mv.from.col {
            "O-O".into()
        } else {
            "O-O-O".into()
        };
    }

    let capture = !pos.board.is_empty_at(mv.to)
        || (piece.kind == PieceType::Pawn && mv.from.col != mv.to.col);

    let mut san = String::with_capacity(8);

    if piece.kind == PieceType::Pawn {
        if capture {
            san.push(mv.from.file_char());
            san.push('x');
        }
        san.push_str(&mv.to.to_algebraic());
        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(promo.letter().to_ascii_uppercase());
        }
    } else {
        san.push(piece.kind.letter().to_ascii_uppercase());
        san.push_str(&disambiguation(pos, mv, piece.kind, legal_moves));
        if capture {
            san.push('x');
        }
        san.push_str(&mv.to.to_algebraic());
    }

    san
}

/// File, rank or both, when another piece of the same kind can also reach
/// the destination.
fn disambiguation(pos: &Position, mv: Move, kind: PieceType, legal_moves: &[Move]) -> String {
    let us = pos.side_to_move;
    let rivals: Vec<Pos> = legal_moves
        .iter()
        .filter(|m| {
            m.to == mv.to
                && m.from != mv.from
                && pos.board.get(m.from).is_some_and(|p| p.is(kind, us))
        })
        .map(|m| m.from)
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let same_file = rivals.iter().any(|from| from.col == mv.from.col);
    let same_rank = rivals.iter().any(|from| from.row == mv.from.row);

    match (same_file, same_rank) {
        (false, _) => mv.from.file_char().to_string(),
        (true, false) => mv.from.rank_char().to_string(),
        (true, true) => mv.from.to_algebraic(),
    }
}

// =========================================================================
// SAN parsing
// =========================================================================

/// Parse SAN into the matching legal move.
///
/// Check and annotation suffixes (`+`, `#`, `!`, `?`) are ignored.
pub fn parse_san(pos: &Position, san: &str) -> Result<Move, ChessError> {
    let legal = movegen::legal_moves(pos);
    let text = san.trim().trim_end_matches(['+', '#', '!', '?']);

    if text == "O-O" || text == "0-0" {
        return find_castling(pos, &legal, true);
    }
    if text == "O-O-O" || text == "0-0-0" {
        return find_castling(pos, &legal, false);
    }

    let unparsable = |reason: &str| ChessError::InvalidMove {
        from: String::new(),
        to: san.to_string(),
        reason: reason.into(),
    };

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Err(unparsable("empty SAN string"));
    }

    let (chars, promotion) = if chars.len() >= 2 && chars[chars.len() - 2] == '=' {
        let letter = chars[chars.len() - 1];
        let kind = PieceType::from_promotion_letter(letter)
            .ok_or_else(|| ChessError::InvalidPromotion(letter.to_string()))?;
        (&chars[..chars.len() - 2], Some(kind))
    } else {
        (&chars[..], None)
    };

    let (kind, rest) = match chars[0] {
        'N' => (PieceType::Knight, &chars[1..]),
        'B' => (PieceType::Bishop, &chars[1..]),
        'R' => (PieceType::Rook, &chars[1..]),
        'Q' => (PieceType::Queen, &chars[1..]),
        'K' => (PieceType::King, &chars[1..]),
        _ => (PieceType::Pawn, chars),
    };

    let rest: Vec<char> = rest.iter().copied().filter(|&c| c != 'x').collect();
    if rest.len() < 2 {
        return Err(unparsable("SAN too short"));
    }

    let dest_str: String = rest[rest.len() - 2..].iter().collect();
    let dest =
        Pos::from_algebraic(&dest_str).ok_or_else(|| ChessError::InvalidSquare(dest_str.clone()))?;

    let hint = &rest[..rest.len() - 2];
    let hint_file = hint
        .iter()
        .find(|c| c.is_ascii_lowercase())
        .map(|&c| c as u8 - b'a')
        // A pawn move without a file prefix is a straight push.
        .or((kind == PieceType::Pawn).then_some(dest.col));
    let hint_row = hint
        .iter()
        .find(|c| c.is_ascii_digit())
        .map(|&c| b'8' - c as u8);

    let us = pos.side_to_move;
    let candidates: Vec<&Move> = legal
        .iter()
        .filter(|m| {
            m.to == dest
                && pos.board.get(m.from).is_some_and(|p| p.is(kind, us))
                && hint_file.is_none_or(|f| m.from.col == f)
                && hint_row.is_none_or(|r| m.from.row == r)
                && m.promotion == promotion
        })
        .collect();

    match candidates.as_slice() {
        [] => Err(unparsable(&format!("no legal move matches SAN '{san}'"))),
        [only] => Ok(**only),
        many => Err(unparsable(&format!(
            "ambiguous SAN '{san}': {} candidates",
            many.len()
        ))),
    }
}

fn find_castling(pos: &Position, legal: &[Move], kingside: bool) -> Result<Move, ChessError> {
    let us = pos.side_to_move;
    let king = Pos::new(us.back_row(), rules::KING_HOME_COL);
    let target = Pos::new(us.back_row(), if kingside { 6 } else { 2 });

    legal
        .iter()
        .find(|m| {
            m.from == king
                && m.to == target
                && pos.board.get(king).is_some_and(|p| p.is(PieceType::King, us))
        })
        .copied()
        .ok_or_else(|| {
            ChessError::invalid_move(
                king,
                target,
                if kingside {
                    "castling kingside not legal"
                } else {
                    "castling queenside not legal"
                },
            )
        })
}

// =========================================================================
// Tests
// =========================================================================
