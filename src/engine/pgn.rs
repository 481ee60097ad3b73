//! PGN (Portable Game Notation) export.
//!
//! Produces PGN with the Seven Tag Roster and move text with move numbers.

use crate::engine::game::Game;
use crate::engine::types::{Color, Winner};

/// Maximum move-text line length.
const LINE_WIDTH: usize = 80;

/// Export a game as a PGN string.
pub fn to_pgn(game: &Game) -> String {
    let mut pgn = String::with_capacity(512);

    let date = game.created_at.format("%Y.%m.%d");
    let result = result_string(game);

    pgn.push_str("[Event \"Casual Game\"]\n");
    pgn.push_str("[Site \"chessroom\"]\n");
    pgn.push_str(&format!("[Date \"{date}\"]\n"));
    pgn.push_str("[Round \"-\"]\n");
    pgn.push_str(&format!("[White \"{}\"]\n", game.white_player));
    pgn.push_str(&format!("[Black \"{}\"]\n", game.black_player));
    pgn.push_str(&format!("[Result \"{result}\"]\n"));

    if let Some(over) = game.game_over() {
        pgn.push_str(&format!("[Termination \"{:?}\"]\n", over.reason));
    }

    if game.started_from_fen() {
        let start = game.start();
        pgn.push_str("[SetUp \"1\"]\n");
        pgn.push_str(&format!(
            "[FEN \"{}\"]\n",
            crate::engine::fen::encode(&start.position, &[], start)
        ));
    }

    pgn.push('\n');

    let mut tokens = Vec::with_capacity(game.history().len() * 3 / 2 + 1);
    let mut move_num = game.start().fullmove;
    let mut white_turn = game.start().position.side_to_move == Color::White;

    for (i, record) in game.history().iter().enumerate() {
        if white_turn {
            tokens.push(format!("{move_num}. {}", record.notation));
        } else if i == 0 {
            tokens.push(format!("{move_num}... {}", record.notation));
        } else {
            tokens.push(record.notation.clone());
        }
        if !white_turn {
            move_num += 1;
        }
        white_turn = !white_turn;
    }
    tokens.push(result.to_string());

    let mut line = String::new();
    for token in tokens {
        if !line.is_empty() && line.len() + token.len() + 1 > LINE_WIDTH {
            pgn.push_str(&line);
            pgn.push('\n');
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&token);
    }
    pgn.push_str(&line);
    pgn.push('\n');

    pgn
}

/// PGN result token.
fn result_string(game: &Game) -> &'static str {
    match game.game_over().map(|over| over.winner) {
        Some(Winner::White) => "1-0",
        Some(Winner::Black) => "0-1",
        Some(Winner::Draw) => "1/2-1/2",
        None => "*",
    }
}

// =========================================================================
// Tests
// =========================================================================
