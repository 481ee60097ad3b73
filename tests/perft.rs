//! Perft (PERFormance Test): exhaustive move-generation correctness suite.
//!
//! Each test verifies that the number of leaf nodes at a given depth matches
//! known-correct values for standard positions. A wrong count means a bug in
//! move rules, execution bookkeeping, or the self-check filter.
//!
//! Reference: <https://www.chessprogramming.org/Perft_Results>

use chessroom::engine::board::Position;
use chessroom::engine::fen::decode_position;
use chessroom::engine::movegen::legal_moves;

/// Recursive perft: count leaf nodes at `depth`.
fn perft(pos: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = legal_moves(pos);
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .into_iter()
        .map(|mv| {
            let child = pos.play(mv).expect("legal move must play").position;
            perft(&child, depth - 1)
        })
        .sum()
}

fn from_fen(fen: &str) -> Position {
    decode_position(fen).unwrap().position
}

// =====================================================================
// Position 1: starting position
// =====================================================================

#[test]
fn perft_start_depth_1() {
    assert_eq!(perft(&Position::starting(), 1), 20);
}

#[test]
fn perft_start_depth_2() {
    assert_eq!(perft(&Position::starting(), 2), 400);
}

#[test]
fn perft_start_depth_3() {
    assert_eq!(perft(&Position::starting(), 3), 8_902);
}

// =====================================================================
// Position 2: "Kiwipete" (castling, en passant, pins, promotions)
// =====================================================================

fn kiwipete() -> Position {
    from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
}

#[test]
fn perft_kiwipete_depth_1() {
    assert_eq!(perft(&kiwipete(), 1), 48);
}

#[test]
fn perft_kiwipete_depth_2() {
    assert_eq!(perft(&kiwipete(), 2), 2_039);
}

// =====================================================================
// Position 3: rook endgame with en passant discovered checks
// =====================================================================

fn position_3() -> Position {
    from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1")
}

#[test]
fn perft_pos3_depth_1() {
    assert_eq!(perft(&position_3(), 1), 14);
}

#[test]
fn perft_pos3_depth_2() {
    assert_eq!(perft(&position_3(), 2), 191);
}

#[test]
fn perft_pos3_depth_3() {
    assert_eq!(perft(&position_3(), 3), 2_812);
}

// =====================================================================
// Position 4: promotions with capture, castling only for black
// =====================================================================

fn position_4() -> Position {
    from_fen("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1")
}

#[test]
fn perft_pos4_depth_1() {
    assert_eq!(perft(&position_4(), 1), 6);
}

#[test]
fn perft_pos4_depth_2() {
    assert_eq!(perft(&position_4(), 2), 264);
}

// =====================================================================
// Position 5
// =====================================================================

fn position_5() -> Position {
    from_fen("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8")
}

#[test]
fn perft_pos5_depth_1() {
    assert_eq!(perft(&position_5(), 1), 44);
}

#[test]
fn perft_pos5_depth_2() {
    assert_eq!(perft(&position_5(), 2), 1_486);
}
