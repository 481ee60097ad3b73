//! Properties checked over seeded random games: undo restores every earlier
//! state, self-check moves are always refused, the en-passant target lives
//! for exactly one ply, and checkmate and stalemate never coincide.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use chessroom::engine::attacks::would_be_in_check;
use chessroom::engine::executor::{double_step_target, needs_promotion};
use chessroom::engine::movegen::{is_checkmate, is_stalemate};
use chessroom::engine::rules::valid_moves;
use chessroom::engine::{Color, Game, PieceType, Position};

const GAMES: u64 = 12;
const MAX_PLIES: usize = 120;

/// Everything undo must bring back.
#[derive(Debug, PartialEq)]
struct State {
    position: Position,
    fen: String,
    captured: (Vec<chessroom::engine::Piece>, Vec<chessroom::engine::Piece>),
    score: (u32, u32),
}

fn state_of(game: &Game) -> State {
    State {
        position: *game.position(),
        fen: game.to_fen(),
        captured: (game.captured().white.clone(), game.captured().black.clone()),
        score: (game.score().white, game.score().black),
    }
}

/// Play a random game, checking per-ply properties on the way. Returns the
/// game and the state seen before each ply.
fn random_game(seed: u64) -> (Game, Vec<State>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = Game::new();
    let mut before = Vec::new();

    for _ in 0..MAX_PLIES {
        check_self_check_filter(&game);
        check_terminal_exclusivity(game.position());

        let moves = game.legal_moves();
        let Some(&mv) = moves.choose(&mut rng) else {
            break;
        };
        let piece = game.position().board.get(mv.from).unwrap();

        before.push(state_of(&game));
        assert!(
            game.make_move(mv.from, mv.to, mv.promotion),
            "seed {seed}: legal move {mv} rejected"
        );

        assert_eq!(
            game.en_passant(),
            double_step_target(piece, mv.from, mv.to),
            "seed {seed}: en-passant target after {mv}"
        );
    }
    (game, before)
}

/// Every geometrically valid move that leaves the mover in check must be
/// refused without touching the game.
fn check_self_check_filter(game: &Game) {
    let pos = game.position();
    let side = pos.side_to_move;
    for (from, piece) in pos.board.pieces_of(side) {
        for to in valid_moves(from.row, from.col, &pos.board, pos.en_passant) {
            if !would_be_in_check(from, to, &pos.board, pos.en_passant) {
                continue;
            }
            let promotion = needs_promotion(piece, to).then_some(PieceType::Queen);
            let mut trial = game.clone();
            assert!(
                !trial.make_move(from, to, promotion),
                "{from}{to} exposes the king in {}",
                game.to_fen()
            );
            assert_eq!(trial.to_fen(), game.to_fen());
        }
    }
}

fn check_terminal_exclusivity(pos: &Position) {
    for color in [Color::White, Color::Black] {
        assert!(
            !(is_checkmate(color, &pos.board, pos.en_passant)
                && is_stalemate(color, &pos.board, pos.en_passant)),
            "{color} both mated and stalemated"
        );
    }
}

#[test]
fn undo_restores_each_earlier_state() {
    for seed in 0..GAMES {
        let (mut game, before) = random_game(seed);
        for expected in before.iter().rev() {
            game.undo().unwrap();
            assert_eq!(&state_of(&game), expected, "seed {seed}");
            assert!(!game.is_game_over());
        }
        assert!(game.history().is_empty());
        assert!(game.undo().is_err());
    }
}

#[test]
fn replaying_history_matches_live_play() {
    for seed in 0..GAMES {
        let (game, _) = random_game(seed + 1000);
        let mut replay = Game::new();
        for record in game.history() {
            assert!(replay.make_move(record.from, record.to, record.promotion));
        }
        assert_eq!(state_of(&replay), state_of(&game), "seed {seed}");
        assert_eq!(replay.status(), game.status());
    }
}

#[test]
fn snapshot_restore_survives_random_games() {
    for seed in 0..4 {
        let (game, _) = random_game(seed + 2000);
        let json = serde_json::to_string(&game.snapshot()).unwrap();
        let restored = Game::restore(serde_json::from_str(&json).unwrap()).unwrap();
        assert_eq!(state_of(&restored), state_of(&game));
        assert_eq!(restored.legal_moves(), game.legal_moves());
    }
}
