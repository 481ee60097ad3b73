use serde::{Deserialize, Serialize};

use crate::ai::MoveSource;
use crate::engine::clock::Clock;
use crate::engine::game::{ComputerSide, Game};
use crate::engine::history::{Captures, MoveRecord, Score};
use crate::engine::san::{self, move_to_san};
use crate::engine::types::{GameOver, HasMoved, Move, Piece};

// ---------------------------------------------------------------------------
// Request models
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub fen: Option<String>,
    pub white_player: Option<String>,
    pub black_player: Option<String>,
    /// Color played by the computer ("white" / "black"); absent for two humans.
    pub computer_color: Option<String>,
    pub difficulty: Option<String>,
    /// Seconds per side; overrides the server default, 0 for untimed.
    pub clock_seconds: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub from: Option<String>,
    pub to: Option<String>,
    pub promotion: Option<String>,
    /// Standard algebraic notation (`Nf3`, `exd5`, `O-O`, `e8=Q`); used
    /// instead of `from`/`to` when present.
    pub san: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionRequest {
    pub piece: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMoveRequest {
    pub difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListGamesQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalMovesQuery {
    pub from: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoQuery {
    pub plies: Option<usize>,
}

// ---------------------------------------------------------------------------
// Response models
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Name of the search oracle, or `null` when moves are random.
    pub oracle: Option<String>,
    pub games: usize,
    pub uptime: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    pub id: String,
    /// Row 0 is rank 8. `null` for empty cells.
    pub board: Vec<Vec<Option<Piece>>>,
    pub fen: String,
    pub status: String,
    pub current_player: String,
    pub check: bool,
    pub move_history: Vec<MoveRecord>,
    pub captured_pieces: Captures,
    pub score: Score,
    pub has_moved: HasMoved,
    pub en_passant_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_promotion: Option<LastMove>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_over: Option<GameOver>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_move: Option<LastMove>,
    pub players: Players,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computer: Option<ComputerSide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock: Option<Clock>,
    pub hints_remaining: u32,
    pub created_at: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LastMove {
    pub from: String,
    pub to: String,
    pub san: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Players {
    pub white: String,
    pub black: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListGamesResponse {
    pub games: Vec<GameResponse>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalMoveEntry {
    pub from: String,
    pub to: String,
    pub san: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalMovesResponse {
    pub moves: Vec<LegalMoveEntry>,
    /// Distinct target squares, for highlighting.
    pub destinations: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMoveResponse {
    #[serde(rename = "move")]
    pub ai_move: LastMove,
    pub source: MoveSource,
    #[serde(flatten)]
    pub game: GameResponse,
    pub thinking_time: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HintResponse {
    pub hint: LastMove,
    pub source: MoveSource,
    pub hints_remaining: u32,
    pub thinking_time: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FenResponse {
    pub fen: String,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert internal Game to full API GameResponse.
pub fn game_to_response(game: &Game) -> GameResponse {
    let status = game.status();
    let position = game.position();

    let last_move = game.history().last().map(|rec| LastMove {
        from: rec.from.to_algebraic(),
        to: rec.to.to_algebraic(),
        san: rec.notation.clone(),
    });

    let pending_promotion = game.pending_promotion().map(|mv| LastMove {
        from: mv.from.to_algebraic(),
        to: mv.to.to_algebraic(),
        san: mv.to_string(),
    });

    GameResponse {
        id: game.id.clone(),
        board: game.board().rows().iter().map(|row| row.to_vec()).collect(),
        fen: game.to_fen(),
        status: status.as_str().to_string(),
        current_player: game.side_to_move().to_string(),
        check: position.is_in_check(),
        move_history: game.history().to_vec(),
        captured_pieces: game.captured().clone(),
        score: game.score(),
        has_moved: position.has_moved,
        en_passant_target: position.en_passant.map(|sq| sq.to_algebraic()),
        pending_promotion,
        game_over: game.game_over(),
        last_move,
        players: Players {
            white: game.white_player.clone(),
            black: game.black_player.clone(),
        },
        computer: game.computer,
        clock: game.clock().copied(),
        hints_remaining: game.hints_remaining(),
        created_at: game.created_at.to_rfc3339(),
    }
}

/// Describe a candidate move in SAN against the current position.
pub fn move_summary(game: &Game, mv: Move) -> LastMove {
    LastMove {
        from: mv.from.to_algebraic(),
        to: mv.to.to_algebraic(),
        san: san::notation(game.position(), mv),
    }
}

/// Build a legal move entry with SAN.
pub fn legal_move_entry(game: &Game, mv: Move, legal: &[Move]) -> LegalMoveEntry {
    LegalMoveEntry {
        from: mv.from.to_algebraic(),
        to: mv.to.to_algebraic(),
        san: move_to_san(game.position(), mv, legal),
        promotion: mv.promotion.map(|kind| kind.to_string()),
    }
}
