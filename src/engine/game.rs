//! Stateful game controller.
//!
//! `Game` owns one session: the current position with its capture
//! bookkeeping, the move history, game-over state, a pending promotion, the
//! hint allowance and optional clocks. Every move, human or computer, goes
//! through [`Progress::advance`], and undo rebuilds state by replaying the
//! truncated history from the start position.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::board::{Board, Position};
use crate::engine::clock::Clock;
use crate::engine::executor;
use crate::engine::fen::{self, Setup};
use crate::engine::history::{Captures, MoveRecord, Progress, Score};
use crate::engine::movegen;
use crate::engine::san;
use crate::engine::types::{
    ChessError, Color, Difficulty, GameOver, GameOverReason, GameStatus, HasMoved, Move,
    PieceType, Pos, Winner,
};

/// Hints granted per game unless configured otherwise.
pub const DEFAULT_MAX_HINTS: u32 = 3;

// =========================================================================
// Outcomes
// =========================================================================

/// Result of a successful [`Game::try_move`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveApplied {
    /// The move is complete and recorded.
    Played(MoveRecord),
    /// A pawn reached the last rank without a choice; the turn waits for
    /// [`Game::complete_promotion`].
    AwaitingPromotion,
}

/// The side played by the computer, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputerSide {
    pub color: Color,
    pub difficulty: Difficulty,
}

/// A pawn move waiting for its promotion piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Pending {
    mv: Move,
    /// Board with the pawn already standing on the last rank.
    board: Board,
}

// =========================================================================
// Game
// =========================================================================

#[derive(Clone, Debug)]
pub struct Game {
    // Metadata
    pub id: String,
    pub white_player: String,
    pub black_player: String,
    pub created_at: DateTime<Utc>,
    pub computer: Option<ComputerSide>,

    // Core state
    start: Setup,
    progress: Progress,
    history: Vec<MoveRecord>,
    game_over: Option<GameOver>,
    pending: Option<Pending>,

    // Extras
    hints_used: u32,
    max_hints: u32,
    clock: Option<Clock>,
}

impl Game {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// A new game from the standard starting position.
    pub fn new() -> Self {
        Self::from_setup(Setup::standard())
    }

    /// A new game from a FEN position.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let setup = fen::decode_position(fen)?;
        Ok(Self::from_setup(setup))
    }

    fn from_setup(start: Setup) -> Self {
        let mut game = Game {
            id: Uuid::new_v4().to_string(),
            white_player: "Player".into(),
            black_player: "Player".into(),
            created_at: Utc::now(),
            computer: None,
            start,
            progress: Progress::new(start.position),
            history: Vec::new(),
            game_over: None,
            pending: None,
            hints_used: 0,
            max_hints: DEFAULT_MAX_HINTS,
            clock: None,
        };
        game.game_over = game.detect_game_over();
        game
    }

    pub fn with_players(mut self, white: impl Into<String>, black: impl Into<String>) -> Self {
        self.white_player = white.into();
        self.black_player = black.into();
        self
    }

    pub fn with_computer(mut self, color: Color, difficulty: Difficulty) -> Self {
        self.computer = Some(ComputerSide { color, difficulty });
        self
    }

    /// Give both sides `seconds` on the clock. Zero means untimed.
    pub fn with_clock(mut self, seconds: u32) -> Self {
        self.clock = (seconds > 0).then(|| Clock::new(seconds));
        self
    }

    pub fn with_max_hints(mut self, max_hints: u32) -> Self {
        self.max_hints = max_hints;
        self
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    /// Board as shown to players. While a promotion is pending the pawn
    /// already stands on the last rank.
    pub fn board(&self) -> &Board {
        match &self.pending {
            Some(pending) => &pending.board,
            None => &self.progress.position.board,
        }
    }

    /// Position the next move is validated against.
    pub fn position(&self) -> &Position {
        &self.progress.position
    }

    /// Side to move. During a pending promotion this is still the mover.
    pub fn side_to_move(&self) -> Color {
        self.progress.position.side_to_move
    }

    pub fn has_moved(&self) -> &HasMoved {
        &self.progress.position.has_moved
    }

    pub fn en_passant(&self) -> Option<Pos> {
        self.progress.position.en_passant
    }

    pub fn captured(&self) -> &Captures {
        &self.progress.captured
    }

    pub fn score(&self) -> Score {
        self.progress.score
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn game_over(&self) -> Option<GameOver> {
        self.game_over
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over.is_some()
    }

    pub fn pending_promotion(&self) -> Option<Move> {
        self.pending.map(|p| p.mv)
    }

    pub fn clock(&self) -> Option<&Clock> {
        self.clock.as_ref()
    }

    pub fn start(&self) -> &Setup {
        &self.start
    }

    /// Whether the game began from a position other than the standard one.
    pub fn started_from_fen(&self) -> bool {
        self.start != Setup::standard()
    }

    pub fn hints_remaining(&self) -> u32 {
        self.max_hints.saturating_sub(self.hints_used)
    }

    pub fn status(&self) -> GameStatus {
        match self.game_over.map(|g| g.reason) {
            Some(GameOverReason::Checkmate) => GameStatus::Checkmate,
            Some(GameOverReason::Stalemate) => GameStatus::Stalemate,
            Some(GameOverReason::Timeout) => GameStatus::Timeout,
            None if self.pending.is_some() => GameStatus::AwaitingPromotion,
            None if self.progress.position.is_in_check() => GameStatus::Check,
            None => GameStatus::Active,
        }
    }

    /// Legal moves for the side to move; empty once the game is over or
    /// while a promotion is pending.
    pub fn legal_moves(&self) -> Vec<Move> {
        if !self.accepts_moves() {
            return Vec::new();
        }
        movegen::legal_moves(&self.progress.position)
    }

    /// Legal destinations for the piece on `from`, for move highlighting.
    pub fn legal_destinations(&self, from: Pos) -> Vec<Pos> {
        if !self.accepts_moves() {
            return Vec::new();
        }
        movegen::legal_destinations(&self.progress.position, from)
    }

    /// Current position as FEN.
    pub fn to_fen(&self) -> String {
        fen::encode(&self.progress.position, &self.history, &self.start)
    }

    pub fn halfmove_clock(&self) -> u32 {
        fen::halfmove_clock(&self.start, &self.history)
    }

    pub fn fullmove_number(&self) -> u32 {
        fen::fullmove_number(&self.start, self.history.len())
    }

    fn accepts_moves(&self) -> bool {
        self.game_over.is_none() && self.pending.is_none()
    }

    // -----------------------------------------------------------------
    // Making moves
    // -----------------------------------------------------------------

    /// Apply a move. `false` means it was rejected and nothing changed;
    /// `true` means it was applied, possibly leaving a promotion pending.
    pub fn make_move(&mut self, from: Pos, to: Pos, promotion: Option<PieceType>) -> bool {
        match self.try_move(from, to, promotion) {
            Ok(_) => true,
            Err(err) => {
                debug!(game = %self.id, %from, %to, %err, "move rejected");
                false
            }
        }
    }

    /// Apply a move, reporting why it was rejected.
    pub fn try_move(
        &mut self,
        from: Pos,
        to: Pos,
        promotion: Option<PieceType>,
    ) -> Result<MoveApplied, ChessError> {
        if let Some(over) = self.game_over {
            return Err(ChessError::GameOver(format!("{:?}", over.reason).to_lowercase()));
        }
        if self.pending.is_some() {
            return Err(ChessError::invalid_move(from, to, "a promotion is pending"));
        }

        let mv = Move { from, to, promotion };
        let position = &self.progress.position;
        if !movegen::is_legal(position, mv) {
            return Err(ChessError::invalid_move(from, to, "illegal move"));
        }

        let needs_choice = position
            .board
            .get(from)
            .is_some_and(|piece| executor::needs_promotion(piece, to));
        if needs_choice && promotion.is_none() {
            let shown = executor::execute_move(
                from,
                to,
                &position.board,
                position.en_passant,
                false,
                None,
            );
            self.pending = Some(Pending {
                mv,
                board: shown.board,
            });
            debug!(game = %self.id, %mv, "awaiting promotion choice");
            return Ok(MoveApplied::AwaitingPromotion);
        }

        self.commit(mv).map(MoveApplied::Played)
    }

    /// Finish a pending promotion with the chosen piece.
    pub fn complete_promotion(&mut self, kind: PieceType) -> Result<MoveRecord, ChessError> {
        let pending = self.pending.ok_or(ChessError::NoPendingPromotion)?;
        if !PieceType::PROMOTIONS.contains(&kind) {
            return Err(ChessError::InvalidPromotion(kind.to_string()));
        }
        self.pending = None;
        let mv = Move::with_promotion(pending.mv.from, pending.mv.to, kind);
        self.commit(mv).inspect_err(|_| self.pending = Some(pending))
    }

    fn commit(&mut self, mv: Move) -> Result<MoveRecord, ChessError> {
        let notation = san::notation(&self.progress.position, mv);
        let played = self.progress.advance(mv)?;

        let record = MoveRecord::new(mv, played.piece, played.captured, notation);
        self.history.push(record.clone());
        self.game_over = self.detect_game_over();

        info!(
            game = %self.id,
            ply = self.history.len(),
            san = %record.notation,
            "move played"
        );
        if let Some(over) = self.game_over {
            info!(game = %self.id, winner = ?over.winner, reason = ?over.reason, "game over");
        }
        Ok(record)
    }

    /// Checkmate or stalemate for the side to move.
    fn detect_game_over(&self) -> Option<GameOver> {
        let pos = &self.progress.position;
        let side = pos.side_to_move;
        if movegen::is_checkmate(side, &pos.board, pos.en_passant) {
            Some(GameOver {
                winner: Winner::from(!side),
                reason: GameOverReason::Checkmate,
            })
        } else if movegen::is_stalemate(side, &pos.board, pos.en_passant) {
            Some(GameOver {
                winner: Winner::Draw,
                reason: GameOverReason::Stalemate,
            })
        } else {
            None
        }
    }

    // -----------------------------------------------------------------
    // Undo / reset
    // -----------------------------------------------------------------

    /// Take back the last ply. A pending promotion counts as that ply.
    pub fn undo(&mut self) -> Result<(), ChessError> {
        self.undo_plies(1).map(|_| ())
    }

    /// Take back up to `plies` plies; returns how many were undone.
    ///
    /// State is rebuilt by replaying the remaining history from the start
    /// position; the kept records are left exactly as they were.
    pub fn undo_plies(&mut self, plies: usize) -> Result<usize, ChessError> {
        if let Some(GameOver {
            reason: GameOverReason::Timeout,
            ..
        }) = self.game_over
        {
            return Err(ChessError::GameOver("timeout".into()));
        }

        let mut remaining = plies;
        let mut undone = 0;
        if remaining > 0 && self.pending.take().is_some() {
            remaining -= 1;
            undone += 1;
        }

        let take = remaining.min(self.history.len());
        if take > 0 {
            let keep = self.history.len() - take;
            let progress = Progress::replay(
                self.start.position,
                self.history[..keep].iter().map(MoveRecord::as_move),
            )?;
            self.history.truncate(keep);
            self.progress = progress;
            undone += take;
        }

        if undone == 0 {
            return Err(ChessError::NothingToUndo);
        }
        self.game_over = self.detect_game_over();
        info!(game = %self.id, undone, ply = self.history.len(), "undo");
        Ok(undone)
    }

    /// Back to the start position. Identity, players, computer side and
    /// configured limits are kept.
    pub fn reset(&mut self) {
        self.progress = Progress::new(self.start.position);
        self.history.clear();
        self.pending = None;
        self.hints_used = 0;
        if let Some(clock) = self.clock.as_mut() {
            clock.reset();
        }
        self.game_over = self.detect_game_over();
        info!(game = %self.id, "reset");
    }

    // -----------------------------------------------------------------
    // Clock and hints
    // -----------------------------------------------------------------

    /// Advance the side-to-move clock by one second. Returns the game-over
    /// state if this tick ran the clock out.
    pub fn tick(&mut self) -> Option<GameOver> {
        if self.game_over.is_some() {
            return None;
        }
        let side = self.side_to_move();
        let clock = self.clock.as_mut()?;
        if !clock.tick(side) {
            return None;
        }
        let over = GameOver {
            winner: Winner::from(!side),
            reason: GameOverReason::Timeout,
        };
        self.game_over = Some(over);
        info!(game = %self.id, loser = %side, "time ran out");
        Some(over)
    }

    /// Use up one hint. Returns how many remain afterwards.
    pub fn register_hint(&mut self) -> Result<u32, ChessError> {
        if self.hints_used >= self.max_hints {
            return Err(ChessError::HintsExhausted);
        }
        self.hints_used += 1;
        Ok(self.hints_remaining())
    }

    // -----------------------------------------------------------------
    // Snapshot / restore
    // -----------------------------------------------------------------

    /// Flat, serializable record of the whole session.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            id: self.id.clone(),
            white_player: self.white_player.clone(),
            black_player: self.black_player.clone(),
            created_at: self.created_at,
            computer: self.computer,
            start: self.start,
            position: self.progress.position,
            captured: self.progress.captured.clone(),
            score: self.progress.score,
            history: self.history.clone(),
            game_over: self.game_over,
            pending_promotion: self.pending.map(|p| p.mv),
            hints_used: self.hints_used,
            max_hints: self.max_hints,
            clock: self.clock,
        }
    }

    /// Rebuild a game from a snapshot.
    ///
    /// The history is replayed from the start position and must arrive at the
    /// recorded position, captures and score.
    pub fn restore(snapshot: GameSnapshot) -> Result<Self, ChessError> {
        fen::check_position(&snapshot.start.position)
            .map_err(|e| ChessError::CorruptState(format!("start position: {e}")))?;
        fen::check_position(&snapshot.position).map_err(ChessError::CorruptState)?;

        let progress = Progress::replay(
            snapshot.start.position,
            snapshot.history.iter().map(MoveRecord::as_move),
        )?;
        if progress.position != snapshot.position
            || progress.captured != snapshot.captured
            || progress.score != snapshot.score
        {
            return Err(ChessError::CorruptState(
                "history does not lead to the recorded position".into(),
            ));
        }

        let pending = match snapshot.pending_promotion {
            Some(mv) => {
                let pos = &progress.position;
                let valid = movegen::is_legal(pos, mv)
                    && mv.promotion.is_none()
                    && pos
                        .board
                        .get(mv.from)
                        .is_some_and(|piece| executor::needs_promotion(piece, mv.to));
                if !valid {
                    return Err(ChessError::CorruptState(format!(
                        "pending promotion {mv} is not playable"
                    )));
                }
                let shown =
                    executor::execute_move(mv.from, mv.to, &pos.board, pos.en_passant, false, None);
                Some(Pending {
                    mv,
                    board: shown.board,
                })
            }
            None => None,
        };

        let mut game = Game {
            id: snapshot.id,
            white_player: snapshot.white_player,
            black_player: snapshot.black_player,
            created_at: snapshot.created_at,
            computer: snapshot.computer,
            start: snapshot.start,
            progress,
            history: snapshot.history,
            game_over: None,
            pending,
            hints_used: snapshot.hints_used,
            max_hints: snapshot.max_hints,
            clock: snapshot.clock,
        };
        // Only a timeout cannot be read off the board.
        game.game_over = match snapshot.game_over {
            Some(over) if over.reason == GameOverReason::Timeout => Some(over),
            _ => game.detect_game_over(),
        };
        Ok(game)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable session record produced by [`Game::snapshot`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub id: String,
    pub white_player: String,
    pub black_player: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub computer: Option<ComputerSide>,
    pub start: Setup,
    pub position: Position,
    pub captured: Captures,
    pub score: Score,
    pub history: Vec<MoveRecord>,
    #[serde(default)]
    pub game_over: Option<GameOver>,
    #[serde(default)]
    pub pending_promotion: Option<Move>,
    pub hints_used: u32,
    pub max_hints: u32,
    #[serde(default)]
    pub clock: Option<Clock>,
}

// =========================================================================
// Tests
// =========================================================================
