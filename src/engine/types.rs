use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// The two sides in a chess game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Index for array lookups: White=0, Black=1.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Row of this side's back rank (white = row 7 / rank 1).
    #[inline]
    pub const fn back_row(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// Row delta of a forward pawn step.
    #[inline]
    pub const fn pawn_direction(self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// Row on which this side's pawns start (and may double-step from).
    #[inline]
    pub const fn pawn_start_row(self) -> u8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    /// Row on which this side's pawns promote.
    #[inline]
    pub const fn promotion_row(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }
}

impl std::ops::Not for Color {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

// ---------------------------------------------------------------------------
// PieceType
// ---------------------------------------------------------------------------

/// The six piece kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    /// All piece types in order.
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    /// Piece types a pawn may promote to, strongest first.
    pub const PROMOTIONS: [PieceType; 4] = [
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
    ];

    /// Material value in pawns.
    pub const fn value(self) -> u32 {
        match self {
            PieceType::Pawn => 1,
            PieceType::Knight => 3,
            PieceType::Bishop => 3,
            PieceType::Rook => 5,
            PieceType::Queen => 9,
            PieceType::King => 0,
        }
    }

    /// Lowercase letter as used in FEN and UCI promotion suffixes.
    pub const fn letter(self) -> char {
        match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        }
    }

    /// Parse a promotion choice (`q`, `r`, `b`, `n`, case-insensitive).
    pub fn from_promotion_letter(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'q' => Some(PieceType::Queen),
            'r' => Some(PieceType::Rook),
            'b' => Some(PieceType::Bishop),
            'n' => Some(PieceType::Knight),
            _ => None,
        }
    }

    /// Parse a promotion choice given as a word or letter ("queen", "Q", ...).
    pub fn from_promotion_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "queen" => Some(PieceType::Queen),
            "rook" => Some(PieceType::Rook),
            "bishop" => Some(PieceType::Bishop),
            "knight" => Some(PieceType::Knight),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::from_promotion_letter(c),
                    _ => None,
                }
            }
        }
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceType::Pawn => write!(f, "pawn"),
            PieceType::Knight => write!(f, "knight"),
            PieceType::Bishop => write!(f, "bishop"),
            PieceType::Rook => write!(f, "rook"),
            PieceType::Queen => write!(f, "queen"),
            PieceType::King => write!(f, "king"),
        }
    }
}

// ---------------------------------------------------------------------------
// Piece
// ---------------------------------------------------------------------------

/// A piece identity: kind plus color. Pieces have no id beyond their cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    #[serde(rename = "type")]
    pub kind: PieceType,
    pub color: Color,
}

impl Piece {
    pub const fn new(kind: PieceType, color: Color) -> Self {
        Piece { kind, color }
    }

    /// Uppercase FEN letter for white, lowercase for black.
    pub fn fen_char(self) -> char {
        match self.color {
            Color::White => self.kind.letter().to_ascii_uppercase(),
            Color::Black => self.kind.letter(),
        }
    }

    /// Unicode chess glyph used by the UI.
    pub fn glyph(self) -> char {
        match (self.color, self.kind) {
            (Color::White, PieceType::King) => '♔',
            (Color::White, PieceType::Queen) => '♕',
            (Color::White, PieceType::Rook) => '♖',
            (Color::White, PieceType::Bishop) => '♗',
            (Color::White, PieceType::Knight) => '♘',
            (Color::White, PieceType::Pawn) => '♙',
            (Color::Black, PieceType::King) => '♚',
            (Color::Black, PieceType::Queen) => '♛',
            (Color::Black, PieceType::Rook) => '♜',
            (Color::Black, PieceType::Bishop) => '♝',
            (Color::Black, PieceType::Knight) => '♞',
            (Color::Black, PieceType::Pawn) => '♟',
        }
    }

    #[inline]
    pub fn value(self) -> u32 {
        self.kind.value()
    }

    #[inline]
    pub fn is(self, kind: PieceType, color: Color) -> bool {
        self.kind == kind && self.color == color
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color, self.kind)
    }
}

/// Decode a piece symbol (Unicode glyph or FEN letter) into a piece.
/// Anything else (including the empty-cell markers `' '` and `'.'`) is `None`.
pub fn piece_info(symbol: char) -> Option<Piece> {
    use Color::{Black, White};
    use PieceType::*;

    let (kind, color) = match symbol {
        '♔' | 'K' => (King, White),
        '♕' | 'Q' => (Queen, White),
        '♖' | 'R' => (Rook, White),
        '♗' | 'B' => (Bishop, White),
        '♘' | 'N' => (Knight, White),
        '♙' | 'P' => (Pawn, White),
        '♚' | 'k' => (King, Black),
        '♛' | 'q' => (Queen, Black),
        '♜' | 'r' => (Rook, Black),
        '♝' | 'b' => (Bishop, Black),
        '♞' | 'n' => (Knight, Black),
        '♟' | 'p' => (Pawn, Black),
        _ => return None,
    };
    Some(Piece::new(kind, color))
}

/// Material value of a piece.
#[inline]
pub fn piece_value(piece: Piece) -> u32 {
    piece.value()
}

// ---------------------------------------------------------------------------
// Pos
// ---------------------------------------------------------------------------

/// A board coordinate. Row 0 is rank 8, col 0 is file a.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub row: u8,
    pub col: u8,
}

impl Pos {
    #[inline]
    pub fn new(row: u8, col: u8) -> Self {
        debug_assert!(row < 8 && col < 8, "position out of range: ({row}, {col})");
        Pos { row, col }
    }

    /// Iterate all 64 squares, rank 8 first.
    pub fn all() -> impl Iterator<Item = Pos> {
        (0..8u8).flat_map(|row| (0..8u8).map(move |col| Pos { row, col }))
    }

    /// Shift by a row/col delta; `None` when leaving the board.
    #[inline]
    pub fn offset(self, dr: i8, dc: i8) -> Option<Pos> {
        let row = self.row as i8 + dr;
        let col = self.col as i8 + dc;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Pos::new(row as u8, col as u8))
        } else {
            None
        }
    }

    /// Parse algebraic notation like "e4".
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file < 8 && rank < 8 {
            Some(Pos::new(7 - rank, file))
        } else {
            None
        }
    }

    /// Convert to algebraic notation like "e4".
    pub fn to_algebraic(self) -> String {
        format!("{}{}", self.file_char(), self.rank_char())
    }

    #[inline]
    pub fn file_char(self) -> char {
        (b'a' + self.col) as char
    }

    #[inline]
    pub fn rank_char(self) -> char {
        (b'8' - self.row) as char
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// A candidate move: from, to and an optional promotion choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Pos,
    pub to: Pos,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceType>,
}

impl Move {
    pub fn new(from: Pos, to: Pos) -> Self {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(from: Pos, to: Pos, promotion: PieceType) -> Self {
        Move {
            from,
            to,
            promotion: Some(promotion),
        }
    }
}

impl fmt::Display for Move {
    /// Long algebraic (UCI) form: `e2e4`, `e7e8q`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promo) = self.promotion {
            write!(f, "{}", promo.letter())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Castling bookkeeping
// ---------------------------------------------------------------------------

/// Per-color "has moved" flags. Monotonic: set once, cleared only on reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastlingFlags {
    pub king: bool,
    /// Queenside rook (file a).
    pub rook_left: bool,
    /// Kingside rook (file h).
    pub rook_right: bool,
}

/// Castling bookkeeping for both colors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HasMoved {
    pub white: CastlingFlags,
    pub black: CastlingFlags,
}

impl HasMoved {
    #[inline]
    pub fn get(&self, color: Color) -> &CastlingFlags {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, color: Color) -> &mut CastlingFlags {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// Record that `piece` left `from`. Only kings and back-rank corner rooks
    /// affect the flags.
    pub fn record_departure(&mut self, piece: Piece, from: Pos) {
        let flags = self.get_mut(piece.color);
        match piece.kind {
            PieceType::King => flags.king = true,
            PieceType::Rook if from.row == piece.color.back_row() => match from.col {
                0 => flags.rook_left = true,
                7 => flags.rook_right = true,
                _ => {}
            },
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Game over
// ---------------------------------------------------------------------------

/// Outcome of a finished game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    White,
    Black,
    Draw,
}

impl From<Color> for Winner {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Winner::White,
            Color::Black => Winner::Black,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameOverReason {
    Checkmate,
    Stalemate,
    Timeout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOver {
    pub winner: Winner,
    pub reason: GameOverReason,
}

// ---------------------------------------------------------------------------
// GameStatus & Difficulty
// ---------------------------------------------------------------------------

/// Current status of a game as reported to the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Active,
    Check,
    AwaitingPromotion,
    Checkmate,
    Stalemate,
    Timeout,
}

impl GameStatus {
    pub fn as_str(&self) -> &str {
        match self {
            GameStatus::Active => "active",
            GameStatus::Check => "check",
            GameStatus::AwaitingPromotion => "awaiting_promotion",
            GameStatus::Checkmate => "checkmate",
            GameStatus::Stalemate => "stalemate",
            GameStatus::Timeout => "timeout",
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(
            self,
            GameStatus::Checkmate | GameStatus::Stalemate | GameStatus::Timeout
        )
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Computer opponent strength levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Harmless,
    Easy,
    Medium,
    Hard,
    Expert,
    Godlike,
}

impl Difficulty {
    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "harmless" => Some(Difficulty::Harmless),
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            "expert" => Some(Difficulty::Expert),
            "godlike" => Some(Difficulty::Godlike),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Harmless => write!(f, "harmless"),
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
            Difficulty::Expert => write!(f, "expert"),
            Difficulty::Godlike => write!(f, "godlike"),
        }
    }
}

// ---------------------------------------------------------------------------
// ChessError
// ---------------------------------------------------------------------------

/// Domain errors for the chess engine.
#[derive(Debug, thiserror::Error)]
pub enum ChessError {
    #[error("invalid move: {from} -> {to}: {reason}")]
    InvalidMove {
        from: String,
        to: String,
        reason: String,
    },

    #[error("invalid FEN string: {0}")]
    InvalidFen(String),

    #[error("invalid square notation: {0}")]
    InvalidSquare(String),

    #[error("game is already over: {0}")]
    GameOver(String),

    #[error("invalid promotion piece: {0}")]
    InvalidPromotion(String),

    #[error("no promotion is pending")]
    NoPendingPromotion,

    #[error("no moves to undo")]
    NothingToUndo,

    #[error("no hints left")]
    HintsExhausted,

    #[error("corrupt game state: {0}")]
    CorruptState(String),
}

impl ChessError {
    pub(crate) fn invalid_move(from: Pos, to: Pos, reason: impl Into<String>) -> Self {
        ChessError::InvalidMove {
            from: from.to_algebraic(),
            to: to.to_algebraic(),
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_toggle() {
        assert_eq!(!Color::White, Color::Black);
        assert_eq!(!Color::Black, Color::White);
    }

    #[test]
    fn color_geometry() {
        assert_eq!(Color::White.back_row(), 7);
        assert_eq!(Color::Black.back_row(), 0);
        assert_eq!(Color::White.pawn_direction(), -1);
        assert_eq!(Color::Black.pawn_start_row(), 1);
        assert_eq!(Color::White.promotion_row(), 0);
    }

    #[test]
    fn piece_values() {
        assert_eq!(PieceType::Pawn.value(), 1);
        assert_eq!(PieceType::Knight.value(), 3);
        assert_eq!(PieceType::Bishop.value(), 3);
        assert_eq!(PieceType::Rook.value(), 5);
        assert_eq!(PieceType::Queen.value(), 9);
        assert_eq!(PieceType::King.value(), 0);
    }

    #[test]
    fn piece_info_decodes_glyphs_and_letters() {
        let wq = Piece::new(PieceType::Queen, Color::White);
        assert_eq!(piece_info('♕'), Some(wq));
        assert_eq!(piece_info('Q'), Some(wq));
        assert_eq!(piece_info('♟'), Some(Piece::new(PieceType::Pawn, Color::Black)));
        assert_eq!(piece_info('n'), Some(Piece::new(PieceType::Knight, Color::Black)));
        assert_eq!(piece_info(' '), None);
        assert_eq!(piece_info('x'), None);
    }

    #[test]
    fn glyph_and_letter_agree() {
        for color in [Color::White, Color::Black] {
            for kind in PieceType::ALL {
                let piece = Piece::new(kind, color);
                assert_eq!(piece_info(piece.glyph()), Some(piece));
                assert_eq!(piece_info(piece.fen_char()), Some(piece));
            }
        }
    }

    #[test]
    fn pos_algebraic() {
        assert_eq!(Pos::from_algebraic("a8"), Some(Pos::new(0, 0)));
        assert_eq!(Pos::from_algebraic("h1"), Some(Pos::new(7, 7)));
        assert_eq!(Pos::from_algebraic("e2"), Some(Pos::new(6, 4)));
        assert_eq!(Pos::new(4, 4).to_algebraic(), "e4");
        assert_eq!(Pos::from_algebraic("i1"), None);
        assert_eq!(Pos::from_algebraic("a9"), None);
        assert_eq!(Pos::from_algebraic("a"), None);
    }

    #[test]
    fn pos_offset_stays_on_board() {
        let a1 = Pos::new(7, 0);
        assert_eq!(a1.offset(-1, 1), Some(Pos::new(6, 1)));
        assert_eq!(a1.offset(1, 0), None);
        assert_eq!(a1.offset(0, -1), None);
        assert_eq!(Pos::all().count(), 64);
    }

    #[test]
    fn move_display_is_uci() {
        let m = Move::new(Pos::new(6, 4), Pos::new(4, 4));
        assert_eq!(m.to_string(), "e2e4");
        let p = Move::with_promotion(Pos::new(1, 0), Pos::new(0, 0), PieceType::Queen);
        assert_eq!(p.to_string(), "a7a8q");
    }

    #[test]
    fn promotion_parsing() {
        assert_eq!(PieceType::from_promotion_str("queen"), Some(PieceType::Queen));
        assert_eq!(PieceType::from_promotion_str("N"), Some(PieceType::Knight));
        assert_eq!(PieceType::from_promotion_str("king"), None);
        assert_eq!(PieceType::from_promotion_str("qq"), None);
    }

    #[test]
    fn has_moved_records_king_and_corner_rooks() {
        let mut hm = HasMoved::default();
        hm.record_departure(Piece::new(PieceType::Rook, Color::White), Pos::new(7, 7));
        assert!(hm.white.rook_right);
        assert!(!hm.white.rook_left);

        // A rook leaving a non-corner square changes nothing.
        hm.record_departure(Piece::new(PieceType::Rook, Color::Black), Pos::new(3, 0));
        assert_eq!(hm.black, CastlingFlags::default());

        hm.record_departure(Piece::new(PieceType::King, Color::Black), Pos::new(0, 4));
        assert!(hm.black.king);
    }

    #[test]
    fn game_status_strings() {
        assert_eq!(GameStatus::Active.as_str(), "active");
        assert_eq!(GameStatus::AwaitingPromotion.as_str(), "awaiting_promotion");
        assert!(GameStatus::Timeout.is_game_over());
        assert!(!GameStatus::Check.is_game_over());
    }

    #[test]
    fn difficulty_from_str() {
        assert_eq!(
            Difficulty::from_str_loose("MEDIUM"),
            Some(Difficulty::Medium)
        );
        assert_eq!(Difficulty::from_str_loose("nope"), None);
    }

    #[test]
    fn serde_shapes() {
        let piece = Piece::new(PieceType::Knight, Color::Black);
        let json = serde_json::to_value(piece).unwrap();
        assert_eq!(json["type"], "knight");
        assert_eq!(json["color"], "black");

        let flags = CastlingFlags {
            king: false,
            rook_left: true,
            rook_right: false,
        };
        let json = serde_json::to_value(flags).unwrap();
        assert_eq!(json["rookLeft"], true);
    }
}
