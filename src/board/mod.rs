//! Rules-engine seam: the session never decides legality itself, it asks a
//! `RulesEngine` and records what comes back.

pub mod movetext;
pub mod shakmaty_rules;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use self::movetext::ParsedMovetext;
pub use self::shakmaty_rules::ShakmatyRules;

/// Standard starting position, full six-field encoding.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PromotionPiece {
    #[serde(rename = "q")]
    Queen,
    #[serde(rename = "r")]
    Rook,
    #[serde(rename = "b")]
    Bishop,
    #[serde(rename = "n")]
    Knight,
}

impl PromotionPiece {
    pub const ALL: [PromotionPiece; 4] = [Self::Queen, Self::Rook, Self::Bishop, Self::Knight];

    pub fn code(self) -> char {
        match self {
            Self::Queen => 'q',
            Self::Rook => 'r',
            Self::Bishop => 'b',
            Self::Knight => 'n',
        }
    }

    pub fn from_code(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'q' => Some(Self::Queen),
            'r' => Some(Self::Rook),
            'b' => Some(Self::Bishop),
            'n' => Some(Self::Knight),
            _ => None,
        }
    }
}

impl fmt::Display for PromotionPiece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for PromotionPiece {
    type Err = RulesError;

    /// Accepts a piece letter (`q`) or name (`queen`), any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let piece = match lower.as_str() {
            "queen" => Some(Self::Queen),
            "rook" => Some(Self::Rook),
            "bishop" => Some(Self::Bishop),
            "knight" => Some(Self::Knight),
            _ if lower.len() == 1 => lower.chars().next().and_then(Self::from_code),
            _ => None,
        };
        piece.ok_or_else(|| RulesError::InvalidPromotion(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Piece kind for a placement-field letter, either case.
    pub fn from_fen_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(Self::Pawn),
            'n' => Some(Self::Knight),
            'b' => Some(Self::Bishop),
            'r' => Some(Self::Rook),
            'q' => Some(Self::Queen),
            'k' => Some(Self::King),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

/// A move as requested by a user: coordinates plus an optional promotion choice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveAttempt {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PromotionPiece>,
}

impl MoveAttempt {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { from: from.into(), to: to.into(), promotion: None }
    }

    pub fn with_promotion(mut self, piece: PromotionPiece) -> Self {
        self.promotion = Some(piece);
        self
    }

    /// Splits `e7e8q` style text; does not check the squares.
    pub fn parse_uci(text: &str) -> Option<Self> {
        let t = text.trim();
        if !t.is_ascii() || !(t.len() == 4 || t.len() == 5) { return None; }
        let promotion = match t.chars().nth(4) {
            Some(c) => Some(PromotionPiece::from_code(c)?),
            None => None,
        };
        Some(Self { from: t[0..2].to_string(), to: t[2..4].to_string(), promotion })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveFlags {
    pub capture: bool,
    pub en_passant: bool,
    pub castle: bool,
    pub promotion: bool,
    pub double_push: bool,
}

/// A legal move with everything a UI needs to describe it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerboseMove {
    pub from: String,
    pub to: String,
    pub san: String,
    pub promotion: Option<PromotionPiece>,
    pub captured: Option<PieceKind>,
    pub flags: MoveFlags,
}

/// Result of playing one move on a position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedMove {
    pub san: String,
    pub from: String,
    pub to: String,
    pub promotion: Option<PromotionPiece>,
    pub captured: Option<PieceKind>,
    /// Position after the move.
    pub fen: String,
}

impl AppliedMove {
    pub fn uci(&self) -> String {
        uci_string(&self.from, &self.to, self.promotion)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RulesError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),
    #[error("invalid square: {0}")]
    InvalidSquare(String),
    #[error("invalid promotion piece: {0}")]
    InvalidPromotion(String),
    #[error("invalid SAN: {0}")]
    InvalidSan(String),
}

pub trait RulesEngine {
    /// Full encoding of `fen`, or of the starting position when `None`.
    fn canonical_position(&self, fen: Option<&str>) -> Result<String, RulesError>;

    /// Legal moves at `fen`, optionally only those leaving `from`.
    fn legal_moves(&self, fen: &str, from: Option<&str>) -> Result<Vec<VerboseMove>, RulesError>;

    /// Plays `attempt`; `Ok(None)` when it is not legal.
    fn apply_move(&self, fen: &str, attempt: &MoveAttempt) -> Result<Option<AppliedMove>, RulesError>;

    /// Resolves and plays a SAN token; `Ok(None)` when it is not legal here.
    fn apply_san(&self, fen: &str, san: &str) -> Result<Option<AppliedMove>, RulesError>;

    fn parse_movetext(&self, document: &str) -> Result<ParsedMovetext, String> {
        movetext::parse(document)
    }

    /// `None` if `from`-`to` is not a legal move at all, `Some(vec![])` if it is
    /// legal and not a promotion, else the legal promotion pieces (q, r, b, n order).
    fn promotion_options(&self, fen: &str, from: &str, to: &str) -> Result<Option<Vec<PromotionPiece>>, RulesError> {
        let moves = self.legal_moves(fen, Some(from))?;
        let mut found = false;
        let mut options = Vec::new();
        for m in moves.iter().filter(|m| m.to == to) {
            found = true;
            if let Some(p) = m.promotion { options.push(p); }
        }
        if !found { return Ok(None); }
        options.sort();
        options.dedup();
        Ok(Some(options))
    }
}

/// `true` for lowercase `a1`..`h8`.
pub fn is_square_label(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 2 && (b'a'..=b'h').contains(&b[0]) && (b'1'..=b'8').contains(&b[1])
}

pub fn uci_string(from: &str, to: &str, promotion: Option<PromotionPiece>) -> String {
    match promotion {
        Some(p) => format!("{from}{to}{}", p.code()),
        None => format!("{from}{to}"),
    }
}
