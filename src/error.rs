use serde::Serialize;
use thiserror::Error;

use crate::board::PromotionPiece;
use crate::session::Mode;

/// Stable machine-readable error codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    IllegalMove,
    PromotionRequired,
    InvalidFen,
    InvalidPgn,
    ResetRequired,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IllegalMove => "ILLEGAL_MOVE",
            Self::PromotionRequired => "PROMOTION_REQUIRED",
            Self::InvalidFen => "INVALID_FEN",
            Self::InvalidPgn => "INVALID_PGN",
            Self::ResetRequired => "RESET_REQUIRED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

fn join_pieces(pieces: &[PromotionPiece]) -> String {
    pieces.iter().map(|p| p.code().to_string()).collect::<Vec<_>>().join(",")
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExplorerError {
    /// Malformed coordinates, an illegal move, or a promotion piece outside `allowed`.
    #[error("illegal move: {message}")]
    IllegalMove { message: String, allowed: Option<Vec<PromotionPiece>> },

    #[error("promotion required (options: {})", join_pieces(.options))]
    PromotionRequired { options: Vec<PromotionPiece> },

    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("invalid PGN: {message}")]
    InvalidPgn { message: String, preview: Option<String> },

    #[error("reset required: session is {mode:?}")]
    ResetRequired { mode: Mode },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ExplorerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::IllegalMove { .. } => ErrorCode::IllegalMove,
            Self::PromotionRequired { .. } => ErrorCode::PromotionRequired,
            Self::InvalidFen(_) => ErrorCode::InvalidFen,
            Self::InvalidPgn { .. } => ErrorCode::InvalidPgn,
            Self::ResetRequired { .. } => ErrorCode::ResetRequired,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }

    pub(crate) fn illegal(message: impl Into<String>) -> Self {
        Self::IllegalMove { message: message.into(), allowed: None }
    }

    pub(crate) fn invalid_pgn(message: impl Into<String>, preview: Option<String>) -> Self {
        Self::InvalidPgn { message: message.into(), preview }
    }
}

pub type Result<T> = std::result::Result<T, ExplorerError>;
