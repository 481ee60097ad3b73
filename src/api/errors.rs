use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::engine::ChessError;

/// Structured API error that serializes to JSON.
#[derive(Debug)]
pub enum ApiError {
    GameNotFound(String),
    InvalidMove(ChessError),
    InvalidFen(ChessError),
    InvalidRequest(String),
    GameOver(String),
    NothingToUndo,
    NoPendingPromotion,
    HintsExhausted,
    /// The game changed while the computer was thinking.
    Conflict(String),
    CorruptState(String),
    InternalError(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::GameNotFound(id) => (
                StatusCode::NOT_FOUND,
                "GAME_NOT_FOUND",
                format!("Game not found: {id}"),
            ),
            ApiError::InvalidMove(err) => {
                (StatusCode::BAD_REQUEST, "INVALID_MOVE", err.to_string())
            }
            ApiError::InvalidFen(err) => (StatusCode::BAD_REQUEST, "INVALID_FEN", err.to_string()),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            ApiError::GameOver(msg) => (StatusCode::CONFLICT, "GAME_OVER", msg),
            ApiError::NothingToUndo => (
                StatusCode::BAD_REQUEST,
                "NOTHING_TO_UNDO",
                "No moves to undo".to_string(),
            ),
            ApiError::NoPendingPromotion => (
                StatusCode::CONFLICT,
                "NO_PENDING_PROMOTION",
                "No promotion is pending".to_string(),
            ),
            ApiError::HintsExhausted => (
                StatusCode::TOO_MANY_REQUESTS,
                "HINTS_EXHAUSTED",
                "No hints left in this game".to_string(),
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::CorruptState(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "CORRUPT_STATE", msg)
            }
            ApiError::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChessError> for ApiError {
    fn from(err: ChessError) -> Self {
        match &err {
            ChessError::InvalidMove { .. } => ApiError::InvalidMove(err),
            ChessError::InvalidFen(_) => ApiError::InvalidFen(err),
            ChessError::InvalidSquare(_) | ChessError::InvalidPromotion(_) => {
                ApiError::InvalidRequest(err.to_string())
            }
            ChessError::GameOver(_) => ApiError::GameOver(err.to_string()),
            ChessError::NoPendingPromotion => ApiError::NoPendingPromotion,
            ChessError::NothingToUndo => ApiError::NothingToUndo,
            ChessError::HintsExhausted => ApiError::HintsExhausted,
            ChessError::CorruptState(_) => ApiError::CorruptState(err.to_string()),
        }
    }
}
