use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure taxonomy of the voting core. Validation failures are detected
/// before any write; `DuplicateVote` is an expected outcome and must stay
/// distinguishable from a storage fault.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("voting session not found")]
    SessionNotFound,
    #[error("voting session is not active")]
    SessionNotActive,
    #[error("invalid reference: {0}")]
    InvalidReference(String),
    #[error("vote already submitted for this question")]
    DuplicateVote,
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("public id space exhausted")]
    AllocationExhausted,
    #[error("teams cannot be replaced once votes have been recorded")]
    TeamsLockedByVotes,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::SessionNotFound => StatusCode::NOT_FOUND,
            AppError::SessionNotActive
            | AppError::DuplicateVote
            | AppError::TeamsLockedByVotes => StatusCode::CONFLICT,
            AppError::InvalidReference(_) | AppError::InvalidPayload(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::AllocationExhausted | AppError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self {
            AppError::Store(err) => {
                tracing::error!("store failure: {err:#}");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
