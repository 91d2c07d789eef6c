use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type AccessResult<T> = Result<T, AccessError>;

#[derive(thiserror::Error, Debug)]
pub enum AccessError {
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Optimistic-concurrency miss: the resource revision moved between the
    /// check and the save. Mutation paths retry this internally; if it
    /// escapes the retry budget it surfaces to the caller as a conflict.
    #[error("stale revision: {0}")]
    Stale(String),
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("internal server error: {0}")]
    Internal(String),
}

impl AccessError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn stale(message: impl Into<String>) -> Self {
        Self::Stale(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale(_))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let status = match self {
            AccessError::Forbidden(_) => StatusCode::FORBIDDEN,
            AccessError::NotFound(_) => StatusCode::NOT_FOUND,
            AccessError::Conflict(_) => StatusCode::CONFLICT,
            AccessError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AccessError::Stale(_) => StatusCode::CONFLICT,
            AccessError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AccessError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = self.to_string();
        let error = match &self {
            AccessError::Forbidden(_) => "forbidden",
            AccessError::NotFound(_) => "not_found",
            AccessError::Conflict(_) => "conflict",
            AccessError::BadRequest(_) => "bad_request",
            AccessError::Stale(_) => "conflict",
            AccessError::Database(_) => "database",
            AccessError::Internal(_) => "internal",
        };

        let payload = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(payload)).into_response()
    }
}

impl From<anyhow::Error> for AccessError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}
