use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::errors::VaultError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Every failure leaves the API as `{"status": "error", "message": ...}`.
#[derive(Serialize)]
struct ErrBody {
    status: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, msg) = match &self {
            AppError::BadRequest(s) => (StatusCode::BAD_REQUEST, s),
            AppError::Unauthorized(s) => (StatusCode::UNAUTHORIZED, s),
            AppError::Forbidden(s) => (StatusCode::FORBIDDEN, s),
            AppError::NotFound(s) => (StatusCode::NOT_FOUND, s),
            AppError::Conflict(s) => (StatusCode::CONFLICT, s),
            AppError::Unavailable(s) => (StatusCode::SERVICE_UNAVAILABLE, s),
            AppError::Internal(s) => (StatusCode::INTERNAL_SERVER_ERROR, s),
        };
        (
            code,
            Json(ErrBody {
                status: "error",
                message: msg.clone(),
            }),
        )
            .into_response()
    }
}

// Conversion from the library error taxonomy. Storage and I/O arms keep
// the medium-specific detail out of the wire body; it stays in the server
// logs only.
impl From<VaultError> for AppError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::Validation { fields } => AppError::BadRequest(format!(
                "invalid or missing fields: {}",
                fields.join(", ")
            )),
            VaultError::NotFound { resource, id } => {
                AppError::NotFound(format!("{resource} '{id}' not found"))
            }
            VaultError::Mismatch { sequence_id, uuid } => AppError::Conflict(format!(
                "sequence id {sequence_id} does not belong to uuid {uuid}"
            )),
            VaultError::WriteConflict { sequence_id } => {
                AppError::Conflict(format!("sequence id {sequence_id} is already taken"))
            }
            VaultError::StorageTimeout { operation } => {
                AppError::Unavailable(format!("storage timed out during {operation}"))
            }
            VaultError::Config { message } => {
                AppError::Internal(format!("configuration error: {message}"))
            }
            VaultError::Schema { message } => {
                AppError::Internal(format!("schema error: {message}"))
            }
            VaultError::StorageWrite { operation, .. } => {
                AppError::Internal(format!("storage write failed during {operation}"))
            }
            VaultError::Serialization { context, .. } => {
                AppError::Internal(format!("serialization failed: {context}"))
            }
            VaultError::Io { operation, .. } => {
                AppError::Internal(format!("I/O failed during {operation}"))
            }
            VaultError::MutexPoisoned { resource } => {
                AppError::Internal(format!("lock poisoned: {resource}"))
            }
            VaultError::Internal { message } => AppError::Internal(message),
        }
    }
}
