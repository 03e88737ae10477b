//! Error types for the flag service
//!
//! Provides unified error handling using thiserror.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

// == Flag Error Enum ==
/// Unified error type for the flag service.
///
/// The evaluation cache never produces one of these; they come from request
/// validation and persistence.
#[derive(Error, Debug)]
pub enum FlagError {
    /// Flag or override does not exist
    #[error("{0}")]
    NotFound(String),

    /// Unique constraint violated (duplicate flag name)
    #[error("{0}")]
    Conflict(String),

    /// Well-formed request that cannot be applied
    #[error("{0}")]
    Validation(String),

    /// Malformed request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// SQLite failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl FlagError {
    pub fn flag_not_found(flag_id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("Feature flag with id '{}' not found", flag_id))
    }

    pub fn flag_name_not_found(name: &str) -> Self {
        Self::NotFound(format!("Feature flag with name '{}' not found", name))
    }

    pub fn duplicate_name(name: &str) -> Self {
        Self::Conflict(format!("Feature flag with name '{}' already exists", name))
    }

    /// Returns true if `err` is a SQLite constraint violation.
    pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            FlagError::NotFound(_) => StatusCode::NOT_FOUND,
            FlagError::Conflict(_) => StatusCode::CONFLICT,
            FlagError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FlagError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            FlagError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == Extractor Rejections ==
// Malformed path, query or body input is reported through FlagError so the
// body is `{"detail": ...}` like every other error.
impl From<PathRejection> for FlagError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for FlagError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for FlagError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // Well-formed JSON of the wrong shape
            JsonRejection::JsonDataError(err) => Self::Validation(err.body_text()),
            other => Self::InvalidRequest(other.body_text()),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for FlagError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            FlagError::Database(err) => {
                error!("Unhandled database error: {}", err);
                "An internal database error occurred.".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the flag service.
pub type Result<T, E = FlagError> = std::result::Result<T, E>;
