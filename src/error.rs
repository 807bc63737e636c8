use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Message raised by the SQLite overlap guard triggers.
pub const OVERLAP_GUARD_MESSAGE: &str = "live_session_overlap";

// 2067 = SQLite unique constraint, 1811 = SQLite trigger abort
// 5 = SQLITE_BUSY, 517 = SQLITE_BUSY_SNAPSHOT (another writer holds the lock)
// 23505 = PostgreSQL unique violation, 23P01 = exclusion violation
// 40001 = serialization failure, 40P01 = deadlock detected
const CONFLICT_CODES: [&str; 8] = ["2067", "1811", "5", "517", "23505", "23P01", "40001", "40P01"];

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Not allowed in current state: {0}")]
    State(String),
    #[error("Meeting provisioning failed: {0}")]
    Provisioning(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

/// Stable, caller-visible classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    State,
    Provisioning,
    Persistence,
    Unauthorized,
    Forbidden,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::State => "state",
            ErrorKind::Provisioning => "provisioning",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Database(e) if is_store_conflict(e) => ErrorKind::Conflict,
            AppError::Database(_) | AppError::Internal | AppError::InternalWithMsg(_) => ErrorKind::Persistence,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Unauthorized => ErrorKind::Unauthorized,
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::State(_) => ErrorKind::State,
            AppError::Provisioning(_) => ErrorKind::Provisioning,
        }
    }
}

fn is_store_conflict(e: &sqlx::Error) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };
    let code = db_err.code().unwrap_or_default();
    CONFLICT_CODES.contains(&&*code) || db_err.message().contains(OVERLAP_GUARD_MESSAGE)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, message) = match &self {
            AppError::Database(e) => {
                if kind == ErrorKind::Conflict {
                    (StatusCode::CONFLICT, "Conflicting write rejected by the store (duplicate or overlapping session)".to_string())
                } else {
                    error!("Database error: {:?}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
                }
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::State(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Provisioning(msg) => {
                error!("Provisioning error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Meeting could not be provisioned".to_string())
            }
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message,
            "kind": kind.as_str(),
        }));

        (status, body).into_response()
    }
}
