use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tagdeck_core::error::CoreError;
use tagdeck_core::import::ImportError;
use tagdeck_db::StoreError;

use crate::services::DataSourceError;

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain, store and manager errors and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON error
/// responses of the form `{ error, code, details? }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Every violation found in a request body.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

type Classified = (StatusCode, &'static str, String, Option<Vec<String>>);

fn validation(violations: &[String]) -> Classified {
    (
        StatusCode::BAD_REQUEST,
        "VALIDATION_ERROR",
        violations.join("; "),
        Some(violations.to_vec()),
    )
}

fn internal(error: &dyn std::fmt::Display) -> Classified {
    tracing::error!(error = %error, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
        None,
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                    None,
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None),
                CoreError::Internal(msg) => internal(msg),
            },

            AppError::Validation(violations) => validation(violations),

            // --- Data-source manager ---
            AppError::DataSource(err) => match err {
                DataSourceError::Validation(violations) => validation(violations),
                DataSourceError::DuplicateName(_) => {
                    (StatusCode::CONFLICT, "DUPLICATE_NAME", err.to_string(), None)
                }
                DataSourceError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string(), None)
                }
                DataSourceError::Store(store) => classify_store_error(store),
                DataSourceError::Task(join) => internal(join),
            },

            AppError::Store(err) => classify_store_error(err),

            AppError::Import(err) => (StatusCode::BAD_REQUEST, "INVALID_CSV", err.to_string(), None),

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::InternalError(msg) => internal(msg),
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(details) = details {
            body["details"] = json!(details);
        }

        (status, axum::Json(body)).into_response()
    }
}

fn classify_store_error(err: &StoreError) -> Classified {
    match err {
        StoreError::UniqueViolation { constraint } => (
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Duplicate value violates unique constraint: {constraint}"),
            None,
        ),
        StoreError::NotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
            None,
        ),
        StoreError::Database(db) => classify_sqlx_error(db),
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> Classified {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
            None,
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                        None,
                    );
                }
            }
            internal(db_err)
        }
        other => internal(other),
    }
}
