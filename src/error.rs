/// Error types for pulse-service
///
/// Every component returns `AppError`; the HTTP boundary is the only place
/// where errors become wire responses, via the `ResponseError` impl below.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// Result type alias for service operations
pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not the owner of this resource")]
    NotOwner,

    #[error("the body of a repost cannot be edited")]
    RepostBodyImmutable,

    #[error("invalid operand: {0}")]
    InvalidOperand(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::NotOwner => StatusCode::FORBIDDEN,
            AppError::RepostBodyImmutable
            | AppError::InvalidOperand(_)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Storage failures roll back and surface as 5xx; the detail stays in
        // the logs, not on the wire.
        let message = match self {
            AppError::Storage(err) => {
                tracing::error!("storage error: {}", err);
                "storage error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(status).json(serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        }))
    }
}
