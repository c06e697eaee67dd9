use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The uploaded resume could not be turned into text.
    #[error("Content error: {0}")]
    Content(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("Configuration error: {0}")]
    Config(String),

    /// The model answered, but not with a usable feedback document.
    #[error("Format error: {0}")]
    Format(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::Cache(e.to_string())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::Content(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Config(_)
            | AppError::Format(_)
            | AppError::Llm(_)
            | AppError::Storage(_)
            | AppError::Cache(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Content(_) => "CONTENT_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::RateLimited => "RATE_LIMITED",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Format(_) => "LLM_FORMAT_ERROR",
            AppError::Llm(_) => "LLM_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Cache(_) => "CACHE_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::Content(msg)
            | AppError::Unauthorized(msg) => msg.clone(),
            AppError::RateLimited => "Rate limit exceeded, try again later".to_string(),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                e.to_string()
            }
            other => {
                tracing::error!("{other}");
                other.to_string()
            }
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
