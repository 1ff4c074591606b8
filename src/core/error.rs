use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("AI provider error: {0}")]
    AiProvider(String),
}

impl AppError {
    /// Stable machine-readable kind, used in logs and tests
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) => "persistence",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) | AppError::BadRequest(_) => "validation",
            AppError::Internal(_) => "internal",
            AppError::Auth(_) | AppError::Unauthorized(_) => "unauthorized",
            AppError::Storage(_) => "storage",
            AppError::AiProvider(_) => "ai_provider",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, message, errors) = match self {
            AppError::Database(ref e) => {
                tracing::error!(kind, "Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    None,
                )
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Validation(ref msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                Some(vec![msg.clone()]),
            ),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Internal(ref msg) => {
                tracing::error!(kind, "Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Auth(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Storage(ref msg) => {
                tracing::error!(kind, "Storage error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store the uploaded image".to_string(),
                    None,
                )
            }
            AppError::AiProvider(ref msg) => {
                tracing::error!(kind, "AI provider error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to generate a prompt for the image".to_string(),
                    None,
                )
            }
        };

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
