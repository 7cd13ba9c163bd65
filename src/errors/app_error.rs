use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::core::llm::ChatError;

/// Errors returned by HTTP handlers
///
/// Dialogue failures never reach this type; they are spoken to the caller.
/// Only failures the caller cannot recover from (the chat completion) are
/// converted into an HTTP error so the telephony provider plays its own
/// fallback.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Chat completion failed: {0}")]
    Chat(#[from] ChatError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Chat(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_maps_to_500() {
        let error = AppError::from(ChatError::MissingConfiguration("OPENAI_ENDPOINT"));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(error.to_string().contains("OPENAI_ENDPOINT"));
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
