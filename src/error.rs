// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::services::dialogflow::IntentError;

pub const EXTERNAL_FAILURE_TEXT: &str =
    "I'm having trouble connecting right now. Please try again in a moment.";
pub const INTERNAL_FAILURE_TEXT: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Configuration(String),

    #[error("intent service call failed: {0}")]
    ExternalService(#[from] IntentError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) | AppError::ExternalService(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Validation(msg) => {
                warn!(error = %msg, "rejecting chat request");
                json!({ "error": msg })
            }
            AppError::Configuration(msg) => {
                error!(error = %msg, "chat request failed on configuration");
                json!({ "error": msg })
            }
            AppError::ExternalService(err) => {
                error!(kind = err.kind(), error = %err, "Error processing request");
                json!({
                    "error": "Failed to process message",
                    "text": EXTERNAL_FAILURE_TEXT,
                    "intent": "error",
                })
            }
            AppError::Internal(detail) => {
                error!(error = %detail, "Unhandled error");
                json!({
                    "error": "Internal server error",
                    "text": INTERNAL_FAILURE_TEXT,
                })
            }
        };

        (status, Json(body)).into_response()
    }
}
