use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::Value;

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse},
    services::chat::relay_message,
    state::SharedState,
};

pub async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let request = match payload {
        Ok(Json(body)) => ChatRequest::from_json(body),
        // A body sent without a JSON content type carries no fields.
        Err(JsonRejection::MissingJsonContentType(_)) => ChatRequest::default(),
        Err(rejection) => return Err(AppError::Internal(rejection.body_text())),
    };

    let response = relay_message(
        state.intents.as_ref(),
        state.config.project_id.as_deref(),
        request,
    )
    .await?;

    Ok(Json(response))
}
