// src/services/chat.rs
use tracing::info;

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse},
    services::dialogflow::{IntentClient, QueryResult, SessionPath, TextQuery},
};

pub const FALLBACK_REPLY: &str =
    "I apologize, but I didn't understand that. Could you rephrase?";
pub const UNKNOWN_INTENT: &str = "unknown";

/// Validate the request, forward it to the intent service once, and shape
/// the reply.
pub async fn relay_message(
    intents: &dyn IntentClient,
    project_id: Option<&str>,
    request: ChatRequest,
) -> Result<ChatResponse, AppError> {
    let session_id = request.session_id_or_default();

    let message = match request.message {
        Some(m) if !m.is_empty() => m,
        _ => return Err(AppError::Validation("Message is required".to_string())),
    };

    let Some(project_id) = project_id.filter(|p| !p.is_empty()) else {
        return Err(AppError::Configuration(
            "Dialogflow project ID not configured".to_string(),
        ));
    };

    let session = SessionPath::new(project_id, session_id.as_str());
    let query = TextQuery::new(message);

    info!(session = %session, message = %query.text, "Sending to Dialogflow");
    let result = intents.detect_intent(&session, &query).await?;
    info!(
        intent = result.intent_display_name.as_deref().unwrap_or("No intent"),
        fulfillment_text = result.fulfillment_text.as_deref().unwrap_or_default(),
        "Dialogflow response"
    );

    Ok(map_query_result(result, session_id))
}

/// Fill in defaults for whatever the intent service left out.
pub fn map_query_result(result: QueryResult, session_id: String) -> ChatResponse {
    let text = result
        .fulfillment_text
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| FALLBACK_REPLY.to_string());
    let intent = result
        .intent_display_name
        .filter(|i| !i.is_empty())
        .unwrap_or_else(|| UNKNOWN_INTENT.to_string());
    let confidence = result
        .confidence
        .filter(|c| !c.is_nan())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(0.0);

    ChatResponse {
        text,
        intent,
        confidence,
        session_id,
    }
}
