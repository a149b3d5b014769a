// src/message.rs
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Session id used when the caller does not supply one.
pub const DEFAULT_SESSION_ID: &str = "default-session";

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default, deserialize_with = "string_or_none")]
    pub message: Option<String>,
    #[serde(
        default,
        rename = "sessionId",
        alias = "session_id",
        deserialize_with = "string_or_none"
    )]
    pub session_id: Option<String>,
}

impl ChatRequest {
    /// Build a request from an arbitrary JSON body. Anything other than an
    /// object reads as an empty request.
    pub fn from_json(body: Value) -> Self {
        match body {
            Value::Object(_) => serde_json::from_value(body).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    /// The caller's session id, or the default one when absent or blank.
    pub fn session_id_or_default(&self) -> String {
        match &self.session_id {
            Some(s) if !s.trim().is_empty() => s.clone(),
            _ => DEFAULT_SESSION_ID.to_string(),
        }
    }
}

// Only JSON strings carry text; numbers, objects and null read as absent.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        _ => None,
    })
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub text: String,
    pub intent: String,
    pub confidence: f64,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}
