//! Adapter for the Dialogflow ES `detectIntent` API.
//!
//! The rest of the crate only sees [`IntentClient`], so handlers can be
//! driven by a fake client in tests while production uses
//! [`DialogflowClient`].

pub mod auth;
pub mod client;
pub mod types;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub use client::DialogflowClient;

/// Language tag sent with every query.
pub const LANGUAGE_CODE: &str = "en-US";

/// Fully qualified Dialogflow session name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPath {
    pub project_id: String,
    pub session_id: String,
}

impl SessionPath {
    pub fn new(project_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for SessionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/agent/sessions/{}",
            self.project_id, self.session_id
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextQuery {
    pub text: String,
    pub language_code: String,
}

impl TextQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language_code: LANGUAGE_CODE.to_string(),
        }
    }
}

/// The parts of a detect-intent reply this service cares about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub fulfillment_text: Option<String>,
    pub intent_display_name: Option<String>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Error)]
pub enum IntentError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("credentials unavailable: {0}")]
    Credentials(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("dialogflow returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl IntentError {
    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            IntentError::InvalidEndpoint(_) => "invalid_endpoint",
            IntentError::Credentials(_) => "credentials",
            IntentError::TokenExchange(_) => "token_exchange",
            IntentError::Transport(_) => "transport",
            IntentError::Api { .. } => "api",
            IntentError::MalformedResponse(_) => "malformed_response",
        }
    }
}

#[async_trait]
pub trait IntentClient: Send + Sync {
    async fn detect_intent(
        &self,
        session: &SessionPath,
        query: &TextQuery,
    ) -> Result<QueryResult, IntentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_path_format() {
        let path = SessionPath::new("my-project", "default-session");
        assert_eq!(
            path.to_string(),
            "projects/my-project/agent/sessions/default-session"
        );
    }

    #[test]
    fn text_query_uses_fixed_language() {
        assert_eq!(TextQuery::new("hi").language_code, "en-US");
    }
}
