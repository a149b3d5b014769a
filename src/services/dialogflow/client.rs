use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use super::{
    IntentClient, IntentError, QueryResult, SessionPath, TextQuery,
    auth::TokenProvider,
    types::{DetectIntentRequest, DetectIntentResponse, GoogleErrorEnvelope},
};
use crate::config::Config;

/// `IntentClient` backed by the Dialogflow v2 REST API.
#[derive(Debug)]
pub struct DialogflowClient {
    http: reqwest::Client,
    endpoint: Url,
    tokens: TokenProvider,
}

impl DialogflowClient {
    pub fn new(endpoint: &str, tokens: TokenProvider, http: reqwest::Client) -> Result<Self, IntentError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| IntentError::InvalidEndpoint(format!("{endpoint:?}: {e}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(IntentError::InvalidEndpoint(endpoint.to_string()));
        }
        Ok(Self { http, endpoint, tokens })
    }

    pub fn from_config(config: &Config) -> Result<Self, IntentError> {
        let http = reqwest::Client::builder().build()?;
        let tokens = TokenProvider::new(config.token_source(), http.clone());
        Self::new(&config.dialogflow_endpoint, tokens, http)
    }

    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    /// `{endpoint}/v2/projects/{p}/agent/sessions/{s}:detectIntent`, with
    /// each caller-supplied segment percent-encoded.
    pub fn detect_intent_url(&self, session: &SessionPath) -> Url {
        let method = format!("{}:detectIntent", session.session_id);
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "v2",
                "projects",
                session.project_id.as_str(),
                "agent",
                "sessions",
                method.as_str(),
            ]);
        }
        url
    }
}

#[async_trait]
impl IntentClient for DialogflowClient {
    async fn detect_intent(
        &self,
        session: &SessionPath,
        query: &TextQuery,
    ) -> Result<QueryResult, IntentError> {
        let token = self.tokens.token().await?;
        let url = self.detect_intent_url(session);

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&DetectIntentRequest::from(query))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GoogleErrorEnvelope>(&body)
                .map(|env| match env.error.status {
                    Some(s) => format!("{s}: {}", env.error.message),
                    None => env.error.message,
                })
                .unwrap_or(body);
            return Err(IntentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: DetectIntentResponse = response
            .json()
            .await
            .map_err(|e| IntentError::MalformedResponse(e.to_string()))?;
        debug!(response_id = ?reply.response_id, session = %session, "detectIntent reply");

        reply
            .query_result
            .map(QueryResult::from)
            .ok_or_else(|| IntentError::MalformedResponse("missing queryResult".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::dialogflow::auth::TokenSource;

    fn client(endpoint: &str) -> DialogflowClient {
        let http = reqwest::Client::new();
        let tokens = TokenProvider::new(TokenSource::Static("t".into()), http.clone());
        DialogflowClient::new(endpoint, tokens, http).unwrap()
    }

    #[test]
    fn builds_detect_intent_url() {
        let url = client("https://dialogflow.googleapis.com")
            .detect_intent_url(&SessionPath::new("proj", "default-session"));
        assert_eq!(
            url.as_str(),
            "https://dialogflow.googleapis.com/v2/projects/proj/agent/sessions/default-session:detectIntent"
        );
    }

    #[test]
    fn encodes_session_segments() {
        let url = client("http://localhost:9000")
            .detect_intent_url(&SessionPath::new("proj", "a/b c"));
        assert_eq!(
            url.path(),
            "/v2/projects/proj/agent/sessions/a%2Fb%20c:detectIntent"
        );
    }

    #[test]
    fn rejects_invalid_endpoint() {
        let http = reqwest::Client::new();
        let tokens = TokenProvider::new(TokenSource::Static("t".into()), http.clone());
        assert!(DialogflowClient::new("not a url", tokens, http).is_err());
    }
}
