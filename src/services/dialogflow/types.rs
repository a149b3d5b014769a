//! Wire types for the Dialogflow v2 REST API and Google OAuth endpoints.

use serde::{Deserialize, Serialize};

use super::{QueryResult, TextQuery};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectIntentRequest<'a> {
    pub query_input: QueryInput<'a>,
}

#[derive(Debug, Serialize)]
pub struct QueryInput<'a> {
    pub text: TextInput<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextInput<'a> {
    pub text: &'a str,
    pub language_code: &'a str,
}

impl<'a> From<&'a TextQuery> for DetectIntentRequest<'a> {
    fn from(query: &'a TextQuery) -> Self {
        Self {
            query_input: QueryInput {
                text: TextInput {
                    text: &query.text,
                    language_code: &query.language_code,
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectIntentResponse {
    #[serde(default)]
    pub response_id: Option<String>,
    #[serde(default)]
    pub query_result: Option<WireQueryResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireQueryResult {
    #[serde(default)]
    pub fulfillment_text: Option<String>,
    #[serde(default)]
    pub intent: Option<WireIntent>,
    #[serde(default)]
    pub intent_detection_confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireIntent {
    #[serde(default)]
    pub display_name: Option<String>,
}

impl From<WireQueryResult> for QueryResult {
    fn from(wire: WireQueryResult) -> Self {
        Self {
            fulfillment_text: wire.fulfillment_text,
            intent_display_name: wire.intent.and_then(|i| i.display_name),
            confidence: wire.intent_detection_confidence,
        }
    }
}

/// Google's JSON error envelope.
#[derive(Debug, Deserialize)]
pub struct GoogleErrorEnvelope {
    pub error: GoogleError,
}

#[derive(Debug, Deserialize)]
pub struct GoogleError {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Token reply shared by the OAuth token endpoint and the metadata server.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_shape() {
        let query = TextQuery::new("I feel anxious");
        let body = serde_json::to_value(DetectIntentRequest::from(&query)).unwrap();
        assert_eq!(
            body,
            json!({"queryInput": {"text": {"text": "I feel anxious", "languageCode": "en-US"}}})
        );
    }

    #[test]
    fn parses_full_query_result() {
        let raw = json!({
            "responseId": "r-1",
            "queryResult": {
                "queryText": "hello",
                "fulfillmentText": "Hi there, how are you feeling?",
                "intent": {"name": "projects/p/agent/intents/1", "displayName": "Default Welcome Intent"},
                "intentDetectionConfidence": 0.87,
                "languageCode": "en"
            }
        });
        let resp: DetectIntentResponse = serde_json::from_value(raw).unwrap();
        let result = QueryResult::from(resp.query_result.unwrap());
        assert_eq!(
            result.fulfillment_text.as_deref(),
            Some("Hi there, how are you feeling?")
        );
        assert_eq!(
            result.intent_display_name.as_deref(),
            Some("Default Welcome Intent")
        );
        assert_eq!(result.confidence, Some(0.87));
    }

    #[test]
    fn missing_fields_stay_empty() {
        let resp: DetectIntentResponse =
            serde_json::from_value(json!({"queryResult": {}})).unwrap();
        assert_eq!(QueryResult::from(resp.query_result.unwrap()), QueryResult::default());
    }
}
