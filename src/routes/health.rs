use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub message: String,
    pub status: String,
    pub timestamp: String,
}

pub async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus {
        message: "Therapy Chatbot Backend is running!".to_string(),
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
