// src/config.rs
use std::{fmt::Debug, path::PathBuf};

use thiserror::Error;

use crate::services::dialogflow::auth::TokenSource;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DIALOGFLOW_ENDPOINT: &str = "https://dialogflow.googleapis.com";
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a valid port number, got {0:?}")]
    InvalidPort(String),
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub project_id: Option<String>,
    pub credentials_path: Option<PathBuf>,
    pub access_token: Option<String>,
    pub dialogflow_endpoint: String,
    pub metadata_host: String,
}

impl Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("project_id", &self.project_id)
            .field("credentials_path", &self.credentials_path)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("dialogflow_endpoint", &self.dialogflow_endpoint)
            .field("metadata_host", &self.metadata_host)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            project_id: None,
            credentials_path: None,
            access_token: None,
            dialogflow_endpoint: DEFAULT_DIALOGFLOW_ENDPOINT.to_string(),
            metadata_host: DEFAULT_METADATA_HOST.to_string(),
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            project_id: get("GOOGLE_PROJECT_ID"),
            credentials_path: get("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
            access_token: get("GOOGLE_OAUTH_ACCESS_TOKEN"),
            dialogflow_endpoint: get("DIALOGFLOW_ENDPOINT")
                .map(|e| e.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_DIALOGFLOW_ENDPOINT.to_string()),
            metadata_host: get("GCE_METADATA_HOST")
                .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string()),
        })
    }

    /// Where bearer tokens for Dialogflow come from, in priority order:
    /// explicit token, credentials file, metadata server.
    pub fn token_source(&self) -> TokenSource {
        if let Some(token) = &self.access_token {
            TokenSource::Static(token.clone())
        } else if let Some(path) = &self.credentials_path {
            TokenSource::CredentialsFile(path.clone())
        } else {
            TokenSource::MetadataServer(self.metadata_host.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.project_id.is_none());
        assert!(config.credentials_path.is_none());
        assert_eq!(config.dialogflow_endpoint, DEFAULT_DIALOGFLOW_ENDPOINT);
        assert_eq!(
            config.token_source(),
            TokenSource::MetadataServer("metadata.google.internal".to_string())
        );
    }

    #[test]
    fn reads_recognized_variables() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("GOOGLE_PROJECT_ID", "therapy-bot"),
            ("GOOGLE_APPLICATION_CREDENTIALS", "/secrets/key.json"),
            ("DIALOGFLOW_ENDPOINT", "http://localhost:9000/"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.project_id.as_deref(), Some("therapy-bot"));
        assert_eq!(config.dialogflow_endpoint, "http://localhost:9000");
        assert_eq!(
            config.token_source(),
            TokenSource::CredentialsFile(PathBuf::from("/secrets/key.json"))
        );
    }

    #[test]
    fn empty_project_id_counts_as_unset() {
        let config = config_from(&[("GOOGLE_PROJECT_ID", "  ")]).unwrap();
        assert!(config.project_id.is_none());
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(ref p) if p == "eighty"));
    }

    #[test]
    fn static_token_wins_and_is_redacted() {
        let config = config_from(&[
            ("GOOGLE_OAUTH_ACCESS_TOKEN", "ya29.secret"),
            ("GOOGLE_APPLICATION_CREDENTIALS", "/secrets/key.json"),
        ])
        .unwrap();

        assert_eq!(
            config.token_source(),
            TokenSource::Static("ya29.secret".to_string())
        );
        assert!(!format!("{config:?}").contains("ya29.secret"));
    }
}
