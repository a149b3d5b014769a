//! OAuth bearer tokens for Google APIs.
//!
//! Tokens come from one of three places: a token handed in directly, a
//! credentials file, or the GCE metadata server. A credentials file is
//! either a service-account key (signed JWT assertion exchanged at the
//! key's `token_uri`) or a gcloud `authorized_user` file (refresh-token
//! grant). Fetched tokens are cached until shortly before they expire.

use std::{
    fmt::Debug,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use super::{IntentError, types::TokenResponse};

pub const DIALOGFLOW_SCOPES: &str =
    "https://www.googleapis.com/auth/cloud-platform https://www.googleapis.com/auth/dialogflow";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;
// Token replies claiming a longer lifetime are held to this.
const MAX_TOKEN_LIFETIME_SECS: u64 = 24 * 3600;
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Clone, PartialEq, Eq)]
pub enum TokenSource {
    Static(String),
    CredentialsFile(PathBuf),
    MetadataServer(String),
}

impl Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::Static(_) => f.write_str("Static(<redacted>)"),
            TokenSource::CredentialsFile(path) => {
                f.debug_tuple("CredentialsFile").field(path).finish()
            }
            TokenSource::MetadataServer(host) => {
                f.debug_tuple("MetadataServer").field(host).finish()
            }
        }
    }
}

/// Contents of a `GOOGLE_APPLICATION_CREDENTIALS` file.
#[derive(Debug, Clone)]
pub enum Credentials {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUser),
}

impl Credentials {
    /// Read a credentials file. A file without a `type` field is treated
    /// as a service-account key.
    pub async fn load(path: &Path) -> Result<Self, IntentError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            IntentError::Credentials(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&raw)
            .map_err(|e| IntentError::Credentials(format!("{}: {e}", path.display())))
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        let value: Value = serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("service_account")
            .to_string();

        match kind.as_str() {
            "service_account" => serde_json::from_value(value)
                .map(Credentials::ServiceAccount)
                .map_err(|e| format!("invalid service account key: {e}")),
            "authorized_user" => serde_json::from_value(value)
                .map(Credentials::AuthorizedUser)
                .map_err(|e| format!("invalid authorized user file: {e}")),
            other => Err(format!("unsupported credentials type {other:?}")),
        }
    }
}

/// The fields of a service-account key file needed to mint tokens.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }

    /// Sign the RS256 assertion sent to the token endpoint.
    pub fn assertion(&self, issued_at: i64) -> Result<String, IntentError> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: DIALOGFLOW_SCOPES,
            aud: self.token_uri(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| IntentError::Credentials(format!("invalid private key: {e}")))?;
        encode(&header, &claims, &key)
            .map_err(|e| IntentError::Credentials(format!("jwt encode: {e}")))
    }
}

/// A gcloud application-default-credentials file for a user account.
#[derive(Clone, Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl Debug for AuthorizedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUser")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl AuthorizedUser {
    pub fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + REFRESH_MARGIN < self.expires_at
    }
}

pub struct TokenProvider {
    source: TokenSource,
    http: reqwest::Client,
    cache: Mutex<Option<CachedToken>>,
}

impl Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("source", &self.source)
            .finish()
    }
}

impl TokenProvider {
    pub fn new(source: TokenSource, http: reqwest::Client) -> Self {
        Self {
            source,
            http,
            cache: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &TokenSource {
        &self.source
    }

    /// A bearer token valid for at least the refresh margin.
    pub async fn token(&self) -> Result<String, IntentError> {
        // Holding the lock across the fetch keeps concurrent requests from
        // minting duplicate tokens.
        let mut guard = self.cache.lock().await;
        if let Some(cached) = guard.as_ref().filter(|c| c.is_fresh()) {
            return Ok(cached.value.clone());
        }

        let fetched = self.fetch().await?;
        let lifetime = token_lifetime(fetched.expires_in);
        let expires_at = Instant::now().checked_add(lifetime).ok_or_else(|| {
            IntentError::TokenExchange(format!("token lifetime {lifetime:?} out of range"))
        })?;
        debug!(source = ?self.source, expires_in = lifetime.as_secs(), "fetched access token");

        let token = fetched.access_token;
        *guard = Some(CachedToken {
            value: token.clone(),
            expires_at,
        });
        Ok(token)
    }

    async fn fetch(&self) -> Result<TokenResponse, IntentError> {
        let response = match &self.source {
            TokenSource::Static(token) => {
                return Ok(TokenResponse {
                    access_token: token.clone(),
                    expires_in: None,
                });
            }
            TokenSource::CredentialsFile(path) => match Credentials::load(path).await? {
                Credentials::ServiceAccount(key) => {
                    let assertion = key.assertion(Utc::now().timestamp())?;
                    self.http
                        .post(key.token_uri())
                        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
                        .send()
                        .await?
                }
                Credentials::AuthorizedUser(user) => {
                    self.http
                        .post(user.token_uri())
                        .form(&[
                            ("grant_type", "refresh_token"),
                            ("client_id", user.client_id.as_str()),
                            ("client_secret", user.client_secret.as_str()),
                            ("refresh_token", user.refresh_token.as_str()),
                        ])
                        .send()
                        .await?
                }
            },
            TokenSource::MetadataServer(host) => {
                let url = format!(
                    "http://{host}/computeMetadata/v1/instance/service-accounts/default/token"
                );
                self.http
                    .get(url)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await?
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IntentError::TokenExchange(format!("{status}: {body}")));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| IntentError::TokenExchange(format!("unreadable token reply: {e}")))
    }
}

fn token_lifetime(expires_in: Option<u64>) -> Duration {
    Duration::from_secs(
        expires_in
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
            .min(MAX_TOKEN_LIFETIME_SECS),
    )
}
