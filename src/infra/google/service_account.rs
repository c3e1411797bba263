// =============================================================================
// GOOGLE SERVICE ACCOUNT AUTHENTICATION
// =============================================================================
//
// Exchanges a signed JWT for an OAuth2 access token (the "JWT bearer" grant)
// and caches the token until shortly before it expires.
//
// **Setup:**
// 1. Create a service account in Google Cloud Console and enable the Sheets
//    and Drive APIs for its project.
// 2. Create a JSON key for it.
// 3. Share the source spreadsheets with the service account email.
// 4. Point the service at the key:
//    - `GOOGLE_SERVICE_ACCOUNT_KEY` - path to the JSON key file, OR
//    - `GOOGLE_SERVICE_ACCOUNT_JSON` / `GOOGLE_CREDENTIALS` - the JSON itself
//      (handy for hosted deployments).

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::core::errors::UpstreamError;

/// Scopes needed to read sheets and to create, export and delete Drive files.
pub const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/spreadsheets",
];

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens are cached for less than Google's one-hour lifetime.
const TOKEN_CACHE_TTL: Duration = Duration::from_secs(55 * 60);

/// A cached token is refreshed when it has less than this left.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(
        "no service account configured: set GOOGLE_SERVICE_ACCOUNT_KEY, \
         GOOGLE_SERVICE_ACCOUNT_JSON or GOOGLE_CREDENTIALS"
    )]
    Missing,

    #[error("could not read service account key {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid service account key: {0}")]
    InvalidKey(String),

    #[error("token request failed: {0}")]
    Transport(String),

    #[error("token exchange rejected ({status}): {body}")]
    Rejected { status: u16, body: String },
}

impl From<AuthError> for UpstreamError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Transport(message) => UpstreamError::Transport {
                service: "oauth2",
                message,
            },
            AuthError::Rejected { status, body } if status >= 500 => UpstreamError::Status {
                service: "oauth2",
                status,
                body,
            },
            other => UpstreamError::Credentials(other.to_string()),
        }
    }
}

/// The fields we need from the JSON key file.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// JWT claims for Google OAuth2.
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

struct CachedToken {
    token: String,
    expires_at: SystemTime,
}

/// Hands out bearer tokens for one service account. Cheap to share via `Arc`.
pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    scopes: String,
    client: Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl ServiceAccountAuth {
    pub async fn from_file(path: &str) -> Result<Self, AuthError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| AuthError::Io {
                path: path.to_string(),
                source,
            })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let credentials: ServiceAccountCredentials =
            serde_json::from_str(json).map_err(|e| AuthError::InvalidKey(e.to_string()))?;

        // Fail at startup rather than on the first request.
        EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;

        Ok(Self {
            credentials,
            scopes: DEFAULT_SCOPES.join(" "),
            client: Client::new(),
            cached_token: Arc::new(RwLock::new(None)),
        })
    }

    /// Loads the key from the environment, file path first.
    pub async fn from_env() -> Result<Self, AuthError> {
        if let Ok(path) = std::env::var("GOOGLE_SERVICE_ACCOUNT_KEY") {
            return Self::from_file(&path).await;
        }

        for var in ["GOOGLE_SERVICE_ACCOUNT_JSON", "GOOGLE_CREDENTIALS"] {
            if let Ok(json) = std::env::var(var) {
                return Self::from_json(&json);
            }
        }

        Err(AuthError::Missing)
    }

    pub fn client_email(&self) -> &str {
        &self.credentials.client_email
    }

    /// Gets a valid access token, refreshing if necessary.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > SystemTime::now() + TOKEN_REFRESH_MARGIN {
                    return Ok(token.token.clone());
                }
            }
        }

        let new_token = self.fetch_new_token().await?;

        {
            let mut cached = self.cached_token.write().await;
            *cached = Some(CachedToken {
                token: new_token.clone(),
                expires_at: SystemTime::now() + TOKEN_CACHE_TTL,
            });
        }

        tracing::debug!(client_email = %self.credentials.client_email, "Refreshed Google access token");
        Ok(new_token)
    }

    fn signed_assertion(&self, now: u64) -> Result<String, AuthError> {
        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: self.scopes.clone(),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| AuthError::InvalidKey(e.to_string()))
    }

    async fn fetch_new_token(&self) -> Result<String, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AuthError::Transport(e.to_string()))?
            .as_secs();
        let jwt = self.signed_assertion(now)?;

        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected { status, body });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        Ok(token.access_token)
    }
}
