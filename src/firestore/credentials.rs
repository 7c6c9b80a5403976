//! Access tokens for the REST client
//!
//! Tokens are fetched lazily on the first request and cached until shortly
//! before they expire.

use super::settings::CredentialsSource;
use crate::error::FirebaseError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::RwLock;

const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ADC_ENV_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";
/// Token the emulator accepts in place of real credentials
const EMULATOR_TOKEN: &str = "owner";
/// Refresh this long before the reported expiry
const EXPIRY_MARGIN_SECS: i64 = 60;
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Fields of a service-account key file this crate needs
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub(crate) async fn from_file(path: &Path) -> Result<Self, FirebaseError> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            FirebaseError::credentials(format!("cannot read key file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            FirebaseError::credentials(format!("invalid key file {}: {}", path.display(), e))
        })
    }

    /// Signed assertion exchanged for an access token
    fn assertion(&self, now: DateTime<Utc>) -> Result<String, FirebaseError> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| FirebaseError::credentials(format!("invalid private key: {}", e)))?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| FirebaseError::credentials(format!("cannot sign assertion: {}", e)))
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > now
    }
}

enum TokenSource {
    Emulator,
    ServiceAccount(ServiceAccountKey),
    MetadataServer,
}

/// Cached bearer-token source for one client
pub(crate) struct TokenProvider {
    source: TokenSource,
    cached: RwLock<Option<AccessToken>>,
}

impl TokenProvider {
    fn new(source: TokenSource) -> Self {
        Self {
            source,
            cached: RwLock::new(None),
        }
    }

    /// Resolve a credentials source, reading key files up front
    pub(crate) async fn from_source(source: &CredentialsSource) -> Result<Self, FirebaseError> {
        let source = match source {
            CredentialsSource::None => TokenSource::Emulator,
            CredentialsSource::FilePath(path) => TokenSource::ServiceAccount(ServiceAccountKey::from_file(path).await?),
            CredentialsSource::Ambient => match std::env::var(ADC_ENV_VAR).ok().filter(|v| !v.is_empty()) {
                Some(path) => TokenSource::ServiceAccount(ServiceAccountKey::from_file(Path::new(&path)).await?),
                None => TokenSource::MetadataServer,
            },
        };
        Ok(Self::new(source))
    }

    /// Current bearer token, refreshing it when stale
    pub(crate) async fn token(&self, http: &reqwest::Client) -> Result<String, FirebaseError> {
        if let TokenSource::Emulator = self.source {
            return Ok(EMULATOR_TOKEN.to_string());
        }

        let now = Utc::now();
        if let Some(token) = self.cached.read().await.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let mut cached = self.cached.write().await;
        // another task may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let response = match &self.source {
            TokenSource::ServiceAccount(key) => {
                let assertion = key.assertion(now)?;
                http.post(&key.token_uri)
                    .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
                    .send()
                    .await?
            }
            TokenSource::MetadataServer => {
                http.get(METADATA_TOKEN_URL)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await?
            }
            TokenSource::Emulator => return Ok(EMULATOR_TOKEN.to_string()),
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FirebaseError::credentials(format!("token request failed ({}): {}", status, body)));
        }

        let token: TokenResponse = response.json().await?;
        let access = AccessToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        };
        tracing::debug!(expires_at = %access.expires_at, "refreshed access token");
        let value = access.value.clone();
        *cached = Some(access);
        Ok(value)
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match &self.source {
            TokenSource::Emulator => "emulator".to_string(),
            TokenSource::ServiceAccount(key) => key.client_email.clone(),
            TokenSource::MetadataServer => "metadata-server".to_string(),
        };
        f.debug_struct("TokenProvider")
            .field("source", &source)
            .field("token", &"<redacted>")
            .finish()
    }
}
