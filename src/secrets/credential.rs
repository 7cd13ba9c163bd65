//! Ambient Azure credentials for Key Vault access.
//!
//! [`DefaultAzureCredential`] mirrors the usual lookup order:
//! 1. Service principal from `AZURE_TENANT_ID` / `AZURE_CLIENT_ID` / `AZURE_CLIENT_SECRET`
//! 2. App Service / Functions managed identity (`IDENTITY_ENDPOINT` + `IDENTITY_HEADER`)
//! 3. Instance metadata service (IMDS) managed identity

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use zeroize::Zeroize;

use super::VaultError;
use crate::config::env_var;

/// Resource and scope for Key Vault tokens.
pub const KEYVAULT_RESOURCE: &str = "https://vault.azure.net";
pub const KEYVAULT_SCOPE: &str = "https://vault.azure.net/.default";

const IMDS_TOKEN_URL: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Refresh tokens this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(300);

/// IMDS is link-local; off Azure the request would otherwise hang until the client timeout.
const IMDS_TIMEOUT: Duration = Duration::from_secs(2);

/// Source of bearer tokens for Azure data-plane calls.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn get_token(&self) -> Result<String, VaultError>;
}

#[derive(Clone)]
enum CredentialSource {
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
    AppServiceIdentity {
        endpoint: String,
        header: String,
        client_id: Option<String>,
    },
    Imds {
        client_id: Option<String>,
    },
}

impl Drop for CredentialSource {
    fn drop(&mut self) {
        match self {
            CredentialSource::ClientSecret { client_secret, .. } => client_secret.zeroize(),
            CredentialSource::AppServiceIdentity { header, .. } => header.zeroize(),
            CredentialSource::Imds { .. } => {}
        }
    }
}

struct CachedToken {
    token: String,
    expires_at: SystemTime,
}

enum TokenState {
    Empty,
    Cached(CachedToken),
    /// The source could not be reached; later lookups fail without a request.
    Unavailable(String),
}

/// Token response shared by the identity endpoints.
///
/// Managed identity endpoints send `expires_on` as a string of epoch seconds;
/// the OAuth2 endpoint sends `expires_in` as a number.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<serde_json::Value>,
    #[serde(default)]
    expires_on: Option<serde_json::Value>,
}

impl TokenResponse {
    fn expires_at(&self) -> SystemTime {
        let now = SystemTime::now();
        if let Some(epoch) = self.expires_on.as_ref().and_then(json_u64) {
            return UNIX_EPOCH + Duration::from_secs(epoch);
        }
        if let Some(seconds) = self.expires_in.as_ref().and_then(json_u64) {
            return now + Duration::from_secs(seconds);
        }
        now
    }
}

fn json_u64(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Credential chain resolved from the process environment.
pub struct DefaultAzureCredential {
    http_client: Client,
    source: CredentialSource,
    state: Mutex<TokenState>,
}

impl DefaultAzureCredential {
    /// Pick the first credential source the environment supports.
    pub fn from_env(http_client: Client) -> Self {
        let client_id = env_var("AZURE_CLIENT_ID");

        let source = match (
            env_var("AZURE_TENANT_ID"),
            client_id.clone(),
            env_var("AZURE_CLIENT_SECRET"),
        ) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                CredentialSource::ClientSecret {
                    tenant_id,
                    client_id,
                    client_secret,
                }
            }
            _ => match (env_var("IDENTITY_ENDPOINT"), env_var("IDENTITY_HEADER")) {
                (Some(endpoint), Some(header)) => CredentialSource::AppServiceIdentity {
                    endpoint,
                    header,
                    client_id,
                },
                _ => CredentialSource::Imds { client_id },
            },
        };

        Self::with_source(http_client, source)
    }

    fn with_source(http_client: Client, source: CredentialSource) -> Self {
        Self {
            http_client,
            source,
            state: Mutex::new(TokenState::Empty),
        }
    }

    /// Short name of the selected source, for logging.
    pub fn source_name(&self) -> &'static str {
        match self.source {
            CredentialSource::ClientSecret { .. } => "client_secret",
            CredentialSource::AppServiceIdentity { .. } => "app_service_identity",
            CredentialSource::Imds { .. } => "imds",
        }
    }

    fn token_request(&self) -> RequestBuilder {
        match &self.source {
            CredentialSource::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
            } => self
                .http_client
                .post(format!("{AUTHORITY_HOST}/{tenant_id}/oauth2/v2.0/token"))
                .form(&[
                    ("grant_type", "client_credentials"),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                    ("scope", KEYVAULT_SCOPE),
                ]),
            CredentialSource::AppServiceIdentity {
                endpoint,
                header,
                client_id,
            } => {
                let mut query = vec![
                    ("resource", KEYVAULT_RESOURCE),
                    ("api-version", "2019-08-01"),
                ];
                if let Some(client_id) = client_id {
                    query.push(("client_id", client_id.as_str()));
                }
                self.http_client
                    .get(endpoint)
                    .query(&query)
                    .header("X-IDENTITY-HEADER", header)
            }
            CredentialSource::Imds { client_id } => {
                let mut query = vec![
                    ("resource", KEYVAULT_RESOURCE),
                    ("api-version", "2018-02-01"),
                ];
                if let Some(client_id) = client_id {
                    query.push(("client_id", client_id.as_str()));
                }
                self.http_client
                    .get(IMDS_TOKEN_URL)
                    .query(&query)
                    .header("Metadata", "true")
                    .timeout(IMDS_TIMEOUT)
            }
        }
    }

    async fn request_token(&self) -> Result<TokenResponse, VaultError> {
        let response = self
            .token_request()
            .send()
            .await
            .map_err(|e| VaultError::Network(format!("Token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VaultError::Credential(format!(
                "Token endpoint returned {status}: {body}"
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| VaultError::Credential(format!("Invalid token response: {e}")))
    }
}

#[async_trait]
impl TokenCredential for DefaultAzureCredential {
    async fn get_token(&self) -> Result<String, VaultError> {
        let mut state = self.state.lock().await;
        match &*state {
            TokenState::Cached(token) if token.expires_at > SystemTime::now() + EXPIRY_MARGIN => {
                return Ok(token.token.clone());
            }
            TokenState::Unavailable(reason) => {
                return Err(VaultError::Credential(format!(
                    "{} credential unavailable: {reason}",
                    self.source_name()
                )));
            }
            _ => {}
        }

        debug!("Requesting Key Vault token via {}", self.source_name());
        let response = match self.request_token().await {
            Ok(response) => response,
            Err(VaultError::Network(reason)) => {
                warn!("{} credential unavailable: {reason}", self.source_name());
                *state = TokenState::Unavailable(reason.clone());
                return Err(VaultError::Network(reason));
            }
            Err(e) => return Err(e),
        };
        let token = response.access_token.clone();
        *state = TokenState::Cached(CachedToken {
            token: response.access_token.clone(),
            expires_at: response.expires_at(),
        });
        Ok(token)
    }
}
