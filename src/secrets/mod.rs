//! Secret resolution
//!
//! Secrets are looked up in Azure Key Vault when `KEYVAULT_URI` is
//! configured, otherwise in the process environment. They are resolved once
//! at startup into [`ServiceSecrets`].

mod credential;
mod keyvault;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};
use zeroize::Zeroize;

use crate::config::{ServerConfig, env_var};

pub use credential::{DefaultAzureCredential, KEYVAULT_SCOPE, TokenCredential};
pub use keyvault::KeyVaultClient;

/// Secret keys resolved at startup.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_ENDPOINT: &str = "OPENAI_ENDPOINT";
pub const SPEECH_KEY: &str = "SPEECH_KEY";
pub const SPEECH_REGION: &str = "SPEECH_REGION";
pub const STORAGE_CONN_STR: &str = "STORAGE_CONN_STR";
pub const STORAGE_CONTAINER: &str = "STORAGE_CONTAINER";

pub const DEFAULT_STORAGE_CONTAINER: &str = "voice-audio";

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Invalid Key Vault URI: {0}")]
    InvalidVaultUri(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Request failed: {0}")]
    Network(String),

    #[error("Key Vault error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid Key Vault response: {0}")]
    InvalidResponse(String),
}

/// A named-secret backend.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, name: &str) -> Result<String, VaultError>;
}

/// Key Vault names allow only alphanumerics and dashes.
pub fn vault_secret_name(key: &str) -> String {
    key.replace('_', "-")
}

/// Looks up secrets in the vault, or in the environment when no vault is configured.
pub struct SecretResolver {
    store: Option<Arc<dyn SecretStore>>,
}

impl SecretResolver {
    /// Build a Key Vault backed resolver when the config names a vault.
    pub fn from_config(config: &ServerConfig) -> Result<Self, VaultError> {
        let Some(vault_uri) = config.keyvault_uri.as_deref() else {
            return Ok(Self::environment());
        };

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| VaultError::Network(format!("Failed to build HTTP client: {e}")))?;
        let credential = DefaultAzureCredential::from_env(http_client);
        info!(
            "Resolving secrets from Key Vault {} using {} credential",
            vault_uri,
            credential.source_name()
        );

        let client = KeyVaultClient::new(vault_uri, Arc::new(credential))?;
        Ok(Self::with_store(Arc::new(client)))
    }

    /// Resolver that only reads environment variables.
    pub fn environment() -> Self {
        Self { store: None }
    }

    pub fn with_store(store: Arc<dyn SecretStore>) -> Self {
        Self { store: Some(store) }
    }

    pub fn uses_vault(&self) -> bool {
        self.store.is_some()
    }

    /// Resolve one secret.
    ///
    /// With a vault, any fetch error yields `default` and the environment is
    /// not consulted. Without one, the environment variable `key` is read.
    pub async fn resolve(&self, key: &str, default: Option<&str>) -> Option<String> {
        let default = default.map(str::to_string);

        match &self.store {
            Some(store) => {
                let name = vault_secret_name(key);
                match store.get_secret(&name).await {
                    Ok(value) => Some(value),
                    Err(e) => {
                        warn!("Key Vault lookup for {} failed: {}", name, e);
                        default
                    }
                }
            }
            None => env_var(key).or(default),
        }
    }
}

/// Credentials and addresses for the backing services.
#[derive(Default, Clone)]
pub struct ServiceSecrets {
    pub openai_api_key: Option<String>,
    pub openai_endpoint: Option<String>,
    pub speech_key: Option<String>,
    pub speech_region: Option<String>,
    pub storage_conn_str: Option<String>,
    pub storage_container: String,
}

impl ServiceSecrets {
    pub async fn resolve(resolver: &SecretResolver) -> Self {
        let storage_container = resolver
            .resolve(STORAGE_CONTAINER, Some(DEFAULT_STORAGE_CONTAINER))
            .await
            .unwrap_or_else(|| DEFAULT_STORAGE_CONTAINER.to_string());

        Self {
            openai_api_key: resolver.resolve(OPENAI_API_KEY, None).await,
            openai_endpoint: resolver.resolve(OPENAI_ENDPOINT, None).await,
            speech_key: resolver.resolve(SPEECH_KEY, None).await,
            speech_region: resolver.resolve(SPEECH_REGION, None).await,
            storage_conn_str: resolver.resolve(STORAGE_CONN_STR, None).await,
            storage_container,
        }
    }
}

impl std::fmt::Debug for ServiceSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("ServiceSecrets")
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("openai_endpoint", &self.openai_endpoint)
            .field("speech_key", &redact(&self.speech_key))
            .field("speech_region", &self.speech_region)
            .field("storage_conn_str", &redact(&self.storage_conn_str))
            .field("storage_container", &self.storage_container)
            .finish()
    }
}

impl Drop for ServiceSecrets {
    fn drop(&mut self) {
        self.openai_api_key.zeroize();
        self.speech_key.zeroize();
        self.storage_conn_str.zeroize();
    }
}
