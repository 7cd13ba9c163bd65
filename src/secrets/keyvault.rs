use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::credential::TokenCredential;
use super::{SecretStore, VaultError};

const KEYVAULT_API_VERSION: &str = "7.4";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct SecretBundle {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeyVaultErrorResponse {
    error: KeyVaultErrorBody,
}

#[derive(Debug, Deserialize)]
struct KeyVaultErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Azure Key Vault secrets client (REST, `api-version=7.4`).
pub struct KeyVaultClient {
    http_client: Client,
    vault_uri: Url,
    credential: Arc<dyn TokenCredential>,
}

impl KeyVaultClient {
    pub fn new(vault_uri: &str, credential: Arc<dyn TokenCredential>) -> Result<Self, VaultError> {
        let vault_uri = Url::parse(vault_uri)
            .map_err(|e| VaultError::InvalidVaultUri(format!("{vault_uri}: {e}")))?;

        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| VaultError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_http_client(http_client, vault_uri, credential))
    }

    pub fn with_http_client(
        http_client: Client,
        vault_uri: Url,
        credential: Arc<dyn TokenCredential>,
    ) -> Self {
        Self {
            http_client,
            vault_uri,
            credential,
        }
    }

    pub fn vault_uri(&self) -> &Url {
        &self.vault_uri
    }

    fn secret_url(&self, name: &str) -> Result<Url, VaultError> {
        let mut url = self.vault_uri.clone();
        url.path_segments_mut()
            .map_err(|_| VaultError::InvalidVaultUri(self.vault_uri.to_string()))?
            .pop_if_empty()
            .push("secrets")
            .push(name);
        url.query_pairs_mut()
            .append_pair("api-version", KEYVAULT_API_VERSION);
        Ok(url)
    }
}

#[async_trait]
impl SecretStore for KeyVaultClient {
    async fn get_secret(&self, name: &str) -> Result<String, VaultError> {
        let url = self.secret_url(name)?;
        let token = self.credential.get_token().await?;

        debug!("Fetching secret {} from {}", name, self.vault_uri);

        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| VaultError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<KeyVaultErrorResponse>(&body)
                .map(|r| format!("{}: {}", r.error.code, r.error.message))
                .unwrap_or(body);
            return Err(VaultError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bundle: SecretBundle = response
            .json()
            .await
            .map_err(|e| VaultError::InvalidResponse(e.to_string()))?;

        bundle
            .value
            .ok_or_else(|| VaultError::InvalidResponse(format!("secret {name} has no value")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StaticToken;

    #[async_trait]
    impl TokenCredential for StaticToken {
        async fn get_token(&self) -> Result<String, VaultError> {
            Ok("test-token".to_string())
        }
    }

    fn client_for(server: &MockServer) -> KeyVaultClient {
        KeyVaultClient::new(&format!("{}/", server.uri()), Arc::new(StaticToken)).unwrap()
    }

    #[tokio::test]
    async fn test_get_secret() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/secrets/OPENAI-API-KEY"))
            .and(query_param("api-version", "7.4"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": "sk-from-vault",
                "id": "https://kv.vault.azure.net/secrets/OPENAI-API-KEY/abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let value = client_for(&server)
            .get_secret("OPENAI-API-KEY")
            .await
            .unwrap();
        assert_eq!(value, "sk-from-vault");
    }

    #[tokio::test]
    async fn test_get_secret_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": "SecretNotFound", "message": "A secret with (name/id) SPEECH-KEY was not found"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).get_secret("SPEECH-KEY").await.unwrap_err();
        match err {
            VaultError::Api { status, message } => {
                assert_eq!(status, 404);
                assert!(message.starts_with("SecretNotFound"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_secret_url_without_trailing_slash() {
        let client =
            KeyVaultClient::new("https://kv-test.vault.azure.net", Arc::new(StaticToken)).unwrap();

        assert_eq!(
            client.secret_url("STORAGE-CONN-STR").unwrap().as_str(),
            "https://kv-test.vault.azure.net/secrets/STORAGE-CONN-STR?api-version=7.4"
        );
    }

    #[test]
    fn test_invalid_vault_uri() {
        let result = KeyVaultClient::new("not a url", Arc::new(StaticToken));
        assert!(matches!(result, Err(VaultError::InvalidVaultUri(_))));
    }
}
