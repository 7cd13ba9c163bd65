//! Public blob hosting for synthesized audio.

mod connection;
mod shared_key;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::path::Path as ObjectPath;
use object_store::{
    Attribute, Attributes, ClientOptions, ObjectStore, PutOptions, PutPayload, RetryConfig,
};
use reqwest::{Client, StatusCode};
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};
use url::Url;

pub use connection::{DEV_ACCOUNT_KEY, DEV_ACCOUNT_NAME, DEV_BLOB_ENDPOINT, StorageConnection};
pub use shared_key::{STORAGE_API_VERSION, authorization, format_ms_date, string_to_sign};

pub const WAV_CONTENT_TYPE: &str = "audio/wav";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Request signing failed: {0}")]
    Signing(String),

    #[error("Storage request failed: {0}")]
    Request(String),

    #[error("Blob upload failed: {0}")]
    Upload(#[from] object_store::Error),
}

/// Stable blob name for a piece of spoken text.
pub fn blob_name(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("tts-{}.wav", hex::encode(digest))
}

/// Uploads are attempted once; a failed upload falls back to `<Say>`.
fn single_attempt() -> RetryConfig {
    RetryConfig {
        max_retries: 0,
        retry_timeout: REQUEST_TIMEOUT,
        ..Default::default()
    }
}

/// Uploads audio into one publicly readable container.
pub struct BlobPublisher {
    http_client: Client,
    connection: StorageConnection,
    container: String,
    store: Arc<dyn ObjectStore>,
}

impl BlobPublisher {
    pub fn new(connection: StorageConnection, container: impl Into<String>) -> Result<Self, StorageError> {
        let container = container.into();

        let store = MicrosoftAzureBuilder::new()
            .with_account(&connection.account_name)
            .with_access_key(&connection.account_key)
            .with_container_name(&container)
            .with_endpoint(connection.blob_endpoint.clone())
            .with_allow_http(connection.allows_http())
            .with_client_options(ClientOptions::new().with_timeout(REQUEST_TIMEOUT))
            .with_retry(single_attempt())
            .build()?;

        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StorageError::Request(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            connection,
            container,
            store: Arc::new(store),
        })
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Public URL of a blob in the container.
    pub fn blob_url(&self, blob_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.connection.blob_endpoint, self.container, blob_name
        )
    }

    fn container_url(&self) -> Result<Url, StorageError> {
        let raw = format!(
            "{}/{}?restype=container",
            self.connection.blob_endpoint, self.container
        );
        Url::parse(&raw).map_err(|e| StorageError::Request(format!("Invalid container URL {raw}: {e}")))
    }

    /// Create the container with anonymous blob read access.
    ///
    /// Returns an error only for failures other than "already exists".
    pub async fn create_container(&self) -> Result<(), StorageError> {
        let url = self.container_url()?;
        let date = format_ms_date(OffsetDateTime::now_utc())?;
        let ms_headers = [
            ("x-ms-blob-public-access", "blob"),
            ("x-ms-date", date.as_str()),
            ("x-ms-version", STORAGE_API_VERSION),
        ];
        let sts = string_to_sign("PUT", 0, &ms_headers, &self.connection.account_name, &url);
        let auth = authorization(
            &self.connection.account_name,
            &self.connection.account_key,
            &sts,
        )?;

        let mut request = self
            .http_client
            .put(url)
            .header("Authorization", auth)
            .header("Content-Length", "0");
        for (name, value) in ms_headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                debug!("Created blob container {}", self.container);
                Ok(())
            }
            StatusCode::CONFLICT => {
                debug!("Blob container {} already exists", self.container);
                Ok(())
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(StorageError::Request(format!(
                    "Create container returned {status}: {body}"
                )))
            }
        }
    }

    /// Make sure the container exists. Failures are logged and ignored.
    pub async fn ensure_container(&self) {
        if let Err(e) = self.create_container().await {
            warn!("Could not ensure blob container {}: {}", self.container, e);
        }
    }

    /// Upload WAV audio, overwriting any existing blob, and return its public URL.
    pub async fn upload_wav(&self, blob_name: &str, audio: Bytes) -> Result<String, StorageError> {
        let path = ObjectPath::from(blob_name);
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, WAV_CONTENT_TYPE.into());

        let size = audio.len();
        self.store
            .put_opts(
                &path,
                PutPayload::from(audio),
                PutOptions {
                    attributes,
                    ..Default::default()
                },
            )
            .await?;

        debug!(
            "Uploaded {} bytes to {}/{}",
            size, self.container, blob_name
        );
        Ok(self.blob_url(blob_name))
    }
}
