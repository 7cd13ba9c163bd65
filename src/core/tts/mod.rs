//! Speech synthesis and publishing.
//!
//! [`SpeechPublisher`] turns reply text into a publicly playable WAV URL:
//! synthesize with Azure Speech, make sure the container exists, upload
//! under a content-addressed name. Every failure yields `None` so callers
//! can fall back to `<Say>`.

mod azure;

use tracing::{debug, warn};

pub use azure::{AZURE_TTS_OUTPUT_FORMAT, AzureSpeechSynthesizer, SynthesisError, azure_tts_url};

use crate::config::ServerConfig;
use crate::core::storage::{BlobPublisher, StorageConnection, blob_name};
use crate::secrets::ServiceSecrets;

pub struct SpeechPublisher {
    synthesizer: AzureSpeechSynthesizer,
    blobs: BlobPublisher,
}

impl SpeechPublisher {
    pub fn new(synthesizer: AzureSpeechSynthesizer, blobs: BlobPublisher) -> Self {
        Self { synthesizer, blobs }
    }

    /// Build the publisher when speech and storage secrets are all present.
    ///
    /// Returns `None` if any of them is missing or the connection string does
    /// not parse.
    pub fn from_secrets(config: &ServerConfig, secrets: &ServiceSecrets) -> Option<Self> {
        let (Some(key), Some(region), Some(conn_str)) = (
            non_empty(&secrets.speech_key),
            non_empty(&secrets.speech_region),
            non_empty(&secrets.storage_conn_str),
        ) else {
            debug!("Speech synthesis unavailable: speech or storage secrets missing");
            return None;
        };

        let connection = match StorageConnection::parse(conn_str) {
            Ok(connection) => connection,
            Err(e) => {
                warn!("Speech synthesis unavailable: {}", e);
                return None;
            }
        };

        let endpoint = config
            .speech_endpoint
            .clone()
            .unwrap_or_else(|| azure_tts_url(region));

        let synthesizer = match AzureSpeechSynthesizer::new(
            endpoint,
            key,
            config.speech_voice.clone(),
            config.speech_language.clone(),
        ) {
            Ok(synthesizer) => synthesizer,
            Err(e) => {
                warn!("Speech synthesis unavailable: {}", e);
                return None;
            }
        };

        match BlobPublisher::new(connection, secrets.storage_container.clone()) {
            Ok(blobs) => Some(Self::new(synthesizer, blobs)),
            Err(e) => {
                warn!("Speech synthesis unavailable: {}", e);
                None
            }
        }
    }

    /// Synthesize `text` and return the URL of the uploaded audio.
    pub async fn publish(&self, text: &str) -> Option<String> {
        let audio = match self.synthesizer.synthesize(text).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!("Speech synthesis failed: {}", e);
                return None;
            }
        };

        self.blobs.ensure_container().await;

        let name = blob_name(text);
        match self.blobs.upload_wav(&name, audio).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Audio upload to container {} failed: {}", self.blobs.container(), e);
                None
            }
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::DEV_ACCOUNT_KEY;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn secrets(speech_key: Option<&str>, region: Option<&str>, conn: Option<&str>) -> ServiceSecrets {
        let mut secrets = ServiceSecrets::default();
        secrets.speech_key = speech_key.map(str::to_string);
        secrets.speech_region = region.map(str::to_string);
        secrets.storage_conn_str = conn.map(str::to_string);
        secrets.storage_container = "voice-audio".to_string();
        secrets
    }

    const CONN: &str = "AccountName=acct;AccountKey=a2V5;EndpointSuffix=core.windows.net";

    #[test]
    fn test_unavailable_without_speech_key() {
        let config = ServerConfig::default();
        assert!(SpeechPublisher::from_secrets(&config, &secrets(None, Some("eastus"), Some(CONN))).is_none());
        assert!(SpeechPublisher::from_secrets(&config, &secrets(Some(" "), Some("eastus"), Some(CONN))).is_none());
    }

    #[test]
    fn test_unavailable_without_region_or_storage() {
        let config = ServerConfig::default();
        assert!(SpeechPublisher::from_secrets(&config, &secrets(Some("k"), None, Some(CONN))).is_none());
        assert!(SpeechPublisher::from_secrets(&config, &secrets(Some("k"), Some("eastus"), None)).is_none());
    }

    #[test]
    fn test_unavailable_with_bad_connection_string() {
        let config = ServerConfig::default();
        assert!(
            SpeechPublisher::from_secrets(&config, &secrets(Some("k"), Some("eastus"), Some("garbage")))
                .is_none()
        );
    }

    #[test]
    fn test_available_uses_regional_endpoint() {
        let config = ServerConfig::default();
        let publisher =
            SpeechPublisher::from_secrets(&config, &secrets(Some("k"), Some("eastus"), Some(CONN))).unwrap();

        assert_eq!(
            publisher.synthesizer.endpoint(),
            "https://eastus.tts.speech.microsoft.com/cognitiveservices/v1"
        );
        assert_eq!(publisher.synthesizer.voice(), "en-US-JennyNeural");
    }

    async fn publisher_for(server: &MockServer) -> SpeechPublisher {
        let mut config = ServerConfig::default();
        config.speech_endpoint = Some(format!("{}/cognitiveservices/v1", server.uri()));
        let conn = format!(
            "AccountName=acct;AccountKey={DEV_ACCOUNT_KEY};BlobEndpoint={}/acct",
            server.uri()
        );
        SpeechPublisher::from_secrets(&config, &secrets(Some("k"), Some("eastus"), Some(&conn))).unwrap()
    }

    #[tokio::test]
    async fn test_publish_returns_blob_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cognitiveservices/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFFWAVE".to_vec()))
            .mount(&server)
            .await;
        // Container already exists; upload still proceeds
        Mock::given(method("PUT"))
            .and(path("/acct/voice-audio"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;
        let blob = blob_name("Your appointment is booked.");
        Mock::given(method("PUT"))
            .and(path(format!("/acct/voice-audio/{blob}")))
            .respond_with(ResponseTemplate::new(201).insert_header("ETag", "\"0x1\""))
            .expect(1)
            .mount(&server)
            .await;

        let url = publisher_for(&server)
            .await
            .publish("Your appointment is booked.")
            .await;

        assert_eq!(url, Some(format!("{}/acct/voice-audio/{blob}", server.uri())));
    }

    #[tokio::test]
    async fn test_publish_synthesis_failure_returns_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        assert_eq!(publisher_for(&server).await.publish("Hello").await, None);
    }

    #[tokio::test]
    async fn test_publish_upload_failure_returns_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFFWAVE".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        assert_eq!(publisher_for(&server).await.publish("Hello").await, None);
    }
}
