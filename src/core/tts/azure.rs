use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::core::twiml::escape_xml;

pub const AZURE_TTS_OUTPUT_FORMAT: &str = "riff-24khz-16bit-mono-pcm";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Regional REST endpoint for Azure neural voices.
pub fn azure_tts_url(region: &str) -> String {
    format!("https://{region}.tts.speech.microsoft.com/cognitiveservices/v1")
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("Speech service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Speech service returned no audio")]
    EmptyAudio,
}

/// Azure Speech text-to-speech over REST, producing 24 kHz mono WAV.
pub struct AzureSpeechSynthesizer {
    http_client: Client,
    endpoint: String,
    subscription_key: String,
    voice: String,
    language: String,
}

impl AzureSpeechSynthesizer {
    pub fn new(
        endpoint: impl Into<String>,
        subscription_key: impl Into<String>,
        voice: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Self, SynthesisError> {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SynthesisError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            subscription_key: subscription_key.into(),
            voice: voice.into(),
            language: language.into(),
        })
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn ssml(&self, text: &str) -> String {
        format!(
            r#"<speak version="1.0" xmlns="http://www.w3.org/2001/10/synthesis" xml:lang="{lang}"><voice name="{voice}">{text}</voice></speak>"#,
            lang = escape_xml(&self.language),
            voice = escape_xml(&self.voice),
            text = escape_xml(text),
        )
    }

    fn build_http_request(&self, text: &str) -> reqwest::RequestBuilder {
        self.http_client
            .post(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.subscription_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", AZURE_TTS_OUTPUT_FORMAT)
            .header("User-Agent", "appointment-gateway")
            .body(self.ssml(text))
    }

    /// Synthesize `text` to WAV bytes.
    pub async fn synthesize(&self, text: &str) -> Result<Bytes, SynthesisError> {
        debug!(
            "Synthesizing {} chars with voice={}",
            text.len(),
            self.voice
        );

        let response = self
            .build_http_request(text)
            .send()
            .await
            .map_err(|e| SynthesisError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Network(format!("Failed to read audio: {e}")))?;

        if audio.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }
        Ok(audio)
    }
}
