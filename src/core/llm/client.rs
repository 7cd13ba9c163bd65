use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

use super::messages::{
    ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
};

/// System instruction sent ahead of every caller utterance.
pub const SCHEDULER_INSTRUCTION: &str =
    "You are an appointment scheduler. Collect date, time, name, and confirm.";

/// Utterance used when the request carried no speech or body.
const EMPTY_INPUT_FALLBACK: &str = "Hello";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0} is not configured")]
    MissingConfiguration(&'static str),

    #[error("Request failed: {0}")]
    Network(String),

    #[error("Chat API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid chat response: {0}")]
    InvalidResponse(String),

    #[error("Chat response contained no message content")]
    EmptyResponse,
}

/// Client for one Azure OpenAI chat deployment.
///
/// The endpoint and key may be absent when secrets could not be resolved;
/// that only fails once a completion is requested.
pub struct AzureOpenAIChat {
    http_client: Client,
    endpoint: Option<String>,
    api_key: Option<String>,
    deployment: String,
    api_version: String,
}

impl AzureOpenAIChat {
    pub fn new(
        endpoint: Option<String>,
        api_key: Option<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Result<Self, ChatError> {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChatError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            endpoint,
            api_key,
            deployment: deployment.into(),
            api_version: api_version.into(),
        })
    }

    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    fn completions_url(&self, endpoint: &str) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            endpoint.trim_end_matches('/'),
            self.deployment
        )
    }

    /// Ask the deployment for a reply to one caller utterance.
    ///
    /// An empty utterance is replaced by a greeting. Single attempt, no retries.
    pub async fn reply(&self, user_text: &str) -> Result<String, ChatError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or(ChatError::MissingConfiguration("OPENAI_ENDPOINT"))?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ChatError::MissingConfiguration("OPENAI_API_KEY"))?;

        let user_text = if user_text.is_empty() {
            EMPTY_INPUT_FALLBACK
        } else {
            user_text
        };

        let request = ChatCompletionRequest {
            messages: vec![
                ChatMessage::system(SCHEDULER_INSTRUCTION),
                ChatMessage::user(user_text),
            ],
        };

        let url = self.completions_url(endpoint);
        debug!(
            "Requesting chat completion from deployment={} ({} chars)",
            self.deployment,
            user_text.len()
        );

        let response = self
            .http_client
            .post(&url)
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| ChatError::Network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&response_text)
                .map(|error_response| match error_response.error.code {
                    Some(code) if !code.is_empty() => {
                        format!("{code}: {}", error_response.error.message)
                    }
                    _ => error_response.error.message,
                })
                .unwrap_or(response_text);
            return Err(ChatError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;

        let reply = completion
            .first_content()
            .ok_or(ChatError::EmptyResponse)?
            .to_string();

        info!(
            "Chat completion received from deployment={} ({} chars)",
            self.deployment,
            reply.len()
        );

        Ok(reply)
    }
}
