use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::core::dialogue::Dialogue;
use crate::core::llm::AzureOpenAIChat;
use crate::core::tts::SpeechPublisher;
use crate::errors::{AppError, AppResult};
use crate::secrets::{SecretResolver, ServiceSecrets};

/// Application state shared by all handlers
///
/// Built once at startup; nothing in it changes while serving.
pub struct AppState {
    pub config: ServerConfig,
    pub dialogue: Dialogue,
    pub chat: AzureOpenAIChat,
    /// `None` when speech or storage secrets are missing
    pub speech: Option<SpeechPublisher>,
}

impl AppState {
    /// Resolve secrets (Key Vault or environment) and build the service clients.
    pub async fn new(config: ServerConfig) -> AppResult<Arc<Self>> {
        let resolver = SecretResolver::from_config(&config)
            .map_err(|e| AppError::Internal(format!("Failed to initialize secret resolver: {e}")))?;
        let secrets = ServiceSecrets::resolve(&resolver).await;

        Self::with_secrets(config, &secrets)
    }

    /// Build the state from already resolved secrets.
    pub fn with_secrets(config: ServerConfig, secrets: &ServiceSecrets) -> AppResult<Arc<Self>> {
        if secrets.openai_endpoint.is_none() || secrets.openai_api_key.is_none() {
            warn!("OPENAI_ENDPOINT or OPENAI_API_KEY not resolved; /api/voice-agent will fail");
        }

        let chat = AzureOpenAIChat::new(
            secrets.openai_endpoint.clone(),
            secrets.openai_api_key.clone(),
            config.aoai_deployment.clone(),
            config.aoai_api_version.clone(),
        )?;

        let speech = SpeechPublisher::from_secrets(&config, secrets);
        match (config.use_azure_tts, speech.is_some()) {
            (true, true) => info!("Azure speech synthesis enabled"),
            (true, false) => warn!(
                "USE_AZURE_TTS is set but SPEECH_KEY, SPEECH_REGION or STORAGE_CONN_STR is unavailable; replies will use <Say>"
            ),
            (false, _) => {}
        }

        let dialogue = Dialogue::new(config.business_name.clone());

        Ok(Arc::new(Self {
            config,
            dialogue,
            chat,
            speech,
        }))
    }
}
