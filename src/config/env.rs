use super::utils::{env_var, parse_bool};

/// Settings read from process environment variables.
///
/// Every field is optional; defaults are applied in [`super::merge`].
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub keyvault_uri: Option<String>,
    pub use_azure_tts: Option<bool>,
    pub aoai_deployment: Option<String>,
    pub aoai_api_version: Option<String>,
    pub speech_voice: Option<String>,
    pub speech_endpoint: Option<String>,
    pub call_handler_path: Option<String>,
    pub speech_language: Option<String>,
    pub business_name: Option<String>,
}

impl EnvConfig {
    /// Read the configuration from environment variables
    ///
    /// `PORT` takes precedence over `FUNCTIONS_CUSTOMHANDLER_PORT`, which the
    /// Functions host sets for custom handlers.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let port = match env_var("PORT").or_else(|| env_var("FUNCTIONS_CUSTOMHANDLER_PORT")) {
            Some(raw) => Some(
                raw.parse::<u16>()
                    .map_err(|e| format!("Invalid PORT value '{raw}': {e}"))?,
            ),
            None => None,
        };

        Ok(Self {
            host: env_var("HOST"),
            port,
            keyvault_uri: env_var("KEYVAULT_URI"),
            use_azure_tts: env_var("USE_AZURE_TTS").map(|v| parse_bool(&v)),
            aoai_deployment: env_var("AOAI_DEPLOYMENT"),
            aoai_api_version: env_var("AOAI_API_VERSION"),
            speech_voice: env_var("SPEECH_VOICE"),
            speech_endpoint: env_var("SPEECH_ENDPOINT"),
            call_handler_path: env_var("CALL_HANDLER_PATH"),
            speech_language: env_var("SPEECH_LANGUAGE"),
            business_name: env_var("BUSINESS_NAME"),
        })
    }
}
