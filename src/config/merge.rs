use super::ServerConfig;
use super::env::EnvConfig;
use super::yaml::YamlConfig;

pub(crate) const DEFAULT_HOST: &str = "0.0.0.0";
pub(crate) const DEFAULT_PORT: u16 = 3001;
pub(crate) const DEFAULT_AOAI_DEPLOYMENT: &str = "gpt-4o-mini";
pub(crate) const DEFAULT_AOAI_API_VERSION: &str = "2024-02-15-preview";
pub(crate) const DEFAULT_SPEECH_VOICE: &str = "en-US-JennyNeural";
pub(crate) const DEFAULT_CALL_HANDLER_PATH: &str = "/api/call-handler";
pub(crate) const DEFAULT_SPEECH_LANGUAGE: &str = "en-US";
pub(crate) const DEFAULT_BUSINESS_NAME: &str = "Aurora Healthcare";

/// Merge environment variables (base) with optional YAML overrides.
///
/// Priority: YAML > environment > defaults.
pub fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let env = EnvConfig::load()?;
    let yaml = yaml.unwrap_or_default();

    let server = yaml.server.unwrap_or_default();
    let secrets = yaml.secrets.unwrap_or_default();
    let openai = yaml.openai.unwrap_or_default();
    let speech = yaml.speech.unwrap_or_default();
    let dialogue = yaml.dialogue.unwrap_or_default();

    Ok(ServerConfig {
        host: server
            .host
            .or(env.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: server.port.or(env.port).unwrap_or(DEFAULT_PORT),
        keyvault_uri: secrets.keyvault_uri.or(env.keyvault_uri),
        use_azure_tts: speech.use_azure_tts.or(env.use_azure_tts).unwrap_or(false),
        aoai_deployment: openai
            .deployment
            .or(env.aoai_deployment)
            .unwrap_or_else(|| DEFAULT_AOAI_DEPLOYMENT.to_string()),
        aoai_api_version: openai
            .api_version
            .or(env.aoai_api_version)
            .unwrap_or_else(|| DEFAULT_AOAI_API_VERSION.to_string()),
        speech_voice: speech
            .voice
            .or(env.speech_voice)
            .unwrap_or_else(|| DEFAULT_SPEECH_VOICE.to_string()),
        speech_endpoint: speech.endpoint.or(env.speech_endpoint),
        call_handler_path: dialogue
            .action_path
            .or(env.call_handler_path)
            .unwrap_or_else(|| DEFAULT_CALL_HANDLER_PATH.to_string()),
        speech_language: dialogue
            .language
            .or(env.speech_language)
            .unwrap_or_else(|| DEFAULT_SPEECH_LANGUAGE.to_string()),
        business_name: dialogue
            .business_name
            .or(env.business_name)
            .unwrap_or_else(|| DEFAULT_BUSINESS_NAME.to_string()),
    })
}
