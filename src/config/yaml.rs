use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// This structure represents the full configuration that can be loaded from a YAML file.
/// All fields are optional to allow partial configuration. Values present here
/// override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///
/// secrets:
///   keyvault_uri: "https://kv-voice-agent.vault.azure.net/"
///
/// openai:
///   deployment: "gpt-4o-mini"
///   api_version: "2024-02-15-preview"
///
/// speech:
///   use_azure_tts: true
///   voice: "en-US-JennyNeural"
///
/// dialogue:
///   action_path: "/api/call-handler"
///   language: "en-US"
///   business_name: "Aurora Healthcare"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub secrets: Option<SecretsYaml>,
    pub openai: Option<OpenAIYaml>,
    pub speech: Option<SpeechYaml>,
    pub dialogue: Option<DialogueYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Secret vault configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecretsYaml {
    /// Key Vault address, e.g. `https://kv-voice-agent-123.vault.azure.net/`
    pub keyvault_uri: Option<String>,
}

/// Azure OpenAI chat deployment from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OpenAIYaml {
    pub deployment: Option<String>,
    pub api_version: Option<String>,
}

/// Speech synthesis configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SpeechYaml {
    /// Play synthesized audio from blob storage instead of `<Say>`
    pub use_azure_tts: Option<bool>,
    pub voice: Option<String>,
    /// Full synthesis URL override (sovereign clouds, private endpoints)
    pub endpoint: Option<String>,
}

/// Dialogue configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DialogueYaml {
    pub action_path: Option<String>,
    pub language: Option<String>,
    pub business_name: Option<String>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Required fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
