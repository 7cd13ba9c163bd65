//! Configuration module for the appointment gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//! Secrets (API keys, connection strings) are not part of this configuration; they are
//! resolved separately by [`crate::secrets`] so they can come from Key Vault.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use appointment_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

pub use utils::{TRUTHY_VALUES, env_var, parse_bool};

/// Server configuration
///
/// Contains all non-secret configuration needed to run the gateway:
/// - Server settings (host, port)
/// - Key Vault address used to resolve secrets
/// - Azure OpenAI deployment selection
/// - Speech synthesis options
/// - Dialogue settings (callback path, capture language, business name)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    /// Key Vault address; when `None` secrets come from the environment
    pub keyvault_uri: Option<String>,

    /// Play synthesized audio instead of provider `<Say>`.
    /// Parsed once from `USE_AZURE_TTS` using [`TRUTHY_VALUES`].
    pub use_azure_tts: bool,

    // Azure OpenAI
    pub aoai_deployment: String,
    pub aoai_api_version: String,

    // Azure Speech
    pub speech_voice: String,
    /// Overrides `https://{region}.tts.speech.microsoft.com/cognitiveservices/v1`
    pub speech_endpoint: Option<String>,

    // Dialogue
    /// Route of the dialogue handler, also used as every callback action
    pub call_handler_path: String,
    /// Language passed to `<Gather>` for transcription
    pub speech_language: String,
    pub business_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: merge::DEFAULT_HOST.to_string(),
            port: merge::DEFAULT_PORT,
            keyvault_uri: None,
            use_azure_tts: false,
            aoai_deployment: merge::DEFAULT_AOAI_DEPLOYMENT.to_string(),
            aoai_api_version: merge::DEFAULT_AOAI_API_VERSION.to_string(),
            speech_voice: merge::DEFAULT_SPEECH_VOICE.to_string(),
            speech_endpoint: None,
            call_handler_path: merge::DEFAULT_CALL_HANDLER_PATH.to_string(),
            speech_language: merge::DEFAULT_SPEECH_LANGUAGE.to_string(),
            business_name: merge::DEFAULT_BUSINESS_NAME.to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables only
    ///
    /// The `.env` file is loaded in `main.rs` before this is called, so its values
    /// are visible here as environment variables.
    ///
    /// # Errors
    /// Returns an error if an environment variable has an invalid format or
    /// validation fails.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        validation::validate_call_handler_path(&self.call_handler_path)?;
        validation::validate_keyvault_uri(&self.keyvault_uri)?;
        Ok(())
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if secrets are resolved through Key Vault
    pub fn has_keyvault(&self) -> bool {
        self.keyvault_uri.is_some()
    }
}
