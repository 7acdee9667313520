//! Configuration types for the Groupstream server.
//!
//! Deserialized from `config.toml`. Provider selection is static: the
//! `[azure_openai]` section wins when present, otherwise `[openai]` is
//! used; starting without either is an error (enforced at wiring time,
//! not here).

use secrecy::SecretString;
use serde::Deserialize;

/// Top-level server configuration.
#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,

    /// Cap on generated tokens per assistant reply.
    #[serde(default = "default_max_completion_tokens")]
    pub max_completion_tokens: u32,

    pub openai: Option<OpenAiSettings>,
    pub azure_openai: Option<AzureOpenAiSettings>,
}

/// Listen address settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// OpenAI (or any OpenAI-compatible endpoint) provider settings.
#[derive(Debug, Deserialize)]
pub struct OpenAiSettings {
    #[serde(default)]
    pub api_key: Option<SecretString>,
    pub model: String,
    /// Override the default `https://api.openai.com/v1` base URL.
    pub base_url: Option<String>,
}

/// Azure OpenAI provider settings.
#[derive(Debug, Deserialize)]
pub struct AzureOpenAiSettings {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Deployment name of the model.
    pub deployment: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_completion_tokens() -> u32 {
    1024
}

fn default_api_version() -> String {
    "2024-10-21".to_string()
}
