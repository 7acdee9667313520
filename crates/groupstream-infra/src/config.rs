//! Configuration loading for the Groupstream server.
//!
//! Reads a TOML settings file and fills missing API keys from the
//! environment (`OPENAI_API_KEY` / `AZURE_OPENAI_API_KEY`). Unlike
//! purely tunable settings, the file itself is required: the server
//! cannot run without a provider section.

use std::path::Path;

use anyhow::Context;
use secrecy::SecretString;

use groupstream_types::config::Settings;

/// Load settings from a TOML file and apply environment fallbacks.
pub async fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read config file {}", path.display()))?;

    let mut settings: Settings = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    apply_env_fallbacks(&mut settings);
    Ok(settings)
}

/// Fill missing API keys from the conventional environment variables.
fn apply_env_fallbacks(settings: &mut Settings) {
    if let Some(openai) = settings.openai.as_mut() {
        if openai.api_key.is_none() {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                tracing::debug!("openai.api_key taken from OPENAI_API_KEY");
                openai.api_key = Some(SecretString::from(key));
            }
        }
    }

    if let Some(azure) = settings.azure_openai.as_mut() {
        if azure.api_key.is_none() {
            if let Ok(key) = std::env::var("AZURE_OPENAI_API_KEY") {
                tracing::debug!("azure_openai.api_key taken from AZURE_OPENAI_API_KEY");
                azure.api_key = Some(SecretString::from(key));
            }
        }
    }
}
