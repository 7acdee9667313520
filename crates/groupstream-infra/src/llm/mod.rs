//! Completion provider implementations and startup selection.

pub mod openai_compat;

use std::sync::Arc;

use anyhow::{bail, Context};
use secrecy::ExposeSecret;

use groupstream_core::llm::SharedProvider;
use groupstream_types::config::Settings;

use self::openai_compat::OpenAiCompatibleProvider;

/// Build the completion provider from configuration.
///
/// Selection is static, decided once per process: an `[azure_openai]`
/// section takes priority over `[openai]`; with neither, startup fails.
pub fn build_provider(settings: &Settings) -> anyhow::Result<SharedProvider> {
    if let Some(azure) = &settings.azure_openai {
        let api_key = azure
            .api_key
            .as_ref()
            .context("azure_openai.api_key missing (set it or AZURE_OPENAI_API_KEY)")?;
        tracing::info!(
            endpoint = %azure.endpoint,
            deployment = %azure.deployment,
            "using Azure OpenAI completion provider"
        );
        return Ok(Arc::new(OpenAiCompatibleProvider::azure(
            &azure.endpoint,
            api_key.expose_secret(),
            &azure.deployment,
            &azure.api_version,
        )));
    }

    if let Some(openai) = &settings.openai {
        let api_key = openai
            .api_key
            .as_ref()
            .context("openai.api_key missing (set it or OPENAI_API_KEY)")?;
        tracing::info!(model = %openai.model, "using OpenAI completion provider");
        return Ok(Arc::new(OpenAiCompatibleProvider::openai(
            api_key.expose_secret(),
            &openai.model,
            openai.base_url.as_deref(),
        )));
    }

    bail!("no completion provider configured: add [azure_openai] or [openai] to the config")
}
