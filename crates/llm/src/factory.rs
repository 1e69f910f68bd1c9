//! Model provider factory.
//!
//! Resolves a provider name plus connection settings into a shared client.
//! A Claude provider without an API key is a configuration error; the caller
//! decides whether that means failing or running in demo mode.

use crate::client::LlmClient;
use crate::providers::{claude, ollama, ClaudeClient, OllamaClient};
use crate::types::ProviderType;
use std::sync::Arc;
use std::time::Duration;

/// Connection settings for a provider. Unset fields use provider defaults.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,

    /// `anthropic-version` header (Claude only)
    pub api_version: Option<String>,

    pub timeout: Option<Duration>,
}

/// Create an LLM client for `provider` ("claude", "anthropic", "ollama").
///
/// # Errors
/// Returns a message if the provider is unknown, its API key is missing, or
/// the HTTP client cannot be built.
pub fn create_client(
    provider: &str,
    settings: &ProviderSettings,
) -> Result<Arc<dyn LlmClient>, String> {
    let provider_type =
        ProviderType::parse(provider).ok_or_else(|| format!("Unknown provider: {}", provider))?;

    let api_key = settings
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty());

    if provider_type.requires_api_key() && api_key.is_none() {
        return Err(format!(
            "{} provider requires API key",
            display_name(provider_type)
        ));
    }

    match provider_type {
        ProviderType::Ollama => {
            let base_url = settings
                .endpoint
                .as_deref()
                .unwrap_or(ollama::DEFAULT_OLLAMA_URL);
            let mut client = OllamaClient::with_base_url(base_url);
            if let Some(timeout) = settings.timeout {
                client = client.with_timeout(timeout).map_err(|e| e.to_string())?;
            }
            Ok(Arc::new(client))
        }
        ProviderType::Claude => {
            let base_url = settings
                .endpoint
                .as_deref()
                .unwrap_or(claude::DEFAULT_CLAUDE_URL);
            let mut client = ClaudeClient::with_base_url(base_url, api_key.unwrap_or_default());
            if let Some(version) = &settings.api_version {
                client = client.with_api_version(version);
            }
            if let Some(timeout) = settings.timeout {
                client = client.with_timeout(timeout).map_err(|e| e.to_string())?;
            }
            Ok(Arc::new(client))
        }
    }
}

fn display_name(provider_type: ProviderType) -> &'static str {
    match provider_type {
        ProviderType::Claude => "Claude",
        ProviderType::Ollama => "Ollama",
    }
}
