//! Command handlers for the PipeWrench CLI.
//!
//! This module organizes all CLI commands into separate submodules, plus the
//! start-up helpers they share.

pub mod ask;
pub mod check;
pub mod info;
pub mod profiles;
pub mod whitelist;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use check::CheckCommand;
pub use info::InfoCommand;
pub use profiles::ProfilesCommand;
pub use whitelist::WhitelistCommand;

use pipewrench_compliance::WhitelistRegistry;
use pipewrench_core::{config::AppConfig, AppResult};
use pipewrench_llm::{create_client, LlmClient, ProviderSettings};
use pipewrench_prompt::ProfileCatalog;
use std::sync::Arc;

/// Base whitelist merged with the configured override file.
pub fn load_registry(config: &AppConfig) -> AppResult<WhitelistRegistry> {
    WhitelistRegistry::load(config.compliance.whitelist_override.as_deref())
}

/// Built-in profiles merged with the workspace profile files.
pub fn load_profiles(config: &AppConfig) -> AppResult<ProfileCatalog> {
    ProfileCatalog::load(&config.workspace)
}

/// Model client for the active provider, or `None` (demo mode) when it
/// cannot be configured.
pub fn build_client(config: &AppConfig) -> Option<Arc<dyn LlmClient>> {
    let settings = ProviderSettings {
        endpoint: config.provider_endpoint(),
        api_key: config.resolve_api_key(&config.provider),
        api_version: config.provider_api_version(),
        timeout: config.provider_timeout(),
    };

    match create_client(&config.provider, &settings) {
        Ok(client) => Some(client),
        Err(reason) => {
            tracing::warn!("Model provider unavailable ({}), using demo mode", reason);
            None
        }
    }
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
