//! Info command handler.
//!
//! Prints a snapshot of the configured system: whitelist, profiles and
//! model provider.

use super::{load_profiles, load_registry, print_json};
use clap::Args;
use pipewrench_core::{config::AppConfig, AppResult};

/// Show system information
#[derive(Args, Debug)]
pub struct InfoCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl InfoCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing info command");

        let registry = load_registry(config)?;
        let catalog = load_profiles(config)?;
        let api_key_configured = config.resolve_api_key(&config.provider).is_some();
        let summary = registry.summary();

        if self.json {
            let output = serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "provider": config.provider,
                "model": config.model,
                "apiKeyConfigured": api_key_configured,
                "maxContextChars": config.compliance.max_context_chars,
                "maxTokens": config.compliance.max_tokens,
                "whitelist": {
                    "totalEntries": summary.total_entries,
                    "domainCount": summary.domain_count,
                    "domains": registry.domains(),
                    "overrideSource": registry.override_source(),
                },
                "departments": catalog.departments().map(|d| &d.id).collect::<Vec<_>>(),
                "roles": catalog.roles().map(|r| &r.id).collect::<Vec<_>>(),
            });
            return print_json(&output);
        }

        println!("PipeWrench {}", env!("CARGO_PKG_VERSION"));
        println!("Provider:          {}", config.provider);
        println!("Model:             {}", config.model);
        println!(
            "API key:           {}",
            if api_key_configured {
                "configured"
            } else {
                "not configured"
            }
        );
        println!("Max context chars: {}", config.compliance.max_context_chars);
        println!("Max answer tokens: {}", config.compliance.max_tokens);
        println!("Departments:       {}", catalog.department_count());
        println!("Roles:             {}", catalog.role_count());
        if let Some(source) = registry.override_source() {
            println!("Whitelist override: {}", source.display());
        }
        println!("\nWhitelist:\n{}", summary);

        Ok(())
    }
}
