//! Whitelist command handler.
//!
//! Inspects the approved-source registry.

use super::{load_registry, print_json};
use clap::{Args, Subcommand};
use pipewrench_core::{config::AppConfig, AppResult};

/// Inspect approved sources
#[derive(Args, Debug)]
pub struct WhitelistCommand {
    #[command(subcommand)]
    pub action: WhitelistAction,
}

#[derive(Subcommand, Debug)]
pub enum WhitelistAction {
    /// List approved sources
    List(WhitelistListCommand),
    /// Test URLs against the whitelist
    Test(WhitelistTestCommand),
}

impl WhitelistCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            WhitelistAction::List(cmd) => cmd.execute(config).await,
            WhitelistAction::Test(cmd) => cmd.execute(config).await,
        }
    }
}

/// List approved sources
#[derive(Args, Debug)]
pub struct WhitelistListCommand {
    /// Only print distinct domains
    #[arg(long)]
    pub domains: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl WhitelistListCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing whitelist list command");

        let registry = load_registry(config)?;

        if self.json {
            let output = serde_json::json!({
                "totalEntries": registry.len(),
                "domains": registry.domains(),
                "entries": registry.entries().collect::<Vec<_>>(),
                "overrideSource": registry.override_source(),
            });
            return print_json(&output);
        }

        if self.domains {
            for domain in registry.domains() {
                println!("{}", domain);
            }
            return Ok(());
        }

        for entry in registry.entries() {
            let scope = if entry.include_children {
                "+children"
            } else {
                "exact"
            };
            if entry.description.is_empty() {
                println!("{:<10} {}", scope, entry.origin);
            } else {
                println!("{:<10} {}  ({})", scope, entry.origin, entry.description);
            }
        }

        println!("\n{}", registry.summary());
        Ok(())
    }
}

/// Test URLs against the whitelist
#[derive(Args, Debug)]
pub struct WhitelistTestCommand {
    /// URLs to test
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl WhitelistTestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing whitelist test command for {} urls", self.urls.len());

        let registry = load_registry(config)?;
        let results: Vec<(&str, bool)> = self
            .urls
            .iter()
            .map(|url| (url.as_str(), registry.is_whitelisted(url)))
            .collect();

        if self.json {
            let output: Vec<serde_json::Value> = results
                .iter()
                .map(|(url, approved)| serde_json::json!({ "url": url, "whitelisted": approved }))
                .collect();
            return print_json(&serde_json::Value::Array(output));
        }

        for (url, approved) in results {
            let marker = if approved { "APPROVED" } else { "REJECTED" };
            println!("{:<9} {}", marker, url);
        }

        Ok(())
    }
}
