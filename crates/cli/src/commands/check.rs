//! Check command handler.
//!
//! Audits an existing answer: extracts its citations and classifies them
//! against the whitelist without calling a model.

use super::{load_registry, print_json};
use clap::Args;
use pipewrench_compliance::{check_compliance, extract_citations};
use pipewrench_core::{config::AppConfig, AppResult};
use std::io::Read;
use std::path::PathBuf;

/// Check the citations of an existing answer
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Answer text (reads stdin when neither TEXT nor --file is given)
    #[arg(conflicts_with = "file")]
    pub text: Option<String>,

    /// Read the answer from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CheckCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing check command");

        let text = self.read_input()?;
        let registry = load_registry(config)?;

        let citations = extract_citations(&text);
        let check = check_compliance(&citations, &registry);

        if self.json {
            let output = serde_json::json!({
                "citations": citations,
                "allWhitelisted": check.all_whitelisted(),
                "status": check.status,
                "rejected": check.rejected,
                "notice": check.notice,
            });
            return print_json(&output);
        }

        for citation in &citations {
            let approved = citation
                .normalized_origin
                .as_deref()
                .is_some_and(|origin| registry.is_whitelisted(origin));
            let marker = if approved { "APPROVED" } else { "REJECTED" };
            println!("{:<9} {}", marker, citation.display_origin());
        }

        println!("Status: {}", check.status.as_str());
        if let Some(notice) = &check.notice {
            println!("\n{}", notice);
        }

        Ok(())
    }

    fn read_input(&self) -> AppResult<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }

        if let Some(path) = &self.file {
            tracing::debug!("Reading answer from {:?}", path);
            return Ok(std::fs::read_to_string(path)?);
        }

        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}
