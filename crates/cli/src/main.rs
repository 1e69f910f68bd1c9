//! PipeWrench CLI
//!
//! Main entry point for the pipewrench command-line tool.
//! Answers public works questions and audits their citations against the
//! approved-source whitelist.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{AskCommand, CheckCommand, InfoCommand, ProfilesCommand, WhitelistCommand};
use pipewrench_core::{config::AppConfig, logging, AppError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Instrument;

/// PipeWrench - citation-checked answers for public works teams
#[derive(Parser, Debug)]
#[command(name = "pipewrench")]
#[command(about = "Citation-checked answers for public works teams", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Model provider (claude, ollama)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question with optional document context
    Ask(AskCommand),

    /// Check the citations of an existing answer
    Check(CheckCommand),

    /// Inspect approved sources
    Whitelist(WhitelistCommand),

    /// List department and role profiles
    Profiles(ProfilesCommand),

    /// Show system information
    Info(InfoCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load defaults, config file and environment
    let config = AppConfig::load_with(cli.workspace.clone(), cli.config.clone())
        .context("Failed to load configuration")?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    config.validate()?;

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    let command = cli.command;
    let command_name = match &command {
        Commands::Ask(_) => "ask",
        Commands::Check(_) => "check",
        Commands::Whitelist(_) => "whitelist",
        Commands::Profiles(_) => "profiles",
        Commands::Info(_) => "info",
    };
    let span = tracing::info_span!("command", name = command_name);

    // Route to command handlers
    let result = async {
        match command {
            Commands::Ask(cmd) => cmd.execute(&config).await,
            Commands::Check(cmd) => cmd.execute(&config).await,
            Commands::Whitelist(cmd) => cmd.execute(&config).await,
            Commands::Profiles(cmd) => cmd.execute(&config).await,
            Commands::Info(cmd) => cmd.execute(&config).await,
        }
    }
    .instrument(span)
    .await;

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::debug!("Command failed: {}", e),
    }

    Ok(result?)
}

/// Print a failure for the user. Provider failures get a service-style message.
fn report(error: &anyhow::Error) {
    match error.downcast_ref::<AppError>() {
        Some(AppError::Provider(reason)) => {
            eprintln!("The assistant is temporarily unavailable: {}", reason);
        }
        _ => eprintln!("Error: {:#}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_with_documents() {
        let cli = Cli::try_parse_from([
            "pipewrench",
            "ask",
            "What PPE is required?",
            "-d",
            "sop.txt",
            "--document",
            "permit.txt",
            "--department",
            "water_wastewater",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Ask(cmd) => {
                assert_eq!(cmd.question, "What PPE is required?");
                assert_eq!(cmd.documents.len(), 2);
                assert_eq!(cmd.department.as_deref(), Some("water_wastewater"));
                assert!(cmd.json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_whitelist_test_requires_url() {
        assert!(Cli::try_parse_from(["pipewrench", "whitelist", "test"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["pipewrench", "info", "--provider", "ollama", "--verbose"])
            .unwrap();
        assert_eq!(cli.provider.as_deref(), Some("ollama"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_report_provider_error_downcasts() {
        let error = anyhow::Error::from(AppError::Provider("timeout".to_string()));
        assert!(matches!(
            error.downcast_ref::<AppError>(),
            Some(AppError::Provider(_))
        ));
    }
}
