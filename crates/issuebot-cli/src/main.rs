//! CLI entry point for issuebot.
//!
//! This binary provides the `issuebot` command with subcommands for the
//! interactive chat loop, one-shot requests, and a remote-service status
//! check.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod config;
mod helpers;
mod repl;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// issuebot -- a conversational front end for your issue tracker.
#[derive(Parser)]
#[command(
    name = "issuebot",
    version,
    about = "issuebot -- turn natural-language requests into tracker operations",
    long_about = "A conversational front end that classifies what you ask for, drafts a \
                  structured issue, and dispatches it to an issue-tracker tool service."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = "issuebot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive chat loop.
    Chat,

    /// Classify and dispatch a single request, then exit.
    Ask {
        /// The request text.
        request: Vec<String>,
    },

    /// List the tools the remote service exposes.
    Status,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    helpers::init_tracing("info");

    let config = config::AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Chat => repl::cmd_chat(config).await,
        Commands::Ask { request } => repl::cmd_ask(config, request.join(" ")).await,
        Commands::Status => repl::cmd_status(config).await,
    }
}
