//! Repo Lens - ask questions about a GitHub repository.
//!
//! Architecture:
//! - GitHub OAuth login yields a per-session access token
//! - The repository tree is walked through the contents API and formatted
//!   as context for the chat model
//! - Each question runs a tool-calling relay that fetches one source file,
//!   then the selected model answers with the recent conversation replayed

mod assistant;
mod auth;
mod cli;
mod config;
mod conversation;
mod error;
mod github;
mod llm;
mod relay;
mod server;
mod session;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{execute, Cli};
use config::Config;

fn init_logging(verbose: bool) {
    let default = if verbose { "repolens=debug" } else { "repolens=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.env_file {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    tracing::debug!(?config, "configuration loaded");

    execute(cli, config).await
}
