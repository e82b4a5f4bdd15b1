//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_MODEL;

/// Repo Lens - Ask questions about a GitHub repository
#[derive(Parser, Debug)]
#[command(name = "repolens")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Read configuration from this env file instead of ./.env
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// GitHub access for commands that read a repository.
#[derive(Args, Debug)]
pub struct GithubArgs {
    /// GitHub access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,
}

/// Chat model selection.
#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Groq API key
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Model used for the final answer
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    pub model: String,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web UI
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8501")]
        port: u16,

        /// Open browser automatically
        #[arg(long)]
        open: bool,
    },

    /// Print the GitHub authorization URL
    Login,

    /// Print a repository's file structure
    Tree {
        /// Repository URL (https://github.com/owner/repo)
        url: String,

        #[command(flatten)]
        github: GithubArgs,
    },

    /// Ask a single question about a repository
    Ask {
        /// Repository URL (https://github.com/owner/repo)
        url: String,

        #[command(flatten)]
        github: GithubArgs,

        #[command(flatten)]
        model: ModelArgs,

        /// Question to ask
        #[arg(trailing_var_arg = true, required = true)]
        question: Vec<String>,
    },

    /// Interactive conversation about a repository
    Chat {
        /// Repository URL (https://github.com/owner/repo)
        url: String,

        #[command(flatten)]
        github: GithubArgs,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// List selectable models
    Models,
}
