//! CLI command execution.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::assistant::RepoAssistant;
use crate::auth::{Credential, OAuthClient};
use crate::config::{http_client, Config, AVAILABLE_MODELS, DEFAULT_MODEL};
use crate::error::AppError;
use crate::github::{format_structure, ContentsClient, DirectoryListing, RepoRef};
use crate::llm::{ApiKey, GroqClient};
use crate::server;
use crate::session::Session;

use super::args::{Cli, Commands, GithubArgs, ModelArgs};

/// Execute a parsed command line against `config`.
pub async fn execute(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Serve { port, open } => server::start_server(config, port, open).await,
        Commands::Login => {
            let oauth = OAuthClient::new(&config, http_client()?);
            println!("{}", oauth.authorization_url());
            Ok(())
        }
        Commands::Tree { url, github } => print_tree(&config, &url, &github).await,
        Commands::Ask {
            url,
            github,
            model,
            question,
        } => {
            let question = question.join(" ");
            ask_once(&config, &url, &github, &model, &question).await
        }
        Commands::Chat { url, github, model } => chat(&config, &url, &github, &model).await,
        Commands::Models => {
            for model in AVAILABLE_MODELS {
                if *model == DEFAULT_MODEL {
                    println!("{model} (default)");
                } else {
                    println!("{model}");
                }
            }
            Ok(())
        }
    }
}

fn print_warnings(listing: &DirectoryListing) {
    if listing.is_complete() {
        return;
    }
    for failure in &listing.failures {
        eprintln!("warning: {failure}");
    }
    if listing.truncated {
        eprintln!("warning: listing truncated (REPOLENS_MAX_DEPTH / REPOLENS_MAX_NODES)");
    }
}

async fn print_tree(config: &Config, url: &str, github: &GithubArgs) -> Result<()> {
    let repo = RepoRef::parse(url)?;
    let contents = ContentsClient::new(config, http_client()?);
    let listing = contents
        .fetch_repository(&repo, &Credential::from_token(github.token.clone()))
        .await
        .with_context(|| format!("Failed to list {repo}"))?;

    print_warnings(&listing);
    print!("{}", format_structure(&listing.entries, 0));
    Ok(())
}

/// A session bound to `url` with its structure loaded, as the web UI would
/// have after login, settings and repository load.
async fn prepare_session(
    contents: &ContentsClient,
    url: &str,
    github: &GithubArgs,
    model: &ModelArgs,
) -> Result<Session> {
    let repo = RepoRef::parse(url)?;
    let credential = Credential::from_token(github.token.clone());

    let mut session = Session::new("cli".to_string());
    session.set_api_key(ApiKey::new(model.api_key.clone()).ok_or(AppError::MissingApiKey)?);
    session.set_model(&model.model)?;

    let listing = contents
        .fetch_repository(&repo, &credential)
        .await
        .with_context(|| format!("Failed to list {repo}"))?;
    print_warnings(&listing);
    if listing.root_failed() {
        anyhow::bail!("Failed to list {repo} (status {})", listing.status);
    }

    session.set_credential(credential);
    session.bind_repo(repo)?;
    session.set_structure(format_structure(&listing.entries, 0));
    Ok(session)
}

async fn ask_once(
    config: &Config,
    url: &str,
    github: &GithubArgs,
    model: &ModelArgs,
    question: &str,
) -> Result<()> {
    let http = http_client()?;
    let contents = ContentsClient::new(config, http.clone());
    let mut session = prepare_session(&contents, url, github, model).await?;

    let groq = GroqClient::new(http, &config.llm_base_url, session.api_key()?.clone());
    let assistant = RepoAssistant::new(&groq, &contents, &config.tool_model);
    let answer = assistant
        .ask(&mut session, question)
        .await
        .context("Failed to answer question")?;
    println!("{answer}");
    Ok(())
}

async fn chat(config: &Config, url: &str, github: &GithubArgs, model: &ModelArgs) -> Result<()> {
    let http = http_client()?;
    let contents = ContentsClient::new(config, http.clone());
    let mut session = prepare_session(&contents, url, github, model).await?;

    let groq = GroqClient::new(http, &config.llm_base_url, session.api_key()?.clone());
    let assistant = RepoAssistant::new(&groq, &contents, &config.tool_model);

    println!(
        "Chatting about {} with {} (type 'exit' to quit)",
        session.repo()?,
        session.model()
    );

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        match assistant.ask(&mut session, question).await {
            Ok(answer) => println!("{answer}\n"),
            Err(e) => eprintln!("error: {e}\n"),
        }
    }
    Ok(())
}
