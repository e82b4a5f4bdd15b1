//! Runtime configuration loaded from the environment.
//!
//! A `.env` file in the working directory is honoured (see [`Config::load`]).

use std::path::Path;
use std::time::Duration;

/// Default OAuth redirect target; the server's index route handles the callback.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8501/";

/// Model used for the tool-calling relay.
pub const TOOL_CALL_MODEL: &str = "llama3-groq-70b-8192-tool-use-preview";

/// Models a user may pick for the final answer.
pub const AVAILABLE_MODELS: &[&str] = &[
    "gemma-7b-it",
    "gemma2-9b-it",
    "llama-3.1-70b-versatile",
    "llama-3.1-8b-instant",
    "llama-guard-3-8b",
    "llama3-70b-8192",
    "llama3-8b-8192",
    "mixtral-8x7b-32768",
];

/// Model selected when the user has not chosen one.
pub const DEFAULT_MODEL: &str = "llama-3.1-70b-versatile";

const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_GITHUB_OAUTH_URL: &str = "https://github.com";
const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MAX_DEPTH: usize = 32;
const DEFAULT_MAX_NODES: usize = 5_000;

/// Application configuration.
#[derive(Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Optional OAuth scope (e.g. `repo` for private repositories).
    pub oauth_scope: Option<String>,
    pub github_api_url: String,
    pub github_oauth_url: String,
    pub llm_base_url: String,
    pub tool_model: String,
    /// Deepest directory level the tree walk descends into.
    pub max_depth: usize,
    /// Entry count after which the tree walk stops entering new
    /// directories. Directories already queued are still listed.
    pub max_nodes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            oauth_scope: None,
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            github_oauth_url: DEFAULT_GITHUB_OAUTH_URL.to_string(),
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            tool_model: TOOL_CALL_MODEL.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("oauth_scope", &self.oauth_scope)
            .field("github_api_url", &self.github_api_url)
            .field("github_oauth_url", &self.github_oauth_url)
            .field("llm_base_url", &self.llm_base_url)
            .field("tool_model", &self.tool_model)
            .field("max_depth", &self.max_depth)
            .field("max_nodes", &self.max_nodes)
            .finish()
    }
}

impl Config {
    /// Load `.env` (if present) and read the configuration from the environment.
    pub fn load() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("Failed to read .env: {e}"),
        }
        Self::from_env()
    }

    /// Load a specific env file, then read the environment.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        dotenvy::from_path(path)?;
        Ok(Self::from_env())
    }

    /// Read the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_usize = |key: &str, fallback: usize| {
            get(key).map_or(fallback, |v| {
                v.trim().parse().unwrap_or_else(|_| {
                    tracing::warn!("Ignoring invalid {key}={v}");
                    fallback
                })
            })
        };

        let client_id = get("GITHUB_CLIENT_ID").unwrap_or_default();
        if client_id.is_empty() {
            tracing::warn!("GITHUB_CLIENT_ID is not set; GitHub login will fail");
        }

        Self {
            client_id,
            client_secret: get("GITHUB_CLIENT_SECRET").unwrap_or_default(),
            redirect_uri: get("REPOLENS_REDIRECT_URI").unwrap_or(defaults.redirect_uri),
            oauth_scope: get("REPOLENS_OAUTH_SCOPE"),
            github_api_url: get("REPOLENS_GITHUB_API_URL").unwrap_or(defaults.github_api_url),
            github_oauth_url: get("REPOLENS_GITHUB_OAUTH_URL")
                .unwrap_or(defaults.github_oauth_url),
            llm_base_url: get("REPOLENS_LLM_BASE_URL").unwrap_or(defaults.llm_base_url),
            tool_model: defaults.tool_model,
            max_depth: get_usize("REPOLENS_MAX_DEPTH", defaults.max_depth),
            max_nodes: get_usize("REPOLENS_MAX_NODES", defaults.max_nodes),
        }
    }
}

/// HTTP client shared by the GitHub and model clients.
///
/// GitHub rejects requests without a `User-Agent`.
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("repolens/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(120))
        .build()
}

/// Whether `model` is one of [`AVAILABLE_MODELS`].
pub fn is_known_model(model: &str) -> bool {
    AVAILABLE_MODELS.contains(&model)
}
