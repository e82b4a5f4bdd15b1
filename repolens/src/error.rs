//! Error types shared by the fetcher, OAuth, relay and server layers.

use thiserror::Error;

/// Result alias used across the library-style modules.
pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// Every failure the application can surface to a user.
#[derive(Debug, Error)]
pub enum AppError {
    /// The OAuth token exchange failed; the user has to log in again.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Non-success response from the contents API.
    #[error("Failed to fetch file: {status} - {body}")]
    Fetch { status: u16, body: String },

    /// The repository URL does not have exactly two path segments.
    #[error("The URL must be in the format 'https://github.com/owner/repo'.")]
    InvalidRepoUrl(String),

    /// A session tried to switch to a different repository.
    #[error("This session is bound to {current}; start a new session to browse {requested}")]
    RepositoryLocked { current: String, requested: String },

    #[error("Please log in with GitHub first.")]
    NotAuthenticated,

    #[error("Please enter your Groq API key in the settings to start chatting.")]
    MissingApiKey,

    #[error("Please enter a repository URL first.")]
    NoRepository,

    #[error("Please enter a question.")]
    EmptyQuestion,

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Unknown session")]
    UnknownSession,

    /// Non-success response from the chat-completions API.
    #[error("Model request failed: {status} - {body}")]
    Model { status: u16, body: String },

    /// Base64 or UTF-8 decoding of file content failed.
    #[error("Failed to decode file content: {0}")]
    Decode(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Whether the failure is caused by user input or missing setup rather
    /// than by a remote service.
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRepoUrl(_)
                | Self::RepositoryLocked { .. }
                | Self::NotAuthenticated
                | Self::MissingApiKey
                | Self::NoRepository
                | Self::EmptyQuestion
                | Self::UnknownModel(_)
        )
    }
}
