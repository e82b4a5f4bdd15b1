//! Per-session state passed to every operation.

use chrono::{DateTime, Utc};

use crate::auth::Credential;
use crate::config::{is_known_model, DEFAULT_MODEL};
use crate::conversation::ConversationLog;
use crate::error::{AppError, Result};
use crate::github::RepoRef;
use crate::llm::ApiKey;

/// Everything one user session owns.
#[derive(Debug)]
pub struct Session {
    /// Unique session identifier (UUIDv7).
    pub id: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    credential: Option<Credential>,
    repo: Option<RepoRef>,
    structure: String,
    api_key: Option<ApiKey>,
    model: String,
    conversation: ConversationLog,
}

impl Session {
    pub fn new(id: String) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            credential: None,
            repo: None,
            structure: String::new(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            conversation: ConversationLog::default(),
        }
    }

    pub fn set_credential(&mut self, credential: Credential) {
        self.credential = Some(credential);
    }

    pub const fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn credential(&self) -> Result<&Credential> {
        self.credential.as_ref().ok_or(AppError::NotAuthenticated)
    }

    /// Fail with `RepositoryLocked` when the session is bound to another
    /// repository.
    pub fn check_repo(&self, repo: &RepoRef) -> Result<()> {
        match &self.repo {
            Some(current) if current != repo => Err(AppError::RepositoryLocked {
                current: current.to_string(),
                requested: repo.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Bind the session to `repo`. Rebinding the same repository is allowed;
    /// switching to another one is not.
    pub fn bind_repo(&mut self, repo: RepoRef) -> Result<()> {
        self.check_repo(&repo)?;
        if self.repo.is_none() {
            tracing::info!(session = %self.id, %repo, "session bound to repository");
            self.repo = Some(repo);
        }
        Ok(())
    }

    pub fn repo(&self) -> Result<&RepoRef> {
        self.repo.as_ref().ok_or(AppError::NoRepository)
    }

    pub fn set_structure(&mut self, structure: String) {
        self.structure = structure;
    }

    /// Formatted repository tree used as model context.
    pub fn structure(&self) -> &str {
        &self.structure
    }

    pub fn set_api_key(&mut self, api_key: ApiKey) {
        self.api_key = Some(api_key);
    }

    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn api_key(&self) -> Result<&ApiKey> {
        self.api_key.as_ref().ok_or(AppError::MissingApiKey)
    }

    pub fn set_model(&mut self, model: &str) -> Result<()> {
        if !is_known_model(model) {
            return Err(AppError::UnknownModel(model.to_string()));
        }
        self.model = model.to_string();
        Ok(())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub const fn conversation(&self) -> &ConversationLog {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut ConversationLog {
        &mut self.conversation
    }
}
