//! Access credential returned by the OAuth token exchange.

use serde::{Deserialize, Serialize};

/// GitHub access token plus the metadata returned alongside it.
///
/// Lives only in memory for the lifetime of a session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    /// Seconds until expiry, when the provider issues expiring tokens.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl Credential {
    /// Credential from a bare token (e.g. a personal access token).
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            access_token: token.into(),
            token_type: Some("bearer".to_string()),
            scope: None,
            expires_in: None,
        }
    }

    /// Value for the `Authorization` header on GitHub API calls.
    pub fn authorization_header(&self) -> String {
        format!("token {}", self.access_token)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}
