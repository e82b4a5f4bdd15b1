//! GitHub OAuth authorization-code grant.

use reqwest::header::ACCEPT;
use serde::Deserialize;

use super::Credential;
use crate::config::Config;
use crate::error::{AppError, Result};

/// Query parameters GitHub appends to the redirect URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Token endpoint body; GitHub reports rejected codes as 200 with `error` set.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    scope: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Builds authorization URLs and exchanges codes for access tokens.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scope: Option<String>,
}

impl OAuthClient {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: config.github_oauth_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scope: config.oauth_scope.clone(),
        }
    }

    /// URL the user visits to grant access.
    pub fn authorization_url(&self) -> String {
        let mut url = format!(
            "{}/login/oauth/authorize?response_type=code&client_id={}&redirect_uri={}",
            self.base_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri)
        );
        if let Some(scope) = &self.scope {
            url.push_str("&scope=");
            url.push_str(&urlencoding::encode(scope));
        }
        url
    }

    /// Exchange a single-use authorization code for a [`Credential`].
    pub async fn exchange_code(&self, callback: &CallbackParams, code: &str) -> Result<Credential> {
        if let Some(error) = &callback.error {
            let detail = callback.error_description.as_deref().unwrap_or("");
            return Err(AppError::Auth(format!("{error} {detail}").trim().to_string()));
        }

        let url = format!("{}/login/oauth/access_token", self.base_url);
        let resp = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("token request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AppError::Auth(format!("token response unreadable: {e}")))?;

        if !status.is_success() {
            return Err(AppError::Auth(format!(
                "token endpoint returned {}: {body}",
                status.as_u16()
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::Auth(format!("unexpected token response: {e}")))?;

        if let Some(error) = token.error {
            let detail = token.error_description.unwrap_or_default();
            return Err(AppError::Auth(format!("{error} {detail}").trim().to_string()));
        }

        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Auth("token response had no access_token".to_string()))?;

        tracing::info!(scope = ?token.scope, "GitHub token exchange succeeded");

        Ok(Credential {
            access_token,
            token_type: token.token_type,
            scope: token.scope,
            expires_in: token.expires_in,
        })
    }
}
