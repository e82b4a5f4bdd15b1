//! Repo Lens web server.
//!
//! Endpoints:
//! - GET / - UI page; also the OAuth redirect target (`?code=...`)
//! - GET /login - Redirect to GitHub's authorization page
//! - GET /api/session - Session status and settings
//! - POST /api/settings - Set API key and model
//! - POST /api/repo - Bind a repository and return its structure
//! - GET /api/messages - Conversation transcript
//! - POST /api/chat - Ask a question about the repository
//!
//! API calls identify their session with the `x-session-id` header.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::assistant::RepoAssistant;
use crate::auth::{CallbackParams, OAuthClient};
use crate::config::{http_client, Config, AVAILABLE_MODELS};
use crate::conversation::ChatMessage;
use crate::error::AppError;
use crate::github::{format_structure, ContentsClient, RepoRef};
use crate::llm::{ApiKey, GroqClient};
use crate::session::{Session, SessionStore};

const SESSION_HEADER: &str = "x-session-id";

/// Shared server state.
pub struct ServerState {
    config: Config,
    http: reqwest::Client,
    oauth: OAuthClient,
    contents: ContentsClient,
    sessions: SessionStore,
}

impl ServerState {
    pub fn new(config: Config, http: reqwest::Client) -> Self {
        Self {
            oauth: OAuthClient::new(&config, http.clone()),
            contents: ContentsClient::new(&config, http.clone()),
            sessions: SessionStore::default(),
            config,
            http,
        }
    }
}

// === Request/Response Types ===

/// Error rendered inline by the UI.
#[derive(Debug)]
pub struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::Auth(_) | AppError::NotAuthenticated | AppError::UnknownSession => {
                StatusCode::UNAUTHORIZED
            }
            err if err.is_user_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        };
        if status == StatusCode::BAD_GATEWAY {
            tracing::warn!("request failed: {}", self.0);
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub authenticated: bool,
    pub repository: Option<String>,
    pub model: String,
    pub models: Vec<String>,
    pub has_api_key: bool,
    pub created_at: DateTime<Utc>,
}

impl SessionInfo {
    fn of(session: &Session) -> Self {
        Self {
            session_id: session.id.clone(),
            authenticated: session.is_authenticated(),
            repository: session.repo().ok().map(ToString::to_string),
            model: session.model().to_string(),
            models: AVAILABLE_MODELS.iter().map(ToString::to_string).collect(),
            has_api_key: session.has_api_key(),
            created_at: session.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    pub api_key: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RepoRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RepoResponse {
    pub repository: String,
    pub structure: String,
    pub status: u16,
    pub warnings: Vec<String>,
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

// === Server Lifecycle ===

/// Build the application router.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/login", get(login_handler))
        .route("/api/session", get(session_info))
        .route("/api/settings", post(update_settings))
        .route("/api/repo", post(load_repository))
        .route("/api/messages", get(list_messages))
        .route("/api/chat", post(ask))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server.
pub async fn start_server(config: Config, port: u16, open_browser: bool) -> Result<()> {
    let http = http_client().context("Failed to build HTTP client")?;
    let state = Arc::new(ServerState::new(config, http));
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    println!("Repo Lens server starting on http://localhost:{port}");
    tracing::info!(%addr, "server listening");

    if open_browser {
        if let Err(e) = open::that(format!("http://localhost:{port}")) {
            tracing::warn!("Failed to open browser: {e}");
        }
    }

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

async fn session_for(
    state: &ServerState,
    headers: &HeaderMap,
) -> std::result::Result<Arc<Mutex<Session>>, ApiError> {
    let id = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::UnknownSession)?;
    Ok(state.sessions.get(id).await?)
}

// === Handlers ===

async fn index_handler(
    State(state): State<Arc<ServerState>>,
    Query(callback): Query<CallbackParams>,
) -> Response {
    if callback.code.is_none() && callback.error.is_none() {
        return Html(include_str!("ui.html")).into_response();
    }

    tracing::debug!(state = ?callback.state, "OAuth callback received");
    let code = callback.code.clone().unwrap_or_default();
    match state.oauth.exchange_code(&callback, &code).await {
        Ok(credential) => {
            let mut session = Session::new(String::new());
            session.set_credential(credential);
            let id = state.sessions.insert(session).await;
            tracing::info!(session = %id, "login successful");
            Redirect::to(&format!("/?session={id}")).into_response()
        }
        Err(err) => {
            tracing::warn!("OAuth callback failed: {err}");
            Redirect::to(&format!(
                "/?auth_error={}",
                urlencoding::encode(&err.to_string())
            ))
            .into_response()
        }
    }
}

async fn login_handler(State(state): State<Arc<ServerState>>) -> Redirect {
    Redirect::to(&state.oauth.authorization_url())
}

async fn session_info(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> ApiResult<SessionInfo> {
    let session = session_for(&state, &headers).await?;
    let session = session.lock().await;
    Ok(Json(SessionInfo::of(&session)))
}

async fn update_settings(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(req): Json<SettingsRequest>,
) -> ApiResult<SessionInfo> {
    let session = session_for(&state, &headers).await?;
    let mut session = session.lock().await;

    if let Some(key) = req.api_key.and_then(ApiKey::new) {
        session.set_api_key(key);
    }
    if let Some(model) = req.model {
        session.set_model(&model)?;
    }
    Ok(Json(SessionInfo::of(&session)))
}

async fn load_repository(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(req): Json<RepoRequest>,
) -> ApiResult<RepoResponse> {
    let session = session_for(&state, &headers).await?;
    let mut session = session.lock().await;

    let credential = session.credential()?.clone();
    let repo = RepoRef::parse(&req.url)?;
    session.check_repo(&repo)?;

    let listing = state.contents.fetch_repository(&repo, &credential).await?;
    let structure = format_structure(&listing.entries, 0);
    // A repository whose root cannot be listed is reported but not bound.
    if !listing.root_failed() {
        session.bind_repo(repo.clone())?;
        session.set_structure(structure.clone());
    }

    Ok(Json(RepoResponse {
        repository: repo.to_string(),
        structure,
        status: listing.status,
        warnings: listing.failures.iter().map(ToString::to_string).collect(),
        truncated: listing.truncated,
    }))
}

async fn list_messages(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> ApiResult<Vec<ChatMessage>> {
    let session = session_for(&state, &headers).await?;
    let session = session.lock().await;
    Ok(Json(session.conversation().transcript().to_vec()))
}

async fn ask(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(req): Json<AskRequest>,
) -> ApiResult<AskResponse> {
    let session = session_for(&state, &headers).await?;
    let mut session = session.lock().await;

    let model = GroqClient::new(
        state.http.clone(),
        &state.config.llm_base_url,
        session.api_key()?.clone(),
    );
    let assistant = RepoAssistant::new(&model, &state.contents, &state.config.tool_model);
    let answer = assistant.ask(&mut session, &req.question).await?;
    Ok(Json(AskResponse { answer }))
}

#[cfg(test)]
mod tests;
