use super::*;
use crate::test_support::spawn_server;
use axum::extract::{Form, Path};
use reqwest::header::LOCATION;
use serde_json::{json, Value};
use std::collections::HashMap;

async fn token_endpoint(Form(form): Form<HashMap<String, String>>) -> Json<Value> {
    if form.get("code").map(String::as_str) == Some("good-code") {
        Json(json!({"access_token": "gho_test", "token_type": "bearer", "scope": ""}))
    } else {
        Json(json!({"error": "bad_verification_code", "error_description": "expired"}))
    }
}

async fn root_listing(Path((_owner, repo)): Path<(String, String)>) -> Response {
    if repo == "widgets" {
        Json(json!([{"type": "file", "path": "README.md"}])).into_response()
    } else {
        (StatusCode::NOT_FOUND, r#"{"message":"Not Found"}"#).into_response()
    }
}

async fn readme() -> Json<Value> {
    // "# Widgets\n"
    Json(json!({"type": "file", "path": "README.md", "content": "IyBXaWRn\nZXRzCg==\n"}))
}

/// Calls the tool when tools are offered, summarizes the tool result on the
/// relay's second call, and otherwise reports which model answered.
async fn completions(Json(body): Json<Value>) -> Json<Value> {
    let messages = body["messages"].as_array().cloned().unwrap_or_default();
    let message = if body.get("tools").is_some() {
        json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": {"name": "fetch_file_source_code", "arguments": "{\"file_path\":\"README.md\"}"}
            }]
        })
    } else if let Some(tool) = messages.iter().find(|m| m["role"] == "tool") {
        json!({"role": "assistant", "content": format!("relay saw {}", tool["content"].as_str().unwrap_or(""))})
    } else {
        let prompt = messages.last().and_then(|m| m["content"].as_str()).unwrap_or("");
        json!({
            "role": "assistant",
            "content": format!("{} | {}", body["model"].as_str().unwrap_or(""), prompt.contains("relay saw # Widgets"))
        })
    };
    Json(json!({"choices": [{"index": 0, "message": message}]}))
}

async fn upstream_stub() -> String {
    spawn_server(|_| {
        Router::new()
            .route("/login/oauth/access_token", post(token_endpoint))
            .route("/repos/{owner}/{repo}/contents/", get(root_listing))
            .route("/repos/{owner}/{repo}/contents/README.md", get(readme))
            .route("/chat/completions", post(completions))
    })
    .await
}

async fn app() -> String {
    let upstream = upstream_stub().await;
    let config = Config {
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        github_api_url: upstream.clone(),
        github_oauth_url: upstream.clone(),
        llm_base_url: upstream,
        ..Config::default()
    };
    let state = Arc::new(ServerState::new(config, reqwest::Client::new()));
    spawn_server(|_| router(state)).await
}

fn no_redirects() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

async fn login(client: &reqwest::Client, base: &str) -> String {
    let resp = client
        .get(format!("{base}/?code=good-code&state=xyz"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_redirection());
    let location = resp.headers()[LOCATION].to_str().unwrap().to_string();
    location
        .strip_prefix("/?session=")
        .expect("session redirect")
        .to_string()
}

#[tokio::test]
async fn index_serves_ui() {
    let base = app().await;
    let resp = no_redirects().get(&base).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Repo Lens"));
}

#[tokio::test]
async fn login_redirects_to_authorization_page() {
    let base = app().await;
    let resp = no_redirects()
        .get(format!("{base}/login"))
        .send()
        .await
        .unwrap();
    let location = resp.headers()[LOCATION].to_str().unwrap();
    assert!(location.contains("/login/oauth/authorize?response_type=code&client_id=client"));
}

#[tokio::test]
async fn failed_callback_reports_error() {
    let base = app().await;
    let resp = no_redirects()
        .get(format!("{base}/?code=stale"))
        .send()
        .await
        .unwrap();
    let location = resp.headers()[LOCATION].to_str().unwrap();
    assert!(location.starts_with("/?auth_error="));
    assert!(location.contains("bad_verification_code"));
}

#[tokio::test]
async fn api_requires_known_session() {
    let base = app().await;
    let client = no_redirects();

    let missing = client
        .get(format!("{base}/api/session"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let unknown = client
        .get(format!("{base}/api/session"))
        .header(SESSION_HEADER, "nope")
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let body: Value = unknown.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn full_chat_flow() {
    let base = app().await;
    let client = no_redirects();
    let session = login(&client, &base).await;

    let info: SessionInfo = client
        .get(format!("{base}/api/session"))
        .header(SESSION_HEADER, &session)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(info.authenticated);
    assert!(!info.has_api_key);
    assert_eq!(info.models.len(), AVAILABLE_MODELS.len());

    // No key yet.
    let resp = client
        .post(format!("{base}/api/chat"))
        .header(SESSION_HEADER, &session)
        .json(&json!({"question": "What is this?"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let info: SessionInfo = client
        .post(format!("{base}/api/settings"))
        .header(SESSION_HEADER, &session)
        .json(&json!({"api_key": "gsk_test", "model": "llama3-8b-8192"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(info.has_api_key);
    assert_eq!(info.model, "llama3-8b-8192");

    let bad = client
        .post(format!("{base}/api/repo"))
        .header(SESSION_HEADER, &session)
        .json(&json!({"url": "https://github.com/acme"}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    let repo: RepoResponse = client
        .post(format!("{base}/api/repo"))
        .header(SESSION_HEADER, &session)
        .json(&json!({"url": "https://github.com/acme/widgets"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(repo.repository, "acme/widgets");
    assert_eq!(repo.structure, "├── 📄 README.md\n");
    assert_eq!(repo.status, 200);
    assert!(repo.warnings.is_empty());

    let locked = client
        .post(format!("{base}/api/repo"))
        .header(SESSION_HEADER, &session)
        .json(&json!({"url": "https://github.com/acme/gadgets"}))
        .send()
        .await
        .unwrap();
    assert_eq!(locked.status(), StatusCode::BAD_REQUEST);

    let reply: AskResponse = client
        .post(format!("{base}/api/chat"))
        .header(SESSION_HEADER, &session)
        .json(&json!({"question": "What does the README say?"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reply.answer, "llama3-8b-8192 | true");

    let transcript: Vec<ChatMessage> = client
        .get(format!("{base}/api/messages"))
        .header(SESSION_HEADER, &session)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].content, "What does the README say?");
    assert_eq!(transcript[1].content, reply.answer);
}

#[tokio::test]
async fn misspelled_repository_does_not_lock_session() {
    let base = app().await;
    let client = no_redirects();
    let session = login(&client, &base).await;

    let missing: RepoResponse = client
        .post(format!("{base}/api/repo"))
        .header(SESSION_HEADER, &session)
        .json(&json!({"url": "https://github.com/acme/widgtes"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(missing.status, 404);
    assert_eq!(missing.structure, "");
    assert_eq!(missing.warnings.len(), 1);

    let info: SessionInfo = client
        .get(format!("{base}/api/session"))
        .header(SESSION_HEADER, &session)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info.repository, None);

    let resp = client
        .post(format!("{base}/api/repo"))
        .header(SESSION_HEADER, &session)
        .json(&json!({"url": "https://github.com/acme/widgets"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let repo: RepoResponse = resp.json().await.unwrap();
    assert_eq!(repo.repository, "acme/widgets");
    assert_eq!(repo.structure, "├── 📄 README.md\n");
}
