//! Helpers for tests that need a real HTTP peer.

use axum::Router;
use tokio::net::TcpListener;

/// Serve the router returned by `build` on an ephemeral local port.
///
/// `build` receives the server's base URL so handlers can emit absolute links.
pub async fn spawn_server(build: impl FnOnce(String) -> Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let router = build(base.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    base
}
