// SPDX-License-Identifier: MIT

use std::sync::Arc;

use drive_index::config::Config;
use drive_index::routes::create_router;
use drive_index::store::{TokenPair, TokenStore};
use drive_index::AppState;

/// Spawn a fake upstream (Graph / OAuth endpoint) on an ephemeral port and
/// return its base URL.
#[allow(dead_code)]
pub async fn spawn_upstream(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake upstream");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Like [`spawn_upstream`], but the router builder gets the upstream's own
/// base URL, so handlers can mint absolute (signed) download URLs pointing
/// back at the fake server.
#[allow(dead_code)]
pub async fn spawn_upstream_with<F>(make_router: F) -> String
where
    F: FnOnce(String) -> axum::Router,
{
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake upstream");
    let base = format!("http://{}", listener.local_addr().unwrap());
    let router = make_router(base.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    base
}

/// Create a test app talking to the given upstream base URL.
/// Returns the router, the shared state and a handle to the token store.
#[allow(dead_code)]
pub fn create_test_app(
    upstream_base: &str,
    protected_routes: Vec<String>,
) -> (axum::Router, Arc<AppState>, TokenStore) {
    let mut config = Config::test_default();
    config.drive_api = format!("{}/drive", upstream_base);
    config.auth_api = format!("{}/oauth/token", upstream_base);
    config.protected_routes = protected_routes;

    let store = TokenStore::in_memory();
    let state = Arc::new(AppState::new(config, store.clone()));
    (create_router(state.clone()), state, store)
}

/// Test app with an unreachable upstream, for paths that must never leave
/// the gateway.
#[allow(dead_code)]
pub fn create_offline_app() -> (axum::Router, Arc<AppState>, TokenStore) {
    create_test_app("http://127.0.0.1:1", vec![])
}

/// Seed the store with a valid token pair.
#[allow(dead_code)]
pub async fn seed_tokens(store: &TokenStore) {
    store
        .set(&TokenPair {
            access_token: "test-access-token".to_string(),
            expires_in: 3600,
            refresh_token: "test-refresh-token".to_string(),
        })
        .await
        .expect("Failed to seed tokens");
}
