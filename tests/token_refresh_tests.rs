// SPDX-License-Identifier: MIT

//! Token lifecycle against a fake OAuth endpoint: refresh happens exactly
//! once, the new pair is persisted, and subsequent requests are served from
//! the store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::routing::post;
use axum::{body::Body, http::StatusCode, Json, Router};
use drive_index::store::TokenPair;
use serde_json::json;
use tower::ServiceExt;

mod common;

fn fake_upstream(refresh_calls: Arc<AtomicUsize>) -> Router {
    Router::new()
        .route(
            "/oauth/token",
            post(move |_body: String| {
                let calls = refresh_calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Json(json!({
                        "access_token": "refreshed-access",
                        "refresh_token": "rotated-refresh",
                        "expires_in": 3600,
                    }))
                }
            }),
        )
        .fallback(|req: Request| async move {
            // Minimal drive: a root folder with no children.
            if req.uri().path().ends_with("/children") {
                Json(json!({ "value": [] }))
            } else {
                Json(json!({ "name": "root", "id": "root-id", "folder": { "childCount": 0 } }))
            }
        })
}

#[tokio::test]
async fn test_refresh_token_used_exactly_once_and_persisted() {
    let refresh_calls = Arc::new(AtomicUsize::new(0));
    let base = common::spawn_upstream(fake_upstream(refresh_calls.clone())).await;
    let (app, _state, store) = common::create_test_app(&base, vec![]);

    // Refresh token only: the access-token entry is written with a zero TTL
    // so the store has already evicted it.
    store
        .set(&TokenPair {
            access_token: "stale".to_string(),
            expires_in: 0,
            refresh_token: "old-refresh".to_string(),
        })
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .uri("/api?path=/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(refresh_calls.load(Ordering::SeqCst), 1);

    let stored = store.get().await.unwrap();
    assert_eq!(stored.access_token.as_deref(), Some("refreshed-access"));
    assert_eq!(stored.refresh_token.as_deref(), Some("rotated-refresh"));

    // Second request is served from the stored access token.
    let response = app
        .oneshot(
            axum::http::Request::builder()
                .uri("/api?path=/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_store_makes_no_refresh_call() {
    let refresh_calls = Arc::new(AtomicUsize::new(0));
    let base = common::spawn_upstream(fake_upstream(refresh_calls.clone())).await;
    let (app, _state, _store) = common::create_test_app(&base, vec![]);

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .uri("/api?path=/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(refresh_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_refresh_response_without_pair_is_unauthenticated() {
    // A 2xx answer missing the refresh token yields an empty access token,
    // which the listing endpoint reports as 403.
    let router = Router::new().route(
        "/oauth/token",
        post(|| async { Json(json!({ "access_token": "half-a-pair" })) }),
    );
    let base = common::spawn_upstream(router).await;
    let (app, _state, store) = common::create_test_app(&base, vec![]);

    store
        .set(&TokenPair {
            access_token: "stale".to_string(),
            expires_in: 0,
            refresh_token: "old-refresh".to_string(),
        })
        .await
        .unwrap();

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .uri("/api?path=/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
