// SPDX-License-Identifier: MIT

//! Thumbnail redirects.

use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::{body::Body, Json, Router};
use serde_json::json;
use tower::ServiceExt;

mod common;

fn thumbnail_drive(has_thumbnails: bool) -> Router {
    Router::new().fallback(move |req: Request| async move {
        if req.uri().path().ends_with("/thumbnails") {
            if !has_thumbnails {
                return Json(json!({ "value": [] }));
            }
            return Json(json!({
                "value": [{
                    "large": { "url": "https://thumbs.example/large.jpg" },
                    "medium": { "url": "https://thumbs.example/medium.jpg" },
                    "small": { "url": "https://thumbs.example/small.jpg" },
                }]
            }));
        }
        Json(json!({ "name": "photo.jpg", "id": "p1", "file": {} }))
    })
}

async fn thumbnail_app(has_thumbnails: bool) -> axum::Router {
    let base = common::spawn_upstream(thumbnail_drive(has_thumbnails)).await;
    let (app, _state, store) = common::create_test_app(&base, vec![]);
    common::seed_tokens(&store).await;
    app
}

#[tokio::test]
async fn test_redirects_to_requested_size() {
    let app = thumbnail_app(true).await;

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .uri("/api/thumbnail?path=/photo.jpg&size=large")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://thumbs.example/large.jpg"
    );
}

#[tokio::test]
async fn test_size_defaults_to_medium() {
    let app = thumbnail_app(true).await;

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .uri("/api/thumbnail?path=/photo.jpg")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://thumbs.example/medium.jpg"
    );
}

#[tokio::test]
async fn test_item_without_thumbnails_is_rejected() {
    let app = thumbnail_app(false).await;

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .uri("/api/thumbnail?path=/photo.jpg&size=small")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "The item doesn't have a valid thumbnail.");
}
