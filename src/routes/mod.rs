// SPDX-License-Identifier: MIT

//! HTTP route handlers.

pub mod api;
pub mod item;
pub mod raw;
pub mod search;
pub mod thumbnail;

use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::services::AuthCheck;
use crate::AppState;

/// Header carrying the client-side hashed password for protected routes.
pub const PROTECTED_TOKEN_HEADER: &str = "od-protected-token";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - only origins from the configured allow-list are reflected
    let allowed_origins = state.config.allowed_origins.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                allowed_origins.iter().any(|o| o == origin_str)
            },
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(PROTECTED_TOKEN_HEADER),
        ]);

    Router::new()
        .route("/health", get(health_check))
        .merge(api::routes())
        .merge(raw::routes())
        .merge(item::routes())
        .merge(search::routes())
        .merge(thumbnail::routes())
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// JSON response with an explicit `Cache-Control` header.
pub(crate) fn json_with_cache(status: StatusCode, cache_control: &str, body: Value) -> Response {
    let mut response = (status, Json(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(cache_control) {
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, value);
    }
    response
}

/// Response for a failed protected-route check: the check's code and message,
/// carrying the caching policy the handler had already decided on.
pub(crate) fn auth_check_response(check: &AuthCheck, cache_control: &str) -> Response {
    json_with_cache(
        check.code,
        cache_control,
        json!({ "error": check.message }),
    )
}
