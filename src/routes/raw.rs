// SPDX-License-Identifier: MIT

//! Raw-download endpoint: redirect to the signed download URL, or proxy the
//! bytes through the gateway for small files.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::path::{clean_path, encode_path};
use crate::routes::{auth_check_response, PROTECTED_TOKEN_HEADER};
use crate::services::graph::DOWNLOAD_SELECT;
use crate::AppState;

/// Largest file the gateway will proxy instead of redirecting (4 MiB).
const MAX_PROXY_SIZE: u64 = 4 * 1024 * 1024;

const PATH_PLACEHOLDER: &str = "[...path]";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/raw", get(get_raw))
}

#[derive(Deserialize)]
struct RawQuery {
    path: Option<String>,
    /// Hashed protected-route token (fallback when the header is absent).
    odpt: Option<String>,
    /// Proxy the bytes through the gateway instead of redirecting.
    proxy: Option<String>,
}

/// Stream or redirect a file's raw content.
async fn get_raw(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RawQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let access_token = state.tokens.get_access_token().await?;
    if access_token.is_empty() {
        return Err(AppError::NoAccessToken);
    }

    let path = params.path.unwrap_or_else(|| "/".to_string());
    if path == PATH_PLACEHOLDER {
        return Err(AppError::BadRequest("No path specified.".to_string()));
    }
    let clean = clean_path(&path);

    let odpt = params.odpt.unwrap_or_default();
    let supplied_token = headers
        .get(PROTECTED_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(&odpt);

    let check = state.guard.check(&clean, &access_token, supplied_token).await;
    if !check.passed() {
        return Ok(auth_check_response(&check, "no-cache"));
    }

    let encoded = encode_path(&state.config.base_directory, &clean);
    let data = state
        .graph
        .get_item(&access_token, &encoded, DOWNLOAD_SELECT)
        .await?;

    let Some(url) = data.get("@microsoft.graph.downloadUrl").and_then(Value::as_str) else {
        return Err(AppError::NotFound("No download URL found.".to_string()));
    };

    let proxy = params.proxy.as_deref() == Some("true");
    let size = data.get("size").and_then(Value::as_u64);

    // Only proxy raw file content for small files; everything else gets a
    // redirect to the signed URL, which the client fetches directly.
    if proxy && size.is_some_and(|s| s < MAX_PROXY_SIZE) {
        return proxy_content(&state, url).await;
    }

    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    redirect_with_cors(url, origin, &state.config.allowed_origins, "no-cache")
}

/// Stream the upstream bytes through the gateway, forwarding the upstream
/// response headers (hop-by-hop headers excluded).
async fn proxy_content(state: &AppState, url: &str) -> Result<Response> {
    let upstream = state.graph.fetch_content(url).await?;

    let mut response = Response::builder().status(StatusCode::OK);
    if let Some(response_headers) = response.headers_mut() {
        for (name, value) in upstream.headers() {
            if name == header::CONNECTION || name == header::TRANSFER_ENCODING {
                continue;
            }
            response_headers.insert(name.clone(), value.clone());
        }
        if let Ok(cache) = HeaderValue::from_str(&state.config.cache_control_header) {
            response_headers.insert(header::CACHE_CONTROL, cache);
        }
    }

    response
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build proxy response: {}", e)))
}

/// 302 redirect to a signed URL with explicit CORS headers: the request
/// origin is echoed when it is on the allow-list, so browser clients on the
/// known origins can follow the redirect from script.
pub(crate) fn redirect_with_cors(
    url: &str,
    origin: Option<&str>,
    allowed_origins: &[String],
    cache_control: &str,
) -> Result<Response> {
    let location = HeaderValue::from_str(url)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid download URL: {}", e)))?;

    let mut response = StatusCode::FOUND.into_response();
    let headers = response.headers_mut();
    headers.insert(header::LOCATION, location);
    if let Ok(cache) = HeaderValue::from_str(cache_control) {
        headers.insert(header::CACHE_CONTROL, cache);
    }

    if let Some(origin) = origin.filter(|o| allowed_origins.iter().any(|a| a == o)) {
        if let Ok(value) = HeaderValue::from_str(origin) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );

    Ok(response)
}
