// SPDX-License-Identifier: MIT

//! Thumbnail endpoint: redirect to the upstream thumbnail URL for a given
//! size class.

use std::sync::Arc;

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
use crate::AppState;

const PATH_PLACEHOLDER: &str = "[...path]";

/// Thumbnail size classes the upstream provides.
const THUMBNAIL_SIZES: [&str; 3] = ["large", "medium", "small"];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/thumbnail", get(get_thumbnail))
}

#[derive(Deserialize)]
struct ThumbnailQuery {
    path: Option<String>,
    size: Option<String>,
    odpt: Option<String>,
}

/// Redirect to the item's thumbnail in the requested size.
async fn get_thumbnail(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ThumbnailQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let access_token = state.tokens.get_access_token().await?;
    if access_token.is_empty() {
        return Err(AppError::NoAccessToken);
    }

    let size = params.size.unwrap_or_else(|| "medium".to_string());
    if !THUMBNAIL_SIZES.contains(&size.as_str()) {
        return Err(AppError::BadRequest("Invalid size".to_string()));
    }

    let path = params.path.unwrap_or_default();
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
        return Ok(auth_check_response(&check, &state.config.cache_control_header));
    }

    let cache_control = if check.via_password() {
        "no-cache"
    } else {
        state.config.cache_control_header.as_str()
    };

    let encoded = encode_path(&state.config.base_directory, &clean);
    let data = state.graph.get_thumbnails(&access_token, &encoded).await?;

    let thumbnail_url = data
        .get("value")
        .and_then(Value::as_array)
        .and_then(|sets| sets.first())
        .and_then(|set| set.get(&size))
        .and_then(|t| t.get("url"))
        .and_then(Value::as_str);

    let Some(url) = thumbnail_url else {
        return Err(AppError::BadRequest(
            "The item doesn't have a valid thumbnail.".to_string(),
        ));
    };

    let location = HeaderValue::from_str(url)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid thumbnail URL: {}", e)))?;

    let mut response = StatusCode::FOUND.into_response();
    response.headers_mut().insert(header::LOCATION, location);
    if let Ok(cache) = HeaderValue::from_str(cache_control) {
        response.headers_mut().insert(header::CACHE_CONTROL, cache);
    }
    Ok(response)
}
