// SPDX-License-Identifier: MIT

//! Listing endpoint: folder/file metadata at a logical path, plus the token
//! persistence endpoint used by the OAuth setup flow.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::reveal_obfuscated_token;
use crate::error::{AppError, Result};
use crate::path::{clean_path, encode_path};
use crate::routes::{auth_check_response, json_with_cache, raw, PROTECTED_TOKEN_HEADER};
use crate::services::graph::{DOWNLOAD_SELECT, ITEM_SELECT};
use crate::store::TokenPair;
use crate::AppState;

/// Routing artifact sent by clients whose path template never resolved.
const PATH_PLACEHOLDER: &str = "[...path]";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api", get(get_listing).post(store_tokens))
}

#[derive(Deserialize)]
struct ListingQuery {
    path: Option<String>,
    /// Presence flag: serve the raw download redirect instead of metadata.
    raw: Option<String>,
    /// Pagination cursor from a previous response.
    next: Option<String>,
    /// OData `$orderby` expression.
    sort: Option<String>,
}

/// Only field names, `asc`/`desc` keywords, spaces and commas may appear in
/// an `$orderby` expression; anything else never reaches upstream.
fn valid_sort(sort: &str) -> bool {
    sort.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == ',')
}

/// Extract the opaque skip token from an `@odata.nextLink` URL, if the
/// listing has further pages.
fn next_skip_token(folder: &Value) -> Option<String> {
    let link = folder.get("@odata.nextLink")?.as_str()?;
    let idx = link.to_lowercase().find("skiptoken=")?;
    Some(link[idx + "skiptoken=".len()..].to_string())
}

/// Serve folder listings (paginated) and file metadata.
async fn get_listing(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListingQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let path = params.path.unwrap_or_else(|| "/".to_string());
    if path == PATH_PLACEHOLDER {
        return Err(AppError::BadRequest("No path specified.".to_string()));
    }

    let sort = params.sort.unwrap_or_default();
    if !valid_sort(&sort) {
        return Err(AppError::BadRequest("Sort query invalid.".to_string()));
    }

    let clean = clean_path(&path);

    let access_token = state.tokens.get_access_token().await?;
    if access_token.is_empty() {
        return Err(AppError::NoAccessToken);
    }

    let supplied_token = headers
        .get(PROTECTED_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let check = state.guard.check(&clean, &access_token, supplied_token).await;
    if !check.passed() {
        return Ok(auth_check_response(&check, &state.config.cache_control_header));
    }

    // Protected routes are not allowed to serve from cache.
    let cache_control = if check.via_password() {
        "no-cache"
    } else {
        state.config.cache_control_header.as_str()
    };

    let encoded = encode_path(&state.config.base_directory, &clean);

    // Legacy raw link: redirect straight to the signed download URL.
    if params.raw.is_some() {
        let data = state
            .graph
            .get_item(&access_token, &encoded, DOWNLOAD_SELECT)
            .await?;
        let Some(url) = data.get("@microsoft.graph.downloadUrl").and_then(Value::as_str)
        else {
            return Err(AppError::NotFound("No download url found.".to_string()));
        };

        let origin = headers.get(axum::http::header::ORIGIN).and_then(|v| v.to_str().ok());
        return raw::redirect_with_cors(url, origin, &state.config.allowed_origins, "no-cache");
    }

    let identity = state
        .graph
        .get_item(&access_token, &encoded, ITEM_SELECT)
        .await?;

    if identity.get("folder").is_some() {
        let folder = state
            .graph
            .list_children(
                &access_token,
                &encoded,
                state.config.max_items,
                params.next.as_deref().filter(|s| !s.is_empty()),
                Some(&sort).filter(|s| !s.is_empty()).map(String::as_str),
            )
            .await?;

        let body = match next_skip_token(&folder) {
            Some(next) => json!({ "folder": folder, "next": next }),
            None => json!({ "folder": folder }),
        };
        return Ok(json_with_cache(StatusCode::OK, cache_control, body));
    }

    Ok(json_with_cache(
        StatusCode::OK,
        cache_control,
        json!({ "file": identity }),
    ))
}

/// Persist a token pair acquired by the OAuth setup flow. Tokens arrive
/// obfuscated; either failing to reveal is a 400.
async fn store_tokens(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    let invalid = || AppError::BadRequest("Invalid request body".to_string());

    let access_token = body
        .get("obfuscatedAccessToken")
        .and_then(Value::as_str)
        .and_then(reveal_obfuscated_token)
        .ok_or_else(invalid)?;
    let refresh_token = body
        .get("obfuscatedRefreshToken")
        .and_then(Value::as_str)
        .and_then(reveal_obfuscated_token)
        .ok_or_else(invalid)?;
    let expires_in = body
        .get("accessTokenExpiry")
        .and_then(Value::as_u64)
        .ok_or_else(invalid)?;

    state
        .tokens
        .store_tokens(&TokenPair {
            access_token,
            expires_in,
            refresh_token,
        })
        .await?;

    Ok(Json(json!({ "message": "OK" })))
}
