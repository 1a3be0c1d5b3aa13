// SPDX-License-Identifier: MIT

//! Free-text search scoped at the configured base directory.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::Result;
use crate::path::encode_path;
use crate::routes::json_with_cache;
use crate::services::graph::sanitise_query;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/search", get(get_search))
}

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

/// Search the drive below the base directory and return the raw match list.
async fn get_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<Response> {
    let query = params.q.unwrap_or_default();
    if query.is_empty() {
        // Nothing to search for; answer without touching upstream.
        return Ok(json_with_cache(
            StatusCode::OK,
            &state.config.cache_control_header,
            json!([]),
        ));
    }

    let access_token = state.tokens.get_access_token().await?;

    let encoded_root = encode_path(&state.config.base_directory, "/");
    let encoded_query = urlencoding::encode(&sanitise_query(&query)).into_owned();

    let data = state
        .graph
        .search(
            &access_token,
            &encoded_root,
            &encoded_query,
            state.config.max_items,
        )
        .await?;

    let results = data.get("value").cloned().unwrap_or_else(|| json!([]));
    Ok(json_with_cache(
        StatusCode::OK,
        &state.config.cache_control_header,
        results,
    ))
}
