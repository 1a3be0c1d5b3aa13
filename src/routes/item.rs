// SPDX-License-Identifier: MIT

//! Item-by-ID lookup, used by the rename/share affordances.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::routes::json_with_cache;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/item", get(get_item))
}

#[derive(Deserialize)]
struct ItemQuery {
    id: Option<String>,
}

/// Fetch item metadata by its opaque drive item ID.
async fn get_item(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ItemQuery>,
) -> Result<Response> {
    let access_token = state.tokens.get_access_token().await?;

    let id = params
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Invalid driveItem ID.".to_string()))?;

    let item = state.graph.get_item_by_id(&access_token, &id).await?;

    Ok(json_with_cache(
        StatusCode::OK,
        &state.config.cache_control_header,
        item,
    ))
}
