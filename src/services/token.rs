// SPDX-License-Identifier: MIT

//! OAuth access-token lifecycle.
//!
//! Returns a usable access token for upstream calls, refreshing through the
//! OAuth endpoint when the stored one has evicted. An empty string means
//! "not authenticated" and short-circuits without any network call.

use crate::error::AppError;
use crate::services::GraphClient;
use crate::store::{TokenPair, TokenStore};

/// Manages the process-wide token pair.
///
/// Refresh is intentionally not mutually exclusive: concurrent requests may
/// both refresh and the store keeps the last write. Stale-token eviction is
/// the store's job (TTL on the access-token entry), so a stored access token
/// is returned as-is without re-checking its expiry here.
#[derive(Clone)]
pub struct TokenManager {
    store: TokenStore,
    graph: GraphClient,
}

impl TokenManager {
    pub fn new(store: TokenStore, graph: GraphClient) -> Self {
        Self { store, graph }
    }

    /// Get an access token for the Graph API, or an empty string when the
    /// application is not authenticated.
    ///
    /// Upstream failures during refresh propagate to the route boundary and
    /// surface as 500-class responses; they are not retried.
    pub async fn get_access_token(&self) -> Result<String, AppError> {
        let stored = self.store.get().await?;

        if let Some(access_token) = stored.access_token {
            tracing::debug!("Access token served from store");
            return Ok(access_token);
        }

        let Some(refresh_token) = stored.refresh_token else {
            tracing::debug!("No refresh token stored, returning empty access token");
            return Ok(String::new());
        };

        let Some(refreshed) = self.graph.refresh_token(&refresh_token).await? else {
            tracing::warn!("Token endpoint answered without a usable token pair");
            return Ok(String::new());
        };

        self.store
            .set(&TokenPair {
                access_token: refreshed.access_token.clone(),
                expires_in: refreshed.expires_in,
                refresh_token: refreshed.refresh_token,
            })
            .await?;

        tracing::info!("Access token refreshed and stored");
        Ok(refreshed.access_token)
    }

    /// Persist a token pair obtained out-of-band (the OAuth setup flow posts
    /// it to `POST /api`).
    pub async fn store_tokens(&self, pair: &TokenPair) -> Result<(), AppError> {
        self.store.set(pair).await
    }
}
