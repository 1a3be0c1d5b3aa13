// SPDX-License-Identifier: MIT

//! drive-index: expose a OneDrive drive as a browsable, shareable file index.
//!
//! This crate is the API gateway between public HTTP requests and the
//! Microsoft Graph drive API: OAuth token lifecycle, path-to-resource
//! encoding, per-directory password protection, and the listing / search /
//! raw-download request pipeline. Page rendering and previews live in a
//! separate frontend that only consumes this gateway's HTTP contract.

pub mod config;
pub mod error;
pub mod path;
pub mod routes;
pub mod services;
pub mod store;

use config::Config;
use services::{GraphClient, RouteGuard, TokenManager};
use store::TokenStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub graph: GraphClient,
    pub tokens: TokenManager,
    pub guard: RouteGuard,
}

impl AppState {
    /// Wire up the state from configuration and a connected token store.
    pub fn new(config: Config, store: TokenStore) -> Self {
        let graph = GraphClient::new(&config);
        let tokens = TokenManager::new(store, graph.clone());
        let guard = RouteGuard::new(
            config.protected_routes.clone(),
            config.base_directory.clone(),
            graph.clone(),
        );
        Self {
            config,
            graph,
            tokens,
            guard,
        }
    }
}
