// SPDX-License-Identifier: MIT

//! drive-index API server.
//!
//! Serves a OneDrive drive as a browsable file index: folder listings,
//! search, raw downloads and thumbnails, with optional per-directory
//! password protection.

use std::sync::Arc;

use drive_index::{config::Config, store::TokenStore, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting drive-index API");

    let store = TokenStore::connect(&config.redis_url)
        .await
        .expect("Failed to connect to Redis");

    let port = config.port;
    let state = Arc::new(AppState::new(config, store));

    let app = drive_index::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("drive_index=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
