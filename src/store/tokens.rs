// SPDX-License-Identifier: MIT

//! OAuth token pair persistence.
//!
//! The access token is stored with a TTL equal to its `expires_in`, so expiry
//! is enforced by the store evicting the entry rather than by readers
//! comparing timestamps. The refresh token has no TTL; it is overwritten on
//! every refresh and never deleted explicitly.
//!
//! Writes are not mutually exclusive across requests: concurrent refreshes may
//! both land and the store keeps whichever write arrives last. That is an
//! accepted property of this workload.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use redis::AsyncCommands;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::store::keys;

/// A freshly obtained OAuth token pair, as written to the store.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    /// Access token lifetime in seconds, used as the store TTL.
    pub expires_in: u64,
    pub refresh_token: String,
}

/// What the store currently holds. Either entry may be absent: the access
/// token evicts on expiry, and a missing refresh token means the application
/// needs to be re-authenticated.
#[derive(Debug, Clone, Default)]
pub struct StoredTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Process-wide token store.
#[derive(Clone)]
pub struct TokenStore {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Redis(redis::aio::MultiplexedConnection),
    Memory(Arc<RwLock<MemoryTokens>>),
}

#[derive(Default)]
struct MemoryTokens {
    /// Access token with its eviction deadline.
    access_token: Option<(String, DateTime<Utc>)>,
    refresh_token: Option<String>,
}

impl TokenStore {
    /// Connect to Redis and verify connectivity.
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::Store(format!("Failed to create Redis client: {}", e)))?;

        let mut con = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Store(format!("Failed to connect to Redis: {}", e)))?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut con)
            .await
            .map_err(|e| AppError::Store(format!("Redis PING failed: {}", e)))?;
        if pong != "PONG" {
            return Err(AppError::Store(format!("Unexpected PING reply: {}", pong)));
        }

        tracing::info!("Connected to Redis token store");
        Ok(Self {
            backend: Backend::Redis(con),
        })
    }

    /// Create an in-memory store for tests. TTL eviction behaves like Redis.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(RwLock::new(MemoryTokens::default()))),
        }
    }

    /// Read the current token pair.
    pub async fn get(&self) -> Result<StoredTokens, AppError> {
        match &self.backend {
            Backend::Redis(con) => {
                let mut con = con.clone();
                let (access_token, refresh_token): (Option<String>, Option<String>) =
                    redis::pipe()
                        .get(keys::ACCESS_TOKEN)
                        .get(keys::REFRESH_TOKEN)
                        .query_async(&mut con)
                        .await
                        .map_err(|e| AppError::Store(e.to_string()))?;
                Ok(StoredTokens {
                    access_token,
                    refresh_token,
                })
            }
            Backend::Memory(inner) => {
                let inner = inner.read().await;
                let access_token = inner
                    .access_token
                    .as_ref()
                    .filter(|(_, deadline)| Utc::now() < *deadline)
                    .map(|(token, _)| token.clone());
                Ok(StoredTokens {
                    access_token,
                    refresh_token: inner.refresh_token.clone(),
                })
            }
        }
    }

    /// Persist a token pair, overwriting whatever is stored.
    pub async fn set(&self, pair: &TokenPair) -> Result<(), AppError> {
        match &self.backend {
            Backend::Redis(con) => {
                let mut con = con.clone();
                let _: () = con
                    .set_ex(keys::ACCESS_TOKEN, &pair.access_token, pair.expires_in)
                    .await
                    .map_err(|e| AppError::Store(e.to_string()))?;
                let _: () = con
                    .set(keys::REFRESH_TOKEN, &pair.refresh_token)
                    .await
                    .map_err(|e| AppError::Store(e.to_string()))?;
                Ok(())
            }
            Backend::Memory(inner) => {
                let mut inner = inner.write().await;
                let deadline = Utc::now() + Duration::seconds(pair.expires_in as i64);
                inner.access_token = Some((pair.access_token.clone(), deadline));
                inner.refresh_token = Some(pair.refresh_token.clone());
                Ok(())
            }
        }
    }
}
