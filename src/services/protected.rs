// SPDX-License-Identifier: MIT

//! Protected-route authentication.
//!
//! A configured list of path prefixes marks directories that require a
//! password before their contents are served. The secret lives in a
//! `.password` file stored at the prefix inside the drive itself, so checking
//! a protected path costs two upstream calls: item metadata for the signed
//! download URL, then the file content.
//!
//! The caller supplies a token that is already a hash of the real password
//! (computed client-side and cached there), so verification is an equality
//! check against the hashed secret. The comparison strategy is a capability
//! trait so a stronger proof-of-knowledge scheme can replace it without
//! touching call sites.

use std::sync::Arc;

use axum::http::StatusCode;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::path::encode_path;
use crate::services::GraphClient;

/// Name of the secret file inside a protected directory.
const PASSWORD_FILE: &str = ".password";

/// Outcome of a protected-route check.
///
/// Any code other than 200 halts the request and becomes the HTTP response.
/// Code 200 with a non-empty message means "authenticated via password" and
/// the response must not be cached; 200 with an empty message means the route
/// is not protected at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCheck {
    pub code: StatusCode,
    pub message: String,
}

impl AuthCheck {
    fn unprotected() -> Self {
        Self {
            code: StatusCode::OK,
            message: String::new(),
        }
    }

    fn authenticated() -> Self {
        Self {
            code: StatusCode::OK,
            message: "Authenticated.".to_string(),
        }
    }

    pub fn passed(&self) -> bool {
        self.code == StatusCode::OK
    }

    /// Whether the route is protected and the caller authenticated, in which
    /// case the response must not be served from cache.
    pub fn via_password(&self) -> bool {
        self.code == StatusCode::OK && !self.message.is_empty()
    }
}

/// Strategy for verifying a caller-supplied token against the stored secret.
pub trait TokenComparer: Send + Sync {
    fn verify(&self, stored_secret: &str, supplied_token: &str) -> bool;
}

/// Default comparer: sha256-hex of the trimmed stored secret, compared in
/// constant time against the supplied (pre-hashed) token.
pub struct HashedTokenComparer;

impl TokenComparer for HashedTokenComparer {
    fn verify(&self, stored_secret: &str, supplied_token: &str) -> bool {
        let digest = hex::encode(Sha256::digest(stored_secret.trim().as_bytes()));
        digest.as_bytes().ct_eq(supplied_token.as_bytes()).into()
    }
}

/// Protected-route authenticator.
#[derive(Clone)]
pub struct RouteGuard {
    protected_routes: Vec<String>,
    base_directory: String,
    graph: GraphClient,
    comparer: Arc<dyn TokenComparer>,
}

impl RouteGuard {
    pub fn new(protected_routes: Vec<String>, base_directory: String, graph: GraphClient) -> Self {
        Self::with_comparer(
            protected_routes,
            base_directory,
            graph,
            Arc::new(HashedTokenComparer),
        )
    }

    pub fn with_comparer(
        protected_routes: Vec<String>,
        base_directory: String,
        graph: GraphClient,
        comparer: Arc<dyn TokenComparer>,
    ) -> Self {
        Self {
            protected_routes,
            base_directory,
            graph,
            comparer,
        }
    }

    /// Resolve the `.password` path guarding `path`, or `None` when no
    /// protected prefix matches.
    ///
    /// Matching is case-insensitive (OneDrive ignores case) and compares
    /// whole path components by normalizing both sides to a trailing slash.
    /// The first match in configuration order wins, not the longest one;
    /// changing that would silently change access-control behavior.
    pub fn auth_token_path(&self, path: &str) -> Option<String> {
        let path = format!("{}/", path.to_lowercase());
        for route in &self.protected_routes {
            let route = format!("{}/", route.to_lowercase().trim_end_matches('/'));
            if path.starts_with(&route) {
                return Some(format!("{}{}", route, PASSWORD_FILE));
            }
        }
        None
    }

    /// Check whether `clean_path` may be served to a caller presenting
    /// `supplied_token`.
    ///
    /// Infallible by contract: upstream failures are folded into the
    /// returned code (404 when the `.password` file itself is missing —
    /// a misconfiguration signal distinct from "unauthenticated" — and 500
    /// for anything else).
    pub async fn check(
        &self,
        clean_path: &str,
        access_token: &str,
        supplied_token: &str,
    ) -> AuthCheck {
        let Some(secret_path) = self.auth_token_path(clean_path) else {
            return AuthCheck::unprotected();
        };

        match self.fetch_secret(access_token, &secret_path).await {
            Ok(secret) => {
                if self.comparer.verify(&secret, supplied_token) {
                    AuthCheck::authenticated()
                } else {
                    AuthCheck {
                        code: StatusCode::UNAUTHORIZED,
                        message: "Password required.".to_string(),
                    }
                }
            }
            Err(AppError::Upstream { status: 404, .. }) => AuthCheck {
                code: StatusCode::NOT_FOUND,
                message: "You haven't set a password.".to_string(),
            },
            Err(err) => {
                tracing::error!(error = %err, path = clean_path, "Protected-route check failed");
                AuthCheck {
                    code: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Internal server error.".to_string(),
                }
            }
        }
    }

    /// Download the `.password` file content (metadata fetch, then content
    /// fetch from the signed URL).
    async fn fetch_secret(&self, access_token: &str, secret_path: &str) -> Result<String, AppError> {
        let encoded = encode_path(&self.base_directory, secret_path);
        let meta = self
            .graph
            .get_item(access_token, &encoded, "@microsoft.graph.downloadUrl,file")
            .await?;

        let url = meta
            .get("@microsoft.graph.downloadUrl")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("Password file has no download URL"))
            })?;

        let content = self.graph.fetch_content(url).await?;
        content.text().await.map_err(AppError::upstream_transport)
    }
}
