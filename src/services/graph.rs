// SPDX-License-Identifier: MIT

//! Microsoft Graph drive API client.
//!
//! Thin request layer over the Graph item endpoints. Responses are passed
//! through as [`serde_json::Value`]: the gateway translates and forwards
//! upstream payloads, it does not re-model them. Upstream failures are
//! remapped to [`AppError::Upstream`] carrying the upstream status and body,
//! which the route boundary mirrors to the client. Nothing is retried.

use serde_json::Value;

use crate::config::Config;
use crate::error::AppError;

/// Item fields selected for listings and identity lookups.
pub const ITEM_SELECT: &str = "name,size,id,lastModifiedDateTime,folder,file,video,image";

/// Item fields selected for raw-download lookups.
///
/// OneDrive international rejects a bare `@microsoft.graph.downloadUrl`
/// select, so `id` and `size` ride along.
pub const DOWNLOAD_SELECT: &str = "id,size,@microsoft.graph.downloadUrl";

/// Graph API client.
#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    drive_api: String,
    auth_api: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl GraphClient {
    /// Create a new Graph client from the application configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            drive_api: config.drive_api.clone(),
            auth_api: config.auth_api.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
        }
    }

    /// URL addressing the item at an encoded path (empty string = drive root).
    pub fn item_url(&self, encoded_path: &str) -> String {
        format!("{}/root{}", self.drive_api, encoded_path)
    }

    /// Fetch an item at an encoded path with the given `select` fields.
    pub async fn get_item(
        &self,
        access_token: &str,
        encoded_path: &str,
        select: &str,
    ) -> Result<Value, AppError> {
        let response = self
            .http
            .get(self.item_url(encoded_path))
            .bearer_auth(access_token)
            .query(&[("select", select)])
            .send()
            .await
            .map_err(AppError::upstream_transport)?;

        self.check_json(response).await
    }

    /// Fetch a folder's children page. The root needs no `:` before the
    /// `/children` suffix; every other encoded path does.
    pub async fn list_children(
        &self,
        access_token: &str,
        encoded_path: &str,
        top: u32,
        skip_token: Option<&str>,
        orderby: Option<&str>,
    ) -> Result<Value, AppError> {
        let colon = if encoded_path.is_empty() { "" } else { ":" };
        let url = format!("{}{}/children", self.item_url(encoded_path), colon);

        let top = top.to_string();
        let mut query: Vec<(&str, &str)> = vec![("select", ITEM_SELECT), ("$top", &top)];
        if let Some(token) = skip_token {
            query.push(("$skipToken", token));
        }
        if let Some(order) = orderby {
            query.push(("$orderby", order));
        }

        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(&query)
            .send()
            .await
            .map_err(AppError::upstream_transport)?;

        self.check_json(response).await
    }

    /// Fetch item metadata by its opaque ID.
    pub async fn get_item_by_id(&self, access_token: &str, id: &str) -> Result<Value, AppError> {
        let url = format!("{}/items/{}", self.drive_api, id);
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(&[("select", "id,name,parentReference")])
            .send()
            .await
            .map_err(AppError::upstream_transport)?;

        self.check_json(response).await
    }

    /// Fetch the thumbnail set for an item.
    pub async fn get_thumbnails(
        &self,
        access_token: &str,
        encoded_path: &str,
    ) -> Result<Value, AppError> {
        let colon = if encoded_path.is_empty() { "" } else { ":" };
        let url = format!("{}{}/thumbnails", self.item_url(encoded_path), colon);

        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(AppError::upstream_transport)?;

        self.check_json(response).await
    }

    /// Search below the encoded root path (empty string = drive root). The
    /// query must already be sanitized and percent-encoded.
    pub async fn search(
        &self,
        access_token: &str,
        encoded_root: &str,
        encoded_query: &str,
        top: u32,
    ) -> Result<Value, AppError> {
        let colon = if encoded_root.is_empty() { "" } else { ":" };
        let url = format!(
            "{}/root{}{}/search(q='{}')",
            self.drive_api, encoded_root, colon, encoded_query
        );

        let top = top.to_string();
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(&[
                ("select", "id,name,file,folder,parentReference"),
                ("top", top.as_str()),
            ])
            .send()
            .await
            .map_err(AppError::upstream_transport)?;

        self.check_json(response).await
    }

    /// Fetch a signed download URL's content (no bearer token; the URL is
    /// pre-authenticated). Used for `.password` files and proxied downloads.
    pub async fn fetch_content(&self, url: &str) -> Result<reqwest::Response, AppError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(AppError::upstream_transport)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                status,
                body: serde_json::from_str(&body)
                    .unwrap_or_else(|_| Value::String("Internal server error.".to_string())),
            });
        }
        Ok(response)
    }

    /// Exchange a refresh token for a new token pair at the OAuth endpoint.
    ///
    /// Returns `Ok(None)` when the upstream answers 2xx but without both
    /// `access_token` and `refresh_token` (the caller treats that as
    /// unauthenticated). Transport failures and non-2xx answers are errors.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<RefreshedTokens>, AppError> {
        let response = self
            .http
            .post(&self.auth_api)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(AppError::upstream_transport)?;

        let body = self.check_json(response).await?;

        match (
            body.get("access_token").and_then(Value::as_str),
            body.get("refresh_token").and_then(Value::as_str),
        ) {
            (Some(access), Some(refresh)) => Ok(Some(RefreshedTokens {
                access_token: access.to_string(),
                refresh_token: refresh.to_string(),
                expires_in: body.get("expires_in").and_then(Value::as_u64).unwrap_or(0),
            })),
            _ => Ok(None),
        }
    }

    /// Check response status and parse the JSON body, remapping failures to
    /// the upstream status with the upstream payload (or a generic message
    /// when the body is not JSON).
    async fn check_json(&self, response: reqwest::Response) -> Result<Value, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body: serde_json::from_str(&body)
                    .unwrap_or_else(|_| Value::String("Internal server error.".to_string())),
            });
        }

        response.json().await.map_err(|e| AppError::Upstream {
            status: 500,
            body: Value::String(format!("JSON parse error: {}", e)),
        })
    }
}

/// New token pair from the OAuth token endpoint.
#[derive(Debug, Clone)]
pub struct RefreshedTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the new access token in seconds.
    pub expires_in: u64,
}

/// Sanitize a free-text search query for the Graph search grammar:
/// single quotes are doubled, angle brackets are expanded to entities, and
/// `?` / `/` (which the grammar treats specially) become spaces.
pub fn sanitise_query(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for c in query.chars() {
        match c {
            '\'' => out.push_str("''"),
            '<' => out.push_str(" &lt; "),
            '>' => out.push_str(" &gt; "),
            '?' | '/' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}
