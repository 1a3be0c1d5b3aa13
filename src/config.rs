// SPDX-License-Identifier: MIT

//! Application configuration loaded from environment variables.
//!
//! Everything is loaded once at startup into an immutable [`Config`] that is
//! passed explicitly to the components that need it. The OAuth client secret
//! is stored obfuscated (reversibly encoded, not encrypted) and revealed here,
//! so the plaintext only ever lives in memory.

use std::env;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// Default `Cache-Control` value for unprotected, successful responses.
const DEFAULT_CACHE_CONTROL: &str = "max-age=0, s-maxage=60, stale-while-revalidate";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Base directory inside the drive that the index is rooted at
    pub base_directory: String,
    /// OAuth client ID (public)
    pub client_id: String,
    /// OAuth client secret, already revealed from its obfuscated form
    pub client_secret: String,
    /// OAuth redirect URI registered with the identity provider
    pub redirect_uri: String,
    /// OAuth token endpoint URL
    pub auth_api: String,
    /// Graph drive API base URL (e.g. `https://graph.microsoft.com/v1.0/me/drive`)
    pub drive_api: String,
    /// `Cache-Control` header value for unprotected responses
    pub cache_control_header: String,
    /// Page size cap for folder listings and search results
    pub max_items: u32,
    /// Protected path prefixes, matched first-match-wins in this order
    pub protected_routes: Vec<String>,
    /// Origins allowed by CORS on raw/redirect responses
    pub allowed_origins: Vec<String>,
    /// Redis connection URL for the token store
    pub redis_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let obfuscated_secret = env::var("ONEDRIVE_CLIENT_SECRET")
            .map_err(|_| ConfigError::Missing("ONEDRIVE_CLIENT_SECRET"))?;
        let client_secret = reveal_obfuscated_token(obfuscated_secret.trim())
            .ok_or(ConfigError::Invalid("ONEDRIVE_CLIENT_SECRET"))?;

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            base_directory: env::var("BASE_DIRECTORY").unwrap_or_else(|_| "/".to_string()),
            client_id: env::var("ONEDRIVE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("ONEDRIVE_CLIENT_ID"))?,
            client_secret,
            redirect_uri: env::var("REDIRECT_URI")
                .unwrap_or_else(|_| "http://localhost".to_string()),
            auth_api: env::var("AUTH_API_URL").unwrap_or_else(|_| {
                "https://login.microsoftonline.com/common/oauth2/v2.0/token".to_string()
            }),
            drive_api: env::var("DRIVE_API_URL")
                .unwrap_or_else(|_| "https://graph.microsoft.com/v1.0/me/drive".to_string()),
            cache_control_header: env::var("CACHE_CONTROL_HEADER")
                .unwrap_or_else(|_| DEFAULT_CACHE_CONTROL.to_string()),
            max_items: env::var("MAX_ITEMS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(100),
            protected_routes: parse_list(env::var("PROTECTED_ROUTES").ok().as_deref()),
            allowed_origins: parse_list(env::var("ALLOWED_ORIGINS").ok().as_deref()),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            base_directory: "/".to_string(),
            client_id: "test_client_id".to_string(),
            client_secret: "test_client_secret".to_string(),
            redirect_uri: "http://localhost".to_string(),
            auth_api: "http://127.0.0.1:1/oauth/token".to_string(),
            drive_api: "http://127.0.0.1:1/drive".to_string(),
            cache_control_header: DEFAULT_CACHE_CONTROL.to_string(),
            max_items: 100,
            protected_routes: vec![],
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "https://mozilla.github.io".to_string(),
            ],
            redis_url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

/// Split a comma-separated env value into trimmed, non-empty entries.
fn parse_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Reveal an obfuscated token (base64 of the plaintext).
///
/// Returns `None` when the value is not valid base64-encoded UTF-8. Used for
/// the client secret at startup and for the token pair posted by the OAuth
/// setup flow.
pub fn reveal_obfuscated_token(obfuscated: &str) -> Option<String> {
    let bytes = BASE64.decode(obfuscated.as_bytes()).ok()?;
    String::from_utf8(bytes).ok()
}

/// Obfuscate a token for storage in configuration. Inverse of
/// [`reveal_obfuscated_token`]; mainly useful for tests and setup tooling.
pub fn obfuscate_token(token: &str) -> String {
    BASE64.encode(token.as_bytes())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Malformed environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reveal_round_trip() {
        let secret = "very secret value";
        assert_eq!(
            reveal_obfuscated_token(&obfuscate_token(secret)).unwrap(),
            secret
        );
    }

    #[test]
    fn test_reveal_rejects_garbage() {
        assert!(reveal_obfuscated_token("not base64!!").is_none());
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list(Some("/private, /docs/internal ,")),
            vec!["/private".to_string(), "/docs/internal".to_string()]
        );
        assert!(parse_list(None).is_empty());
    }
}
