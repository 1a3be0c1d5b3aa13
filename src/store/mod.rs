// SPDX-License-Identifier: MIT

//! Token storage layer (Redis).

pub mod tokens;

pub use tokens::{StoredTokens, TokenPair, TokenStore};

/// Store keys as constants. The token pair is process-wide, so the keys are
/// fixed singletons rather than being scoped per user.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const REFRESH_TOKEN: &str = "refresh_token";
}
