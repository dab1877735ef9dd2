//! Pre-Shared Token Authentication
//!
//! The game client embeds `auth.token` from its GSI config file in every
//! push. The server only compares it against its own configured secret.

use serde_json::Value;
use sha2::{Sha256, Digest};
use thiserror::Error;

/// Token the service accepts when none is configured.
pub const DEFAULT_AUTH_TOKEN: &str = "7ATvXUzTfBYyMLrA";

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// Expected `auth.token`.
    token: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new(DEFAULT_AUTH_TOKEN)
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig").field("token", &"<redacted>").finish()
    }
}

impl AuthConfig {
    /// Create config with an explicit token.
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    /// Create config from the `GSI_AUTH_TOKEN` environment variable.
    pub fn from_env() -> Self {
        std::env::var("GSI_AUTH_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .map(Self::new)
            .unwrap_or_default()
    }
}

/// Authentication errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No `auth.token` string in the payload.
    #[error("missing auth.token")]
    MissingToken,
    /// Token does not match.
    #[error("invalid auth token")]
    InvalidToken,
}

/// Check `auth.token` of a parsed payload.
pub fn validate_token(payload: &Value, config: &AuthConfig) -> Result<(), AuthError> {
    let token = payload
        .get("auth")
        .and_then(|auth| auth.get("token"))
        .and_then(Value::as_str)
        .ok_or(AuthError::MissingToken)?;

    // compare digests so the comparison time does not depend on the prefix
    if token_digest(token) == token_digest(&config.token) {
        Ok(())
    } else {
        Err(AuthError::InvalidToken)
    }
}

fn token_digest(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"gsi-relay-token:");
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

// =============================================================================
// TESTS
// =============================================================================
