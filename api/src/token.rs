//! Access-token (JWT) claim decoding.
//!
//! The client never verifies signatures; it only reads the payload to learn
//! who the token belongs to and which roles it grants. Verification is the
//! server's job.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use thiserror::Error;

/// Claims the client cares about inside a Bookteria access token.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// Subject: the account username.
    pub sub: String,

    /// User identifier.
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,

    /// Space-separated scope string (`"ROLE_ADMIN ROLE_USER profile"`).
    #[serde(default)]
    pub scope: Option<String>,

    /// Expiry as a Unix timestamp (seconds).
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Roles granted by the token's scope, in scope order.
    #[must_use]
    pub fn roles(&self) -> Vec<String> {
        self.scope.as_deref().map(roles_from_scope).unwrap_or_default()
    }
}

/// Failure to decode a token payload.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The token is not a three-part JWT.
    #[error("token is not a JWT")]
    Malformed,

    /// The payload segment is not valid base64 JSON.
    #[error("token payload undecodable: {0}")]
    Payload(String),
}

/// Decode the claims from a JWT without verifying its signature.
///
/// # Errors
///
/// Returns `TokenError::Malformed` when the token has no payload segment and
/// `TokenError::Payload` when the segment is not base64-encoded JSON.
pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenError> {
    let payload = token.split('.').nth(1).ok_or(TokenError::Malformed)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|error| TokenError::Payload(error.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|error| TokenError::Payload(error.to_string()))
}

/// Extract role names from a scope string.
///
/// Keeps `ROLE_`-prefixed entries, strips the prefix, preserves order.
#[must_use]
pub fn roles_from_scope(scope: &str) -> Vec<String> {
    scope
        .split_whitespace()
        .filter_map(|entry| entry.strip_prefix("ROLE_"))
        .map(ToOwned::to_owned)
        .collect()
}
