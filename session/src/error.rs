//! Error taxonomy for the request pipeline and session operations.

use thiserror::Error;

/// Result type alias for session-layer operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Failures a request can resolve with.
///
/// The pipeline never swallows an error: after its side effects run
/// (notification, refresh, retry) the call still rejects with one of these.
/// Errors are `Clone` because every caller queued behind an in-flight refresh
/// receives the same failure value.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The server could not be reached after exhausting the retry budget.
    #[error("cannot reach the server after {attempts} attempts: {reason}")]
    Connectivity {
        /// Underlying transport failure.
        reason: String,
        /// Total attempts made, including the original request.
        attempts: u32,
    },

    /// The request came back 401 even after a refresh replay.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Server-supplied message.
        message: String,
    },

    /// Credential refresh failed; the session has been cleared.
    #[error("session expired, please sign in again")]
    SessionExpired,

    /// A refresh was requested but no credential is stored.
    #[error("no credential available to refresh")]
    MissingCredential,

    /// The server answered with a 5xx status.
    #[error("server error (status {status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-supplied message, or a generic fallback.
        message: String,
        /// Raw response body, kept for diagnostic display.
        details: Option<String>,
    },

    /// The server rejected the request with a 4xx status other than 401.
    #[error("request rejected (status {status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Server-supplied message, or a generic fallback.
        message: String,
        /// Raw response body, kept for diagnostic display.
        details: Option<String>,
    },

    /// A response body could not be parsed.
    #[error("malformed response: {0}")]
    Decode(String),

    /// A stored or received access token could not be decoded.
    #[error("invalid access token: {0}")]
    InvalidToken(String),

    /// The HTTP client could not be constructed from the configuration.
    #[error("client configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status carried by this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Server { status, .. } | Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` when the server refused the credential outright.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// `true` when the current session is no longer recoverable.
    #[must_use]
    pub const fn is_session_terminal(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::MissingCredential)
    }
}
