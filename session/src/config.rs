//! Client configuration.
//!
//! Configuration values are provided by the application, not hardcoded: the
//! base address, the per-request timeout, the transient-failure retry budget,
//! and the credential transport strategy.

use std::time::Duration;

/// How the credential travels with each request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CredentialMode {
    /// Attach an `Authorization: Bearer <token>` header to every request.
    #[default]
    BearerHeader,

    /// Rely on an HttpOnly session cookie sent automatically by the cookie
    /// store; no header is attached.
    CookieSession,
}

/// Client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base address every request path is resolved against
    /// (e.g. `"https://shop.example.com/api/v1"`).
    pub base_url: String,

    /// Per-request timeout enforced by the transport. Exceeding it is treated
    /// identically to a network failure and enters the retry path.
    ///
    /// Default: 15 seconds
    pub timeout: Duration,

    /// How many times a transiently-failed request is resubmitted.
    ///
    /// Default: 2 (three attempts total)
    pub retry_limit: u32,

    /// Fixed wait between retry attempts.
    ///
    /// Default: 1 second
    pub retry_backoff: Duration,

    /// Credential transport strategy.
    ///
    /// Default: bearer header
    pub credential_mode: CredentialMode,
}

impl ClientConfig {
    /// Create a configuration for the given base address.
    #[must_use]
    pub const fn new(base_url: String) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(15),
            retry_limit: 2,
            retry_backoff: Duration::from_secs(1),
            credential_mode: CredentialMode::BearerHeader,
        }
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the transient-failure retry budget.
    #[must_use]
    pub const fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    /// Set the wait between retry attempts.
    #[must_use]
    pub const fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    /// Set the credential transport strategy.
    #[must_use]
    pub const fn with_credential_mode(mut self, credential_mode: CredentialMode) -> Self {
        self.credential_mode = credential_mode;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8888/api/v1".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("https://example.com/api".to_string())
            .with_timeout(Duration::from_secs(5))
            .with_retry_limit(1)
            .with_retry_backoff(Duration::from_millis(200))
            .with_credential_mode(CredentialMode::CookieSession);

        assert_eq!(config.base_url, "https://example.com/api");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.retry_limit, 1);
        assert_eq!(config.retry_backoff, Duration::from_millis(200));
        assert_eq!(config.credential_mode, CredentialMode::CookieSession);
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.retry_limit, 2);
        assert_eq!(config.retry_backoff, Duration::from_secs(1));
        assert_eq!(config.credential_mode, CredentialMode::BearerHeader);
    }
}
