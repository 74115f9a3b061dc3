//! Identity service endpoints and wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Login endpoint (`POST`): exchanges credentials for a token grant.
pub const AUTH_TOKEN: &str = "/identity/auth/token";

/// Refresh endpoint (`POST`): exchanges a stale token for a fresh grant.
pub const AUTH_REFRESH: &str = "/identity/auth/refresh";

/// Logout endpoint (`POST`): invalidates the token server-side.
pub const AUTH_LOGOUT: &str = "/identity/auth/logout";

/// Identity fetch endpoint (`GET`): returns the authenticated user record.
pub const MY_INFO: &str = "/identity/users/my-info";

/// Registration endpoint (`POST`): creates a new user account.
pub const REGISTRATION: &str = "/identity/users/registration";

/// Login request body.
#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest {
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl LoginRequest {
    /// Create a login request.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Registration request body.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    /// Desired username.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Date of birth (`YYYY-MM-DD`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
}

impl RegistrationRequest {
    /// Create a registration request with only the required fields.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            first_name: None,
            last_name: None,
            dob: None,
        }
    }

    /// Builder: set the given name.
    #[must_use]
    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    /// Builder: set the family name.
    #[must_use]
    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    /// Builder: set the date of birth.
    #[must_use]
    pub fn with_dob(mut self, dob: impl Into<String>) -> Self {
        self.dob = Some(dob.into());
        self
    }
}

/// Token grant returned by the login and refresh endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    /// Signed access token (JWT).
    pub token: String,

    /// Expiry of the grant. Absent when the deployment relies on the token's
    /// own `exp` claim (or an HttpOnly cookie) instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_time: Option<DateTime<Utc>>,
}

/// Refresh request body (bearer-header deployments).
///
/// Cookie-session deployments send an empty body; the HttpOnly cookie carries
/// the credential.
#[derive(Clone, Debug, Serialize)]
pub struct RefreshRequest {
    /// The token to exchange.
    pub token: String,
}

impl RefreshRequest {
    /// Create a refresh request.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self { token }
    }
}

/// Logout request body.
#[derive(Clone, Debug, Serialize)]
pub struct LogoutRequest {
    /// The token to invalidate.
    pub token: String,
}

impl LogoutRequest {
    /// Create a logout request.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self { token }
    }
}

/// Authenticated user record, as returned by the identity fetch endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// User identifier.
    pub id: String,

    /// Account username.
    pub username: String,

    /// Granted roles, in server order.
    #[serde(default)]
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_grant_wire_shape() {
        let grant: TokenGrant = serde_json::from_str(
            r#"{"token": "abc", "expiryTime": "2026-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(grant.token, "abc");
        assert!(grant.expiry_time.is_some());

        let bare: TokenGrant = serde_json::from_str(r#"{"token": "abc"}"#).unwrap();
        assert!(bare.expiry_time.is_none());
    }

    #[test]
    fn test_registration_builder_serializes_camel_case() {
        let request = RegistrationRequest::new("alice", "s3cret")
            .with_first_name("Alice")
            .with_dob("1990-05-01");
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["firstName"], "Alice");
        assert_eq!(body["dob"], "1990-05-01");
        assert!(body.get("lastName").is_none());
    }

    #[test]
    fn test_user_info_roles_default_empty() {
        let user: UserInfo =
            serde_json::from_str(r#"{"id": "u-1", "username": "alice"}"#).unwrap();
        assert!(user.roles.is_empty());
    }
}
