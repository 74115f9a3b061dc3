//! Session state: the single client-side record of credential and identity.
//!
//! The session is owned exclusively by [`SessionState`]; collaborators read
//! it through accessors and mutate it only through the exposed operations.
//! Authenticated/anonymous transitions are published over a watch channel so
//! dependent stores can drop per-user caches and the router can redirect to
//! the login view.

use crate::error::ApiError;
use bookteria_api::identity::{TokenGrant, UserInfo};
use bookteria_api::token::decode_claims;
use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;

/// Snapshot of the current session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    /// Bearer credential, when one is stored.
    pub credential: Option<String>,

    /// Expiry of the credential, when the grant carried one.
    pub expires_at: Option<DateTime<Utc>>,

    /// Authenticated identity: provisional (decoded from the token) right
    /// after install, replaced by the server record once fetched.
    pub identity: Option<UserInfo>,
}

impl Session {
    fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        self.credential.is_some()
            && self.identity.is_some()
            && self.expires_at.is_none_or(|expiry| expiry > now)
    }
}

/// Shared handle to the process-wide session record.
///
/// Cheap to clone; all clones observe the same state.
#[derive(Clone)]
pub struct SessionState {
    inner: Arc<RwLock<Session>>,
    authenticated: Arc<watch::Sender<bool>>,
}

impl SessionState {
    /// Create an empty (anonymous) session.
    #[must_use]
    pub fn new() -> Self {
        let (authenticated, _) = watch::channel(false);
        Self {
            inner: Arc::new(RwLock::new(Session::default())),
            authenticated: Arc::new(authenticated),
        }
    }

    /// Store a token grant and decode a provisional identity from its claims.
    ///
    /// Returns the provisional identity. On an undecodable token the session
    /// is cleared and nothing persists.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidToken` when the token payload cannot be
    /// decoded.
    pub fn install(&self, grant: &TokenGrant) -> Result<UserInfo, ApiError> {
        let claims = match decode_claims(&grant.token) {
            Ok(claims) => claims,
            Err(error) => {
                self.clear();
                return Err(ApiError::InvalidToken(error.to_string()));
            }
        };

        let identity = UserInfo {
            id: claims.user_id.clone().unwrap_or_else(|| claims.sub.clone()),
            username: claims.sub.clone(),
            roles: claims.roles(),
        };

        {
            let mut session = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            session.credential = Some(grant.token.clone());
            session.expires_at = grant.expiry_time;
            session.identity = Some(identity.clone());
        }
        self.publish();
        Ok(identity)
    }

    /// Replace the identity with the authoritative server record.
    pub fn set_identity(&self, identity: UserInfo) {
        {
            let mut session = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            session.identity = Some(identity);
        }
        self.publish();
    }

    /// Clear credential, expiry, and identity. Subscribers observe the
    /// transition to anonymous.
    pub fn clear(&self) {
        {
            let mut session = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            *session = Session::default();
        }
        self.publish();
    }

    /// Current credential, if any.
    #[must_use]
    pub fn credential(&self) -> Option<String> {
        self.read().credential.clone()
    }

    /// Credential expiry, if any.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.read().expires_at
    }

    /// Current identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<UserInfo> {
        self.read().identity.clone()
    }

    /// `true` when a credential and identity are present and the credential
    /// has not expired.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated_at(Utc::now())
    }

    /// Roles of the current identity (empty when anonymous).
    #[must_use]
    pub fn roles(&self) -> Vec<String> {
        self.read()
            .identity
            .as_ref()
            .map(|identity| identity.roles.clone())
            .unwrap_or_default()
    }

    /// `true` when the current identity holds the given role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.read()
            .identity
            .as_ref()
            .is_some_and(|identity| identity.roles.iter().any(|held| held == role))
    }

    /// Full snapshot of the session record.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    /// Subscribe to authenticated/anonymous transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Session> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self) {
        let now_authenticated = self.read().is_authenticated_at(Utc::now());
        self.authenticated.send_if_modified(|flag| {
            if *flag == now_authenticated {
                false
            } else {
                *flag = now_authenticated;
                true
            }
        });
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::Duration;

    fn jwt(sub: &str, user_id: &str, scope: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS512"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::json!({"sub": sub, "userId": user_id, "scope": scope})
                .to_string()
                .as_bytes(),
        );
        format!("{header}.{payload}.sig")
    }

    fn grant(expires_in: Duration) -> TokenGrant {
        TokenGrant {
            token: jwt("alice", "u-1", "ROLE_ADMIN ROLE_USER"),
            expiry_time: Some(Utc::now() + expires_in),
        }
    }

    #[test]
    fn test_install_decodes_provisional_identity() {
        let state = SessionState::new();
        let identity = state.install(&grant(Duration::hours(1))).unwrap();

        assert_eq!(identity.username, "alice");
        assert_eq!(identity.id, "u-1");
        assert_eq!(identity.roles, vec!["ADMIN", "USER"]);
        assert!(state.is_authenticated());
        assert!(state.has_role("ADMIN"));
        assert!(!state.has_role("SUPPORT"));
    }

    #[test]
    fn test_install_bad_token_clears_session() {
        let state = SessionState::new();
        state.install(&grant(Duration::hours(1))).unwrap();

        let bad = TokenGrant {
            token: "not-a-jwt".to_string(),
            expiry_time: None,
        };
        assert!(matches!(
            state.install(&bad),
            Err(ApiError::InvalidToken(_))
        ));
        assert!(!state.is_authenticated());
        assert!(state.credential().is_none());
    }

    #[test]
    fn test_expired_credential_is_anonymous() {
        let state = SessionState::new();
        state.install(&grant(Duration::hours(-1))).unwrap();

        assert!(state.credential().is_some());
        assert!(!state.is_authenticated());
    }

    #[test]
    fn test_clear_publishes_transition() {
        let state = SessionState::new();
        let mut watcher = state.subscribe();
        assert!(!*watcher.borrow_and_update());

        state.install(&grant(Duration::hours(1))).unwrap();
        assert!(watcher.has_changed().unwrap());
        assert!(*watcher.borrow_and_update());

        state.clear();
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());
    }

    #[test]
    fn test_set_identity_replaces_provisional_record() {
        let state = SessionState::new();
        state.install(&grant(Duration::hours(1))).unwrap();

        state.set_identity(UserInfo {
            id: "u-1".to_string(),
            username: "alice".to_string(),
            roles: vec!["ADMIN".to_string()],
        });
        assert_eq!(state.roles(), vec!["ADMIN"]);
    }
}
