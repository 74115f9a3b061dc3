//! The Bookteria client: request dispatcher, interceptor pipeline, and
//! session operations.
//!
//! Every request runs through an explicit per-request state machine instead
//! of exception-driven interceptor chaining. The error phase is evaluated in
//! a fixed order: transport failure (bounded silent retry), first 401
//! (coordinated refresh and replay), everything else (notification and typed
//! rejection). All paths preserve the error for the caller.

use crate::config::{ClientConfig, CredentialMode};
use crate::error::{ApiError, Result};
use crate::loading::LoadingGauge;
use crate::notify::Notifier;
use crate::refresh::RefreshCoordinator;
use crate::state::SessionState;
use crate::transport::{
    HttpTransport, PreparedRequest, Request, Response, Transport, TransportFailure,
};
use bookteria_api::envelope::{Envelope, error_message};
use bookteria_api::identity::{
    self, LoginRequest, LogoutRequest, RefreshRequest, RegistrationRequest, TokenGrant, UserInfo,
};
use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};

/// Fallback text when an error body carries no `message`.
const GENERIC_FAILURE_TEXT: &str = "Something went wrong. Please try again.";

/// Shown when the retry budget is exhausted.
const CONNECTIVITY_TEXT: &str = "Cannot reach the server. Please check your connection.";

/// Shown when the server answers 5xx.
const SERVER_TROUBLE_TEXT: &str = "The server ran into trouble. Please try again later.";

/// Shown when a refresh fails for a previously authenticated session.
const SESSION_EXPIRED_TEXT: &str = "Your session has expired. Please sign in again.";

/// Where the per-request state machine goes after one transport exchange.
#[derive(Debug)]
enum StepOutcome {
    /// The request is done; hand the response to the caller.
    Complete(Response),
    /// Transient transport failure within budget: wait, then resubmit.
    RetryAfterBackoff,
    /// First 401: obtain a fresh credential, then resubmit. Carries the
    /// server's message so a caller with nothing to refresh can be rejected
    /// with the original error.
    RefreshCredential { message: String },
    /// Terminal failure: reject the caller with this error.
    Abort(ApiError),
}

struct ClientInner<T> {
    transport: T,
    config: ClientConfig,
    session: SessionState,
    refresher: RefreshCoordinator,
    loading: LoadingGauge,
    notifier: Notifier,
}

/// Bookteria API client.
///
/// Cheap to clone; all clones share the same session, refresh coordinator,
/// loading gauge, and notification slot.
pub struct Client<T: Transport> {
    inner: std::sync::Arc<ClientInner<T>>,
}

impl<T: Transport> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            inner: std::sync::Arc::clone(&self.inner),
        }
    }
}

impl Client<HttpTransport> {
    /// Create a client backed by the production HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` when the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: Transport> Client<T> {
    /// Create a client over an explicit transport (used in tests).
    #[must_use]
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        Self {
            inner: std::sync::Arc::new(ClientInner {
                transport,
                config,
                session: SessionState::new(),
                refresher: RefreshCoordinator::new(),
                loading: LoadingGauge::new(),
                notifier: Notifier::new(),
            }),
        }
    }

    /// The session record.
    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.inner.session
    }

    /// The global loading gauge.
    #[must_use]
    pub fn loading(&self) -> &LoadingGauge {
        &self.inner.loading
    }

    /// The global notification slot.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    // ═══════════════════════════════════════════════════════════════════
    // Dispatch
    // ═══════════════════════════════════════════════════════════════════

    /// Dispatch a request through the interceptor pipeline.
    ///
    /// # Errors
    ///
    /// Rejects with the triggering [`ApiError`] after side effects
    /// (notification, refresh, retry) have run. Silent requests suppress the
    /// side effects, never the rejection.
    pub async fn send(&self, request: Request) -> Result<Response> {
        let mut request = request;
        // Notifications key off the caller's flag; retries force `silent` on
        // the descriptor to keep the busy flag from flickering.
        let announce = !request.silent;

        loop {
            if !request.silent {
                self.inner.loading.show();
            }
            let attempt = self.inner.transport.execute(self.prepare(&request)).await;
            if !request.silent {
                self.inner.loading.hide();
            }

            match Self::classify(&self.inner.config, &mut request, attempt) {
                StepOutcome::Complete(response) => return Ok(response),
                StepOutcome::RetryAfterBackoff => {
                    tokio::time::sleep(self.inner.config.retry_backoff).await;
                }
                StepOutcome::RefreshCredential { message } => {
                    // The replay picks the fresh credential up from the
                    // session on its next pass through `prepare`.
                    match self.refresh().await {
                        Ok(_) => {}
                        // Nothing stored to refresh: the caller gets the
                        // server's original 401 answer, not the fast-fail.
                        Err(ApiError::MissingCredential) => {
                            return Err(ApiError::Unauthorized { message });
                        }
                        Err(error) => return Err(error),
                    }
                }
                StepOutcome::Abort(error) => {
                    if announce {
                        self.announce(&error);
                    }
                    return Err(error);
                }
            }
        }
    }

    /// Dispatch a request and unwrap the `{result}` envelope.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send), plus `ApiError::Decode` when the body is not
    /// a well-formed envelope.
    pub async fn send_json<D: serde::de::DeserializeOwned>(&self, request: Request) -> Result<D> {
        let response = self.send(request).await?;
        let envelope: Envelope<D> = response.json()?;
        envelope
            .into_result()
            .map_err(|error| ApiError::Decode(error.to_string()))
    }

    fn prepare(&self, request: &Request) -> PreparedRequest {
        let authorization = match self.inner.config.credential_mode {
            CredentialMode::BearerHeader => self
                .inner
                .session
                .credential()
                .map(|token| format!("Bearer {token}")),
            CredentialMode::CookieSession => None,
        };
        PreparedRequest {
            method: request.method.clone(),
            path: request.path.clone(),
            body: request.body.clone(),
            authorization,
        }
    }

    /// Evaluate one transport exchange. Order is fixed: transport failure,
    /// then first 401, then everything else.
    fn classify(
        config: &ClientConfig,
        request: &mut Request,
        attempt: std::result::Result<Response, TransportFailure>,
    ) -> StepOutcome {
        match attempt {
            Err(failure) => {
                if request.retry_count < config.retry_limit {
                    request.retry_count += 1;
                    request.silent = true;
                    tracing::debug!(
                        path = %request.path,
                        attempt = request.retry_count,
                        "transport failure, scheduling retry"
                    );
                    StepOutcome::RetryAfterBackoff
                } else {
                    StepOutcome::Abort(ApiError::Connectivity {
                        reason: failure.to_string(),
                        attempts: request.retry_count + 1,
                    })
                }
            }
            Ok(response) if response.status == StatusCode::UNAUTHORIZED && !request.retried => {
                request.retried = true;
                StepOutcome::RefreshCredential {
                    message: error_message(&response.body)
                        .unwrap_or_else(|| GENERIC_FAILURE_TEXT.to_string()),
                }
            }
            Ok(response) if response.status == StatusCode::UNAUTHORIZED => {
                StepOutcome::Abort(ApiError::Unauthorized {
                    message: error_message(&response.body)
                        .unwrap_or_else(|| GENERIC_FAILURE_TEXT.to_string()),
                })
            }
            Ok(response) if response.status.is_success() => StepOutcome::Complete(response),
            Ok(response) => StepOutcome::Abort(Self::status_error(&response)),
        }
    }

    fn status_error(response: &Response) -> ApiError {
        let status = response.status.as_u16();
        let message =
            error_message(&response.body).unwrap_or_else(|| GENERIC_FAILURE_TEXT.to_string());
        let details = (!response.body.is_empty()).then(|| response.text());
        if response.status.is_server_error() {
            ApiError::Server {
                status,
                message,
                details,
            }
        } else {
            ApiError::Rejected {
                status,
                message,
                details,
            }
        }
    }

    fn announce(&self, error: &ApiError) {
        match error {
            ApiError::Connectivity { reason, .. } => self.inner.notifier.error(
                CONNECTIVITY_TEXT,
                Some("Connection error".to_string()),
                Some(reason.clone()),
            ),
            ApiError::Server {
                status, details, ..
            } => self.inner.notifier.error(
                SERVER_TROUBLE_TEXT,
                Some(format!("Server error ({status})")),
                details.clone(),
            ),
            ApiError::Rejected {
                message, details, ..
            } => self.inner.notifier.error(
                message.clone(),
                Some("Request failed".to_string()),
                details.clone(),
            ),
            // 401s and refresh failures notify (or stay quiet) on their own
            // paths; decode errors are the caller's concern.
            _ => {}
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Session operations
    // ═══════════════════════════════════════════════════════════════════

    /// Log in: exchange credentials for a token grant, then fetch the
    /// authoritative identity.
    ///
    /// No partial login state survives a failure: if the identity fetch
    /// fails, the whole operation fails and the session is cleared.
    ///
    /// # Errors
    ///
    /// Propagates the failing step's [`ApiError`].
    pub async fn login(&self, credentials: LoginRequest) -> Result<UserInfo> {
        let grant: TokenGrant = self
            .send_json(Request::post(identity::AUTH_TOKEN).json(&credentials)?)
            .await?;
        self.inner.session.install(&grant)?;

        match self.send_json::<UserInfo>(Request::get(identity::MY_INFO)).await {
            Ok(user) => {
                self.inner.session.set_identity(user.clone());
                tracing::info!(username = %user.username, "login succeeded");
                Ok(user)
            }
            Err(error) => {
                tracing::warn!(%error, "identity fetch after login failed, rolling back");
                self.inner.session.clear();
                Err(error)
            }
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Propagates the pipeline's [`ApiError`].
    pub async fn register(&self, registration: RegistrationRequest) -> Result<UserInfo> {
        self.send_json(Request::post(identity::REGISTRATION).json(&registration)?)
            .await
    }

    /// Fetch the authenticated identity.
    ///
    /// No-op without a credential. On an unauthorized answer the session is
    /// cleared and the error propagates; any other failure keeps the
    /// provisional (token-decoded) identity and surfaces a non-fatal
    /// warning.
    ///
    /// # Errors
    ///
    /// Propagates unauthorized/terminal failures; other failures resolve
    /// with the provisional identity.
    pub async fn fetch_identity(&self) -> Result<Option<UserInfo>> {
        if self.inner.session.credential().is_none() {
            return Ok(None);
        }

        match self.send_json::<UserInfo>(Request::get(identity::MY_INFO)).await {
            Ok(user) => {
                self.inner.session.set_identity(user.clone());
                Ok(Some(user))
            }
            Err(error) if error.is_unauthorized() || error.is_session_terminal() => {
                self.inner.session.clear();
                Err(error)
            }
            Err(error) => {
                tracing::warn!(%error, "identity fetch failed, keeping provisional identity");
                self.inner.notifier.warning(
                    "Could not load your profile. Some details may be out of date.",
                    None,
                );
                Ok(self.inner.session.identity())
            }
        }
    }

    /// Restore a persisted credential at application start.
    ///
    /// Already-expired grants are discarded. The identity fetch runs
    /// fire-and-forget with its own error containment; hydration never
    /// blocks startup.
    pub fn hydrate(&self, token: String, expiry_time: Option<DateTime<Utc>>)
    where
        T: 'static,
    {
        if expiry_time.is_some_and(|expiry| expiry <= Utc::now()) {
            tracing::info!("persisted session expired, skipping hydration");
            return;
        }

        let grant = TokenGrant { token, expiry_time };
        if let Err(error) = self.inner.session.install(&grant) {
            tracing::warn!(%error, "persisted credential undecodable, discarding");
            return;
        }

        let client = self.clone();
        tokio::spawn(async move {
            if let Err(error) = client.fetch_identity().await {
                tracing::warn!(%error, "background identity hydration failed");
            }
        });
    }

    /// Log out.
    ///
    /// The local session is cleared first (watch subscribers drop per-user
    /// caches and redirect); the remote invalidation is best-effort and its
    /// failure is logged, never propagated.
    pub async fn logout(&self) {
        let credential = self.inner.session.credential();
        self.inner.session.clear();
        tracing::info!("logged out");

        if let Some(token) = credential {
            let request = match Request::post(identity::AUTH_LOGOUT).json(&LogoutRequest::new(token))
            {
                Ok(request) => request.silent(),
                Err(error) => {
                    tracing::warn!(%error, "could not encode logout request");
                    return;
                }
            };
            if let Err(error) = self.send(request).await {
                tracing::warn!(%error, "remote logout failed, local session already cleared");
            }
        }
    }

    /// Obtain a fresh credential, coordinating with concurrent callers.
    ///
    /// At most one refresh call is in flight at a time; concurrent callers
    /// queue and share its outcome in arrival order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::MissingCredential` when nothing is stored, or
    /// `ApiError::SessionExpired` when the refresh endpoint fails; the
    /// session is cleared and, if it was previously authenticated, a warning
    /// is shown exactly once.
    pub async fn refresh(&self) -> Result<String> {
        self.inner.refresher.run(|| self.refresh_once()).await
    }

    /// The single refresh exchange. Talks to the transport directly: the
    /// refresh request must not re-enter the 401 handling or the loading
    /// gauge.
    async fn refresh_once(&self) -> Result<String> {
        let Some(current) = self.inner.session.credential() else {
            tracing::debug!("refresh requested with no stored credential");
            self.inner.session.clear();
            return Err(ApiError::MissingCredential);
        };
        let was_authenticated = self.inner.session.is_authenticated();

        match self.attempt_refresh(current).await {
            Ok(token) => {
                tracing::debug!("credential refreshed");
                Ok(token)
            }
            Err(error) => {
                tracing::warn!(%error, "credential refresh failed, clearing session");
                self.inner.session.clear();
                if was_authenticated {
                    let text = match &error {
                        ApiError::Server { message, .. } | ApiError::Rejected { message, .. }
                            if message != GENERIC_FAILURE_TEXT =>
                        {
                            message.clone()
                        }
                        _ => SESSION_EXPIRED_TEXT.to_string(),
                    };
                    self.inner
                        .notifier
                        .warning(text, Some("Session expired".to_string()));
                }
                Err(ApiError::SessionExpired)
            }
        }
    }

    async fn attempt_refresh(&self, current: String) -> Result<String> {
        let body = match self.inner.config.credential_mode {
            CredentialMode::BearerHeader => Some(
                serde_json::to_value(RefreshRequest::new(current))
                    .map_err(|error| ApiError::Decode(error.to_string()))?,
            ),
            // The HttpOnly cookie carries the credential.
            CredentialMode::CookieSession => None,
        };
        let request = PreparedRequest {
            method: Method::POST,
            path: identity::AUTH_REFRESH.to_string(),
            body,
            authorization: None,
        };

        let response =
            self.inner
                .transport
                .execute(request)
                .await
                .map_err(|failure| ApiError::Connectivity {
                    reason: failure.to_string(),
                    attempts: 1,
                })?;
        if !response.status.is_success() {
            return Err(Self::status_error(&response));
        }

        let envelope: Envelope<TokenGrant> = response.json()?;
        let grant = envelope
            .into_result()
            .map_err(|error| ApiError::Decode(error.to_string()))?;
        self.inner.session.install(&grant)?;
        Ok(grant.token)
    }
}
