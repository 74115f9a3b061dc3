//! Transport abstraction: request descriptors, responses, and the HTTP
//! implementation.
//!
//! The pipeline talks to the wire through the [`Transport`] trait so the
//! coordination logic can be exercised against an in-memory mock; the
//! production implementation is a thin wrapper over `reqwest`.

use crate::config::{ClientConfig, CredentialMode};
use crate::error::ApiError;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Outgoing request descriptor.
///
/// Owned by the call site; the pipeline mutates the retry bookkeeping in
/// place while driving the request to completion.
#[derive(Clone, Debug)]
pub struct Request {
    /// HTTP method.
    pub method: Method,

    /// Path relative to the configured base address (e.g. `"/my-cart"`).
    pub path: String,

    /// JSON body, if any.
    pub body: Option<serde_json::Value>,

    /// Suppress the loading gauge and notifications for this request.
    /// Errors still propagate to the caller.
    pub silent: bool,

    /// Whether a credential refresh was already attempted for this request.
    /// A request is refreshed at most once.
    pub(crate) retried: bool,

    /// Transient-failure resubmissions so far.
    pub(crate) retry_count: u32,
}

impl Request {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            silent: false,
            retried: false,
            retry_count: 0,
        }
    }

    /// `GET` request for the given path.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` request for the given path.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT` request for the given path.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `DELETE` request for the given path.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Builder: attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` when the body cannot be serialized.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body =
            Some(serde_json::to_value(body).map_err(|error| ApiError::Decode(error.to_string()))?);
        Ok(self)
    }

    /// Builder: mark the request silent.
    #[must_use]
    pub const fn silent(mut self) -> Self {
        self.silent = true;
        self
    }
}

/// Request as handed to the transport: resolved flags folded into concrete
/// header material.
#[derive(Clone, Debug)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: Method,

    /// Path relative to the base address.
    pub path: String,

    /// JSON body, if any.
    pub body: Option<serde_json::Value>,

    /// Full `Authorization` header value (`"Bearer <token>"`), when the
    /// client runs in bearer-header mode and holds a credential.
    pub authorization: Option<String>,
}

/// Transport-level failure: no response was received.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportFailure {
    /// The request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The connection could not be established or broke mid-flight.
    #[error("connection failed: {0}")]
    Connect(String),
}

/// Received response: status plus raw body bytes.
///
/// The body stays opaque here; envelope interpretation happens in the
/// pipeline and at call sites.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// HTTP status.
    pub status: StatusCode,

    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl Response {
    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|error| ApiError::Decode(error.to_string()))
    }

    /// Body as lossy UTF-8 text, for diagnostics.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// One HTTP exchange.
///
/// Implementations must not retry, refresh, or touch UI state; all
/// coordination lives in the pipeline.
pub trait Transport: Send + Sync {
    /// Execute the prepared request and return the raw response.
    fn execute(
        &self,
        request: PreparedRequest,
    ) -> impl Future<Output = std::result::Result<Response, TransportFailure>> + Send;
}

/// Production transport over `reqwest`.
///
/// Enforces the configured per-request timeout; in cookie-session mode the
/// underlying client carries a cookie store so HttpOnly session cookies
/// travel automatically (the `withCredentials` analog).
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build the transport from the client configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` when the underlying HTTP client cannot be
    /// constructed (e.g. TLS backend initialization failure).
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout);
        if config.credential_mode == CredentialMode::CookieSession {
            builder = builder.cookie_store(true);
        }
        let http = builder
            .build()
            .map_err(|error| ApiError::Config(error.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }
}

impl Transport for HttpTransport {
    async fn execute(
        &self,
        request: PreparedRequest,
    ) -> std::result::Result<Response, TransportFailure> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.http.request(request.method, url);
        if let Some(authorization) = &request.authorization {
            builder = builder.header(reqwest::header::AUTHORIZATION, authorization);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|error| {
            if error.is_timeout() {
                TransportFailure::Timeout
            } else {
                TransportFailure::Connect(error.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| TransportFailure::Connect(error.to_string()))?
            .to_vec();

        Ok(Response { status, body })
    }
}
