//! Mock transport.

use crate::transport::{PreparedRequest, Response, Transport, TransportFailure};
use futures::future::BoxFuture;
use reqwest::StatusCode;
use std::sync::{Arc, Mutex};

type Outcome = std::result::Result<Response, TransportFailure>;
type Handler = dyn Fn(PreparedRequest) -> BoxFuture<'static, Outcome> + Send + Sync;

/// Mock transport.
///
/// Routes every exchange through a handler closure and records the request.
/// The handler decides per request, so tests can model token rotation,
/// flaky networks, or gated refresh endpoints.
#[derive(Clone)]
pub struct MockTransport {
    handler: Arc<Handler>,
    log: Arc<Mutex<Vec<PreparedRequest>>>,
}

impl MockTransport {
    /// Build a mock around an async handler.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(PreparedRequest) -> BoxFuture<'static, Outcome> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Build a mock around a synchronous handler.
    pub fn respond_with<F>(handler: F) -> Self
    where
        F: Fn(PreparedRequest) -> Outcome + Send + Sync + 'static,
    {
        Self::with_handler(move |request| {
            let outcome = handler(request);
            Box::pin(async move { outcome })
        })
    }

    /// Build a mock that answers every request with the same status/body.
    #[must_use]
    pub fn fixed(status: u16, body: serde_json::Value) -> Self {
        Self::respond_with(move |_| Ok(status_response(status, &body)))
    }

    /// Build a mock that fails every request at the transport level.
    #[must_use]
    pub fn always_fail(failure: TransportFailure) -> Self {
        Self::respond_with(move |_| Err(failure.clone()))
    }

    /// Every request issued so far, in order.
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    #[must_use]
    pub fn requests(&self) -> Vec<PreparedRequest> {
        self.log.lock().unwrap().clone()
    }

    /// Number of requests issued so far.
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }
}

impl Transport for MockTransport {
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn execute(&self, request: PreparedRequest) -> Outcome {
        self.log.lock().unwrap().push(request.clone());
        (self.handler)(request).await
    }
}

/// Response with the given status and JSON body.
#[allow(clippy::unwrap_used)] // Test helper: fixed inputs
#[must_use]
pub fn status_response(status: u16, body: &serde_json::Value) -> Response {
    Response {
        status: StatusCode::from_u16(status).unwrap(),
        body: serde_json::to_vec(body).unwrap(),
    }
}

/// 200 response wrapping the value in the standard `{result}` envelope.
#[must_use]
pub fn envelope_response(result: serde_json::Value) -> Response {
    status_response(200, &serde_json::json!({ "result": result }))
}
