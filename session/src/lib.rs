//! # Bookteria Session Layer
//!
//! The request coordination engine behind the Bookteria client: a typed HTTP
//! dispatcher with an interceptor pipeline that attaches credentials,
//! deduplicates concurrent token refreshes, retries transient network
//! failures, and drives the global loading/notification UI state.
//!
//! ## Architecture
//!
//! ```text
//! caller → Client::send → [loading gauge] → transport
//!                            │
//!                            ├─ transport failure → bounded silent retry
//!                            ├─ 401 (first)       → RefreshCoordinator → replay
//!                            └─ other error       → notification + typed error
//! ```
//!
//! Every request resolves to the caller with either the final response or the
//! original error; notifications and the loading gauge are side effects, never
//! substitutes for error propagation. Requests flagged [`Request::silent`]
//! suppress the side effects but still reject normally.
//!
//! ## Example
//!
//! ```rust,ignore
//! use bookteria_session::{Client, ClientConfig};
//! use bookteria_api::LoginRequest;
//!
//! let client = Client::new(ClientConfig::new("https://shop.example.com/api/v1".into()))?;
//! let identity = client.login(LoginRequest::new("alice", "s3cret")).await?;
//! assert!(client.session().is_authenticated());
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod client;
pub mod config;
pub mod error;
pub mod loading;
pub mod notify;
pub mod refresh;
pub mod state;
pub mod transport;

#[cfg(feature = "test-utils")]
pub mod mocks;

// Re-export main types for convenience
pub use client::Client;
pub use config::{ClientConfig, CredentialMode};
pub use error::{ApiError, Result};
pub use loading::LoadingGauge;
pub use notify::{Notification, Notifier, Severity};
pub use refresh::RefreshCoordinator;
pub use state::SessionState;
pub use transport::{HttpTransport, PreparedRequest, Request, Response, Transport, TransportFailure};
