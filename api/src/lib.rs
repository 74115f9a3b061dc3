//! # Bookteria API Wire Contracts
//!
//! Request and response types for the Bookteria identity service, the
//! standard response envelope shared by every backend service, and
//! access-token (JWT) claim decoding.
//!
//! This crate owns only the shapes that travel over the wire. The request
//! coordination engine (interceptors, credential refresh, loading and
//! notification state) lives in `bookteria-session`.
//!
//! ## Envelope
//!
//! Every service wraps its responses in the same envelope: success bodies
//! carry the payload under `result`, error bodies carry a human-readable
//! `message`:
//!
//! ```json
//! { "result": { "token": "...", "expiryTime": "..." } }
//! { "message": "Invalid credentials" }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod envelope;
pub mod identity;
pub mod token;

// Re-export main types for convenience
pub use envelope::{Envelope, EnvelopeError, error_message};
pub use identity::{
    LoginRequest, LogoutRequest, RefreshRequest, RegistrationRequest, TokenGrant, UserInfo,
};
pub use token::{TokenClaims, TokenError, decode_claims, roles_from_scope};
