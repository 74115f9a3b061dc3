//! Mock transport for testing.
//!
//! In-memory implementation of the [`Transport`](crate::transport::Transport)
//! trait for unit and integration tests: scripted or handler-driven
//! responses plus a log of every request the pipeline issued.

pub mod transport;

pub use transport::{MockTransport, envelope_response, status_response};
