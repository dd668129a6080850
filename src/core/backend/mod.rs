//! Symphony backend client.
//!
//! Every tool call ends up here as a single outbound HTTP request against the
//! fixed Symphony base address. The client attaches the static credentials,
//! normalizes the response body and turns non-success statuses into
//! [`BackendError`]s.
//!
//! - `request.rs` - HTTP verbs and the per-call request value
//! - `response.rs` - body parsing and failure message extraction
//! - `client.rs` - the reqwest-backed [`SymphonyClient`]
//! - `error.rs` - backend error types
//!
//! The registry talks to the backend through the [`BackendApi`] trait so that
//! tools can be exercised without a network.

mod client;
mod error;
mod request;
mod response;

pub use client::SymphonyClient;
pub use error::BackendError;
pub use request::{BackendRequest, HttpMethod};
pub use response::{failure_message, parse_body};

use serde_json::Value;

/// An endpoint capable of executing [`BackendRequest`]s.
///
/// Implementations return the normalized response body on success.
#[async_trait::async_trait]
pub trait BackendApi: Send + Sync {
    /// Perform one request and return the normalized body.
    async fn call(&self, request: BackendRequest) -> Result<Value, BackendError>;
}
