//! Error types and handling for the MCP server.
//!
//! Server construction can fail in the tools domain (duplicate registration)
//! or in the Symphony backend (HTTP client setup). Transports report their own
//! [`TransportError`](crate::core::transport::TransportError).

use thiserror::Error;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the tools domain.
    #[error("Tool error: {0}")]
    Tool(#[from] crate::domains::tools::ToolError),

    /// Error originating from the Symphony backend client.
    #[error("Backend error: {0}")]
    Backend(#[from] crate::core::backend::BackendError),
}
