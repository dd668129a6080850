//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the MCP server:
//! configuration, error handling, the Symphony backend client, the server
//! handler and the transport bindings.

pub mod backend;
pub mod config;
pub mod error;
pub mod server;
pub mod transport;

pub use backend::{BackendApi, BackendError, BackendRequest, HttpMethod, SymphonyClient};
pub use config::Config;
pub use error::{Error, Result};
pub use server::McpServer;
pub use transport::{TransportConfig, TransportService};
