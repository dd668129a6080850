//! Transport layer for the MCP server.
//!
//! This module provides two interchangeable transport bindings:
//! - **STDIO**: a single long-lived peer over stdin/stdout - feature: `stdio`
//! - **HTTP**: JSON-RPC over POST with per-client sessions - feature: `http`
//!
//! Both hand tool calls to the same [`McpServer`](crate::core::McpServer)
//! and therefore the same tool registry.

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "http")]
pub use config::HttpConfig;
