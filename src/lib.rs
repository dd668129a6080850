//! Symphony MCP Server Library
//!
//! This crate exposes the Symphony trading REST API to Model Context Protocol
//! clients. Every tool is a thin proxy: arguments are validated, one HTTP
//! request is sent to Symphony, and the normalized JSON reply is returned.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the backend client, the server
//!   handler and the STDIO / HTTP transports
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: the tool catalog, argument schemas, registry and router
//!
//! # Example
//!
//! ```rust,no_run
//! use symphony_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
