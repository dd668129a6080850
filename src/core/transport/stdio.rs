//! STDIO transport implementation.
//!
//! One peer attached over stdin/stdout for the lifetime of the process. Logs
//! go to stderr so they never interleave with protocol frames.

use rmcp::ServiceExt;
use tracing::info;

use super::{TransportError, TransportResult};
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Attach to stdin/stdout and serve until the peer disconnects.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        let tool_count = server.registry().len();

        let service = server
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;

        info!("Symphony MCP server is running on STDIO ({} tools)", tool_count);

        let reason = service
            .waiting()
            .await
            .map_err(|e| TransportError::ServiceError(e.to_string()))?;

        info!("STDIO transport finished: {:?}", reason);
        Ok(())
    }
}
