//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler. It owns the tool registry
//! and exposes it to both transports:
//! - STDIO goes through the rmcp `ToolRouter` built in
//!   `domains/tools/router.rs` and the `#[tool_handler]` impl below;
//! - HTTP calls [`McpServer::list_tools`] and [`McpServer::call_tool`].
//!
//! **Adding a new tool does NOT require modifying this file!**

use rmcp::{
    ServerHandler, handler::server::tool::ToolRouter, model::*, tool_handler,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::backend::{BackendApi, SymphonyClient};
use super::config::Config;
use super::error::Error;
use crate::domains::tools::{ResultEnvelope, ToolError, ToolRegistry, build_tool_router};

/// Instructions sent to clients during initialization.
pub const INSTRUCTIONS: &str = "Symphony MCP server. Each tool forwards one call to the \
    Symphony trading API and returns the JSON response. Use symphonyRequest for endpoints \
    without a dedicated tool.";

/// The main MCP server handler.
///
/// Cheap to clone; every clone shares the same registry.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Every registered tool contract.
    registry: Arc<ToolRegistry>,

    /// Tool router for handling tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a server talking to the Symphony backend described by `config`.
    pub fn new(config: Config) -> Result<Self, Error> {
        let client = SymphonyClient::new(&config.backend)?;
        info!("Symphony backend: {}", client.base_url());
        Self::with_backend(config, Arc::new(client))
    }

    /// Create a server on top of an arbitrary backend.
    pub fn with_backend(config: Config, backend: Arc<dyn BackendApi>) -> Result<Self, Error> {
        let registry = Arc::new(ToolRegistry::with_catalog(backend)?);

        Ok(Self {
            tool_router: build_tool_router::<Self>(registry.clone()),
            config: Arc::new(config),
            registry,
        })
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Get the tool registry.
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools (for HTTP transport).
    pub fn list_tools(&self) -> Vec<Value> {
        self.registry
            .tools()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Call a tool by name (for HTTP transport).
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> Result<ResultEnvelope, ToolError> {
        self.registry.dispatch(name, arguments).await
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name().to_string(),
                version: self.version().to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::testing::RecordingBackend;
    use serde_json::json;

    fn test_server(backend: Arc<RecordingBackend>) -> McpServer {
        McpServer::with_backend(Config::default(), backend).unwrap()
    }

    #[test]
    fn test_server_info() {
        let server = test_server(Arc::new(RecordingBackend::new()));
        let info = server.get_info();
        assert_eq!(info.server_info.name, "symphony-mcp");
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("symphonyRequest"));
    }

    #[test]
    fn test_list_tools_shape() {
        let server = test_server(Arc::new(RecordingBackend::new()));
        let tools = server.list_tools();
        assert_eq!(tools.len(), 26);

        let fees = tools
            .iter()
            .find(|t| t["name"] == "getAgentFees")
            .unwrap();
        assert_eq!(fees["description"], "Get fees settings for a specific agent");
        assert_eq!(fees["inputSchema"]["properties"]["agentId"]["type"], "string");
    }

    #[tokio::test]
    async fn test_call_tool_uses_backend() {
        let backend = Arc::new(RecordingBackend::new().respond("/fees/organization", json!({ "fee": 2 })));
        let server = test_server(backend.clone());

        let envelope = server.call_tool("getOrganizationFees", None).await.unwrap();
        assert_eq!(envelope.data(), Some(&json!({ "fee": 2 })));
        assert_eq!(backend.call_count(), 1);
    }

    #[test]
    fn test_clones_share_registry() {
        let server = test_server(Arc::new(RecordingBackend::new()));
        let clone = server.clone();
        assert!(Arc::ptr_eq(server.registry(), clone.registry()));
    }

    /// Full MCP exchange over an in-memory pipe, exactly as a STDIO peer sees it.
    mod stdio_session {
        use super::*;
        use rmcp::ServiceExt;
        use std::time::Duration;
        use tokio::io::{
            AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
        };

        struct Peer {
            reader: Lines<BufReader<ReadHalf<DuplexStream>>>,
            writer: WriteHalf<DuplexStream>,
        }

        impl Peer {
            async fn send(&mut self, message: Value) {
                let mut line = message.to_string();
                line.push('\n');
                self.writer.write_all(line.as_bytes()).await.unwrap();
                self.writer.flush().await.unwrap();
            }

            async fn recv(&mut self) -> Value {
                let line = tokio::time::timeout(Duration::from_secs(5), self.reader.next_line())
                    .await
                    .expect("server did not answer in time")
                    .unwrap()
                    .expect("server closed the stream");
                serde_json::from_str(&line).unwrap()
            }

            async fn call(&mut self, id: u64, name: &str, arguments: Value) -> Value {
                self.send(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "method": "tools/call",
                    "params": { "name": name, "arguments": arguments }
                }))
                .await;
                let reply = self.recv().await;
                assert_eq!(reply["id"], id);
                reply
            }
        }

        async fn connect(server: McpServer) -> Peer {
            let (client, transport) = tokio::io::duplex(64 * 1024);
            tokio::spawn(async move {
                if let Ok(service) = server.serve(tokio::io::split(transport)).await {
                    let _ = service.waiting().await;
                }
            });

            let (read, writer) = tokio::io::split(client);
            let mut peer = Peer {
                reader: BufReader::new(read).lines(),
                writer,
            };

            peer.send(json!({
                "jsonrpc": "2.0",
                "id": 0,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2025-03-26",
                    "capabilities": {},
                    "clientInfo": { "name": "test-client", "version": "0.0.0" }
                }
            }))
            .await;
            let init = peer.recv().await;
            assert_eq!(init["id"], 0);
            assert_eq!(init["result"]["serverInfo"]["name"], "symphony-mcp");

            peer.send(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
                .await;
            peer
        }

        #[tokio::test]
        async fn test_tool_call_reaches_backend() {
            let backend =
                Arc::new(RecordingBackend::new().respond("/agent/A1/fees", json!({ "rate": 0.01 })));
            let mut peer = connect(test_server(backend.clone())).await;

            let reply = peer.call(1, "getAgentFees", json!({ "agentId": "A1" })).await;
            assert_eq!(reply["result"]["structuredContent"], json!({ "rate": 0.01 }));
            assert_eq!(reply["result"]["isError"], false);
            assert_eq!(reply["result"]["content"][0]["text"], r#"{"rate":0.01}"#);

            let requests = backend.requests();
            assert_eq!(requests.len(), 1);
            assert_eq!(requests[0], crate::core::backend::BackendRequest::get("/agent/A1/fees"));
        }

        #[tokio::test]
        async fn test_backend_failure_is_tool_error() {
            let backend = Arc::new(RecordingBackend::new().fail(
                "/withdraw/token",
                404,
                json!({ "message": "not found" }),
            ));
            let mut peer = connect(test_server(backend)).await;

            let reply = peer
                .call(2, "withdrawToken", json!({ "payload": { "token": "USDC" } }))
                .await;
            assert_eq!(reply["result"]["isError"], true);
            assert_eq!(
                reply["result"]["content"][0]["text"],
                "Symphony POST /withdraw/token failed: not found"
            );
        }

        #[tokio::test]
        async fn test_invalid_arguments_are_protocol_errors() {
            let backend = Arc::new(RecordingBackend::new());
            let mut peer = connect(test_server(backend.clone())).await;

            let reply = peer.call(3, "getAgentFees", json!({ "agentId": ".." })).await;
            assert_eq!(reply["error"]["code"], -32602);
            assert_eq!(backend.call_count(), 0);
        }
    }
}
