//! Tool Router - builds the rmcp ToolRouter from the registry.
//!
//! Used by the STDIO transport. Every registered contract becomes one route
//! that forwards to [`ToolRegistry::dispatch`], so both transports share the
//! same validation and backend path.

use std::sync::Arc;

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, ToolRouter},
    model::{CallToolResult, Content},
};
use serde_json::Value;

use super::envelope::ResultEnvelope;
use super::error::ToolError;
use super::registry::ToolRegistry;

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(registry: Arc<ToolRegistry>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    registry
        .contracts()
        .fold(ToolRouter::new(), |router, contract| {
            let registry = registry.clone();
            let name = contract.name().to_string();

            router.with_route(ToolRoute::new_dyn(
                contract.to_tool(),
                move |ctx: ToolCallContext<'_, S>| {
                    let arguments = ctx.arguments.clone().map(Value::Object);
                    let registry = registry.clone();
                    let name = name.clone();
                    async move { to_call_tool_result(registry.dispatch(&name, arguments).await) }
                        .boxed()
                },
            ))
        })
}

/// Map a dispatch outcome onto the MCP tool-call result.
///
/// Backend failures are tool-level errors (`isError: true`) the model can
/// read; caller mistakes are protocol errors.
pub fn to_call_tool_result(
    outcome: Result<ResultEnvelope, ToolError>,
) -> Result<CallToolResult, McpError> {
    match outcome {
        Ok(envelope) => Ok(envelope.into_call_tool_result()),
        Err(e @ ToolError::Backend(_)) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        Err(e @ (ToolError::NotFound(_) | ToolError::InvalidArguments(_))) => {
            Err(McpError::invalid_params(e.to_string(), None))
        }
        Err(e @ ToolError::DuplicateTool(_)) => Err(McpError::internal_error(e.to_string(), None)),
    }
}
