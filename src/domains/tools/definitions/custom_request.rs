//! Generic pass-through tool.
//!
//! `symphonyRequest` reaches any Symphony endpoint: the caller chooses the
//! path, the verb and an optional body.

use futures::FutureExt;

use crate::core::backend::{BackendRequest, HttpMethod};
use crate::domains::tools::contract::{ToolContract, forward};
use crate::domains::tools::schema::{ArgumentSchema, FieldKind, FieldDef};
use crate::domains::tools::ToolError;

/// Custom request tool definition.
pub struct SymphonyRequestTool;

impl SymphonyRequestTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "symphonyRequest";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Make a custom request to any Symphony API endpoint";

    pub fn schema() -> ArgumentSchema {
        ArgumentSchema::new(vec![
            FieldDef::required(
                "path",
                FieldKind::EndpointPath,
                "Endpoint path like /agent/register",
            ),
            FieldDef::required("method", FieldKind::OneOf(HttpMethod::NAMES), "HTTP method"),
            FieldDef::optional("body", FieldKind::Payload, "Optional JSON request body"),
        ])
    }

    pub fn contract() -> ToolContract {
        ToolContract::new(Self::NAME, Self::DESCRIPTION, Self::schema(), |backend, args| {
            let path = args.text("path").unwrap_or_default().to_string();
            let body = args.payload("body").cloned();
            match args.text("method").unwrap_or_default().parse::<HttpMethod>() {
                Ok(method) => forward(backend, BackendRequest::new(method, path).with_body(body)),
                Err(reason) => {
                    let err = ToolError::invalid_arguments(reason);
                    async move { Err(err) }.boxed()
                }
            }
        })
    }
}
