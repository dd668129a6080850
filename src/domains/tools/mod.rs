//! Tools domain module.
//!
//! This module handles every Symphony tool exposed by the MCP server. A tool
//! is a [`ToolContract`]: a name, a description, an [`ArgumentSchema`] and a
//! handler that turns validated arguments into one backend call.
//!
//! ## Architecture
//!
//! - `definitions/` - the static tool catalog, grouped by API area
//! - `contract.rs` - contracts and the builders generating them
//! - `schema.rs` - argument schemas and validation
//! - `envelope.rs` - the uniform success envelope
//! - `registry.rs` - central registration and dispatch
//! - `router.rs` - rmcp ToolRouter built from the registry (STDIO transport)
//! - `error.rs` - tool-specific error types

mod contract;
pub mod definitions;
mod envelope;
mod error;
mod registry;
pub mod router;
mod schema;

pub use contract::{HandlerFuture, PAYLOAD_FIELD, ToolContract, ToolHandler, expand_template, forward};
pub use envelope::{EnvelopeContent, ResultEnvelope};
pub use error::ToolError;
pub use registry::ToolRegistry;
pub use router::{build_tool_router, to_call_tool_result};
pub use schema::{ArgumentSchema, FieldKind, FieldDef, ValidatedArgs};
