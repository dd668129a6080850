//! Tool contracts and the builders that generate them.
//!
//! A contract is the static definition of a tool: name, description, argument
//! schema and a handler closure. Handlers receive the backend and arguments
//! that already passed schema validation.

use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use rmcp::model::Tool;
use serde_json::Value;

use super::envelope::ResultEnvelope;
use super::error::ToolError;
use super::schema::{ArgumentSchema, FieldKind, FieldDef, ValidatedArgs};
use crate::core::backend::{BackendApi, BackendRequest, HttpMethod};

/// Name of the single argument of payload-forwarding tools.
pub const PAYLOAD_FIELD: &str = "payload";

/// Future returned by a tool handler.
pub type HandlerFuture = BoxFuture<'static, Result<ResultEnvelope, ToolError>>;

/// Handler closure of a tool.
pub type ToolHandler = Arc<dyn Fn(Arc<dyn BackendApi>, ValidatedArgs) -> HandlerFuture + Send + Sync>;

/// Static definition of a callable tool.
#[derive(Clone)]
pub struct ToolContract {
    name: String,
    description: String,
    schema: ArgumentSchema,
    handler: ToolHandler,
}

impl fmt::Debug for ToolContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolContract")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl ToolContract {
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ArgumentSchema,
        handler: F,
    ) -> Self
    where
        F: Fn(Arc<dyn BackendApi>, ValidatedArgs) -> HandlerFuture + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            handler: Arc::new(handler),
        }
    }

    /// Tool whose single `payload` object is forwarded verbatim as the body.
    pub fn payload(
        name: &'static str,
        path: &'static str,
        method: HttpMethod,
        description: &'static str,
    ) -> Self {
        let schema = ArgumentSchema::new(vec![FieldDef::required(
            PAYLOAD_FIELD,
            FieldKind::Payload,
            "Request body forwarded to Symphony as-is",
        )]);

        Self::new(name, description, schema, move |backend, args| {
            let body = args.payload(PAYLOAD_FIELD).cloned();
            forward(backend, BackendRequest::new(method, path).with_body(body))
        })
    }

    /// GET tool whose single string argument replaces `{field}` in `template`.
    pub fn path_param(
        name: &'static str,
        description: &'static str,
        field: &'static str,
        template: &'static str,
    ) -> Self {
        let schema = ArgumentSchema::new(vec![FieldDef::required(
            field,
            FieldKind::PathSegment,
            "Identifier substituted into the endpoint path",
        )]);

        Self::new(name, description, schema, move |backend, args| {
            let value = args.text(field).unwrap_or_default();
            let path = expand_template(template, field, value);
            forward(backend, BackendRequest::get(path))
        })
    }

    /// GET tool without arguments.
    pub fn fixed_get(name: &'static str, description: &'static str, path: &'static str) -> Self {
        Self::new(name, description, ArgumentSchema::empty(), move |backend, _| {
            forward(backend, BackendRequest::get(path))
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &ArgumentSchema {
        &self.schema
    }

    /// Run the handler. Arguments must already be validated against the schema.
    pub fn invoke(&self, backend: Arc<dyn BackendApi>, args: ValidatedArgs) -> HandlerFuture {
        (self.handler)(backend, args)
    }

    /// Tool metadata for MCP listings.
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.clone().into(),
            description: Some(self.description.clone().into()),
            input_schema: Arc::new(self.schema.to_json_schema()),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }
}

/// Send a request and wrap the normalized body in a [`ResultEnvelope`].
pub fn forward(backend: Arc<dyn BackendApi>, request: BackendRequest) -> HandlerFuture {
    async move {
        let data: Value = backend.call(request).await?;
        Ok(ResultEnvelope::json(data))
    }
    .boxed()
}

/// Replace `{field}` in `template` with `value`.
pub fn expand_template(template: &str, field: &str, value: &str) -> String {
    template.replace(&format!("{{{field}}}"), value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::testing::RecordingBackend;
    use serde_json::json;

    #[test]
    fn test_expand_template() {
        assert_eq!(
            expand_template("/agent/{agentId}/fees", "agentId", "A1"),
            "/agent/A1/fees"
        );
        assert_eq!(
            expand_template("/smart-account/{accountId}/orders", "accountId", "0xabc"),
            "/smart-account/0xabc/orders"
        );
    }

    #[test]
    fn test_payload_contract_schema() {
        let contract =
            ToolContract::payload("setFees", "/fees/set", HttpMethod::Post, "Set fees");
        let fields = contract.schema().fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, PAYLOAD_FIELD);
        assert_eq!(fields[0].kind, FieldKind::Payload);
        assert!(fields[0].required);
    }

    #[test]
    fn test_to_tool_metadata() {
        let tool = ToolContract::path_param(
            "getAgentFees",
            "Get fees settings for a specific agent",
            "agentId",
            "/agent/{agentId}/fees",
        )
        .to_tool();
        assert_eq!(tool.name, "getAgentFees");
        assert_eq!(
            tool.description.as_deref(),
            Some("Get fees settings for a specific agent")
        );
        assert_eq!(tool.input_schema["required"], json!(["agentId"]));
    }

    #[tokio::test]
    async fn test_payload_contract_forwards_body() {
        let backend = Arc::new(RecordingBackend::new().respond("/agent/register", json!({ "id": 7 })));
        let contract = ToolContract::payload(
            "registerAgent",
            "/agent/register",
            HttpMethod::Post,
            "Register a new agent",
        );

        let args = contract
            .schema()
            .validate(Some(&json!({ "payload": { "name": "bot" } })))
            .unwrap();
        let envelope = contract.invoke(backend.clone(), args).await.unwrap();
        assert_eq!(envelope.data(), Some(&json!({ "id": 7 })));

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].path, "/agent/register");
        assert_eq!(requests[0].body, Some(json!({ "name": "bot" })));
    }

    #[tokio::test]
    async fn test_fixed_get_contract() {
        let backend = Arc::new(RecordingBackend::new());
        let contract = ToolContract::fixed_get(
            "getFeesBalances",
            "Get fee balances for the organization",
            "/fees/balances",
        );

        let args = contract.schema().validate(None).unwrap();
        let envelope = contract.invoke(backend.clone(), args).await.unwrap();
        assert_eq!(envelope.data(), Some(&json!({})));
        assert_eq!(backend.requests()[0], BackendRequest::get("/fees/balances"));
    }
}
