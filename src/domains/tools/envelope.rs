//! Uniform success envelope returned by every tool.

use rmcp::model::{CallToolResult, Content};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Success container: `{"content": [{"type": "json", "json": <data>}]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub content: Vec<EnvelopeContent>,
}

/// A single content item of an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EnvelopeContent {
    Json { json: Value },
}

impl ResultEnvelope {
    /// Wrap backend data.
    pub fn json(data: Value) -> Self {
        Self {
            content: vec![EnvelopeContent::Json { json: data }],
        }
    }

    /// The wrapped data.
    pub fn data(&self) -> Option<&Value> {
        self.content.first().map(|item| match item {
            EnvelopeContent::Json { json } => json,
        })
    }

    pub fn into_data(self) -> Value {
        self.content
            .into_iter()
            .next()
            .map(|item| match item {
                EnvelopeContent::Json { json } => json,
            })
            .unwrap_or(Value::Null)
    }

    /// Convert to an MCP tool result.
    ///
    /// MCP content has no `json` item type, so the data travels both as text
    /// and as `structuredContent`.
    pub fn into_call_tool_result(self) -> CallToolResult {
        let data = self.into_data();
        CallToolResult {
            content: vec![Content::text(data.to_string())],
            structured_content: Some(data),
            is_error: Some(false),
            meta: None,
        }
    }
}
