//! Declarative argument schemas and their validation.
//!
//! A schema is a flat list of named fields. Validation checks presence and
//! shape of each declared field, drops undeclared ones and reports every
//! offending field at once.

use rmcp::model::JsonObject;
use serde_json::{Map, Value, json};

/// Semantic type of a single argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any JSON object, forwarded untouched.
    Payload,
    /// Any string.
    Text,
    /// Non-empty string usable as one URL path segment. `.` and `..` are
    /// refused since URL normalization would collapse them.
    PathSegment,
    /// String starting with `/`.
    EndpointPath,
    /// String restricted to a fixed set of values.
    OneOf(&'static [&'static str]),
}

/// Declaration of one argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub description: &'static str,
}

impl FieldDef {
    pub const fn required(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
        }
    }

    fn check(&self, value: &Value) -> Result<(), String> {
        match (self.kind, value) {
            (FieldKind::Payload, Value::Object(_)) => Ok(()),
            (FieldKind::Payload, other) => Err(expected("object", other)),
            (FieldKind::Text, Value::String(_)) => Ok(()),
            (FieldKind::PathSegment, Value::String(s)) => {
                if s.is_empty() {
                    Err("must not be empty".to_string())
                } else if is_dot_segment(s) {
                    Err("must not be a dot segment".to_string())
                } else if s.contains(['/', '\\', '?', '#']) {
                    Err("must not contain '/', '\\', '?' or '#'".to_string())
                } else {
                    Ok(())
                }
            }
            (FieldKind::EndpointPath, Value::String(s)) => {
                if s.starts_with('/') {
                    Ok(())
                } else {
                    Err("must start with '/'".to_string())
                }
            }
            (FieldKind::OneOf(choices), Value::String(s)) => {
                if choices.contains(&s.as_str()) {
                    Ok(())
                } else {
                    Err(format!("expected one of {}, received '{}'", choices.join(", "), s))
                }
            }
            (_, other) => Err(expected("string", other)),
        }
    }

    fn json_schema(&self) -> Value {
        let mut schema = match self.kind {
            FieldKind::Payload => json!({ "type": "object", "additionalProperties": true }),
            FieldKind::Text | FieldKind::EndpointPath => json!({ "type": "string" }),
            FieldKind::PathSegment => json!({ "type": "string", "minLength": 1 }),
            FieldKind::OneOf(choices) => json!({ "type": "string", "enum": choices }),
        };
        if !self.description.is_empty() {
            schema["description"] = Value::String(self.description.to_string());
        }
        schema
    }
}

/// Input contract of a tool. Immutable once the tool is registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentSchema {
    fields: Vec<FieldDef>,
}

impl ArgumentSchema {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self { fields }
    }

    /// Schema of a tool that takes no arguments.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Validate raw caller arguments.
    ///
    /// Missing arguments are treated as an empty object. Optional fields may
    /// be absent or `null`.
    pub fn validate(&self, raw: Option<&Value>) -> Result<ValidatedArgs, String> {
        let empty = Map::new();
        let object = match raw {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(other) => return Err(format!("arguments: {}", expected("object", other))),
        };

        let mut problems = Vec::new();
        let mut accepted = Map::new();

        for field in &self.fields {
            match object.get(field.name) {
                None | Some(Value::Null) if field.required => {
                    problems.push(format!("{}: required", field.name));
                }
                None | Some(Value::Null) => {}
                Some(value) => match field.check(value) {
                    Ok(()) => {
                        accepted.insert(field.name.to_string(), value.clone());
                    }
                    Err(reason) => problems.push(format!("{}: {}", field.name, reason)),
                },
            }
        }

        if problems.is_empty() {
            Ok(ValidatedArgs(accepted))
        } else {
            Err(problems.join("; "))
        }
    }

    /// Render as a JSON Schema object for tool listings.
    pub fn to_json_schema(&self) -> JsonObject {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.to_string(), f.json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), json!(required));
        }
        schema
    }
}

/// Arguments that passed schema validation. Only declared fields survive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArgs(Map<String, Value>);

impl ValidatedArgs {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn payload(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| v.is_object())
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// `.` or `..`, including the percent-encoded spellings URL parsers accept.
fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

fn expected(kind: &str, received: &Value) -> String {
    format!("expected {}, received {}", kind, type_name(received))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
