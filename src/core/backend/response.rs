//! Response body normalization.

use serde_json::{Map, Value, json};

/// Fallback used when neither the body nor the status line explain a failure.
const GENERIC_FAILURE: &str = "Request failed";

/// Parse a response body into a JSON value.
///
/// An empty body yields `{}` and text that is not JSON yields
/// `{"raw": <text>}`. This never fails.
pub fn parse_body(text: &str) -> Value {
    if text.is_empty() {
        return Value::Object(Map::new());
    }

    serde_json::from_str(text).unwrap_or_else(|_| json!({ "raw": text }))
}

/// Pick a human-readable failure message for an unsuccessful response.
///
/// Prefers the body's `message` field, then the status reason phrase.
pub fn failure_message(body: &Value, reason: Option<&str>) -> String {
    let from_body = match body.get("message") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Null) | Some(Value::Bool(false)) | Some(Value::String(_)) | None => None,
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => None,
        Some(other) => Some(other.to_string()),
    };

    from_body
        .or_else(|| reason.filter(|r| !r.is_empty()).map(str::to_string))
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}
