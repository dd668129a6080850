//! Backend error types.

use serde_json::Value;
use thiserror::Error;

use super::request::HttpMethod;
use super::response::failure_message;

/// Errors produced while calling the Symphony backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered with a non-success status.
    #[error("Symphony {method} {path} failed: {message}")]
    Status {
        method: HttpMethod,
        path: String,
        status: u16,
        message: String,
        body: Value,
    },

    /// The request never produced a response (connect failure, timeout, ...).
    #[error("Symphony {method} {path} failed: {message}")]
    Transport {
        method: HttpMethod,
        path: String,
        message: String,
    },

    /// The request path is not absolute.
    #[error("Invalid backend path '{0}': must start with '/'")]
    InvalidPath(String),

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl BackendError {
    /// Build a status error, extracting the message from the parsed body.
    ///
    /// The message falls back to `reason` and then to `"Request failed"`.
    pub fn status(
        method: HttpMethod,
        path: impl Into<String>,
        status: u16,
        body: Value,
        reason: Option<&str>,
    ) -> Self {
        let message = failure_message(&body, reason);
        Self::Status {
            method,
            path: path.into(),
            status,
            message,
            body,
        }
    }

    /// Build a transport error for a request that did not complete.
    pub fn transport(method: HttpMethod, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            method,
            path: path.into(),
            message: message.into(),
        }
    }

    /// HTTP status returned by the backend, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
