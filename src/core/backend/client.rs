//! reqwest-backed Symphony client.

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::error::BackendError;
use super::request::BackendRequest;
use super::response::parse_body;
use super::BackendApi;
use crate::core::config::BackendConfig;

/// Header carrying the static Symphony credential.
pub const API_KEY_HEADER: &str = "x-api-key";

/// HTTP client bound to one Symphony base address and credential.
#[derive(Clone)]
pub struct SymphonyClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for SymphonyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymphonyClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl SymphonyClient {
    /// Create a client from the backend configuration.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| BackendError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// The base address every path is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform one request and normalize the outcome.
    #[instrument(skip_all, fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: &BackendRequest) -> Result<Value, BackendError> {
        if !request.path.starts_with('/') {
            return Err(BackendError::InvalidPath(request.path.clone()));
        }

        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self
            .http
            .request(request.method.into(), &url)
            .header(CONTENT_TYPE, "application/json");

        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }

        if let Some(body) = request.wire_body() {
            builder = builder.json(body);
        }

        debug!("Calling Symphony: {} {}", request.method, url);

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(request, &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(request, &e))?;
        let body = parse_body(&text);

        if status.is_success() {
            debug!(status = status.as_u16(), "Symphony call succeeded");
            Ok(body)
        } else {
            warn!(status = status.as_u16(), "Symphony call failed");
            Err(BackendError::status(
                request.method,
                &request.path,
                status.as_u16(),
                body,
                status.canonical_reason(),
            ))
        }
    }
}

#[async_trait::async_trait]
impl BackendApi for SymphonyClient {
    async fn call(&self, request: BackendRequest) -> Result<Value, BackendError> {
        self.send(&request).await
    }
}

fn transport_error(request: &BackendRequest, error: &reqwest::Error) -> BackendError {
    let message = if error.is_timeout() {
        "request timed out".to_string()
    } else {
        error.to_string()
    };
    warn!("Symphony request did not complete: {}", message);
    BackendError::transport(request.method, &request.path, message)
}
