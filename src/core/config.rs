//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure populated from
//! environment variables or defaults. The binary loads `.env` through
//! `dotenvy` before reading any of them.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Default Symphony API base address.
pub const DEFAULT_BASE_URL: &str = "https://api.symphony.io";

/// Default deadline for a single backend call, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Symphony backend configuration.
    pub backend: BackendConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
///
/// Read on its own, before [`Config::from_env`], so that warnings raised while
/// loading the rest of the configuration reach an installed subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level floor (e.g., "info", "debug", "trace").
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Load from `MCP_LOG_LEVEL`.
    pub fn from_env() -> Self {
        std::env::var("MCP_LOG_LEVEL")
            .map(|level| Self { level })
            .unwrap_or_default()
    }
}

/// Configuration for the Symphony backend.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base address every tool path is appended to.
    pub base_url: String,

    /// Value sent in the `x-api-key` header.
    pub api_key: Option<String>,

    /// Per-request deadline. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }
}

impl BackendConfig {
    /// Load backend settings from `SYMPHONY_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        match std::env::var("SYMPHONY_API_KEY") {
            Ok(key) if !key.is_empty() => {
                config.api_key = Some(key);
                info!("Symphony API key loaded from environment");
            }
            _ => warn!("SYMPHONY_API_KEY not set - requests will be sent without credentials"),
        }

        if let Ok(base_url) = std::env::var("SYMPHONY_BASE_URL") {
            config.base_url = base_url;
        }

        if let Ok(raw) = std::env::var("SYMPHONY_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(0) => config.timeout = None,
                Ok(secs) => config.timeout = Some(Duration::from_secs(secs)),
                Err(_) => warn!(
                    "Invalid SYMPHONY_TIMEOUT_SECS '{}', using {}s",
                    raw, DEFAULT_TIMEOUT_SECS
                ),
            }
        }

        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "symphony-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            transport: TransportConfig::default(),
            backend: BackendConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Server settings use the `MCP_` prefix (`MCP_SERVER_NAME`,
    /// `MCP_TRANSPORT`, ...), backend settings the `SYMPHONY_` prefix.
    /// `.env` loading is left to the caller, which does it before logging.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        config.transport = TransportConfig::from_env();
        config.backend = BackendConfig::from_env();

        config
    }
}
