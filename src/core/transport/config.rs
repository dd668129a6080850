//! Transport configuration types.

use serde::{Deserialize, Serialize};
#[cfg(feature = "http")]
use std::time::Duration;
#[cfg(feature = "http")]
use tracing::warn;

/// Transport configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Standard input/output transport (default for MCP).
    #[cfg(feature = "stdio")]
    Stdio,

    /// HTTP transport with JSON-RPC over POST and session tracking.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// HTTP transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path for JSON-RPC endpoint.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Browser origins allowed to call the server. Empty disables CORS and
    /// rejects every request that carries an `Origin` header.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Idle time after which a session is forgotten. `0` keeps sessions
    /// until they are closed.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

#[cfg(feature = "http")]
fn default_port() -> u16 {
    3000
}

#[cfg(feature = "http")]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_session_ttl_secs() -> u64 {
    1800
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            return Self::Stdio;
        }

        #[cfg(all(not(feature = "stdio"), feature = "http"))]
        {
            return Self::Http(HttpConfig::default());
        }

        #[cfg(not(any(feature = "stdio", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio or http");
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            rpc_path: default_rpc_path(),
            allowed_origins: Vec::new(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

#[cfg(feature = "http")]
impl HttpConfig {
    /// Load HTTP settings from environment variables.
    ///
    /// The port comes from `MCP_HTTP_PORT`, then `PORT`, then the default.
    /// A variable that does not hold a valid port is skipped.
    pub fn from_env() -> Self {
        let port = ["MCP_HTTP_PORT", "PORT"]
            .into_iter()
            .filter_map(|key| std::env::var(key).ok().map(|raw| (key, raw)))
            .find_map(|(key, raw)| match raw.parse::<u16>() {
                Ok(port) => Some(port),
                Err(_) => {
                    warn!("Ignoring invalid {} '{}'", key, raw);
                    None
                }
            })
            .unwrap_or_else(default_port);
        let host = std::env::var("MCP_HTTP_HOST").unwrap_or_else(|_| default_host());
        let rpc_path = std::env::var("MCP_HTTP_PATH").unwrap_or_else(|_| default_rpc_path());
        let allowed_origins = std::env::var("MCP_HTTP_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let session_ttl_secs = match std::env::var("MCP_HTTP_SESSION_TTL_SECS") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(
                    "Invalid MCP_HTTP_SESSION_TTL_SECS '{}', using {}s",
                    raw,
                    default_session_ttl_secs()
                );
                default_session_ttl_secs()
            }),
            Err(_) => default_session_ttl_secs(),
        };

        Self {
            port,
            host,
            rpc_path,
            allowed_origins,
            session_ttl_secs,
        }
    }

    /// Session idle limit, `None` when sessions never expire.
    pub fn session_ttl(&self) -> Option<Duration> {
        (self.session_ttl_secs > 0).then(|| Duration::from_secs(self.session_ttl_secs))
    }
}

impl TransportConfig {
    /// Load transport config from environment variables.
    pub fn from_env() -> Self {
        let transport = std::env::var("MCP_TRANSPORT")
            .unwrap_or_default()
            .to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "http")]
            "http" => Self::Http(HttpConfig::from_env()),
            #[cfg(feature = "stdio")]
            _ => Self::Stdio,
            #[cfg(not(feature = "stdio"))]
            _ => Self::Http(HttpConfig::from_env()),
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("HTTP on {}:{}{}", cfg.host, cfg.port, cfg.rpc_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[cfg(feature = "http")]
    fn clear_http_env() {
        unsafe {
            std::env::remove_var("MCP_TRANSPORT");
            std::env::remove_var("MCP_HTTP_PORT");
            std::env::remove_var("PORT");
            std::env::remove_var("MCP_HTTP_ALLOWED_ORIGINS");
            std::env::remove_var("MCP_HTTP_SESSION_TTL_SECS");
        }
    }

    #[cfg(feature = "stdio")]
    #[test]
    #[allow(unreachable_patterns)]
    fn test_default_is_stdio() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::remove_var("MCP_TRANSPORT");
        }
        assert!(matches!(TransportConfig::from_env(), TransportConfig::Stdio));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_port_fallbacks() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_http_env();
        unsafe {
            std::env::set_var("MCP_TRANSPORT", "HTTP");
            std::env::set_var("PORT", "4100");
        }
        match TransportConfig::from_env() {
            TransportConfig::Http(cfg) => {
                assert_eq!(cfg.port, 4100);
                assert_eq!(cfg.rpc_path, "/mcp");
            }
            #[allow(unreachable_patterns)]
            other => panic!("unexpected transport: {other:?}"),
        }

        unsafe {
            std::env::set_var("MCP_HTTP_PORT", "4200");
        }
        assert_eq!(HttpConfig::from_env().port, 4200);

        // An unusable MCP_HTTP_PORT falls through to PORT
        unsafe {
            std::env::set_var("MCP_HTTP_PORT", "not-a-port");
        }
        assert_eq!(HttpConfig::from_env().port, 4100);

        unsafe {
            std::env::set_var("PORT", "70000");
        }
        assert_eq!(HttpConfig::from_env().port, 3000);

        clear_http_env();
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_origins_and_session_ttl() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_http_env();

        let defaults = HttpConfig::from_env();
        assert!(defaults.allowed_origins.is_empty());
        assert_eq!(defaults.session_ttl(), Some(Duration::from_secs(1800)));

        unsafe {
            std::env::set_var(
                "MCP_HTTP_ALLOWED_ORIGINS",
                "https://app.example.com, http://localhost:5173,,",
            );
            std::env::set_var("MCP_HTTP_SESSION_TTL_SECS", "0");
        }
        let cfg = HttpConfig::from_env();
        assert_eq!(
            cfg.allowed_origins,
            vec!["https://app.example.com", "http://localhost:5173"]
        );
        assert_eq!(cfg.session_ttl(), None);

        unsafe {
            std::env::set_var("MCP_HTTP_SESSION_TTL_SECS", "soon");
        }
        assert_eq!(HttpConfig::from_env().session_ttl_secs, 1800);

        clear_http_env();
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_description() {
        let config = TransportConfig::Http(HttpConfig {
            host: "0.0.0.0".to_string(),
            ..HttpConfig::default()
        });
        assert_eq!(config.description(), "HTTP on 0.0.0.0:3000/mcp");
    }
}
