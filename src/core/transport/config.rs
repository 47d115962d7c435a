//! Transport configuration types.

use serde::{Deserialize, Serialize};

/// Transport configuration options.
///
/// Exactly one transport serves a process; the choice is made once at
/// startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Newline-delimited JSON-RPC over stdin/stdout (default for MCP).
    #[cfg(feature = "stdio")]
    Stdio,

    /// Newline-delimited JSON-RPC over raw TCP connections.
    #[cfg(feature = "tcp")]
    Tcp(TcpConfig),

    /// Plain REST: `/list_tools` and `/run_tool`.
    #[cfg(feature = "http")]
    Rest(HttpConfig),

    /// MCP over HTTP: JSON-RPC over POST, answered as JSON or SSE.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// TCP transport configuration.
#[cfg(feature = "tcp")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TcpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
}

/// HTTP configuration, shared by the REST and MCP-HTTP transports.
#[cfg(feature = "http")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path of the MCP endpoint (MCP-HTTP only).
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,

    /// Interval between SSE keep-alive comments, in seconds.
    #[serde(default = "default_keepalive")]
    pub sse_keepalive_secs: u64,
}

#[cfg(any(feature = "tcp", feature = "http"))]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

#[cfg(feature = "http")]
fn default_keepalive() -> u64 {
    15
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

        #[cfg(all(not(feature = "stdio"), not(feature = "http"), feature = "tcp"))]
        {
            return Self::Tcp(TcpConfig::default());
        }

        #[cfg(not(any(feature = "stdio", feature = "tcp", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio, tcp, or http");
        }
    }
}

#[cfg(feature = "tcp")]
impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: default_host(),
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
            sse_keepalive_secs: default_keepalive(),
        }
    }
}

#[cfg(feature = "http")]
impl HttpConfig {
    /// Socket address to bind.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse("MCP_HTTP_PORT").unwrap_or(defaults.port),
            host: std::env::var("MCP_HTTP_HOST").unwrap_or(defaults.host),
            rpc_path: std::env::var("MCP_HTTP_PATH").unwrap_or(defaults.rpc_path),
            enable_cors: std::env::var("MCP_HTTP_CORS")
                .map(|v| is_truthy(&v))
                .unwrap_or(defaults.enable_cors),
            sse_keepalive_secs: env_parse("MCP_SSE_KEEPALIVE_SECS")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.sse_keepalive_secs),
        }
    }
}

impl TransportConfig {
    /// Create a REST transport config.
    #[cfg(feature = "http")]
    pub fn rest(port: u16, host: impl Into<String>) -> Self {
        Self::Rest(HttpConfig {
            port,
            host: host.into(),
            ..Default::default()
        })
    }

    /// Create an MCP-HTTP transport config.
    #[cfg(feature = "http")]
    pub fn http(port: u16, host: impl Into<String>) -> Self {
        Self::Http(HttpConfig {
            port,
            host: host.into(),
            ..Default::default()
        })
    }

    /// Load transport config from environment variables.
    ///
    /// `MCP_TRANSPORT` selects the transport. When it is unset the legacy
    /// `MCP_MODE` flag is honoured: truthy selects MCP-HTTP, anything else
    /// REST.
    pub fn from_env() -> Self {
        let selector = match std::env::var("MCP_TRANSPORT") {
            Ok(transport) => transport.trim().to_lowercase(),
            Err(_) => match std::env::var("MCP_MODE") {
                Ok(mode) if is_truthy(&mode) => "http".to_string(),
                Ok(_) => "rest".to_string(),
                Err(_) => String::new(),
            },
        };
        Self::from_selector(&selector)
    }

    fn from_selector(selector: &str) -> Self {
        match selector {
            #[cfg(feature = "tcp")]
            "tcp" => {
                let defaults = TcpConfig::default();
                Self::Tcp(TcpConfig {
                    port: env_parse("MCP_TCP_PORT").unwrap_or(defaults.port),
                    host: std::env::var("MCP_TCP_HOST").unwrap_or(defaults.host),
                })
            }
            #[cfg(feature = "http")]
            "rest" => Self::Rest(HttpConfig::from_env()),
            #[cfg(feature = "http")]
            "http" | "mcp" => Self::Http(HttpConfig::from_env()),
            "" => Self::default(),
            other => {
                tracing::warn!("Unknown transport '{}', using the default", other);
                Self::default()
            }
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "tcp")]
            Self::Tcp(cfg) => format!("TCP on {}:{}", cfg.host, cfg.port),
            #[cfg(feature = "http")]
            Self::Rest(cfg) => format!("REST on {}", cfg.address()),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("MCP-HTTP on {}{}", cfg.address(), cfg.rpc_path),
        }
    }
}

#[cfg(any(feature = "tcp", feature = "http"))]
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

pub(crate) fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::test_env;

    #[test]
    fn test_truthy() {
        assert!(is_truthy("TRUE"));
        assert!(is_truthy(" 1 "));
        assert!(!is_truthy("false"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn test_selector() {
        #[cfg(feature = "http")]
        {
            assert!(matches!(TransportConfig::from_selector("rest"), TransportConfig::Rest(_)));
            assert!(matches!(TransportConfig::from_selector("http"), TransportConfig::Http(_)));
        }
        assert_eq!(TransportConfig::from_selector(""), TransportConfig::default());
        assert_eq!(
            TransportConfig::from_selector("carrier-pigeon"),
            TransportConfig::default()
        );
    }

    #[test]
    fn test_from_env_defaults_to_stdio_when_unset() {
        let _lock = test_env::lock();
        assert_eq!(TransportConfig::from_env(), TransportConfig::default());
        #[cfg(feature = "stdio")]
        assert_eq!(TransportConfig::from_env(), TransportConfig::Stdio);
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_legacy_mode_flag() {
        let _lock = test_env::lock();

        for truthy in ["true", "1", "YES"] {
            test_env::set("MCP_MODE", truthy);
            assert!(
                matches!(TransportConfig::from_env(), TransportConfig::Http(_)),
                "MCP_MODE={truthy}"
            );
        }
        for other in ["false", "0", "rest", ""] {
            test_env::set("MCP_MODE", other);
            assert!(
                matches!(TransportConfig::from_env(), TransportConfig::Rest(_)),
                "MCP_MODE={other}"
            );
        }
        test_env::clear();
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_transport_selector_wins_over_mode() {
        let _lock = test_env::lock();
        test_env::set("MCP_MODE", "true");
        test_env::set("MCP_TRANSPORT", " REST ");
        assert!(matches!(TransportConfig::from_env(), TransportConfig::Rest(_)));

        test_env::set("MCP_MODE", "false");
        test_env::set("MCP_TRANSPORT", "mcp");
        assert!(matches!(TransportConfig::from_env(), TransportConfig::Http(_)));
        test_env::clear();
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_settings_from_env() {
        let _lock = test_env::lock();
        test_env::set("MCP_TRANSPORT", "http");
        test_env::set("MCP_HTTP_PORT", "9100");
        test_env::set("MCP_HTTP_PATH", "/rpc");
        test_env::set("MCP_HTTP_CORS", "off");
        test_env::set("MCP_SSE_KEEPALIVE_SECS", "0");

        let TransportConfig::Http(cfg) = TransportConfig::from_env() else {
            panic!("expected the MCP-HTTP transport");
        };
        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.rpc_path, "/rpc");
        assert!(!cfg.enable_cors);
        // Zero is not a usable interval.
        assert_eq!(cfg.sse_keepalive_secs, 15);
        test_env::clear();
    }

    #[cfg(feature = "tcp")]
    #[test]
    fn test_tcp_from_env() {
        let _lock = test_env::lock();
        test_env::set("MCP_TRANSPORT", "tcp");
        test_env::set("MCP_TCP_PORT", "4100");
        assert_eq!(
            TransportConfig::from_env(),
            TransportConfig::Tcp(TcpConfig {
                port: 4100,
                host: "127.0.0.1".to_string(),
            })
        );
        test_env::clear();
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_defaults() {
        let cfg = HttpConfig::default();
        assert_eq!(cfg.address(), "127.0.0.1:8080");
        assert_eq!(cfg.rpc_path, "/mcp");
        assert_eq!(cfg.sse_keepalive_secs, 15);
        assert!(TransportConfig::http(9000, "0.0.0.0")
            .description()
            .contains("0.0.0.0:9000/mcp"));
    }
}
