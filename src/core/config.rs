//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables (optionally via a `.env` file) or
//! defaults.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
///
/// This struct contains all configurable aspects of the server, organized
/// by concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// External API credentials configuration.
    pub credentials: CredentialsConfig,

    /// Which kits load, and how failures are handled.
    pub kits: KitsConfig,
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
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Configuration for external API credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Tavily API key for the web kit.
    /// Get a key at: https://tavily.com
    pub tavily_api_key: Option<String>,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field(
                "tavily_api_key",
                &self.tavily_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Kit loading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitsConfig {
    /// Only these kits load when set (case-insensitive names).
    pub enabled: Option<Vec<String>>,

    /// Abort startup when any kit fails to load.
    pub strict: bool,

    /// Database file inspected by the SQLite kit.
    pub sqlite_path: String,
}

impl Default for KitsConfig {
    fn default() -> Self {
        Self {
            enabled: None,
            strict: false,
            sqlite_path: "example.db".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "toolforge-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig::default(),
            transport: TransportConfig::default(),
            credentials: CredentialsConfig::default(),
            kits: KitsConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_timestamps: true,
        }
    }
}

impl LoggingConfig {
    /// Read only the logging settings.
    ///
    /// Needed before the subscriber is installed, so that messages emitted
    /// while the rest of the configuration loads are not lost.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut logging = Self::default();
        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            logging.level = level;
        }
        if let Ok(timestamps) = std::env::var("MCP_LOG_TIMESTAMPS") {
            logging.with_timestamps = !matches!(
                timestamps.trim().to_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }
        logging
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_SQLITE_PATH`. The Tavily key is
    /// also read from its conventional name, `TAVILY_API_KEY`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self {
            logging: LoggingConfig::from_env(),
            ..Self::default()
        };

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        // Load kit selection
        if let Ok(kits) = std::env::var("MCP_KITS") {
            let names: Vec<String> = kits
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
            if !names.is_empty() {
                info!("Kit allow-list: {:?}", names);
                config.kits.enabled = Some(names);
            }
        }

        if let Ok(strict) = std::env::var("MCP_STRICT_KITS") {
            config.kits.strict = super::transport::is_truthy(&strict);
        }

        if let Ok(path) = std::env::var("MCP_SQLITE_PATH") {
            let path = path.trim();
            if !path.is_empty() {
                config.kits.sqlite_path = path.to_string();
            }
        }

        // Load Tavily API key
        let tavily_key = std::env::var("MCP_TAVILY_API_KEY")
            .or_else(|_| std::env::var("TAVILY_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());
        if tavily_key.is_some() {
            info!("Tavily API key loaded from environment");
        } else {
            warn!("No Tavily API key set (TAVILY_API_KEY); the web kit will be unavailable");
        }
        config.credentials.tavily_api_key = tavily_key;

        config
    }
}

/// Serialises tests that touch process environment variables.
#[cfg(test)]
pub(crate) mod test_env {
    use std::sync::{Mutex, MutexGuard};

    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "MCP_SERVER_NAME",
        "MCP_LOG_LEVEL",
        "MCP_LOG_TIMESTAMPS",
        "MCP_KITS",
        "MCP_STRICT_KITS",
        "MCP_TAVILY_API_KEY",
        "TAVILY_API_KEY",
        "MCP_SQLITE_PATH",
        "MCP_TRANSPORT",
        "MCP_MODE",
        "MCP_HTTP_PORT",
        "MCP_HTTP_HOST",
        "MCP_HTTP_PATH",
        "MCP_HTTP_CORS",
        "MCP_SSE_KEEPALIVE_SECS",
        "MCP_TCP_PORT",
        "MCP_TCP_HOST",
    ];

    /// Take the lock and start from a clean environment.
    pub(crate) fn lock() -> MutexGuard<'static, ()> {
        let guard = ENV_TEST_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        clear();
        guard
    }

    pub(crate) fn clear() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    pub(crate) fn set(key: &str, value: &str) {
        unsafe {
            std::env::set_var(key, value);
        }
    }
}
