//! MCP Server implementation and lifecycle management.
//!
//! [`McpServer`] owns the frozen tool registry and the method router built
//! on top of it. It is cheap to clone and is handed to whichever transport
//! was selected at startup.
//!
//! ## Startup
//!
//! 1. Every built-in kit is loaded once, in order (`domains::kits`)
//! 2. The registry is frozen
//! 3. Only then is the server handed to a transport
//!
//! **Adding a new kit does NOT require modifying this file!**

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument, warn};

use super::config::Config;
use super::error::{Error, Result};
use super::protocol::McpRouter;
use crate::domains::kits::builtin_kits;
use crate::domains::tools::{
    Kit, KitFailurePolicy, KitLoader, LoadReport, ToolArguments, ToolError, ToolRegistry,
};

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Frozen tool registry.
    registry: Arc<ToolRegistry>,

    /// JSON-RPC router over the registry.
    router: Arc<McpRouter>,
}

impl McpServer {
    /// Create a new MCP server, loading the built-in kits.
    pub fn new(config: Config) -> Result<Self> {
        let kits = builtin_kits(&config);
        Self::with_kits(config, kits)
    }

    /// Create a server from an explicit list of kits.
    pub fn with_kits(config: Config, kits: Vec<Box<dyn Kit>>) -> Result<Self> {
        if config.server.name.trim().is_empty() {
            return Err(Error::config("server name must not be empty"));
        }

        let policy = if config.kits.strict {
            KitFailurePolicy::Abort
        } else {
            KitFailurePolicy::Skip
        };
        let (registry, report) = KitLoader::new(policy)
            .with_allow_list(config.kits.enabled.clone())
            .load(kits)?;
        log_report(&report);

        Ok(Self::from_registry(config, registry))
    }

    /// Create a server around an already frozen registry.
    pub fn from_registry(config: Config, registry: ToolRegistry) -> Self {
        let registry = Arc::new(registry);
        let router = McpRouter::new(
            registry.clone(),
            config.server.name.clone(),
            config.server.version.clone(),
        );

        Self {
            config: Arc::new(config),
            registry,
            router: Arc::new(router),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// The JSON-RPC router shared by the MCP transports.
    pub fn router(&self) -> &McpRouter {
        &self.router
    }

    // ========================================================================
    // REST Transport Support Methods
    // ========================================================================

    /// Flat tool summaries: `[{name, description, parameters}]`.
    pub fn tool_summaries(&self) -> Vec<Value> {
        self.registry.list().iter().map(|t| t.to_summary()).collect()
    }

    /// Call a tool by name on the blocking pool.
    #[instrument(skip(self, arguments))]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: ToolArguments,
    ) -> std::result::Result<Value, ToolError> {
        self.registry
            .clone()
            .invoke_blocking(name.to_string(), arguments)
            .await
    }
}

fn log_report(report: &LoadReport) {
    for kit in &report.loaded {
        info!("Kit '{}' ready with {} tools", kit.name, kit.tools);
    }
    for kit in &report.skipped {
        warn!("Kit '{}' skipped: {}", kit.name, kit.reason);
    }
    if !report.disabled.is_empty() {
        info!("Kits disabled by MCP_KITS: {:?}", report.disabled);
    }
}
