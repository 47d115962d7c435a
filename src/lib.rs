//! Toolforge MCP Server Library
//!
//! Hosts loosely-typed tools and serves them over REST, MCP-stdio or
//! MCP-HTTP/SSE from a single registry.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the JSON-RPC protocol layer,
//!   the server and its transports
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: schema extraction, the registry and kit loading
//!   - **kits**: the tool collections shipped with the server
//!
//! # Example
//!
//! ```rust,no_run
//! use toolforge_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
