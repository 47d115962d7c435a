//! Transport layer for the MCP server.
//!
//! This module provides different transport implementations:
//! - **STDIO**: Newline-delimited JSON-RPC over stdin/stdout (default) - feature: `stdio`
//! - **TCP**: The same line framing over TCP connections - feature: `tcp`
//! - **REST**: `/list_tools` and `/run_tool` over HTTP - feature: `http`
//! - **MCP-HTTP**: JSON-RPC over POST with JSON or SSE answers - feature: `http`
//!
//! Every MCP transport hands messages to the shared
//! [`McpRouter`](crate::core::protocol::McpRouter); REST calls the registry
//! directly.
//!
//! # Feature Flags
//!
//! Transport implementations are conditionally compiled based on features:
//! - `stdio` (default): STDIO transport - minimal dependencies
//! - `tcp`: TCP transport - adds tokio/net
//! - `http` (default): REST and MCP-HTTP - adds axum, tower, tower-http

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub mod rest;

#[cfg(feature = "tcp")]
pub mod tcp;

#[cfg(any(feature = "stdio", feature = "tcp"))]
pub mod stdio;

pub use config::TransportConfig;
pub(crate) use config::is_truthy;
pub use error::{TransportError, TransportResult};
pub use service::{Transport, TransportService, TransportState};

#[cfg(feature = "tcp")]
pub use config::TcpConfig;

#[cfg(feature = "http")]
pub use config::HttpConfig;
