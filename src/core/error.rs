//! Error types and handling for the MCP server.
//!
//! This module defines a unified error type that can represent errors from
//! every layer, providing consistent error handling across the application.

use thiserror::Error;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the tools domain.
    #[error("Tool error: {0}")]
    Tool(#[from] crate::domains::tools::ToolError),

    /// A kit failed to load (strict mode only).
    #[error("Kit error: {0}")]
    Kit(#[from] crate::domains::tools::KitError),

    /// Malformed protocol message.
    #[error("Protocol error: {0}")]
    Protocol(#[from] super::protocol::ProtocolError),

    /// Transport failure.
    #[error("Transport error: {0}")]
    Transport(#[from] super::transport::TransportError),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
