//! Tool-specific error types.

use thiserror::Error;

/// Errors that can occur while describing, registering or invoking tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A callable could not be turned into a schema.
    ///
    /// Only raised for structurally broken declarations (empty or repeated
    /// parameter names).
    #[error("Schema extraction failed: {0}")]
    SchemaExtraction(String),

    /// A tool with this name is already registered.
    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),

    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Invalid arguments were provided to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The tool handler failed or panicked.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

impl ToolError {
    /// Create a new "schema extraction" error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaExtraction(msg.into())
    }

    /// Create a new "duplicate tool" error.
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateTool(name.into())
    }

    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a new "execution failed" error.
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Whether the caller can fix this error by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidArguments(_))
    }
}
