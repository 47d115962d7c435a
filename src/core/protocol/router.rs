//! MCP method router.
//!
//! Maps JSON-RPC methods onto registry operations. The router holds no
//! per-session state, so one instance is shared by every transport and
//! every connection.

use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, ErrorCode, ErrorData as McpError, ServerCapabilities};
use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument, warn};

use super::jsonrpc::{JsonRpcRequest, JsonRpcResponse, parse_message, parse_value};
use crate::domains::tools::{ToolArguments, ToolError, ToolRegistry};

/// Protocol revisions this server speaks, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

const INSTRUCTIONS: &str =
    "Call tools/list to discover the available tools, then tools/call to run one.";

/// Transport-agnostic JSON-RPC dispatcher.
#[derive(Debug, Clone)]
pub struct McpRouter {
    registry: Arc<ToolRegistry>,
    name: String,
    version: String,
}

impl McpRouter {
    pub fn new(
        registry: Arc<ToolRegistry>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Handle one raw message. Returns `None` for notifications.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        match parse_message(raw) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!("Rejected message: {}", e);
                Some(e.into_response())
            }
        }
    }

    /// Handle one decoded message. Returns `None` for notifications.
    pub async fn handle_value(&self, value: Value) -> Option<JsonRpcResponse> {
        match parse_value(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!("Rejected message: {}", e);
                Some(e.into_response())
            }
        }
    }

    #[instrument(skip_all, fields(method = %request.method))]
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }

        let JsonRpcRequest { id, method, params } = request;
        let outcome = match method.as_str() {
            "initialize" => Ok(self.initialize(params.as_ref())),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.list_tools()),
            "tools/call" => self.call_tool(params).await,
            _ => {
                warn!("Unknown method: {}", method);
                Err(McpError::new(
                    ErrorCode::METHOD_NOT_FOUND,
                    format!("Method not found: {method}"),
                    None,
                ))
            }
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => info!("Client initialized"),
            "notifications/cancelled" => debug!("Client cancelled a request"),
            other => debug!("Ignoring notification: {}", other),
        }
    }

    fn initialize(&self, params: Option<&Map<String, Value>>) -> Value {
        let requested = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str);
        let version = negotiate_version(requested);
        info!(
            "Initialize: client requested {:?}, using {}",
            requested, version
        );

        json!({
            "protocolVersion": version,
            "capabilities": ServerCapabilities::builder().enable_tools().build(),
            "serverInfo": {
                "name": self.name,
                "version": self.version,
            },
            "instructions": INSTRUCTIONS,
        })
    }

    fn list_tools(&self) -> Value {
        let tools: Vec<_> = self.registry.list().iter().map(|t| t.to_tool()).collect();
        debug!("Listing {} tools", tools.len());
        json!({ "tools": tools })
    }

    async fn call_tool(&self, params: Option<Map<String, Value>>) -> Result<Value, McpError> {
        let Some(mut params) = params else {
            return Err(McpError::invalid_params("Missing params", None));
        };

        let name = match params.remove("name") {
            Some(Value::String(name)) => name,
            _ => return Err(McpError::invalid_params("Missing tool name", None)),
        };

        let arguments: ToolArguments = match params.remove("arguments") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(arguments)) => arguments,
            Some(_) => {
                return Err(McpError::invalid_params(
                    "arguments must be an object",
                    None,
                ));
            }
        };

        if self.registry.get(&name).is_none() {
            warn!("Tool not found: {}", name);
            return Err(McpError::invalid_params(format!("Tool not found: {name}"), None));
        }

        let result = match self.registry.clone().invoke_blocking(name, arguments).await {
            Ok(value) => CallToolResult::success(vec![Content::text(render(&value))]),
            Err(ToolError::ExecutionFailed(message)) => {
                CallToolResult::error(vec![Content::text(message)])
            }
            Err(e) if e.is_client_error() => {
                return Err(McpError::invalid_params(e.to_string(), None));
            }
            Err(e) => return Err(McpError::internal_error(e.to_string(), None)),
        };

        serde_json::to_value(result).map_err(|e| McpError::internal_error(e.to_string(), None))
    }
}

/// Echo the client's version when supported, otherwise offer the newest.
pub fn negotiate_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|r| SUPPORTED_PROTOCOL_VERSIONS.iter().find(|v| **v == r))
        .copied()
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0])
}

/// Text content for a tool result: strings as-is, anything else as compact JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
