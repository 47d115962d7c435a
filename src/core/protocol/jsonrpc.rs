//! JSON-RPC 2.0 envelopes.
//!
//! Parsing is strict about structure and lenient about nothing else: an
//! envelope that is not a single object with `jsonrpc: "2.0"` and a string
//! `method` is rejected with a [`ProtocolError`], which maps to the
//! "Invalid Request" error object.

use rmcp::model::{ErrorCode, ErrorData};
use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

pub const JSONRPC_VERSION: &str = "2.0";

/// A parsed request or notification.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    /// `None` for notifications.
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Map<String, Value>>,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// A response envelope. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorData>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, error: ErrorData) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A malformed envelope.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// Well-formed JSON that is not a valid request. Keeps the request id
    /// when one could be read.
    #[error("invalid request: {reason}")]
    InvalidRequest { id: Option<Value>, reason: String },
}

impl ProtocolError {
    fn invalid(id: Option<Value>, reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            id,
            reason: reason.into(),
        }
    }

    /// Id to echo in the error response, if any.
    pub fn id(&self) -> Option<Value> {
        match self {
            Self::InvalidJson(_) => None,
            Self::InvalidRequest { id, .. } => id.clone(),
        }
    }

    pub fn to_error_data(&self) -> ErrorData {
        let detail = match self {
            Self::InvalidJson(detail) => format!("invalid JSON: {detail}"),
            Self::InvalidRequest { reason, .. } => reason.clone(),
        };
        ErrorData::new(
            ErrorCode::INVALID_REQUEST,
            "Invalid Request",
            Some(json!({ "detail": detail })),
        )
    }

    pub fn into_response(self) -> JsonRpcResponse {
        JsonRpcResponse::error(self.id(), self.to_error_data())
    }
}

/// Parse one raw message.
pub fn parse_message(raw: &str) -> Result<JsonRpcRequest, ProtocolError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
    parse_value(value)
}

/// Validate an already-decoded message.
pub fn parse_value(value: Value) -> Result<JsonRpcRequest, ProtocolError> {
    let mut object = match value {
        Value::Object(object) => object,
        Value::Array(_) => {
            return Err(ProtocolError::invalid(
                None,
                "batch requests are not supported",
            ));
        }
        _ => return Err(ProtocolError::invalid(None, "request must be a JSON object")),
    };

    let id = match object.remove("id") {
        None => None,
        Some(id @ (Value::String(_) | Value::Number(_) | Value::Null)) => Some(id),
        Some(_) => return Err(ProtocolError::invalid(None, "id must be a string, number or null")),
    };

    if object.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(ProtocolError::invalid(id, "jsonrpc must be \"2.0\""));
    }

    let method = match object.remove("method") {
        Some(Value::String(method)) => method,
        Some(_) => return Err(ProtocolError::invalid(id, "method must be a string")),
        None => return Err(ProtocolError::invalid(id, "missing method")),
    };

    let params = match object.remove("params") {
        None | Some(Value::Null) => None,
        Some(Value::Object(params)) => Some(params),
        Some(_) => return Err(ProtocolError::invalid(id, "params must be an object")),
    };

    Ok(JsonRpcRequest { id, method, params })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request() {
        let request =
            parse_message(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list","params":{}}"#).unwrap();
        assert_eq!(request.id, Some(json!(1)));
        assert_eq!(request.method, "tools/list");
        assert_eq!(request.params, Some(Map::new()));
        assert!(!request.is_notification());
    }

    #[test]
    fn test_parse_notification() {
        let request =
            parse_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(request.is_notification());
        assert!(request.params.is_none());
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_message("{not json").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidJson(_)));

        let response = serde_json::to_value(err.into_response()).unwrap();
        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["error"]["code"], -32600);
        assert_eq!(response["error"]["message"], "Invalid Request");
        assert!(response.get("result").is_none());
    }

    #[test]
    fn test_structural_errors_keep_id() {
        let err = parse_message(r#"{"jsonrpc":"1.0","id":"a","method":"ping"}"#).unwrap_err();
        assert_eq!(err.id(), Some(json!("a")));

        let err = parse_message(r#"{"jsonrpc":"2.0","id":7}"#).unwrap_err();
        assert_eq!(err.id(), Some(json!(7)));
        assert_eq!(err.to_error_data().data.unwrap()["detail"], "missing method");

        let err =
            parse_message(r#"{"jsonrpc":"2.0","id":7,"method":"x","params":[1]}"#).unwrap_err();
        assert!(err.to_string().contains("params"));
    }

    #[test]
    fn test_rejected_shapes() {
        assert!(parse_message("[]").is_err());
        assert!(parse_message("42").is_err());
        let err = parse_message(r#"{"jsonrpc":"2.0","id":{},"method":"ping"}"#).unwrap_err();
        assert_eq!(err.id(), None);
    }

    #[test]
    fn test_response_shape() {
        let ok = serde_json::to_value(JsonRpcResponse::success(Some(json!(3)), json!({}))).unwrap();
        assert_eq!(ok, json!({"jsonrpc": "2.0", "id": 3, "result": {}}));
    }
}
