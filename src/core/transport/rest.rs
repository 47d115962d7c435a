//! REST transport implementation.
//!
//! Stateless, one request per response:
//! - `GET|POST /list_tools` returns `[{name, description, parameters}]`
//! - `POST /run_tool` takes `{name, args}` and returns `{"result": ...}`
//!
//! Every failure is a JSON body `{"error": "..."}` with a 4xx/5xx status.

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use http::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{info, instrument, warn};

use super::TransportResult;
use super::config::HttpConfig;
use super::http::{health_check, serve_app, with_layers};
use super::service::Transport;
use crate::core::McpServer;
use crate::domains::tools::ToolError;

/// REST transport handler.
pub struct RestTransport {
    config: HttpConfig,
}

impl RestTransport {
    /// Create a new REST transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Transport for RestTransport {
    fn describe(&self) -> String {
        format!("REST on {}", self.config.address())
    }

    async fn serve(self: Box<Self>, server: McpServer) -> TransportResult<()> {
        let app = rest_router(server, self.config.enable_cors);

        info!("  → List:   GET|POST /list_tools");
        info!("  → Run:    POST /run_tool");
        info!("  → Health: GET /health");
        serve_app(&self.config, app, "REST").await
    }
}

/// Build the REST router.
pub fn rest_router(server: McpServer, enable_cors: bool) -> Router {
    let app = Router::new()
        .route("/list_tools", get(list_tools).post(list_tools))
        .route("/run_tool", post(run_tool))
        .route("/health", get(health_check))
        .with_state(server);
    with_layers(app, enable_cors)
}

/// Body of `/run_tool`. `tool` and `arguments` are accepted as aliases.
#[derive(Debug, Deserialize)]
struct RunToolRequest {
    #[serde(alias = "tool")]
    name: String,
    #[serde(default, alias = "arguments")]
    args: Value,
}

/// An error answered as `{"error": message}`.
#[derive(Debug)]
struct RestError {
    status: StatusCode,
    message: String,
}

impl RestError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ToolError> for RestError {
    fn from(e: ToolError) -> Self {
        let status = match e {
            ToolError::NotFound(_) => StatusCode::NOT_FOUND,
            ToolError::InvalidArguments(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[instrument(skip_all)]
async fn list_tools(State(server): State<McpServer>) -> Json<Vec<Value>> {
    Json(server.tool_summaries())
}

#[instrument(skip_all)]
async fn run_tool(State(server): State<McpServer>, body: Bytes) -> Result<Json<Value>, RestError> {
    let request: RunToolRequest = serde_json::from_slice(&body)
        .map_err(|e| RestError::bad_request(format!("Invalid request body: {e}")))?;

    let args = match request.args {
        Value::Null => Map::new(),
        Value::Object(args) => args,
        _ => return Err(RestError::bad_request("args must be an object")),
    };

    match server.call_tool(&request.name, args).await {
        Ok(result) => Ok(Json(json!({ "result": result }))),
        Err(e) => {
            warn!("run_tool '{}' failed: {}", request.name, e);
            Err(e.into())
        }
    }
}
