//! MCP-HTTP transport implementation.
//!
//! `POST <path>` carries one JSON-RPC message. The answer is a single JSON
//! object or an SSE stream framing the same payload as one `message` event,
//! chosen from the request's `Accept` header. `GET <path>` opens a long-lived
//! SSE stream that only carries keep-alive comments; its resources are
//! released when the client disconnects.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use bytes::Bytes;
use futures::{Stream, StreamExt, stream};
use http::{HeaderMap, StatusCode, header};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, instrument};

use super::config::HttpConfig;
use super::service::Transport;
use super::{TransportError, TransportResult};
use crate::core::McpServer;
use crate::core::protocol::ProtocolError;

/// MCP-HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn describe(&self) -> String {
        format!("MCP-HTTP on {}{}", self.config.address(), self.config.rpc_path)
    }

    async fn serve(self: Box<Self>, server: McpServer) -> TransportResult<()> {
        let app = mcp_router(HttpState::new(server, &self.config), &self.config);

        info!("  → JSON-RPC: POST {}", self.config.rpc_path);
        info!("  → Stream:   GET {}", self.config.rpc_path);
        info!("  → Health:   GET /health");
        serve_app(&self.config, app, "MCP over HTTP").await
    }
}

/// Application state shared across MCP-HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    server: McpServer,
    rpc_path: String,
    keepalive: Duration,
    /// Number of GET streams currently open.
    open_streams: Arc<AtomicUsize>,
}

impl HttpState {
    pub fn new(server: McpServer, config: &HttpConfig) -> Self {
        Self {
            server,
            rpc_path: config.rpc_path.clone(),
            keepalive: Duration::from_secs(config.sse_keepalive_secs),
            open_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }
}

/// Build the MCP-HTTP router.
pub fn mcp_router(state: HttpState, config: &HttpConfig) -> Router {
    let app = Router::new()
        .route(&config.rpc_path, get(handle_stream).post(handle_rpc))
        .route("/health", get(health_check))
        .route("/", get(root_handler))
        .with_state(state);
    with_layers(app, config.enable_cors)
}

// ============================================================================
// Shared HTTP plumbing (also used by the REST transport)
// ============================================================================

/// Add request tracing and, when enabled, permissive CORS.
pub(super) fn with_layers(app: Router, enable_cors: bool) -> Router {
    let app = app.layer(TraceLayer::new_for_http());
    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app.layer(cors)
    } else {
        app
    }
}

/// Bind the configured address and serve `app` until shutdown.
pub(super) async fn serve_app(
    config: &HttpConfig,
    app: Router,
    label: &str,
) -> TransportResult<()> {
    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TransportError::bind(&addr, e))?;

    let cors_status = if config.enable_cors {
        "enabled"
    } else {
        "disabled"
    };
    info!(
        "Ready - listening on {} ({}, CORS {})",
        addr, label, cors_status
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| TransportError::http(e.to_string()))
}

/// Health check endpoint.
pub(super) async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

// ============================================================================
// Handlers
// ============================================================================

/// Root handler - provides API info.
async fn root_handler(State(state): State<HttpState>) -> impl IntoResponse {
    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "MCP-HTTP",
        "endpoints": {
            "rpc": state.rpc_path,
            "health": "/health"
        },
        "protocol": "JSON-RPC 2.0",
        "tools": state.server.registry().len(),
        "documentation": format!(
            "POST JSON-RPC messages to {}; GET it for an event stream",
            state.rpc_path
        )
    }))
}

/// Handle one JSON-RPC message.
#[instrument(skip_all)]
async fn handle_rpc(State(state): State<HttpState>, headers: HeaderMap, body: Bytes) -> Response {
    let response = match serde_json::from_slice::<Value>(&body) {
        Ok(message) => state.server.router().handle_value(message).await,
        Err(e) => Some(ProtocolError::InvalidJson(e.to_string()).into_response()),
    };

    let Some(response) = response else {
        return StatusCode::ACCEPTED.into_response();
    };

    match negotiate(&headers) {
        ResponseFormat::Json => Json(response).into_response(),
        ResponseFormat::Sse => match Event::default().event("message").json_data(&response) {
            Ok(event) => {
                debug!("Answering over SSE");
                Sse::new(stream::once(async move { Ok::<_, Infallible>(event) })).into_response()
            }
            Err(e) => {
                error!("Failed to encode SSE event: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        },
    }
}

/// Open a keep-alive event stream.
async fn handle_stream(
    State(state): State<HttpState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let open = state.open_streams.fetch_add(1, Ordering::SeqCst) + 1;
    info!("SSE stream opened ({} open)", open);

    let guard = StreamGuard {
        open_streams: state.open_streams.clone(),
    };
    let events = stream::pending::<Result<Event, Infallible>>().map(move |event| {
        let _guard = &guard;
        event
    });

    Sse::new(events).keep_alive(KeepAlive::new().interval(state.keepalive))
}

/// Decrements the open-stream counter when the stream is dropped.
struct StreamGuard {
    open_streams: Arc<AtomicUsize>,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        let open = self.open_streams.fetch_sub(1, Ordering::SeqCst) - 1;
        info!("SSE stream closed ({} open)", open);
    }
}

// ============================================================================
// Content negotiation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseFormat {
    Json,
    Sse,
}

/// Pick the acceptable format with the highest quality. Ties go to the
/// earlier entry; anything else falls back to JSON.
fn negotiate(headers: &HeaderMap) -> ResponseFormat {
    let Some(accept) = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) else {
        return ResponseFormat::Json;
    };

    let mut best: Option<(ResponseFormat, f32)> = None;
    for entry in accept.split(',') {
        let mut parts = entry.split(';');
        let media = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        let format = match media.as_str() {
            "application/json" => ResponseFormat::Json,
            "text/event-stream" => ResponseFormat::Sse,
            _ => continue,
        };
        let quality = parts
            .find_map(|p| p.trim().strip_prefix("q="))
            .and_then(|q| q.trim().parse::<f32>().ok())
            .unwrap_or(1.0);
        if quality <= 0.0 {
            continue;
        }
        if best.is_none_or(|(_, q)| quality > q) {
            best = Some((format, quality));
        }
    }

    best.map(|(format, _)| format).unwrap_or(ResponseFormat::Json)
}
