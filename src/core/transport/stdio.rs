//! STDIO transport implementation.
//!
//! Newline-delimited JSON-RPC over standard input/output, the default MCP
//! mode. Messages are handled strictly in order; a bad line gets an error
//! response and the loop carries on. Logs go to stderr, so stdout carries
//! protocol frames only.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use super::service::Transport;
use super::{TransportError, TransportResult};
use crate::core::McpServer;
use crate::core::protocol::{JsonRpcResponse, McpRouter, ProtocolError};

/// STDIO transport handler.
pub struct StdioTransport;

#[async_trait]
impl Transport for StdioTransport {
    fn describe(&self) -> String {
        "STDIO (standard MCP mode)".to_string()
    }

    async fn serve(self: Box<Self>, server: McpServer) -> TransportResult<()> {
        info!("Ready - communicating via stdin/stdout");
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        let handled = serve_lines(server.router(), stdin, stdout).await?;
        info!("STDIO transport finished after {} messages", handled);
        Ok(())
    }
}

/// Serve one JSON-RPC session over a line-framed stream.
///
/// Returns the number of messages handled once `reader` reaches end of
/// input. A line that is not UTF-8 is answered like any malformed message.
/// Read and write failures end the session.
pub async fn serve_lines<R, W>(
    router: &McpRouter,
    mut reader: R,
    mut writer: W,
) -> TransportResult<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    let mut handled = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                handled += 1;
                debug!("<- {}", line);
                router.handle_message(line).await
            }
            Err(e) => {
                handled += 1;
                warn!("Rejecting non UTF-8 frame: {}", e);
                Some(ProtocolError::InvalidJson(format!("invalid UTF-8: {e}")).into_response())
            }
        };
        let Some(response) = response else {
            continue;
        };

        write_frame(&mut writer, &response).await?;
    }

    Ok(handled)
}

async fn write_frame<W>(writer: &mut W, response: &JsonRpcResponse) -> TransportResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut frame = serde_json::to_vec(response)?;
    frame.push(b'\n');
    writer
        .write_all(&frame)
        .await
        .map_err(|e| TransportError::connection(format!("write failed: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| TransportError::connection(format!("flush failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::{RegistryBuilder, ToolSchema, TypeTag};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn router() -> McpRouter {
        let mut builder = RegistryBuilder::new();
        builder
            .register(
                "echo",
                ToolSchema::builder("Echo text back.")
                    .required("text", TypeTag::String)
                    .build()
                    .unwrap(),
                |args| Ok(args["text"].clone()),
            )
            .unwrap();
        McpRouter::new(Arc::new(builder.freeze()), "stdio-test", "0.0.0")
    }

    async fn run(input: &str) -> (usize, Vec<Value>) {
        run_bytes(input.as_bytes()).await
    }

    async fn run_bytes(input: &[u8]) -> (usize, Vec<Value>) {
        let router = router();
        let mut output = Vec::new();
        let handled = serve_lines(&router, input, &mut output)
            .await
            .unwrap();
        let responses = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (handled, responses)
    }

    #[tokio::test]
    async fn test_list_then_invalid_line() {
        let input = "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\nthis is not json\n";
        let (handled, responses) = run(input).await;

        assert_eq!(handled, 2);
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["result"]["tools"][0]["name"], "echo");
        assert_eq!(responses[1]["id"], Value::Null);
        assert_eq!(responses[1]["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn test_non_utf8_line_keeps_session() {
        let mut input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n".to_vec();
        input.extend_from_slice(b"\xff\xfe garbage\n");
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n");

        let (handled, responses) = run_bytes(&input).await;
        assert_eq!(handled, 3);
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["id"], Value::Null);
        assert_eq!(responses[1]["error"]["code"], -32600);
        assert_eq!(responses[2]["id"], 2);
        assert_eq!(responses[2]["result"], json!({}));
    }

    #[tokio::test]
    async fn test_last_line_without_newline() {
        let (handled, responses) = run(r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#).await;
        assert_eq!(handled, 1);
        assert_eq!(responses[0]["id"], 7);
    }

    #[tokio::test]
    async fn test_session_survives_errors() {
        let input = [
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call",
                   "params": {"name": "missing"}}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
                   "params": {"name": "echo", "arguments": {"text": "still here"}}}),
        ]
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("\n\n");

        let (handled, responses) = run(&input).await;
        assert_eq!(handled, 3);
        // The notification produces no frame.
        assert_eq!(responses.len(), 2);
        assert!(responses[0].get("error").is_some());
        assert_eq!(responses[1]["result"]["content"][0]["text"], "still here");
    }

    #[tokio::test]
    async fn test_empty_input_closes() {
        let (handled, responses) = run("").await;
        assert_eq!(handled, 0);
        assert!(responses.is_empty());
    }
}
