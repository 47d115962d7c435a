//! MCP protocol layer: JSON-RPC envelopes and the method router.
//!
//! Nothing here knows about a wire format. Transports hand raw messages to
//! [`McpRouter`] and write back whatever it returns.

pub mod jsonrpc;
pub mod router;

pub use jsonrpc::{JsonRpcRequest, JsonRpcResponse, ProtocolError, parse_message, parse_value};
pub use router::{McpRouter, SUPPORTED_PROTOCOL_VERSIONS, negotiate_version};
