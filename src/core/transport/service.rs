//! Transport service - orchestrates different transport types.
//!
//! One [`Transport`] strategy is chosen when the service is built, either
//! from a [`TransportConfig`] or injected directly. The service tracks the
//! dispatcher lifecycle (`Uninitialized -> Ready -> Closed`) and publishes
//! it through a watch channel.

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{info, warn};

use super::{TransportConfig, TransportResult};
use crate::core::McpServer;

#[cfg(feature = "stdio")]
use super::stdio::StdioTransport;

#[cfg(feature = "tcp")]
use super::tcp::TcpTransport;

#[cfg(feature = "http")]
use super::{http::HttpTransport, rest::RestTransport};

/// A wire-format strategy.
///
/// `serve` runs until the transport closes: end of input for stdio, process
/// shutdown for listeners.
#[async_trait]
pub trait Transport: Send {
    /// Human-readable description for logs.
    fn describe(&self) -> String;

    /// Serve requests until the transport closes.
    async fn serve(self: Box<Self>, server: McpServer) -> TransportResult<()>;
}

/// Lifecycle of the transport dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Built, not yet accepting input.
    Uninitialized,
    /// Registry populated, accepting input.
    Ready,
    /// Input ended or the transport failed.
    Closed,
}

/// Transport service - manages the transport layer for the MCP server.
pub struct TransportService {
    transport: Box<dyn Transport>,
    state: watch::Sender<TransportState>,
}

impl TransportService {
    /// Create a new transport service with the given configuration.
    pub fn new(config: TransportConfig) -> Self {
        Self::with_transport(build_transport(config))
    }

    /// Create a transport service around an already built strategy.
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        let (state, _) = watch::channel(TransportState::Uninitialized);
        Self { transport, state }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TransportState {
        *self.state.borrow()
    }

    /// Watch lifecycle changes.
    pub fn subscribe(&self) -> watch::Receiver<TransportState> {
        self.state.subscribe()
    }

    /// Start the transport with the given MCP server.
    ///
    /// The server's registry is already frozen, so the transport goes
    /// straight to `Ready`. This method blocks until the transport closes.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        info!("Starting transport: {}", self.transport.describe());
        self.state.send_replace(TransportState::Ready);

        let result = self.transport.serve(server).await;
        self.state.send_replace(TransportState::Closed);

        match &result {
            Ok(()) => info!("Transport closed"),
            Err(e) => warn!("Transport closed with error: {}", e),
        }
        result
    }
}

fn build_transport(config: TransportConfig) -> Box<dyn Transport> {
    match config {
        #[cfg(feature = "stdio")]
        TransportConfig::Stdio => Box::new(StdioTransport),
        #[cfg(feature = "tcp")]
        TransportConfig::Tcp(cfg) => Box::new(TcpTransport::new(cfg)),
        #[cfg(feature = "http")]
        TransportConfig::Rest(cfg) => Box::new(RestTransport::new(cfg)),
        #[cfg(feature = "http")]
        TransportConfig::Http(cfg) => Box::new(HttpTransport::new(cfg)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::domains::tools::ToolRegistry;
    use tokio::sync::oneshot;
    use tokio_test::assert_ok;

    /// Serves until told to stop.
    struct FakeTransport {
        stop: oneshot::Receiver<()>,
    }

    #[async_trait]
    impl Transport for FakeTransport {
        fn describe(&self) -> String {
            "fake".to_string()
        }

        async fn serve(self: Box<Self>, server: McpServer) -> TransportResult<()> {
            assert_eq!(server.registry().len(), 0);
            let _ = self.stop.await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let (stop, stop_rx) = oneshot::channel();
        let service = TransportService::with_transport(Box::new(FakeTransport { stop: stop_rx }));
        assert_eq!(service.state(), TransportState::Uninitialized);

        let mut states = service.subscribe();
        let server = McpServer::from_registry(Config::default(), ToolRegistry::default());
        let handle = tokio::spawn(service.run(server));

        assert_ok!(states.wait_for(|s| *s == TransportState::Ready).await);
        stop.send(()).unwrap();

        assert_ok!(handle.await.unwrap());
        assert_eq!(*states.borrow(), TransportState::Closed);
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_strategy_from_config() {
        let service = TransportService::new(TransportConfig::rest(8081, "127.0.0.1"));
        assert!(service.transport.describe().contains("REST"));

        let service = TransportService::new(TransportConfig::http(8082, "127.0.0.1"));
        assert!(service.transport.describe().contains("/mcp"));
    }
}
