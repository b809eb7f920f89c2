//! Two-console TCP link server
//!
//! Accepts exactly two connections - one per console - then stops
//! accepting, drives both into slave mode, and bridges them until a
//! transport fails.

use crate::bridge::RelayBridge;
use link_cable::TcpByteLink;
use link_core::{LinkError, LinkProtocol, Result};
use tokio::net::TcpListener;
use tracing::info;

/// Configuration for the link server
#[derive(Debug, Clone)]
pub struct LinkServerConfig {
    /// Host to listen on (default: 127.0.0.1)
    pub host: String,
    /// Port to listen on (default: 1989)
    pub port: u16,
}

impl Default for LinkServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 1989,
        }
    }
}

/// TCP server bridging two console connections
pub struct LinkServer {
    config: LinkServerConfig,
    protocol: Box<dyn LinkProtocol>,
}

impl LinkServer {
    /// Create a server with default configuration
    pub fn new(protocol: Box<dyn LinkProtocol>) -> Self {
        Self::with_config(LinkServerConfig::default(), protocol)
    }

    /// Create a server with custom configuration
    pub fn with_config(config: LinkServerConfig, protocol: Box<dyn LinkProtocol>) -> Self {
        Self { config, protocol }
    }

    /// Bind, accept two consoles, and bridge them to completion.
    pub async fn run(&self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| LinkError::Transport(format!("Failed to bind {}: {}", addr, e)))?;
        info!("Listening on {}...", addr);

        let (stream1, addr1) = listener
            .accept()
            .await
            .map_err(|e| LinkError::Transport(format!("Accept failed: {}", e)))?;
        info!("Received connection 1 from {}", addr1);
        let mut link1 = TcpByteLink::from_stream(stream1)?;

        let (stream2, addr2) = listener
            .accept()
            .await
            .map_err(|e| LinkError::Transport(format!("Accept failed: {}", e)))?;
        info!("Received connection 2 from {}", addr2);
        let mut link2 = TcpByteLink::from_stream(stream2)?;

        // Two consoles per session, never more
        drop(listener);

        RelayBridge::new(self.protocol.as_ref())
            .run(&mut link1, &mut link2)
            .await
    }
}
