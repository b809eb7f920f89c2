//! TCP transport for link-cable bytes
//!
//! Carries link-cable traffic as a plain unframed byte stream: one byte
//! out, one byte back per exchange.

use crate::ByteLink;
use async_trait::async_trait;
use link_core::{LinkError, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::trace;

/// Link-cable endpoint on the far side of a TCP stream.
pub struct TcpByteLink {
    stream: TcpStream,
}

impl TcpByteLink {
    /// Connect to a listening relay.
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| LinkError::Transport(format!("Failed to connect to {}: {}", addr, e)))?;
        Self::from_stream(stream)
    }

    /// Wrap an already-accepted connection.
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        // Reduce latency
        stream
            .set_nodelay(true)
            .map_err(|e| LinkError::Transport(format!("Failed to set TCP_NODELAY: {}", e)))?;
        Ok(Self { stream })
    }
}

#[async_trait]
impl ByteLink for TcpByteLink {
    async fn exchange(&mut self, byte: u8) -> Result<u8> {
        self.stream
            .write_all(&[byte])
            .await
            .map_err(|e| LinkError::Transport(format!("TCP send failed: {}", e)))?;

        let mut reply = [0u8; 1];
        self.stream
            .read_exact(&mut reply)
            .await
            .map_err(|e| LinkError::Transport(format!("TCP receive failed: {}", e)))?;

        trace!("TCP exchange: {:02X},{:02X}", byte, reply[0]);
        Ok(reply[0])
    }

    async fn close(&mut self) -> Result<()> {
        self.stream
            .shutdown()
            .await
            .map_err(|e| LinkError::Transport(format!("TCP shutdown failed: {}", e)))
    }
}
