//! Serial <-> TCP forwarding client
//!
//! Connects a serial-attached console to a running link server. Every byte
//! received over TCP is clocked into the console and the console's reply is
//! sent back. The server closing the connection ends the session cleanly.

use link_cable::{ByteLink, SerialLink, serial::DEFAULT_BAUD_RATE};
use link_core::{LinkError, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::info;

/// Configuration for the forwarding client
#[derive(Debug, Clone)]
pub struct SerialTcpClientConfig {
    /// Link server host (default: 127.0.0.1)
    pub server_host: String,
    /// Link server port (default: 1989)
    pub server_port: u16,
    /// Serial port of the console adapter
    pub serial_path: String,
    /// Adapter baud rate
    pub baud_rate: u32,
}

impl SerialTcpClientConfig {
    pub fn new(serial_path: impl Into<String>) -> Self {
        Self {
            server_host: "127.0.0.1".into(),
            server_port: 1989,
            serial_path: serial_path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// Forwarding client for one console
pub struct SerialTcpClient {
    config: SerialTcpClientConfig,
}

impl SerialTcpClient {
    pub fn new(config: SerialTcpClientConfig) -> Self {
        Self { config }
    }

    /// Open the console link, connect to the server, and forward until
    /// either side goes away.
    pub async fn run(&self) -> Result<()> {
        let mut link = SerialLink::open(&self.config.serial_path, self.config.baud_rate).await?;

        let addr = format!("{}:{}", self.config.server_host, self.config.server_port);
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| LinkError::Transport(format!("Failed to connect to {}: {}", addr, e)))?;

        // Reduce latency
        stream
            .set_nodelay(true)
            .map_err(|e| LinkError::Transport(format!("Failed to set TCP_NODELAY: {}", e)))?;
        info!("Connected to {}...", addr);

        forward(&mut link, stream).await
    }
}

/// Forward server bytes into the console and console replies back out.
pub async fn forward<L: ByteLink>(link: &mut L, mut stream: TcpStream) -> Result<()> {
    let mut rx = [0u8; 1];
    loop {
        match stream.read_exact(&mut rx).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                info!("Connection closed");
                return Ok(());
            }
            Err(e) => {
                return Err(LinkError::Transport(format!("TCP receive failed: {}", e)));
            }
        }

        let reply = link.exchange(rx[0]).await?;
        stream
            .write_all(&[reply])
            .await
            .map_err(|e| LinkError::Transport(format!("TCP send failed: {}", e)))?;
    }
}
