//! Single-connection tunnel server
//!
//! Listens for one emulator connection, greets it with our protocol
//! version, and dispatches packets to the installed handler until the peer
//! goes away. Any transport error or malformed packet ends the session;
//! there is no restart.

use crate::packet::{PACKET_SIZE, Packet};
use crate::session::LinkSession;
use link_core::{LinkCableHandler, LinkError, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

/// Configuration for the tunnel server
#[derive(Debug, Clone)]
pub struct BgbServerConfig {
    /// Host to listen on (default: 127.0.0.1)
    pub host: String,
    /// Port to listen on (default: 8765)
    pub port: u16,
}

impl Default for BgbServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8765,
        }
    }
}

/// Tunnel server for a single emulator connection
pub struct BgbLinkServer {
    config: BgbServerConfig,
}

impl BgbLinkServer {
    /// Create a server with default configuration
    pub fn new() -> Self {
        Self::with_config(BgbServerConfig::default())
    }

    /// Create a server with custom configuration
    pub fn with_config(config: BgbServerConfig) -> Self {
        Self { config }
    }

    /// Bind and serve exactly one connection.
    pub async fn run<H: LinkCableHandler>(&self, handler: H) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| LinkError::Transport(format!("Failed to bind {}: {}", addr, e)))?;
        info!("Listening on {}...", addr);

        serve(listener, handler).await
    }
}

impl Default for BgbLinkServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Accept one connection from the listener and run its session to completion.
///
/// The listener is dropped after the first accept; a second peer cannot
/// connect concurrently.
pub async fn serve<H: LinkCableHandler>(listener: TcpListener, handler: H) -> Result<()> {
    let (stream, peer) = listener
        .accept()
        .await
        .map_err(|e| LinkError::Transport(format!("Accept failed: {}", e)))?;
    drop(listener);
    info!("Received connection from {}", peer);

    // Reduce latency
    stream
        .set_nodelay(true)
        .map_err(|e| LinkError::Transport(format!("Failed to set TCP_NODELAY: {}", e)))?;

    run_session(stream, handler).await
}

async fn run_session<H: LinkCableHandler>(mut stream: TcpStream, handler: H) -> Result<()> {
    let mut session = LinkSession::new(handler);

    // Initial handshake: announce our protocol version
    stream
        .write_all(&session.greeting().to_bytes())
        .await
        .map_err(|e| LinkError::Transport(format!("Version send failed: {}", e)))?;

    let mut buf = [0u8; PACKET_SIZE];
    loop {
        match stream.read_exact(&mut buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                info!("Connection dropped");
                return Ok(());
            }
            Err(e) => {
                return Err(LinkError::Transport(format!("Packet read failed: {}", e)));
            }
        }

        let packet = Packet::from_bytes(&buf)?;
        debug!("Inbound packet: {:?}", packet);

        if let Some(reply) = session.handle(packet).await? {
            stream
                .write_all(&reply.to_bytes())
                .await
                .map_err(|e| LinkError::Transport(format!("Packet send failed: {}", e)))?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{PacketKind, status_flags};
    use async_trait::async_trait;

    /// Stands in for the game side: answers every master byte with 0x42.
    struct FixedHandler;

    #[async_trait]
    impl LinkCableHandler for FixedHandler {
        async fn on_master_byte(&mut self, _byte: u8) -> Result<Option<u8>> {
            Ok(Some(0x42))
        }
    }

    async fn read_packet(stream: &mut TcpStream) -> Packet {
        let mut buf = [0u8; PACKET_SIZE];
        stream.read_exact(&mut buf).await.unwrap();
        Packet::from_bytes(&buf).unwrap()
    }

    #[tokio::test]
    async fn test_session_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve(listener, FixedHandler));

        let mut peer = TcpStream::connect(addr).await.unwrap();

        // Server greets with its version
        let greeting = read_packet(&mut peer).await;
        assert_eq!(greeting.kind, PacketKind::Version);
        assert_eq!((greeting.b2, greeting.b3, greeting.b4), (1, 4, 0));

        // Matching version gets a running status back
        let version = Packet::version(100);
        peer.write_all(&version.to_bytes()).await.unwrap();
        let status = read_packet(&mut peer).await;
        assert_eq!(status.kind, PacketKind::Status);
        assert_eq!(status.b2, status_flags::RUNNING);
        assert_eq!(status.timestamp, 100);

        // A master byte comes back as a slave reply from the handler
        let sync1 = Packet::new(PacketKind::Sync1, 0x60, 0x81, 0, 150);
        peer.write_all(&sync1.to_bytes()).await.unwrap();
        let sync2 = read_packet(&mut peer).await;
        assert_eq!(sync2.kind, PacketKind::Sync2);
        assert_eq!(sync2.b2, 0x42);
        assert_eq!(sync2.timestamp, 150);

        // Dropping the connection ends the session cleanly
        drop(peer);
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_version_mismatch_kills_session() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve(listener, FixedHandler));

        let mut peer = TcpStream::connect(addr).await.unwrap();
        let _greeting = read_packet(&mut peer).await;

        let bad_version = Packet::new(PacketKind::Version, 2, 0, 0, 0);
        peer.write_all(&bad_version.to_bytes()).await.unwrap();

        let result = server.await.unwrap();
        assert!(matches!(result, Err(LinkError::UnsupportedVersion { .. })));
    }
}
