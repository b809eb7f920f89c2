//! Serial transport for link-cable bytes
//!
//! Talks to a serial <-> Game Boy adapter which waits for a byte from the
//! host, clocks it into the console, and writes the console's byte back.

use crate::ByteLink;
use async_trait::async_trait;
use link_core::{LinkError, Result};
use serialport::SerialPort;
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, trace};

/// Default baud rate of the serial <-> Game Boy adapter
pub const DEFAULT_BAUD_RATE: u32 = 28_800;

// The serialport crate requires a finite read timeout. Sessions define no
// internal timeouts, so use one long enough to never fire in practice.
const READ_TIMEOUT: Duration = Duration::from_secs(86_400);

/// Link-cable endpoint behind a serial adapter.
///
/// The blocking serial calls run on the tokio blocking pool; each exchange
/// is still strictly sequential.
pub struct SerialLink {
    port: Arc<Mutex<Box<dyn SerialPort>>>,
}

impl SerialLink {
    /// Open the adapter and wait for its boot byte.
    pub async fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let path_owned = path.to_string();
        let port = tokio::task::spawn_blocking(move || -> Result<Box<dyn SerialPort>> {
            let mut port = serialport::new(&path_owned, baud_rate)
                .stop_bits(serialport::StopBits::One)
                .parity(serialport::Parity::None)
                .timeout(READ_TIMEOUT)
                .open()
                .map_err(|e| {
                    LinkError::Transport(format!("Failed to open {}: {}", path_owned, e))
                })?;

            // The adapter emits one byte on boot; discard it
            let mut boot = [0u8; 1];
            port.read_exact(&mut boot)
                .map_err(|e| LinkError::Transport(format!("Serial boot read failed: {}", e)))?;

            Ok(port)
        })
        .await
        .map_err(|e| LinkError::Transport(format!("Serial open task failed: {}", e)))??;

        info!("Serial link connected on {}", path);
        Ok(Self {
            port: Arc::new(Mutex::new(port)),
        })
    }
}

#[async_trait]
impl ByteLink for SerialLink {
    async fn exchange(&mut self, byte: u8) -> Result<u8> {
        let port = Arc::clone(&self.port);
        let reply = tokio::task::spawn_blocking(move || -> Result<u8> {
            let mut port = port
                .lock()
                .map_err(|_| LinkError::Transport("Serial port lock poisoned".into()))?;

            port.write_all(&[byte])
                .map_err(|e| LinkError::Transport(format!("Serial write failed: {}", e)))?;

            let mut reply = [0u8; 1];
            port.read_exact(&mut reply)
                .map_err(|e| LinkError::Transport(format!("Serial read failed: {}", e)))?;

            Ok(reply[0])
        })
        .await
        .map_err(|e| LinkError::Transport(format!("Serial exchange task failed: {}", e)))??;

        trace!("Serial exchange: {:02X},{:02X}", byte, reply);
        Ok(reply)
    }

    async fn close(&mut self) -> Result<()> {
        // Dropping the port handle closes it
        Ok(())
    }
}
