//! Per-game link protocol traits
//!
//! Before two consoles can exchange live bytes, one side must drive the
//! other through a game-specific handshake into externally-clocked ("slave")
//! mode. Each supported game provides a `LinkProtocol` that manufactures
//! per-endpoint `LinkInitializer` state machines.

use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Drives one endpoint through a game-specific link handshake.
pub trait LinkInitializer: Send {
    /// Advance the handshake with the last byte received from the endpoint
    /// (`None` before the first exchange). Returns the next byte to send,
    /// or `None` once the endpoint is initialized.
    fn step(&mut self, received: Option<u8>) -> Option<u8>;

    /// Last byte received from the endpoint. Once `step` returns `None`,
    /// this is the first live byte of the bridged session.
    fn last_received(&self) -> Option<u8>;

    /// Delay to apply before sending the next handshake byte.
    fn send_delay(&self) -> Duration {
        Duration::ZERO
    }
}

/// A supported game's link protocol, selected at configuration time.
pub trait LinkProtocol: Send + Sync {
    /// Game name for logs.
    fn name(&self) -> &'static str;

    /// Fresh handshake state for one endpoint. Endpoints never share
    /// initializer state.
    fn initializer(&self) -> Box<dyn LinkInitializer>;

    /// Bytes the caller sends to every endpoint in lockstep once all
    /// handshakes are complete. Empty when the game needs none.
    fn start_sequence(&self) -> &[u8] {
        &[]
    }
}

/// Consumes link-cable bytes clocked by the remote side and produces replies.
#[async_trait]
pub trait LinkCableHandler: Send {
    /// A byte clocked out by the remote master. Returns the reply byte, or
    /// `None` when there is nothing to answer with. "No response" is
    /// distinct from replying zero; zero is a meaningful protocol value.
    async fn on_master_byte(&mut self, byte: u8) -> Result<Option<u8>>;

    /// A byte produced by the remote slave. A returned byte is clocked back
    /// out as a new master transfer.
    async fn on_slave_byte(&mut self, _byte: u8) -> Result<Option<u8>> {
        Ok(None)
    }
}
