//! Tunnel-to-cable forwarding handler
//!
//! Plugs a `ByteLink` into the tunnel server: every master byte from the
//! emulator is clocked into the attached console, and the console's reply
//! travels back through the tunnel.

use async_trait::async_trait;
use link_cable::ByteLink;
use link_core::{LinkCableHandler, Result};
use tracing::debug;

/// Forwards tunnel master bytes into an attached console.
pub struct CableForwarder<L> {
    link: L,
}

impl<L: ByteLink> CableForwarder<L> {
    pub fn new(link: L) -> Self {
        Self { link }
    }
}

#[async_trait]
impl<L: ByteLink> LinkCableHandler for CableForwarder<L> {
    async fn on_master_byte(&mut self, byte: u8) -> Result<Option<u8>> {
        let reply = self.link.exchange(byte).await?;
        debug!("Cable exchange: {:02X},{:02X}", byte, reply);
        Ok(Some(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ScriptedLink;

    #[tokio::test]
    async fn test_master_bytes_are_clocked_into_the_console() {
        let mut forwarder = CableForwarder::new(ScriptedLink::new([0x02, 0x60]));

        assert_eq!(forwarder.on_master_byte(0x01).await.unwrap(), Some(0x02));
        assert_eq!(forwarder.on_master_byte(0x60).await.unwrap(), Some(0x60));
        assert_eq!(forwarder.link.sent, vec![0x01, 0x60]);
    }
}
