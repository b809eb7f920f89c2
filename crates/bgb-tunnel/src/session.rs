//! Per-connection tunnel session dispatch
//!
//! Pure packet-in/packet-out logic, kept apart from socket I/O so the
//! handshake and timestamp rules are testable without a live peer.

use crate::packet::{PROTOCOL_VERSION, Packet, PacketKind, status_flags};
use link_core::{LinkCableHandler, LinkError, Result};
use tracing::{debug, info};

/// Control value for clocked transfers (bit 7 = internal clock, bit 0 = transfer)
const TRANSFER_CONTROL: u8 = 0x81;
/// Sync3 control value signaling "no data in response"
const NO_RESPONSE_CONTROL: u8 = 1;

/// Per-connection tunnel state.
///
/// Owns the peer-observed clock: every outbound timestamp is the maximum
/// timestamp ever seen from the peer, never an independent clock. Owned
/// exclusively by one connection and destroyed with it.
pub struct LinkSession<H> {
    handler: H,
    last_timestamp: u32,
}

impl<H: LinkCableHandler> LinkSession<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            last_timestamp: 0,
        }
    }

    /// Version packet sent to the peer immediately on connect.
    pub fn greeting(&self) -> Packet {
        Packet::version(0)
    }

    /// Dispatch one inbound packet, returning the reply to send (if any).
    pub async fn handle(&mut self, packet: Packet) -> Result<Option<Packet>> {
        // Claim to be exactly in sync with the peer's clock
        self.last_timestamp = self.last_timestamp.max(packet.timestamp);

        match packet.kind {
            PacketKind::Version => self.handle_version(packet),

            // Joypad updates remotely control an emulator; nothing to do here
            PacketKind::Joypad => Ok(None),

            PacketKind::Sync1 => match self.handler.on_master_byte(packet.b2).await? {
                Some(reply) => Ok(Some(Packet::new(
                    PacketKind::Sync2,
                    reply,
                    TRANSFER_CONTROL,
                    0,
                    self.last_timestamp,
                ))),
                None => Ok(Some(Packet::new(
                    PacketKind::Sync3,
                    NO_RESPONSE_CONTROL,
                    0,
                    0,
                    self.last_timestamp,
                ))),
            },

            // A byte from the slave side; re-clock any reply as a fresh
            // master transfer
            PacketKind::Sync2 => match self.handler.on_slave_byte(packet.b2).await? {
                Some(reply) => Ok(Some(Packet::new(
                    PacketKind::Sync1,
                    reply,
                    TRANSFER_CONTROL,
                    0,
                    self.last_timestamp,
                ))),
                None => Ok(None),
            },

            PacketKind::Sync3 => {
                debug!("Received sync3 packet");
                Ok(Some(Packet::new(
                    PacketKind::Sync3,
                    packet.b2,
                    packet.b3,
                    packet.b4,
                    self.last_timestamp,
                )))
            }

            PacketKind::Status => {
                debug!(
                    "Received status packet: running={} paused={} reconnect={}",
                    packet.b2 & status_flags::RUNNING != 0,
                    packet.b2 & status_flags::PAUSED != 0,
                    packet.b2 & status_flags::SUPPORTS_RECONNECT != 0,
                );

                // The protocol notes say not to answer status with status,
                // but the link destabilizes without it
                Ok(Some(self.status_packet()))
            }

            PacketKind::WantDisconnect => {
                info!("Peer has initiated disconnect");
                Ok(None)
            }
        }
    }

    fn handle_version(&self, packet: Packet) -> Result<Option<Packet>> {
        let (major, minor, patch) = (packet.b2, packet.b3, packet.b4);
        debug!("Received version packet: {}.{}.{}", major, minor, patch);

        if (major, minor, patch) != PROTOCOL_VERSION {
            return Err(LinkError::UnsupportedVersion {
                major,
                minor,
                patch,
            });
        }

        Ok(Some(self.status_packet()))
    }

    fn status_packet(&self) -> Packet {
        Packet::status(status_flags::RUNNING, self.last_timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Replies to master bytes from a fixed script; records what it saw.
    struct ScriptHandler {
        replies: Vec<Option<u8>>,
        seen: Vec<u8>,
    }

    impl ScriptHandler {
        fn new(replies: Vec<Option<u8>>) -> Self {
            Self {
                replies,
                seen: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl LinkCableHandler for ScriptHandler {
        async fn on_master_byte(&mut self, byte: u8) -> Result<Option<u8>> {
            self.seen.push(byte);
            Ok(self.replies.remove(0))
        }

        async fn on_slave_byte(&mut self, byte: u8) -> Result<Option<u8>> {
            self.seen.push(byte);
            Ok(self.replies.remove(0))
        }
    }

    fn version_packet(major: u8, minor: u8, patch: u8, timestamp: u32) -> Packet {
        Packet::new(PacketKind::Version, major, minor, patch, timestamp)
    }

    #[tokio::test]
    async fn test_version_match_replies_status() {
        let mut session = LinkSession::new(ScriptHandler::new(vec![]));
        let reply = session
            .handle(version_packet(1, 4, 0, 7))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(reply.kind, PacketKind::Status);
        assert_eq!(reply.b2, status_flags::RUNNING);
        assert_eq!(reply.timestamp, 7);
    }

    #[tokio::test]
    async fn test_version_mismatch_aborts_before_status() {
        let mut session = LinkSession::new(ScriptHandler::new(vec![]));
        let result = session.handle(version_packet(1, 5, 1, 0)).await;

        assert!(matches!(
            result,
            Err(LinkError::UnsupportedVersion {
                major: 1,
                minor: 5,
                patch: 1
            })
        ));
    }

    #[tokio::test]
    async fn test_outbound_timestamp_is_max_ever_seen() {
        let mut session = LinkSession::new(ScriptHandler::new(vec![]));

        let mut last_reply = None;
        for ts in [5, 3, 9, 1] {
            last_reply = session
                .handle(Packet::new(PacketKind::Status, 1, 0, 0, ts))
                .await
                .unwrap();
        }

        // The peer's clock ran backwards; ours must not
        assert_eq!(last_reply.unwrap().timestamp, 9);
    }

    #[tokio::test]
    async fn test_sync1_with_reply_sends_sync2() {
        let mut session = LinkSession::new(ScriptHandler::new(vec![Some(0x62)]));
        let reply = session
            .handle(Packet::new(PacketKind::Sync1, 0x60, 0x81, 0, 12))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(reply.kind, PacketKind::Sync2);
        assert_eq!(reply.b2, 0x62);
        assert_eq!(reply.b3, TRANSFER_CONTROL);
        assert_eq!(reply.timestamp, 12);
    }

    #[tokio::test]
    async fn test_sync1_without_reply_sends_no_response() {
        let mut session = LinkSession::new(ScriptHandler::new(vec![None]));
        let reply = session
            .handle(Packet::new(PacketKind::Sync1, 0x00, 0x81, 0, 0))
            .await
            .unwrap()
            .unwrap();

        // "Nothing to send" is not the same as sending zero
        assert_eq!(reply.kind, PacketKind::Sync3);
        assert_eq!(reply.b2, NO_RESPONSE_CONTROL);
    }

    #[tokio::test]
    async fn test_sync2_reply_is_reclocked_as_sync1() {
        let mut session = LinkSession::new(ScriptHandler::new(vec![Some(0x29)]));
        let reply = session
            .handle(Packet::new(PacketKind::Sync2, 0x55, 0x80, 0, 3))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(reply.kind, PacketKind::Sync1);
        assert_eq!(reply.b2, 0x29);
    }

    #[tokio::test]
    async fn test_sync3_is_echoed() {
        let mut session = LinkSession::new(ScriptHandler::new(vec![]));
        let reply = session
            .handle(Packet::new(PacketKind::Sync3, 0xAA, 0xBB, 0xCC, 4))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(reply.kind, PacketKind::Sync3);
        assert_eq!((reply.b2, reply.b3, reply.b4), (0xAA, 0xBB, 0xCC));
        assert_eq!(reply.timestamp, 4);
    }

    #[tokio::test]
    async fn test_joypad_and_disconnect_produce_no_reply() {
        let mut session = LinkSession::new(ScriptHandler::new(vec![]));

        let reply = session
            .handle(Packet::new(PacketKind::Joypad, 0x01, 0, 0, 0))
            .await
            .unwrap();
        assert!(reply.is_none());

        let reply = session
            .handle(Packet::new(PacketKind::WantDisconnect, 0, 0, 0, 0))
            .await
            .unwrap();
        assert!(reply.is_none());
    }
}
