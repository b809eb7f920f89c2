//! Tunnel packet codec
//!
//! Every tunnel packet is exactly 8 bytes, little-endian: a type byte,
//! three data bytes, and a 32-bit timestamp.

use link_core::{LinkError, Result};

/// Exact wire size of a tunnel packet
pub const PACKET_SIZE: usize = 8;

/// Protocol version required of every peer
pub const PROTOCOL_VERSION: (u8, u8, u8) = (1, 4, 0);

/// Status byte bit flags
pub mod status_flags {
    /// Emulation is running
    pub const RUNNING: u8 = 1 << 0;
    /// Emulation is paused
    pub const PAUSED: u8 = 1 << 1;
    /// Peer supports reconnection
    pub const SUPPORTS_RECONNECT: u8 = 1 << 2;
}

/// Tunnel packet types
///
/// The type set is fixed by the protocol; anything else is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketKind {
    /// Protocol version handshake
    Version = 1,
    /// Remote joypad update
    Joypad = 101,
    /// Byte clocked out by the master
    Sync1 = 104,
    /// Byte returned by the slave
    Sync2 = 105,
    /// Ack/echo exchange
    Sync3 = 106,
    /// Emulation status heartbeat
    Status = 108,
    /// Peer is about to disconnect
    WantDisconnect = 109,
}

impl TryFrom<u8> for PacketKind {
    type Error = LinkError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(PacketKind::Version),
            101 => Ok(PacketKind::Joypad),
            104 => Ok(PacketKind::Sync1),
            105 => Ok(PacketKind::Sync2),
            106 => Ok(PacketKind::Sync3),
            108 => Ok(PacketKind::Status),
            109 => Ok(PacketKind::WantDisconnect),
            other => Err(LinkError::MalformedPacket(format!(
                "Unknown packet type {}",
                other
            ))),
        }
    }
}

/// A single tunnel packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    pub kind: PacketKind,
    pub b2: u8,
    pub b3: u8,
    pub b4: u8,
    pub timestamp: u32,
}

impl Packet {
    /// Create a new packet
    pub fn new(kind: PacketKind, b2: u8, b3: u8, b4: u8, timestamp: u32) -> Self {
        Self {
            kind,
            b2,
            b3,
            b4,
            timestamp,
        }
    }

    /// Version packet carrying the protocol version we implement
    pub fn version(timestamp: u32) -> Self {
        let (major, minor, patch) = PROTOCOL_VERSION;
        Self::new(PacketKind::Version, major, minor, patch, timestamp)
    }

    /// Status packet with the given flag byte
    pub fn status(flags: u8, timestamp: u32) -> Self {
        Self::new(PacketKind::Status, flags, 0, 0, timestamp)
    }

    /// Serialize to the 8-byte wire format
    pub fn to_bytes(&self) -> [u8; PACKET_SIZE] {
        let mut buf = [0u8; PACKET_SIZE];
        buf[0] = self.kind as u8;
        buf[1] = self.b2;
        buf[2] = self.b3;
        buf[3] = self.b4;
        buf[4..].copy_from_slice(&self.timestamp.to_le_bytes());
        buf
    }

    /// Parse from the wire; the input must be exactly 8 bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() != PACKET_SIZE {
            return Err(LinkError::MalformedPacket(format!(
                "Expected {} bytes, got {}",
                PACKET_SIZE,
                data.len()
            )));
        }

        Ok(Self {
            kind: PacketKind::try_from(data[0])?,
            b2: data[1],
            b3: data[2],
            b4: data[3],
            timestamp: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let packet = Packet::new(PacketKind::Sync1, 0xD4, 0x81, 0x00, 0xDEAD_BEEF);
        let decoded = Packet::from_bytes(&packet.to_bytes()).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_wire_layout_is_little_endian() {
        let packet = Packet::new(PacketKind::Status, 1, 0, 0, 0x0102_0304);
        let bytes = packet.to_bytes();
        assert_eq!(bytes, [108, 1, 0, 0, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_version_packet() {
        let bytes = Packet::version(0).to_bytes();
        assert_eq!(&bytes[..4], &[1, 1, 4, 0]);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let result = Packet::from_bytes(&[1, 2, 3]);
        assert!(matches!(result, Err(LinkError::MalformedPacket(_))));

        let result = Packet::from_bytes(&[0u8; 9]);
        assert!(matches!(result, Err(LinkError::MalformedPacket(_))));
    }

    #[test]
    fn test_rejects_unknown_type() {
        let result = Packet::from_bytes(&[42, 0, 0, 0, 0, 0, 0, 0]);
        assert!(matches!(result, Err(LinkError::MalformedPacket(_))));
    }
}
