//! BGB link-cable tunnel protocol
//!
//! Implements the 8-byte packetized protocol the BGB emulator uses to carry
//! link-cable byte events over a TCP stream, in the server role:
//! - Packet codec and type dispatch
//! - Version handshake and status heartbeats
//! - Sync exchanges representing one link-cable transfer each
//!
//! Protocol reference: https://bgb.bircd.org/bgblink.html

pub mod packet;
pub mod server;
pub mod session;

pub use packet::{PACKET_SIZE, PROTOCOL_VERSION, Packet, PacketKind, status_flags};
pub use server::{BgbLinkServer, BgbServerConfig};
pub use session::LinkSession;
