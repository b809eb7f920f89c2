//! Link-cable byte-exchange transports
//!
//! This crate provides:
//! - The `ByteLink` trait: the single-byte exchange primitive every
//!   transport implements
//! - A TCP implementation (plain unframed byte stream)
//! - A serial implementation for serial <-> Game Boy adapters

pub mod link;
pub mod serial;
pub mod tcp;

pub use link::ByteLink;
pub use serial::SerialLink;
pub use tcp::TcpByteLink;
