//! Relay bridging two link-cable endpoints
//!
//! This crate provides:
//! - The handshake driver and strict-alternation forwarding loop
//! - A TCP server accepting exactly two console connections
//! - A serial <-> TCP forwarding client
//! - A handler that forwards tunnel bytes into an attached console

pub mod bridge;
pub mod client;
pub mod forward;
pub mod server;

#[cfg(test)]
pub(crate) mod testutil;

pub use bridge::{RelayBridge, enter_slave_mode};
pub use client::{SerialTcpClient, SerialTcpClientConfig};
pub use forward::CableForwarder;
pub use server::{LinkServer, LinkServerConfig};
