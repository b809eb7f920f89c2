//! # link-core
//!
//! Core types and traits for Game Boy link-cable bridging.
//!
//! This crate provides the foundational pieces shared by every transport and
//! protocol implementation:
//! - The error taxonomy for link sessions
//! - Per-game link handshake traits (`LinkInitializer`, `LinkProtocol`)
//! - The handler hook for externally-clocked byte exchange

pub mod error;
pub mod protocol;

pub use error::{LinkError, Result};
pub use protocol::{LinkCableHandler, LinkInitializer, LinkProtocol};
