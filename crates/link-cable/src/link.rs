//! Single-byte link-cable exchange primitive

use async_trait::async_trait;
use link_core::Result;

/// One end of a link cable.
///
/// The hardware link transfers one byte at a time under a master clock, so
/// the only primitive is a blocking single-byte exchange: clock one byte out
/// and get the peer's byte back. Implementations back serial adapters, TCP
/// sockets, or in-process partners.
#[async_trait]
pub trait ByteLink: Send {
    /// Clock one byte out and return the byte the peer clocked back.
    async fn exchange(&mut self, byte: u8) -> Result<u8>;

    /// Close the underlying transport.
    async fn close(&mut self) -> Result<()>;
}
