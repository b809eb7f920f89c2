//! Error types for link-cable sessions

use thiserror::Error;

/// Result type for link-cable operations
pub type Result<T> = std::result::Result<T, LinkError>;

/// Link-cable error types
///
/// Every variant is fatal to the session it occurs in; sessions are never
/// retried or restarted internally.
#[derive(Debug, Error)]
pub enum LinkError {
    /// I/O failure or closed connection
    #[error("Transport error: {0}")]
    Transport(String),

    /// Peer speaks an unsupported tunnel protocol version
    #[error("Unsupported protocol version {major}.{minor}.{patch}")]
    UnsupportedVersion { major: u8, minor: u8, patch: u8 },

    /// Malformed or unrecognized tunnel packet
    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    /// Invalid operator configuration, raised before any session starts
    #[error("Validation error: {0}")]
    Validation(String),

    /// Peer backed out of the link
    #[error("Link cancelled: {0}")]
    LinkCancelled(String),

    /// Peer requested a link mode we do not implement
    #[error("Unsupported link mode: {0}")]
    UnsupportedMode(String),
}

impl From<std::io::Error> for LinkError {
    fn from(err: std::io::Error) -> Self {
        LinkError::Transport(err.to_string())
    }
}
