//! Scripted link-cable endpoint for bridge tests

use async_trait::async_trait;
use link_cable::ByteLink;
use link_core::{LinkError, Result};
use std::collections::VecDeque;

/// Replies from a fixed script and records every byte it was sent.
/// Exhausting the script fails the next exchange like a dead transport.
pub(crate) struct ScriptedLink {
    replies: VecDeque<u8>,
    pub sent: Vec<u8>,
}

impl ScriptedLink {
    pub fn new(replies: impl IntoIterator<Item = u8>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            sent: Vec::new(),
        }
    }
}

#[async_trait]
impl ByteLink for ScriptedLink {
    async fn exchange(&mut self, byte: u8) -> Result<u8> {
        self.sent.push(byte);
        self.replies
            .pop_front()
            .ok_or_else(|| LinkError::Transport("Scripted link exhausted".into()))
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
