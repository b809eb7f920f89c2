//! Pokemon Gen 1 link handshake
//!
//! Covers Pokemon R/G/B/Y, and G/S/C when using the time capsule. The game
//! drops into slave mode as soon as it acknowledges a master magic byte, so
//! the handshake is a single exchange repeated until the ack arrives.

use link_core::{LinkInitializer, LinkProtocol};

const MASTER_MAGIC: u8 = 0x01;
const SLAVE_MAGIC: u8 = 0x02;

/// Pokemon Gen 1 protocol selector
#[derive(Debug, Clone, Copy, Default)]
pub struct PokemonGen1;

impl LinkProtocol for PokemonGen1 {
    fn name(&self) -> &'static str {
        "pokemon-gen1"
    }

    fn initializer(&self) -> Box<dyn LinkInitializer> {
        Box::new(PokemonGen1Initializer::new())
    }
}

/// Sends master magic until the console answers with slave magic.
pub struct PokemonGen1Initializer {
    last_received: Option<u8>,
}

impl PokemonGen1Initializer {
    pub fn new() -> Self {
        Self {
            last_received: None,
        }
    }
}

impl Default for PokemonGen1Initializer {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkInitializer for PokemonGen1Initializer {
    fn step(&mut self, received: Option<u8>) -> Option<u8> {
        self.last_received = received;

        if received == Some(SLAVE_MAGIC) {
            return None;
        }
        Some(MASTER_MAGIC)
    }

    fn last_received(&self) -> Option<u8> {
        self.last_received
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_sends_master_magic_until_acked() {
        let mut init = PokemonGen1Initializer::new();

        assert_eq!(init.step(None), Some(MASTER_MAGIC));
        assert_eq!(init.step(Some(0x00)), Some(MASTER_MAGIC));
        assert_eq!(init.step(Some(0xFF)), Some(MASTER_MAGIC));
        assert_eq!(init.step(Some(SLAVE_MAGIC)), None);

        // The ack is handed to the caller as the first live byte
        assert_eq!(init.last_received(), Some(SLAVE_MAGIC));
    }

    #[test]
    fn test_no_delay_and_no_start_sequence() {
        let protocol = PokemonGen1;
        let init = protocol.initializer();

        assert_eq!(init.send_delay(), Duration::ZERO);
        assert!(protocol.start_sequence().is_empty());
    }
}
