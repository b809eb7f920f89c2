//! Handshake driver and forwarding loop
//!
//! Bridges two endpoints that each believe they are talking to a master
//! console: every byte travels alone, in strict alternation, because that
//! is all the hardware link allows.

use link_cable::ByteLink;
use link_core::{LinkError, LinkInitializer, LinkProtocol, Result};
use tracing::{info, trace};

/// Drive one endpoint through the game handshake into slave mode.
///
/// Returns the endpoint's final handshake response, which doubles as its
/// first live byte once bridging starts.
pub async fn enter_slave_mode<L: ByteLink>(
    link: &mut L,
    mut initializer: Box<dyn LinkInitializer>,
) -> Result<Option<u8>> {
    let mut response = None;
    loop {
        let Some(to_send) = initializer.step(response) else {
            return Ok(initializer.last_received());
        };

        let delay = initializer.send_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let reply = link.exchange(to_send).await?;
        trace!("Handshake exchange: {:02X},{:02X}", to_send, reply);
        response = Some(reply);
    }
}

/// Bridges two initialized endpoints for one game.
pub struct RelayBridge<'a> {
    protocol: &'a dyn LinkProtocol,
}

impl<'a> RelayBridge<'a> {
    pub fn new(protocol: &'a dyn LinkProtocol) -> Self {
        Self { protocol }
    }

    /// Initialize both endpoints, send any start sequence in lockstep, and
    /// forward bytes until a transport fails. There is no reconnect.
    pub async fn run<A: ByteLink, B: ByteLink>(&self, a: &mut A, b: &mut B) -> Result<()> {
        info!("Initializing endpoints for {}", self.protocol.name());

        // Each endpoint gets its own handshake state
        let mut a_byte = enter_slave_mode(a, self.protocol.initializer()).await?;
        info!("Endpoint 1 entered slave mode");

        enter_slave_mode(b, self.protocol.initializer()).await?;
        info!("Endpoint 2 entered slave mode");

        // Kick both consoles out of the menus together
        for &start in self.protocol.start_sequence() {
            a_byte = Some(a.exchange(start).await?);
            b.exchange(start).await?;
        }

        let Some(mut byte) = a_byte else {
            return Err(LinkError::Transport(
                "Endpoint 1 produced no live byte".into(),
            ));
        };

        // Ping-pong forwarding under our clock, one byte at a time
        loop {
            let reply = b.exchange(byte).await?;
            trace!("Bridge exchange: {:02X},{:02X}", byte, reply);
            byte = a.exchange(reply).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ScriptedLink;
    use game_protocols::PokemonGen1;

    const SLAVE_ACK: u8 = 0x02;

    #[tokio::test]
    async fn test_enter_slave_mode_returns_first_live_byte() {
        let mut link = ScriptedLink::new([0x00, 0x00, SLAVE_ACK]);
        let first = enter_slave_mode(&mut link, PokemonGen1.initializer())
            .await
            .unwrap();

        assert_eq!(first, Some(SLAVE_ACK));
        // Master magic was repeated until the console acked
        assert_eq!(link.sent, vec![0x01, 0x01, 0x01]);
    }

    #[tokio::test]
    async fn test_strict_alternation_over_thousand_iterations() {
        const ITERATIONS: usize = 1000;

        // Console replies after the handshake ack: A yields even bytes,
        // B yields odd ones, so any reorder or loss breaks the expectation
        let a_replies: Vec<u8> = (0..ITERATIONS).map(|i| (i as u8).wrapping_mul(2)).collect();
        let b_replies: Vec<u8> = (0..ITERATIONS)
            .map(|i| (i as u8).wrapping_mul(2).wrapping_add(1))
            .collect();

        let mut a_script = vec![SLAVE_ACK];
        a_script.extend_from_slice(&a_replies);
        let mut b_script = vec![SLAVE_ACK];
        b_script.extend_from_slice(&b_replies);

        let mut a = ScriptedLink::new(a_script);
        let mut b = ScriptedLink::new(b_script);

        // The scripts run dry eventually; the bridge must die on that
        // transport error rather than retry
        let result = RelayBridge::new(&PokemonGen1).run(&mut a, &mut b).await;
        assert!(matches!(result, Err(LinkError::Transport(_))));

        // A received every B reply in order, one exchange apart
        assert_eq!(a.sent[0], 0x01);
        assert_eq!(&a.sent[1..], &b_replies[..a.sent.len() - 1]);

        // B received A's ack first, then every A reply in order
        assert_eq!(b.sent[0], 0x01);
        assert_eq!(b.sent[1], SLAVE_ACK);
        assert_eq!(&b.sent[2..], &a_replies[..b.sent.len() - 2]);

        // No byte was dropped: both sides consumed their full scripts
        assert_eq!(b.sent.len(), 2 + ITERATIONS);
        assert_eq!(a.sent.len(), 1 + ITERATIONS);
    }

    #[tokio::test]
    async fn test_start_sequence_is_sent_to_both_in_lockstep() {
        struct AckProtocol;
        struct AckInitializer {
            last: Option<u8>,
        }

        impl LinkInitializer for AckInitializer {
            fn step(&mut self, received: Option<u8>) -> Option<u8> {
                self.last = received;
                if received == Some(0xB0) {
                    return None;
                }
                Some(0xA0)
            }

            fn last_received(&self) -> Option<u8> {
                self.last
            }
        }

        impl LinkProtocol for AckProtocol {
            fn name(&self) -> &'static str {
                "ack-test"
            }

            fn initializer(&self) -> Box<dyn LinkInitializer> {
                Box::new(AckInitializer { last: None })
            }

            fn start_sequence(&self) -> &[u8] {
                &[0x30, 0x00, 0x20]
            }
        }

        let mut a = ScriptedLink::new([0xB0, 0x11, 0x12, 0x13, 0x50]);
        let mut b = ScriptedLink::new([0xB0, 0x21, 0x22, 0x23, 0x51]);

        let result = RelayBridge::new(&AckProtocol).run(&mut a, &mut b).await;
        assert!(matches!(result, Err(LinkError::Transport(_))));

        // Handshake, then the start bytes to both, then the steady loop
        // seeded with A's reply to the final start byte
        assert_eq!(&a.sent[..4], &[0xA0, 0x30, 0x00, 0x20]);
        assert_eq!(&b.sent[..4], &[0xA0, 0x30, 0x00, 0x20]);
        assert_eq!(b.sent[4], 0x13);
        assert_eq!(a.sent[4], 0x51);
    }
}
