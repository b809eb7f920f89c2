//! Tetris versus-mode link handshake
//!
//! Walks the console through the full multiplayer menu flow: role
//! confirmation, music and difficulty selection, then the bulk transfer of
//! the starting garbage board and the shared piece sequence. Music and
//! difficulty are hard-coded; this side is not a real player.

use link_core::{LinkInitializer, LinkProtocol};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

const MASTER_MAGIC: u8 = 0x29;
const SLAVE_MAGIC: u8 = 0x55;
const MUSIC_A: u8 = 0x1C;
const PEER_AWAITING_MUSIC: u8 = 0x39;
const MUSIC_CONFIRM: u8 = 0x50;
const DIFFICULTY_CONFIRM: u8 = 0x60;
const SOLID_TILE_FLAG: u8 = 0x80;
const EMPTY_TILE: u8 = 0x2F;

const GARBAGE_LEN: usize = 100;
const PIECE_COUNT: usize = 256;

// Menus need breathing room between bytes; bulk transfer runs flat out
const HANDSHAKE_DELAY: Duration = Duration::from_millis(30);

/// Bytes both consoles receive in lockstep to leave the menus and start
/// the match. Sent by the relay once every endpoint is initialized.
const GAME_START_SEQUENCE: [u8; 5] = [0x30, 0x00, 0x02, 0x02, 0x20];

/// Tetris protocol selector
///
/// An explicit seed makes the generated board and piece sequences
/// reproducible; without one each initializer rolls its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tetris {
    pub seed: Option<u64>,
}

impl LinkProtocol for Tetris {
    fn name(&self) -> &'static str {
        "tetris"
    }

    fn initializer(&self) -> Box<dyn LinkInitializer> {
        match self.seed {
            Some(seed) => Box::new(TetrisInitializer::seeded(seed)),
            None => Box::new(TetrisInitializer::new()),
        }
    }

    fn start_sequence(&self) -> &[u8] {
        &GAME_START_SEQUENCE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    ConfirmingRoles1,
    SelectingMusic,
    SelectingDifficulty,
    ConfirmingRoles2,
    SendingGarbage,
    ConfirmingRoles3,
    SendingPieces,
}

/// Multi-phase handshake state for one endpoint.
pub struct TetrisInitializer {
    phase: Phase,
    transfer_counter: usize,
    last_received: Option<u8>,
    garbage: Vec<u8>,
    pieces: Vec<u8>,
}

impl TetrisInitializer {
    pub fn new() -> Self {
        Self::from_rng(&mut StdRng::from_entropy())
    }

    /// Initializer with reproducible board and piece sequences.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(&mut StdRng::seed_from_u64(seed))
    }

    fn from_rng<R: Rng>(rng: &mut R) -> Self {
        Self {
            phase: Phase::ConfirmingRoles1,
            transfer_counter: 0,
            last_received: None,
            garbage: generate_garbage(rng),
            pieces: generate_pieces(rng),
        }
    }
}

impl Default for TetrisInitializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Starting garbage board: 50/50 chance of an empty cell versus one of 8
/// solid tile variants, the same distribution the game itself rolls for a
/// versus match.
fn generate_garbage<R: Rng>(rng: &mut R) -> Vec<u8> {
    (0..GARBAGE_LEN)
        .map(|_| {
            if rng.gen_bool(0.5) {
                EMPTY_TILE
            } else {
                rng.gen_range(0..8u8) | SOLID_TILE_FLAG
            }
        })
        .collect()
}

/// Shared piece sequence: 7 piece types, each a multiple of 4. Up to 3
/// attempts per entry to avoid a masked repeat of the previous two, the
/// same retry rule the game's RNG applies.
fn generate_pieces<R: Rng>(rng: &mut R) -> Vec<u8> {
    let mut pieces = Vec::with_capacity(PIECE_COUNT);
    let (mut prev1, mut prev2) = (0u8, 0u8);

    for _ in 0..PIECE_COUNT {
        let mut next = 0u8;
        for _ in 0..3 {
            next = rng.gen_range(0..7u8) * 4;
            if (next | prev1 | prev2) & 0xFC != prev2 {
                break;
            }
        }

        pieces.push(next);
        prev2 = prev1;
        prev1 = next;
    }

    pieces
}

impl LinkInitializer for TetrisInitializer {
    fn step(&mut self, received: Option<u8>) -> Option<u8> {
        self.last_received = received;

        if self.phase == Phase::ConfirmingRoles1 {
            if received != Some(SLAVE_MAGIC) {
                return Some(MASTER_MAGIC);
            }
            // The ack byte doubles as the first music-selection exchange
            self.phase = Phase::SelectingMusic;
        }

        if self.phase == Phase::SelectingMusic {
            if received == Some(PEER_AWAITING_MUSIC) {
                self.phase = Phase::SelectingDifficulty;
                return Some(MUSIC_CONFIRM);
            }
            Some(MUSIC_A)
        } else if self.phase == Phase::SelectingDifficulty {
            // Wait for the opponent's difficulty; ours is irrelevant since
            // this side is not a real player
            if received == Some(0) {
                self.phase = Phase::ConfirmingRoles2;
                return Some(DIFFICULTY_CONFIRM);
            }
            Some(0)
        } else if self.phase == Phase::ConfirmingRoles2 {
            if received == Some(SLAVE_MAGIC) {
                self.phase = Phase::SendingGarbage;
                self.transfer_counter = 1;
                Some(self.garbage[0])
            } else {
                Some(MASTER_MAGIC)
            }
        } else if self.phase == Phase::SendingGarbage {
            let to_send = self.garbage[self.transfer_counter];
            self.transfer_counter += 1;

            if self.transfer_counter == self.garbage.len() {
                self.phase = Phase::ConfirmingRoles3;
            }
            Some(to_send)
        } else if self.phase == Phase::ConfirmingRoles3 {
            if received == Some(SLAVE_MAGIC) {
                self.phase = Phase::SendingPieces;
                self.transfer_counter = 1;
                Some(self.pieces[0])
            } else {
                Some(MASTER_MAGIC)
            }
        } else {
            // Phase::SendingPieces
            if self.transfer_counter == self.pieces.len() {
                // Both streams exhausted; the console is in game
                return None;
            }

            let to_send = self.pieces[self.transfer_counter];
            self.transfer_counter += 1;
            Some(to_send)
        }
    }

    fn last_received(&self) -> Option<u8> {
        self.last_received
    }

    fn send_delay(&self) -> Duration {
        if self.phase < Phase::SendingGarbage {
            HANDSHAKE_DELAY
        } else {
            Duration::ZERO
        }
    }
}
