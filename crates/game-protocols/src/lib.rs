//! Per-game link handshake protocols
//!
//! One module per supported game. Each implements the `LinkProtocol` /
//! `LinkInitializer` traits from `link-core`: the relay asks the protocol
//! for a fresh initializer per endpoint and steps it until the console is
//! in externally-clocked mode.

pub mod pokemon_gen1;
pub mod tetris;

pub use pokemon_gen1::PokemonGen1;
pub use tetris::Tetris;
