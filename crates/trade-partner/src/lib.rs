//! Software stand-in for the remote side of a Gen 1 trade
//!
//! This crate provides:
//! - Byte-exact trade data structures (trainer, party records, the game's
//!   text encoding) built once from operator configuration
//! - The trade-center state machine that negotiates against a real console
//!   and replays the serialized trainer block

pub mod data;
pub mod trader;

pub use data::{PokemonConfig, PokemonRecord, TrainerConfig, TrainerRecord};
pub use trader::{TradePartner, TradeState, run_as_master};
