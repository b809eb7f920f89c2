//! Trade-center partner state machine
//!
//! Stands in for the remote console in a trade: negotiates the link type,
//! mirrors the seed exchange, replays the serialized trainer block, and
//! always offers the first party slot. Transitions are keyed solely on the
//! latest received byte; there is no history beyond the current state and
//! the transfer counter.
//!
//! Trade flow reference:
//! http://www.adanscotney.com/2014/01/spoofing-pokemon-trades-with-stellaris.html

use crate::data::TrainerRecord;
use async_trait::async_trait;
use link_cable::ByteLink;
use link_core::{LinkCableHandler, LinkError, Result};
use tracing::info;

/// Trade-center control bytes
mod magic {
    pub const MASTER: u8 = 0x01;
    pub const SLAVE: u8 = 0x02;
    pub const CONNECTED: u8 = 0x60;
    pub const SELECT_TRADE: u8 = 0xD4;
    pub const SELECT_BATTLE: u8 = 0xD5;
    pub const SELECT_CANCEL: u8 = 0xD6;
    pub const TERMINATOR: u8 = 0xFD;
    pub const TRADE_MENU_CLOSED: u8 = 0x6F;
    pub const FIRST_PARTY_SLOT: u8 = 0x60;
    pub const LAST_PARTY_SLOT: u8 = 0x65;
    pub const TRADE_CANCELLED: u8 = 0x61;
    pub const TRADE_CONFIRMED: u8 = 0x62;
}

/// Where the negotiation currently stands. Exactly one state is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeState {
    NotConnected,
    WaitingForLinkType,
    SelectedTrade,
    WaitingForRandomSeed,
    SendingRandomSeed,
    SendingTrainerData,
    WaitingForTrade,
    TradeInitiated,
    TradeConfirmation,
    TradeCancelled,
}

/// The missing trade partner.
///
/// Owns one serialized trainer block, computed at construction and
/// replayed verbatim for every trade.
pub struct TradePartner {
    state: TradeState,
    transfer_counter: usize,
    trainer_block: Vec<u8>,
    is_master: bool,
}

impl TradePartner {
    /// Partner in the slave role, e.g. behind an emulator tunnel.
    pub fn new(trainer: &TrainerRecord) -> Self {
        Self {
            state: TradeState::NotConnected,
            transfer_counter: 0,
            trainer_block: trainer.serialize(),
            is_master: false,
        }
    }

    /// Partner in the master role, clocking a directly-attached console.
    pub fn as_master(trainer: &TrainerRecord) -> Self {
        Self {
            is_master: true,
            ..Self::new(trainer)
        }
    }

    pub fn state(&self) -> TradeState {
        self.state
    }

    /// Advance the negotiation with the latest byte from the console
    /// (`None` before the first exchange) and produce the byte to send
    /// back. When no transition has a better answer, echo.
    pub fn advance(&mut self, received: Option<u8>) -> Result<u8> {
        let data = received;
        let mut to_send = data.unwrap_or(0);

        match self.state {
            TradeState::NotConnected => {
                if data == Some(magic::CONNECTED) {
                    self.state = TradeState::WaitingForLinkType;
                    to_send = magic::CONNECTED;
                    info!("Link initiated");
                } else if self.is_master {
                    to_send = magic::MASTER;
                } else if data == Some(magic::MASTER) {
                    to_send = magic::SLAVE;
                }
            }

            TradeState::WaitingForLinkType => {
                if data == Some(magic::CONNECTED) {
                    to_send = magic::CONNECTED;
                } else if data == Some(magic::SELECT_TRADE) {
                    self.state = TradeState::SelectedTrade;
                    info!("Selected trade center");
                } else if data == Some(magic::SELECT_BATTLE) {
                    return Err(LinkError::UnsupportedMode(
                        "Battles are not supported".into(),
                    ));
                } else if data == Some(magic::SELECT_CANCEL) || data == Some(magic::MASTER) {
                    return Err(LinkError::LinkCancelled(
                        "Console left the link menu".into(),
                    ));
                }
            }

            TradeState::SelectedTrade => {
                if data == Some(magic::TERMINATOR) {
                    self.state = TradeState::WaitingForRandomSeed;
                    info!("Waiting for random seed");
                }
            }

            TradeState::WaitingForRandomSeed => {
                if data != Some(magic::TERMINATOR) {
                    self.state = TradeState::SendingRandomSeed;
                    info!("Exchanging random seed");
                }
            }

            TradeState::SendingRandomSeed => {
                // Seed bytes are echoed back until the terminator recurs
                if data == Some(magic::TERMINATOR) {
                    self.state = TradeState::SendingTrainerData;
                    self.transfer_counter = 0;
                    info!("Sending trainer data");
                }
            }

            TradeState::SendingTrainerData => {
                if self.transfer_counter < self.trainer_block.len() {
                    to_send = self.trainer_block[self.transfer_counter];
                    self.transfer_counter += 1;
                } else {
                    self.state = TradeState::WaitingForTrade;
                    self.transfer_counter = 0;
                    info!("Waiting for trade");
                }
            }

            TradeState::WaitingForTrade => {
                if data == Some(magic::TRADE_MENU_CLOSED) {
                    self.state = TradeState::SelectedTrade;
                    info!("Trade menu closed");
                } else if data
                    .is_some_and(|b| (magic::FIRST_PARTY_SLOT..=magic::LAST_PARTY_SLOT).contains(&b))
                {
                    self.state = TradeState::TradeInitiated;
                    info!("Trade initiated");
                }
            }

            TradeState::TradeInitiated => {
                if data != Some(0) {
                    // Always counter-offer the first party slot
                    to_send = magic::FIRST_PARTY_SLOT;
                } else {
                    self.state = TradeState::TradeConfirmation;
                    info!("Waiting for trade confirmation");
                }
            }

            TradeState::TradeConfirmation => {
                if data == Some(magic::TRADE_CANCELLED) {
                    self.state = TradeState::TradeCancelled;
                    info!("Trade cancelled");
                } else if data == Some(magic::TRADE_CONFIRMED) {
                    // Back to the trade menu, like real cartridges after a
                    // completed trade
                    self.state = TradeState::SelectedTrade;
                    info!("Trade confirmed");
                }
            }

            TradeState::TradeCancelled => {
                if data == Some(0) {
                    self.state = TradeState::WaitingForTrade;
                }
            }
        }

        Ok(to_send)
    }
}

#[async_trait]
impl LinkCableHandler for TradePartner {
    async fn on_master_byte(&mut self, byte: u8) -> Result<Option<u8>> {
        self.advance(Some(byte)).map(Some)
    }
}

/// Clock a trade against a console we master directly (serial adapter).
///
/// Runs until the transport fails or the console cancels; there is no
/// internal timeout or retry.
pub async fn run_as_master<L: ByteLink>(partner: &mut TradePartner, link: &mut L) -> Result<()> {
    let mut response = None;
    loop {
        let to_send = partner.advance(response)?;
        response = Some(link.exchange(to_send).await?);
    }
}
