//! Gen 1 trade data structures and their byte-exact serialization
//!
//! Layouts follow the game's in-RAM party structure: a preamble, the
//! trainer name, the species list, one 44-byte stat record per party slot,
//! then originator names and nicknames. Everything is validated when the
//! records are built; serialization itself cannot fail.
//!
//! Text encoding reference:
//! https://bulbapedia.bulbagarden.net/wiki/Character_encoding_(Generation_I)

use link_core::{LinkError, Result};
use serde::Deserialize;

/// Offset from ASCII to the game's letter tiles. Letters match exactly;
/// other printable characters are approximations.
const TEXT_OFFSET: u8 = 0x3F;
const TEXT_TERMINATOR: u8 = 0x50;
/// Serialized width of every name field (10 characters + terminator)
const TEXT_FIELD_LEN: usize = 11;
const NICKNAME_MAX_LEN: usize = 10;
const TRAINER_NAME_MAX_LEN: usize = 7;

const SPECIES_LIST_TERMINATOR: u8 = 0xFF;
const MAX_PARTY_SIZE: usize = 6;
const PREAMBLE_BYTE: u8 = 0xFD;
const PREAMBLE_LEN: usize = 7;

fn validate_name(name: &str, max_len: usize) -> Result<()> {
    if !name.is_ascii() {
        return Err(LinkError::Validation(format!(
            "Name '{}' contains non-ASCII characters",
            name
        )));
    }
    if name.len() > max_len {
        return Err(LinkError::Validation(format!(
            "Name '{}' exceeds {} characters",
            name, max_len
        )));
    }
    Ok(())
}

/// Encode a previously-validated name into one fixed-width text field.
fn text_field(name: &str) -> [u8; TEXT_FIELD_LEN] {
    let mut field = [0u8; TEXT_FIELD_LEN];
    for (i, b) in name.bytes().enumerate() {
        field[i] = b.wrapping_add(TEXT_OFFSET);
    }
    field[name.len()] = TEXT_TERMINATOR;
    field
}

/// One party member's stat record, fixed at 44 serialized bytes.
///
/// Zeroed stats are acceptable for trading; the receiving game
/// recalculates everything that matters from species and level.
#[derive(Debug, Clone, Default)]
pub struct PokemonRecord {
    nickname: String,
    pub species: u8,
    pub hp: u16,
    pub box_level: u8,
    pub status: u8,
    pub type1: u8,
    pub type2: u8,
    pub catch_rate: u8,
    pub moves: [u8; 4],
    pub trainer_id: u16,
    /// Stored on the wire as 24 bits, little-endian
    pub experience: u32,
    pub hp_ev: u16,
    pub attack_ev: u16,
    pub defense_ev: u16,
    pub speed_ev: u16,
    pub special_ev: u16,
    pub ivs: u16,
    pub move_pp: [u8; 4],
    pub level: u8,
    pub max_hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub speed: u16,
    pub special: u16,
}

impl PokemonRecord {
    /// Serialized size of one stat record
    pub const SERIALIZED_LEN: usize = 44;

    /// Create a record with the given species and nickname; every other
    /// field starts at zero.
    pub fn new(species: u8, nickname: &str) -> Result<Self> {
        validate_name(nickname, NICKNAME_MAX_LEN)?;

        Ok(Self {
            nickname: nickname.to_string(),
            species,
            ..Self::default()
        })
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Serialize to the 44-byte wire layout.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SERIALIZED_LEN);
        buf.push(self.species);
        buf.extend_from_slice(&self.hp.to_le_bytes());
        buf.push(self.box_level);
        buf.push(self.status);
        buf.push(self.type1);
        buf.push(self.type2);
        buf.push(self.catch_rate);
        buf.extend_from_slice(&self.moves);
        buf.extend_from_slice(&self.trainer_id.to_le_bytes());
        buf.extend_from_slice(&self.experience.to_le_bytes()[..3]);
        for word in [
            self.hp_ev,
            self.attack_ev,
            self.defense_ev,
            self.speed_ev,
            self.special_ev,
            self.ivs,
        ] {
            buf.extend_from_slice(&word.to_le_bytes());
        }
        buf.extend_from_slice(&self.move_pp);
        buf.push(self.level);
        for word in [self.max_hp, self.attack, self.defense, self.speed, self.special] {
            buf.extend_from_slice(&word.to_le_bytes());
        }

        buf
    }
}

/// A trainer and their party.
///
/// Built once from operator configuration and immutable afterwards; the
/// trade partner serializes it a single time and replays the bytes
/// verbatim.
#[derive(Debug, Clone)]
pub struct TrainerRecord {
    name: String,
    party: Vec<PokemonRecord>,
}

impl TrainerRecord {
    pub fn new(name: &str) -> Result<Self> {
        validate_name(name, TRAINER_NAME_MAX_LEN)?;

        Ok(Self {
            name: name.to_string(),
            party: Vec::new(),
        })
    }

    pub fn add_party_member(&mut self, record: PokemonRecord) -> Result<()> {
        if self.party.len() >= MAX_PARTY_SIZE {
            return Err(LinkError::Validation(format!(
                "Party is limited to {} members",
                MAX_PARTY_SIZE
            )));
        }
        self.party.push(record);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn party(&self) -> &[PokemonRecord] {
        &self.party
    }

    /// Serialize the full trade block: preamble, trainer name, species
    /// list, stat records, originator names, nicknames. Unused party slots
    /// are padded exactly the way the game pads its own buffers.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        buf.extend_from_slice(&[PREAMBLE_BYTE; PREAMBLE_LEN]);
        buf.extend_from_slice(&text_field(&self.name));
        buf.push(self.party.len() as u8);

        for mon in &self.party {
            buf.push(mon.species);
        }
        for _ in self.party.len()..=MAX_PARTY_SIZE {
            buf.push(SPECIES_LIST_TERMINATOR);
        }

        for mon in &self.party {
            buf.extend_from_slice(&mon.serialize());
        }
        for _ in self.party.len()..MAX_PARTY_SIZE {
            buf.extend_from_slice(&[0u8; PokemonRecord::SERIALIZED_LEN]);
        }

        for _ in &self.party {
            buf.extend_from_slice(&text_field(&self.name));
        }
        for _ in self.party.len()..MAX_PARTY_SIZE {
            buf.extend_from_slice(&text_field(""));
        }

        for mon in &self.party {
            buf.extend_from_slice(&text_field(&mon.nickname));
        }
        for _ in self.party.len()..MAX_PARTY_SIZE {
            buf.extend_from_slice(&text_field(""));
        }

        buf
    }
}

/// Operator-supplied trade configuration, typically loaded from JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainerConfig {
    pub name: String,
    #[serde(default)]
    pub party: Vec<PokemonConfig>,
}

/// One configured party member
#[derive(Debug, Clone, Deserialize)]
pub struct PokemonConfig {
    pub species: u8,
    pub name: String,
    #[serde(default)]
    pub level: u8,
}

impl TryFrom<TrainerConfig> for TrainerRecord {
    type Error = LinkError;

    fn try_from(config: TrainerConfig) -> Result<Self> {
        let mut trainer = TrainerRecord::new(&config.name)?;
        for mon in &config.party {
            let mut record = PokemonRecord::new(mon.species, &mon.name)?;
            record.level = mon.level;
            trainer.add_party_member(record)?;
        }
        Ok(trainer)
    }
}
