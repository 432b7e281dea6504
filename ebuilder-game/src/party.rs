//! The adventuring party and its tier of play.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    MAX_PARTY_LEVEL, MIN_PARTY_LEVEL, TIER_FOUR_MIN_LEVEL, TIER_THREE_MIN_LEVEL,
    TIER_TWO_MIN_LEVEL,
};
use crate::error::{BalanceError, Result};
use crate::numbers::usize_to_f64;
use crate::pc::{CharacterRecord, PlayerCharacter};
use crate::tables::Tables;

/// Tier of play, banded by average party level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "tier1")]
    One,
    #[serde(rename = "tier2")]
    Two,
    #[serde(rename = "tier3")]
    Three,
    #[serde(rename = "tier4")]
    Four,
}

impl Tier {
    /// Levels 1-4 are tier 1, 5-10 tier 2, 11-16 tier 3 and 17-20 tier 4.
    ///
    /// # Errors
    ///
    /// Returns `LevelOutOfRange` for levels below 1 or above 20.
    pub fn from_level(level: f64) -> Result<Self> {
        if !(MIN_PARTY_LEVEL..=MAX_PARTY_LEVEL).contains(&level) {
            return Err(BalanceError::LevelOutOfRange(level));
        }
        let tier = if level < TIER_TWO_MIN_LEVEL {
            Self::One
        } else if level < TIER_THREE_MIN_LEVEL {
            Self::Two
        } else if level < TIER_FOUR_MIN_LEVEL {
            Self::Three
        } else {
            Self::Four
        };
        Ok(tier)
    }

    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier{}", self.number())
    }
}

/// Party file layout: `{"characters": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PartyRecord {
    #[serde(default)]
    pub characters: Vec<CharacterRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Party {
    characters: Vec<PlayerCharacter>,
}

impl Party {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            characters: Vec::new(),
        }
    }

    /// Load a party from its JSON description.
    ///
    /// # Errors
    ///
    /// Returns `Data` for malformed JSON and any error raised while building
    /// a character (unknown class, no levels).
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_json_with(Tables::global(), json)
    }

    /// Same as [`Party::from_json`], splitting class levels with `tables`.
    ///
    /// # Errors
    ///
    /// See [`Party::from_json`].
    pub fn from_json_with(tables: &Tables, json: &str) -> Result<Self> {
        let record: PartyRecord = serde_json::from_str(json)?;
        Self::from_record_with(tables, &record)
    }

    /// # Errors
    ///
    /// Returns the first error raised while building a character.
    pub fn from_record(record: &PartyRecord) -> Result<Self> {
        Self::from_record_with(Tables::global(), record)
    }

    /// # Errors
    ///
    /// Returns the first error raised while building a character.
    pub fn from_record_with(tables: &Tables, record: &PartyRecord) -> Result<Self> {
        let characters = record
            .characters
            .iter()
            .map(|character| PlayerCharacter::from_record_with(tables, character))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { characters })
    }

    pub fn add(&mut self, pc: PlayerCharacter) {
        self.characters.push(pc);
    }

    #[must_use]
    pub fn characters(&self) -> &[PlayerCharacter] {
        &self.characters
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.characters.len()
    }

    /// Average character level.
    ///
    /// # Errors
    ///
    /// Returns `EmptyParty` when there are no characters.
    pub fn level(&self) -> Result<f64> {
        if self.characters.is_empty() {
            return Err(BalanceError::EmptyParty);
        }
        let total: f64 = self
            .characters
            .iter()
            .map(|pc| f64::from(pc.level()))
            .sum();
        Ok(total / usize_to_f64(self.count()))
    }

    /// # Errors
    ///
    /// Returns `EmptyParty` or `LevelOutOfRange`.
    pub fn tier(&self) -> Result<Tier> {
        Tier::from_level(self.level()?)
    }

    /// Sum of every character's power.
    ///
    /// # Errors
    ///
    /// Returns the first lookup miss raised by a character, or `Overflow`
    /// when the total does not fit in a `u32`.
    pub fn power(&self, tables: &Tables) -> Result<u32> {
        self.characters.iter().try_fold(0_u32, |total, pc| {
            total
                .checked_add(pc.power(tables)?)
                .ok_or(BalanceError::Overflow { what: "party power" })
        })
    }
}
