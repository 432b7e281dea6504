//! Encounter Builder Engine
//!
//! Balance scoring for 5e-style tabletop encounters: player character and
//! monster power, encounter difficulty, adventuring-day fatigue, and the
//! warlock/sorcerer pact slot conversion search. All reference data is
//! embedded and loaded once through [`Tables::global`].

pub mod challenge;
pub mod constants;
pub mod day;
pub mod encounter;
pub mod error;
pub mod monsters;
pub mod numbers;
pub mod party;
pub mod pc;
pub mod sorlock;
pub mod tables;

// Re-export commonly used types
pub use challenge::{ChallengeRating, cr_num_to_str, cr_str_to_num};
pub use day::{AdventuringDay, ConsumableKind, Rarity};
pub use encounter::{CostMode, DifficultyMethod, Encounter, Rating};
pub use error::{BalanceError, Result};
pub use monsters::{Monster, MonsterParty, MonsterRecord, RosterRecord};
pub use party::{Party, PartyRecord, Tier};
pub use pc::{
    CharacterRecord, ClassCategory, ClassLevels, LevelBuckets, PlayerCharacter, Situation,
    split_levels,
};
pub use sorlock::{
    Column, ConversionTable, SorlockState, prune_dominated, sorlock_table_level, spend_pact_slots,
};
pub use tables::{Tables, Threshold, ThresholdTable};
