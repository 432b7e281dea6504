//! Reference tables behind every power, difficulty and fatigue score.
//!
//! The tables ship as JSON under `data/` and are parsed once into a typed
//! registry. Two lookup styles coexist and must not be mixed up:
//!
//! - exact-key tables (level points, power, monster power, XP) fail with
//!   [`BalanceError::MissingKey`] when the key is absent;
//! - [`ThresholdTable`]s (difficulty, XP budget, fatigue) pick the last row
//!   whose threshold does not exceed the query.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use crate::challenge::ChallengeRating;
use crate::constants::{
    TABLE_AUX_POINTS, TABLE_CONSUMABLES, TABLE_DIFFICULTY, TABLE_FATIGUE,
    TABLE_ITEM_BONUS, TABLE_MONSTER_POWER, TABLE_PACT_MAGIC, TABLE_POWER, TABLE_PRIMARY_POINTS,
    TABLE_XP, TABLE_XP_BUDGET, TABLE_XP_BUDGET_DESCRIPTIONS,
};
use crate::day::{ConsumableKind, Rarity};
use crate::error::{BalanceError, Result};
use crate::party::Tier;
use crate::pc::ClassCategory;

const DEFAULT_PC_DATA: &str = include_str!("../data/pc.json");
const DEFAULT_MONSTER_DATA: &str = include_str!("../data/monsters.json");
const DEFAULT_ENCOUNTER_DATA: &str = include_str!("../data/encounter.json");
const DEFAULT_SORLOCK_DATA: &str = include_str!("../data/sorlock.json");

/// A row of a floor-lookup table.
pub trait Threshold {
    fn threshold(&self) -> f64;
}

/// Rows sorted ascending by threshold, queried with floor semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdTable<R> {
    rows: Vec<R>,
}

impl<R> Default for ThresholdTable<R> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<R: Threshold> ThresholdTable<R> {
    #[must_use]
    pub const fn new(rows: Vec<R>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Check the table can serve floor lookups.
    ///
    /// # Errors
    ///
    /// Returns `EmptyTable` or `UnsortedTable` naming `table`.
    pub fn validate(&self, table: &'static str) -> Result<()> {
        if self.rows.is_empty() {
            return Err(BalanceError::EmptyTable { table });
        }
        let sorted = self
            .rows
            .windows(2)
            .all(|pair| pair[0].threshold() <= pair[1].threshold());
        if sorted {
            Ok(())
        } else {
            Err(BalanceError::UnsortedTable { table })
        }
    }

    /// Last row whose threshold is `<= query`, or the first row when the
    /// query sits below every threshold. `None` only for an empty table.
    #[must_use]
    pub fn floor(&self, query: f64) -> Option<&R> {
        self.rows
            .iter()
            .rev()
            .find(|row| row.threshold() <= query)
            .or_else(|| self.rows.first())
    }
}

/// Ratio-based difficulty row: a power ratio floor and the resource cost of
/// an encounter at that ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyRow {
    pub multiplier: f64,
    pub category: String,
    pub description: String,
    pub cost: f64,
}

impl Threshold for DifficultyRow {
    fn threshold(&self) -> f64 {
        self.multiplier
    }
}

/// Per-character XP budget for a party level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpBudgetRow {
    pub party_level: u32,
    pub low: u32,
    pub moderate: u32,
    pub high: u32,
}

impl Threshold for XpBudgetRow {
    fn threshold(&self) -> f64 {
        f64::from(self.party_level)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueRow {
    pub cost: f64,
    pub category: String,
    pub description: String,
}

impl Threshold for FatigueRow {
    fn threshold(&self) -> f64 {
        self.cost
    }
}

/// Per-party offsets granted by spending consumables, by rarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConsumableOffsets {
    #[serde(default)]
    pub charge: HashMap<Rarity, f64>,
    #[serde(default)]
    pub consumable: HashMap<Rarity, f64>,
}

impl ConsumableOffsets {
    fn get(&self, rarity: Rarity, kind: ConsumableKind) -> Option<f64> {
        match kind {
            ConsumableKind::Charge => self.charge.get(&rarity).copied(),
            ConsumableKind::Consumable => self.consumable.get(&rarity).copied(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSplit {
    pub sorcerer: u32,
    pub warlock: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PactMagic {
    pub slot_level: u32,
    pub num_slots: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PcTables {
    #[serde(default)]
    pub class_categories: HashMap<String, ClassCategory>,
    #[serde(default)]
    pub primary_level_points: BTreeMap<u32, u32>,
    #[serde(default)]
    pub aux_level_points: BTreeMap<u32, u32>,
    #[serde(default)]
    pub item_bonus_points: BTreeMap<u32, u32>,
    #[serde(default)]
    pub power_by_level_points: BTreeMap<u32, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MonsterTables {
    #[serde(default)]
    pub monster_power: HashMap<Tier, BTreeMap<ChallengeRating, u32>>,
    /// Keyed by the canonical CR string (`"1/4"`, `"8"`).
    #[serde(default)]
    pub xp_by_cr: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EncounterTables {
    #[serde(default)]
    pub difficulty: ThresholdTable<DifficultyRow>,
    #[serde(default)]
    pub xp_budget: ThresholdTable<XpBudgetRow>,
    #[serde(default)]
    pub xp_budget_descriptions: HashMap<String, String>,
    #[serde(default)]
    pub fatigue: ThresholdTable<FatigueRow>,
    #[serde(default)]
    pub consumables: HashMap<Tier, ConsumableOffsets>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SorlockTables {
    /// Sorcerer/warlock split by total character level.
    #[serde(default)]
    pub class_levels: BTreeMap<u32, ClassSplit>,
    #[serde(default)]
    pub pact_magic: BTreeMap<u32, PactMagic>,
    /// Sorcery points spent (key) to the spell slot level created (value).
    #[serde(default)]
    pub spell_slot_by_sorcery_points: BTreeMap<u32, u32>,
}

/// Process-wide read-only registry of every reference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Tables {
    pub pc: PcTables,
    pub monsters: MonsterTables,
    pub encounter: EncounterTables,
    pub sorlock: SorlockTables,
}

impl Tables {
    /// Parse and validate a registry from its four JSON documents.
    ///
    /// # Errors
    ///
    /// Returns `Data` when a document does not parse, or `EmptyTable` /
    /// `UnsortedTable` when a floor-lookup table cannot be used.
    pub fn from_json_parts(pc: &str, monsters: &str, encounter: &str, sorlock: &str) -> Result<Self> {
        let tables = Self {
            pc: serde_json::from_str(pc)?,
            monsters: serde_json::from_str(monsters)?,
            encounter: serde_json::from_str(encounter)?,
            sorlock: serde_json::from_str(sorlock)?,
        };
        tables.encounter.difficulty.validate(TABLE_DIFFICULTY)?;
        tables.encounter.xp_budget.validate(TABLE_XP_BUDGET)?;
        tables.encounter.fatigue.validate(TABLE_FATIGUE)?;
        Ok(tables)
    }

    /// Load the tables embedded in the crate. A broken bundle is logged and
    /// replaced by empty tables, so every later lookup reports a miss.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json_parts(
            DEFAULT_PC_DATA,
            DEFAULT_MONSTER_DATA,
            DEFAULT_ENCOUNTER_DATA,
            DEFAULT_SORLOCK_DATA,
        )
        .unwrap_or_else(|err| {
            log::warn!("embedded reference tables failed to load: {err}");
            Self::default()
        })
    }

    #[must_use]
    pub fn global() -> &'static Self {
        static TABLES: OnceLock<Tables> = OnceLock::new();
        TABLES.get_or_init(Self::load_from_static)
    }

    /// # Errors
    ///
    /// Returns `UnknownClass` when the class name is not in the category table.
    pub fn class_category(&self, class: &str) -> Result<ClassCategory> {
        self.pc
            .class_categories
            .get(&class.trim().to_ascii_uppercase())
            .copied()
            .ok_or_else(|| BalanceError::UnknownClass(class.to_string()))
    }

    /// # Errors
    ///
    /// Returns `MissingKey` when `levels` is not in the table.
    pub fn primary_level_points(&self, levels: u32) -> Result<u32> {
        exact(&self.pc.primary_level_points, TABLE_PRIMARY_POINTS, levels)
    }

    /// # Errors
    ///
    /// Returns `MissingKey` when `levels` is not in the table.
    pub fn aux_level_points(&self, levels: u32) -> Result<u32> {
        exact(&self.pc.aux_level_points, TABLE_AUX_POINTS, levels)
    }

    /// # Errors
    ///
    /// Returns `MissingKey` when `item_count` is not in the table.
    pub fn item_bonus_points(&self, item_count: u32) -> Result<u32> {
        exact(&self.pc.item_bonus_points, TABLE_ITEM_BONUS, item_count)
    }

    /// # Errors
    ///
    /// Returns `MissingKey` when `level_points` is not in the table.
    pub fn power_for_level_points(&self, level_points: u32) -> Result<u32> {
        exact(&self.pc.power_by_level_points, TABLE_POWER, level_points)
    }

    /// # Errors
    ///
    /// Returns `MissingKey` when the tier or CR is not in the table.
    pub fn monster_power(&self, tier: Tier, cr: ChallengeRating) -> Result<u32> {
        self.monsters
            .monster_power
            .get(&tier)
            .and_then(|by_cr| by_cr.get(&cr))
            .copied()
            .ok_or_else(|| BalanceError::missing(TABLE_MONSTER_POWER, format!("{tier}/{cr}")))
    }

    /// # Errors
    ///
    /// Returns `MissingKey` when the CR is not in the table.
    pub fn xp_for_cr(&self, cr: ChallengeRating) -> Result<u32> {
        let key = cr.to_string();
        self.monsters
            .xp_by_cr
            .get(&key)
            .copied()
            .ok_or_else(|| BalanceError::missing(TABLE_XP, key))
    }

    #[must_use]
    pub const fn difficulty_table(&self) -> &ThresholdTable<DifficultyRow> {
        &self.encounter.difficulty
    }

    /// # Errors
    ///
    /// Returns `EmptyTable` when there are no budget rows.
    pub fn xp_budget(&self, party_level: f64) -> Result<&XpBudgetRow> {
        self.encounter
            .xp_budget
            .floor(party_level)
            .ok_or(BalanceError::EmptyTable {
                table: TABLE_XP_BUDGET,
            })
    }

    /// # Errors
    ///
    /// Returns `MissingKey` when the category has no description.
    pub fn xp_budget_description(&self, category: &str) -> Result<&str> {
        self.encounter
            .xp_budget_descriptions
            .get(category)
            .map(String::as_str)
            .ok_or_else(|| BalanceError::missing(TABLE_XP_BUDGET_DESCRIPTIONS, category))
    }

    /// # Errors
    ///
    /// Returns `EmptyTable` when there are no fatigue rows.
    pub fn fatigue(&self, effective_cost: f64) -> Result<&FatigueRow> {
        self.encounter
            .fatigue
            .floor(effective_cost)
            .ok_or(BalanceError::EmptyTable {
                table: TABLE_FATIGUE,
            })
    }

    /// # Errors
    ///
    /// Returns `MissingKey` when the tier, rarity or category is not in the table.
    pub fn consumable_offset(&self, tier: Tier, rarity: Rarity, kind: ConsumableKind) -> Result<f64> {
        self.encounter
            .consumables
            .get(&tier)
            .and_then(|offsets| offsets.get(rarity, kind))
            .ok_or_else(|| {
                BalanceError::missing(TABLE_CONSUMABLES, format!("{tier}/{rarity}_{kind}"))
            })
    }

    /// # Errors
    ///
    /// Returns `UnsupportedLevel` when the level has no sorcerer/warlock split.
    pub fn class_split(&self, level: u32) -> Result<ClassSplit> {
        self.sorlock
            .class_levels
            .get(&level)
            .copied()
            .ok_or(BalanceError::UnsupportedLevel(level))
    }

    /// # Errors
    ///
    /// Returns `MissingKey` when the warlock level is not in the table.
    pub fn pact_magic(&self, warlock_level: u32) -> Result<PactMagic> {
        self.sorlock
            .pact_magic
            .get(&warlock_level)
            .copied()
            .ok_or_else(|| BalanceError::missing(TABLE_PACT_MAGIC, warlock_level))
    }

    /// Spell slot level bought with exactly `sorcery_points`, if any.
    #[must_use]
    pub fn spell_slot_for_sorcery_points(&self, sorcery_points: u32) -> Option<u32> {
        self.sorlock
            .spell_slot_by_sorcery_points
            .get(&sorcery_points)
            .copied()
    }

    /// Highest spell slot level the conversion table can produce.
    #[must_use]
    pub fn max_sorcerer_spell_level(&self) -> u32 {
        self.sorlock
            .spell_slot_by_sorcery_points
            .values()
            .copied()
            .max()
            .unwrap_or(0)
    }
}

fn exact(table: &BTreeMap<u32, u32>, name: &'static str, key: u32) -> Result<u32> {
    table
        .get(&key)
        .copied()
        .ok_or_else(|| BalanceError::missing(name, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fatigue_row(cost: f64, category: &str) -> FatigueRow {
        FatigueRow {
            cost,
            category: category.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn floor_lookup_picks_last_row_not_above_query() {
        let table = ThresholdTable::new(vec![
            fatigue_row(0.0, "a"),
            fatigue_row(5.0, "b"),
            fatigue_row(10.0, "c"),
        ]);
        assert_eq!(table.floor(5.0).unwrap().category, "b");
        assert_eq!(table.floor(7.5).unwrap().category, "b");
        assert_eq!(table.floor(10.0).unwrap().category, "c");
        assert_eq!(table.floor(99.0).unwrap().category, "c");
        assert_eq!(table.floor(-3.0).unwrap().category, "a");
        assert!(ThresholdTable::<FatigueRow>::default().floor(1.0).is_none());
    }

    #[test]
    fn validate_rejects_unsorted_and_empty_tables() {
        let unsorted = ThresholdTable::new(vec![fatigue_row(5.0, "b"), fatigue_row(0.0, "a")]);
        assert!(matches!(
            unsorted.validate("fatigue"),
            Err(BalanceError::UnsortedTable { table: "fatigue" })
        ));
        let empty = ThresholdTable::<FatigueRow>::default();
        assert!(matches!(
            empty.validate("fatigue"),
            Err(BalanceError::EmptyTable { .. })
        ));
    }

    #[test]
    fn embedded_tables_load() {
        let tables = Tables::global();
        assert_eq!(tables.primary_level_points(6).unwrap(), 20);
        assert_eq!(tables.aux_level_points(2).unwrap(), 4);
        assert_eq!(tables.item_bonus_points(10).unwrap(), 5);
        assert_eq!(tables.power_for_level_points(35).unwrap(), 117);
        assert_eq!(tables.class_category("druid").unwrap(), ClassCategory::Caster);
        assert_eq!(
            tables
                .monster_power(Tier::Three, ChallengeRating::from_whole(10).unwrap())
                .unwrap(),
            75
        );
        assert_eq!(tables.xp_for_cr(ChallengeRating::from_eighths(2)).unwrap(), 50);
        assert_eq!(tables.spell_slot_for_sorcery_points(6), Some(4));
        assert_eq!(tables.spell_slot_for_sorcery_points(4), None);
        assert_eq!(tables.max_sorcerer_spell_level(), 5);
    }

    #[test]
    fn exact_lookups_report_misses() {
        let tables = Tables::global();
        assert!(matches!(
            tables.power_for_level_points(500),
            Err(BalanceError::MissingKey { table: "power_by_level_points", .. })
        ));
        assert!(matches!(
            tables.monster_power(Tier::One, ChallengeRating::from_whole(-1).unwrap()),
            Err(BalanceError::MissingKey { .. })
        ));
        assert!(matches!(
            tables.class_category("BLOODHUNTER"),
            Err(BalanceError::UnknownClass(_))
        ));
    }

    #[test]
    fn custom_bundle_with_unsorted_fatigue_is_rejected() {
        let encounter = r#"{
            "difficulty": [{"multiplier": 0.0, "category": "A", "description": "", "cost": 0}],
            "xp_budget": [{"party_level": 1, "low": 1, "moderate": 2, "high": 3}],
            "fatigue": [
                {"cost": 10, "category": "LATE", "description": ""},
                {"cost": 0, "category": "EARLY", "description": ""}
            ]
        }"#;
        let err = Tables::from_json_parts("{}", "{}", encounter, "{}").unwrap_err();
        assert!(matches!(err, BalanceError::UnsortedTable { table: "fatigue" }));
    }
}
