//! Player character power.
//!
//! A character's class levels are split into three buckets relative to its
//! primary (highest-level) class:
//!
//! - **primary**: levels in the primary class;
//! - **auxiliary**: other levels that still feed the primary class's role;
//! - **junk**: levels that do not.
//!
//! Each bucket converts to level points, items and situational modifiers add
//! more, and the total indexes the power table.
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{MONSTER_DISADVANTAGE_BONUS, PC_ADVANTAGE_BONUS};
use crate::error::{BalanceError, Result};
use crate::tables::Tables;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassCategory {
    #[serde(rename = "CASTER")]
    Caster,
    #[serde(rename = "MARTIAL")]
    Martial,
    #[serde(rename = "HALF-CASTER")]
    HalfCaster,
}

/// Class name to level count, in the order the classes were given.
///
/// Order matters: when two classes tie for the most levels, the first one
/// becomes the primary class. A repeated class name overwrites the earlier
/// count in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassLevels(Vec<(String, u32)>);

impl ClassLevels {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn with(mut self, class: &str, levels: u32) -> Self {
        self.insert(class, levels);
        self
    }

    pub fn insert(&mut self, class: &str, levels: u32) {
        if let Some(entry) = self.0.iter_mut().find(|(name, _)| name == class) {
            entry.1 = levels;
        } else {
            self.0.push((class.to_string(), levels));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(name, levels)| (name.as_str(), *levels))
    }

    /// Sum of all class levels, `None` if it overflows.
    #[must_use]
    pub fn total(&self) -> Option<u32> {
        self.0
            .iter()
            .try_fold(0_u32, |total, (_, levels)| total.checked_add(*levels))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First class holding the strictly greatest level count.
    #[must_use]
    pub fn primary(&self) -> Option<(&str, u32)> {
        let mut best: Option<(&str, u32)> = None;
        for (name, levels) in self.iter() {
            if best.is_none_or(|(_, top)| levels > top) {
                best = Some((name, levels));
            }
        }
        best
    }
}

impl<'a> FromIterator<(&'a str, u32)> for ClassLevels {
    fn from_iter<I: IntoIterator<Item = (&'a str, u32)>>(iter: I) -> Self {
        let mut levels = Self::new();
        for (class, count) in iter {
            levels.insert(class, count);
        }
        levels
    }
}

impl Serialize for ClassLevels {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

struct ClassLevelsVisitor;

impl<'de> Visitor<'de> for ClassLevelsVisitor {
    type Value = ClassLevels;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of class name to level count")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut levels = ClassLevels::new();
        while let Some((class, count)) = map.next_entry::<String, u32>()? {
            levels.insert(&class, count);
        }
        Ok(levels)
    }
}

impl<'de> Deserialize<'de> for ClassLevels {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(ClassLevelsVisitor)
    }
}

/// Situational modifiers that shift a character's effective level points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Situation {
    #[serde(rename = "PC_ADVANTAGE", default)]
    pub pc_advantage: bool,
    #[serde(rename = "MONSTER_ADVANTAGE", default)]
    pub monster_advantage: bool,
    #[serde(rename = "MONSTER_DISADVANTAGE", default)]
    pub monster_disadvantage: bool,
}

impl Situation {
    /// Advantage on attacks counts only while monsters lack advantage; monster
    /// disadvantage always counts. The two bonuses stack.
    #[must_use]
    pub const fn bonus_points(self) -> u32 {
        let mut bonus = 0;
        if self.pc_advantage && !self.monster_advantage {
            bonus += PC_ADVANTAGE_BONUS;
        }
        if self.monster_disadvantage {
            bonus += MONSTER_DISADVANTAGE_BONUS;
        }
        bonus
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LevelBuckets {
    pub primary: u32,
    pub aux: u32,
    pub junk: u32,
}

impl LevelBuckets {
    #[must_use]
    pub const fn total(self) -> u32 {
        self.primary + self.aux + self.junk
    }
}

/// Split class levels into primary, auxiliary and junk buckets.
///
/// # Errors
///
/// Returns `UnknownClass` for a class missing from the category table,
/// `NoClassLevels` when `levels` is empty and `Overflow` when the level
/// counts do not fit in a `u32`.
pub fn split_levels(name: &str, levels: &ClassLevels, tables: &Tables) -> Result<LevelBuckets> {
    let Some((primary_class, primary)) = levels.primary() else {
        return Err(BalanceError::NoClassLevels(name.to_string()));
    };
    let primary_category = tables.class_category(primary_class)?;
    if levels.total().is_none() {
        return Err(BalanceError::Overflow {
            what: "character level",
        });
    }

    let (mut caster, mut martial, mut half) = (0, 0, 0);
    for (class, count) in levels.iter() {
        match tables.class_category(class)? {
            ClassCategory::Caster => caster += count,
            ClassCategory::Martial => martial += count,
            ClassCategory::HalfCaster => half += count,
        }
    }

    let buckets = match primary_category {
        ClassCategory::Caster => LevelBuckets {
            primary,
            aux: half,
            junk: caster - primary + martial,
        },
        ClassCategory::Martial => LevelBuckets {
            primary,
            aux: martial - primary + half,
            junk: caster,
        },
        ClassCategory::HalfCaster => LevelBuckets {
            primary,
            aux: caster + martial + half - primary,
            junk: 0,
        },
    };
    Ok(buckets)
}

/// Raw character record as it appears in a party file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub name: String,
    pub levels: ClassLevels,
    #[serde(default)]
    pub items: BTreeMap<String, u32>,
    #[serde(default)]
    pub advantages: Situation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCharacter {
    pub name: String,
    pub primary_levels: u32,
    pub aux_levels: u32,
    pub junk_levels: u32,
    item_count: u32,
    situation: Situation,
}

impl PlayerCharacter {
    /// Build a character against the embedded class table.
    ///
    /// # Errors
    ///
    /// See [`PlayerCharacter::with_tables`].
    pub fn new(
        name: &str,
        levels: &ClassLevels,
        items: &BTreeMap<String, u32>,
        situation: Situation,
    ) -> Result<Self> {
        Self::with_tables(Tables::global(), name, levels, items, situation)
    }

    /// # Errors
    ///
    /// Returns `UnknownClass` or `NoClassLevels` when the levels cannot be
    /// split, and `Overflow` when the level or item counts do not fit in a `u32`.
    pub fn with_tables(
        tables: &Tables,
        name: &str,
        levels: &ClassLevels,
        items: &BTreeMap<String, u32>,
        situation: Situation,
    ) -> Result<Self> {
        let buckets = split_levels(name, levels, tables)?;
        let item_count = items
            .values()
            .try_fold(0_u32, |total, count| total.checked_add(*count))
            .ok_or(BalanceError::Overflow { what: "item count" })?;
        Ok(Self {
            name: name.to_string(),
            primary_levels: buckets.primary,
            aux_levels: buckets.aux,
            junk_levels: buckets.junk,
            item_count,
            situation,
        })
    }

    /// # Errors
    ///
    /// Same as [`PlayerCharacter::new`].
    pub fn from_record(record: &CharacterRecord) -> Result<Self> {
        Self::from_record_with(Tables::global(), record)
    }

    /// # Errors
    ///
    /// Same as [`PlayerCharacter::with_tables`].
    pub fn from_record_with(tables: &Tables, record: &CharacterRecord) -> Result<Self> {
        Self::with_tables(
            tables,
            &record.name,
            &record.levels,
            &record.items,
            record.advantages,
        )
    }

    #[must_use]
    pub const fn level(&self) -> u32 {
        self.primary_levels + self.aux_levels + self.junk_levels
    }

    #[must_use]
    pub const fn situation(&self) -> Situation {
        self.situation
    }

    /// # Errors
    ///
    /// Returns `MissingKey` when the primary level count is not tabulated.
    pub fn primary_level_points(&self, tables: &Tables) -> Result<u32> {
        tables.primary_level_points(self.primary_levels)
    }

    /// # Errors
    ///
    /// Returns `MissingKey` when the auxiliary level count is not tabulated.
    pub fn aux_level_points(&self, tables: &Tables) -> Result<u32> {
        tables.aux_level_points(self.aux_levels)
    }

    /// Junk levels are worth one point each.
    #[must_use]
    pub const fn junk_level_points(&self) -> u32 {
        self.junk_levels
    }

    /// # Errors
    ///
    /// Returns `MissingKey` when a bucket is not tabulated.
    pub fn class_level_points(&self, tables: &Tables) -> Result<u32> {
        checked_points(&[
            self.primary_level_points(tables)?,
            self.aux_level_points(tables)?,
            self.junk_level_points(),
        ])
    }

    /// Bonus from the total item count across all slots.
    ///
    /// # Errors
    ///
    /// Returns `MissingKey` when the item count is not tabulated.
    pub fn item_bonuses(&self, tables: &Tables) -> Result<u32> {
        tables.item_bonus_points(self.item_count)
    }

    #[must_use]
    pub const fn other_bonuses(&self) -> u32 {
        self.situation.bonus_points()
    }

    /// # Errors
    ///
    /// Returns `MissingKey` when any component is not tabulated.
    pub fn total_level_points(&self, tables: &Tables) -> Result<u32> {
        checked_points(&[
            self.class_level_points(tables)?,
            self.item_bonuses(tables)?,
            self.other_bonuses(),
        ])
    }

    /// # Errors
    ///
    /// Returns `MissingKey` when the total level points fall outside the power table.
    pub fn power(&self, tables: &Tables) -> Result<u32> {
        tables.power_for_level_points(self.total_level_points(tables)?)
    }
}

fn checked_points(parts: &[u32]) -> Result<u32> {
    parts
        .iter()
        .try_fold(0_u32, |total, part| total.checked_add(*part))
        .ok_or(BalanceError::Overflow {
            what: "level points",
        })
}
