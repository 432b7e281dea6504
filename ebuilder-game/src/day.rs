//! Adventuring day fatigue across a sequence of encounters.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::encounter::{CostMode, Encounter, Rating};
use crate::error::{BalanceError, Result};
use crate::numbers::usize_to_f64;
use crate::party::Party;
use crate::tables::Tables;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rarity {
    #[serde(rename = "UNCOMMON")]
    Uncommon,
    #[serde(rename = "RARE")]
    Rare,
    #[serde(rename = "VERYRARE")]
    VeryRare,
    #[serde(rename = "LEGENDARY")]
    Legendary,
}

impl Rarity {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Uncommon => "UNCOMMON",
            Self::Rare => "RARE",
            Self::VeryRare => "VERYRARE",
            Self::Legendary => "LEGENDARY",
        }
    }
}

impl FromStr for Rarity {
    type Err = BalanceError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_uppercase().replace([' ', '_', '-'], "").as_str() {
            "UNCOMMON" => Ok(Self::Uncommon),
            "RARE" => Ok(Self::Rare),
            "VERYRARE" => Ok(Self::VeryRare),
            "LEGENDARY" => Ok(Self::Legendary),
            _ => Err(BalanceError::UnknownRarity(raw.to_string())),
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Charged items recover daily; consumables are gone once used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsumableKind {
    Charge,
    Consumable,
}

impl ConsumableKind {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Charge => "CHARGE",
            Self::Consumable => "CONSUMABLE",
        }
    }
}

impl FromStr for ConsumableKind {
    type Err = BalanceError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CHARGE" => Ok(Self::Charge),
            "CONSUMABLE" => Ok(Self::Consumable),
            _ => Err(BalanceError::UnknownConsumableKind(raw.to_string())),
        }
    }
}

impl fmt::Display for ConsumableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdventuringDay<'a> {
    party: &'a Party,
    encounters: Vec<Encounter<'a>>,
    consumables: f64,
    cost_mode: CostMode,
    tables: &'a Tables,
}

impl<'a> AdventuringDay<'a> {
    /// Empty day charging interpolated costs against the embedded tables.
    #[must_use]
    pub fn new(party: &'a Party) -> Self {
        Self {
            party,
            encounters: Vec::new(),
            consumables: 0.0,
            cost_mode: CostMode::default(),
            tables: Tables::global(),
        }
    }

    /// Consumable offsets and fatigue come from `tables`; each encounter
    /// keeps its own registry.
    #[must_use]
    pub const fn with_tables(mut self, tables: &'a Tables) -> Self {
        self.tables = tables;
        self
    }

    #[must_use]
    pub const fn with_cost_mode(mut self, cost_mode: CostMode) -> Self {
        self.cost_mode = cost_mode;
        self
    }

    #[must_use]
    pub const fn cost_mode(&self) -> CostMode {
        self.cost_mode
    }

    pub fn add(&mut self, encounter: Encounter<'a>) {
        self.encounters.push(encounter);
    }

    #[must_use]
    pub fn encounters(&self) -> &[Encounter<'a>] {
        &self.encounters
    }

    /// Accumulated consumable offset for the whole party.
    #[must_use]
    pub const fn consumables(&self) -> f64 {
        self.consumables
    }

    /// Record one consumable spent today. Offsets are per tier and add up
    /// across calls.
    ///
    /// # Errors
    ///
    /// Returns `EmptyParty`, `LevelOutOfRange` or a consumables table miss.
    pub fn add_consumable(&mut self, rarity: Rarity, kind: ConsumableKind) -> Result<()> {
        let tier = self.party.tier()?;
        let offset = self.tables.consumable_offset(tier, rarity, kind)?;
        log::debug!("consumable {rarity}_{kind} at {tier}: {offset}");
        self.consumables += offset;
        Ok(())
    }

    /// Sum of every encounter's cost, each rated with its own method and the
    /// day's cost mode.
    ///
    /// # Errors
    ///
    /// Returns `UncostedEncounter` when a method yields no numeric cost, or
    /// any error raised while rating an encounter.
    pub fn total_cost(&self) -> Result<f64> {
        let mut total = 0.0;
        for (index, encounter) in self.encounters.iter().enumerate() {
            let cost = encounter
                .difficulty_with(encounter.method(), self.cost_mode)?
                .cost
                .ok_or(BalanceError::UncostedEncounter { index })?;
            total += cost;
        }
        Ok(total)
    }

    /// Fatigue for the day; the reported cost is the raw encounter total
    /// before consumables are applied.
    ///
    /// # Errors
    ///
    /// See [`AdventuringDay::total_cost`]; also `EmptyParty` and `EmptyTable`.
    pub fn fatigue(&self) -> Result<Rating> {
        if self.party.count() == 0 {
            return Err(BalanceError::EmptyParty);
        }
        let total_cost = self.total_cost()?;
        let consumable_savings = self.consumables / usize_to_f64(self.party.count());
        let row = self.tables.fatigue(total_cost + consumable_savings)?;
        log::debug!(
            "day cost {total_cost:.3} with savings {consumable_savings:.3} -> {}",
            row.category
        );
        Ok(Rating {
            category: row.category.clone(),
            description: row.description.clone(),
            cost: Some(total_cost),
        })
    }
}
