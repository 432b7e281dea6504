//! Encounter difficulty rating.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::TABLE_DIFFICULTY;
use crate::error::{BalanceError, Result};
use crate::monsters::MonsterParty;
use crate::numbers::{interp, usize_to_f64};
use crate::party::Party;
use crate::tables::{DifficultyRow, Tables};

const BELOW_LOW_BUDGET: &str = "trivial";

/// How an encounter's difficulty is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DifficultyMethod {
    /// Ratio of monster power to party power against the difficulty table.
    #[default]
    #[serde(rename = "cr2")]
    PowerRatio,
    /// Total monster XP against the party's XP budget bands.
    #[serde(rename = "2024")]
    XpThreshold,
}

impl DifficultyMethod {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::PowerRatio => "cr2",
            Self::XpThreshold => "2024",
        }
    }
}

impl FromStr for DifficultyMethod {
    type Err = BalanceError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim() {
            "cr2" => Ok(Self::PowerRatio),
            "2024" => Ok(Self::XpThreshold),
            other => Err(BalanceError::UnknownMethod(other.to_string())),
        }
    }
}

impl fmt::Display for DifficultyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Where the power-ratio cost comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CostMode {
    /// Cost of the floored difficulty row.
    Floored,
    /// Cost interpolated along the whole difficulty table.
    #[default]
    Interpolated,
}

/// Category, description and (when the method yields one) numeric cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub category: String,
    pub description: String,
    pub cost: Option<f64>,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cost {
            Some(cost) => write!(f, "{} ({cost:.2}): {}", self.category, self.description),
            None => write!(f, "{}: {}", self.category, self.description),
        }
    }
}

/// A party facing a monster roster, scored against one table registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Encounter<'a> {
    party: &'a Party,
    monsters: MonsterParty,
    method: DifficultyMethod,
    tables: &'a Tables,
}

impl<'a> Encounter<'a> {
    /// Encounter scored against the embedded tables.
    #[must_use]
    pub fn new(party: &'a Party, monsters: MonsterParty, method: DifficultyMethod) -> Self {
        Self {
            party,
            monsters,
            method,
            tables: Tables::global(),
        }
    }

    #[must_use]
    pub const fn with_tables(mut self, tables: &'a Tables) -> Self {
        self.tables = tables;
        self
    }

    /// # Errors
    ///
    /// Returns `UnknownMethod` when `method` is neither `"cr2"` nor `"2024"`.
    pub fn with_method_name(party: &'a Party, monsters: MonsterParty, method: &str) -> Result<Self> {
        Ok(Self::new(party, monsters, method.parse()?))
    }

    pub const fn set_method(&mut self, method: DifficultyMethod) {
        self.method = method;
    }

    #[must_use]
    pub const fn method(&self) -> DifficultyMethod {
        self.method
    }

    #[must_use]
    pub const fn party(&self) -> &'a Party {
        self.party
    }

    #[must_use]
    pub const fn monsters(&self) -> &MonsterParty {
        &self.monsters
    }

    #[must_use]
    pub const fn tables(&self) -> &'a Tables {
        self.tables
    }

    /// Monster power at the party's tier divided by party power.
    ///
    /// # Errors
    ///
    /// Returns `EmptyParty`, `LevelOutOfRange` or a lookup miss.
    pub fn power_ratio(&self) -> Result<f64> {
        let tier = self.party.tier()?;
        let party_power = self.party.power(self.tables)?;
        if party_power == 0 {
            return Err(BalanceError::EmptyParty);
        }
        let monster_power = self.monsters.power(self.tables, tier)?;
        Ok(f64::from(monster_power) / f64::from(party_power))
    }

    /// Rate with the encounter's own method and interpolated cost.
    ///
    /// # Errors
    ///
    /// See [`Encounter::difficulty_with`].
    pub fn difficulty(&self) -> Result<Rating> {
        self.difficulty_with(self.method, CostMode::Interpolated)
    }

    /// # Errors
    ///
    /// Returns `EmptyParty`, `LevelOutOfRange`, `EmptyTable` or a lookup miss.
    pub fn difficulty_with(&self, method: DifficultyMethod, cost_mode: CostMode) -> Result<Rating> {
        match method {
            DifficultyMethod::PowerRatio => self.rate_power_ratio(cost_mode),
            DifficultyMethod::XpThreshold => self.rate_xp_threshold(),
        }
    }

    /// The category always comes from the floored row; with interpolation the
    /// cost can sit between that row and the next.
    fn rate_power_ratio(&self, cost_mode: CostMode) -> Result<Rating> {
        let ratio = self.power_ratio()?;
        let table = self.tables.difficulty_table();
        let row = table.floor(ratio).ok_or(BalanceError::EmptyTable {
            table: TABLE_DIFFICULTY,
        })?;
        let cost = match cost_mode {
            CostMode::Floored => row.cost,
            CostMode::Interpolated => interpolated_cost(table.rows(), ratio),
        };
        log::debug!(
            "power ratio {ratio:.3} -> {} (row cost {}, charged {cost:.3})",
            row.category,
            row.cost
        );
        Ok(Rating {
            category: row.category.clone(),
            description: row.description.clone(),
            cost: Some(cost),
        })
    }

    fn rate_xp_threshold(&self) -> Result<Rating> {
        let tables = self.tables;
        let xp = f64::from(self.monsters.xp(tables)?);
        let level = self.party.level()?;
        let budget = tables.xp_budget(level)?;
        let members = usize_to_f64(self.party.count());

        let bands = [
            ("low", budget.low),
            ("moderate", budget.moderate),
            ("high", budget.high),
        ];
        let category = bands
            .iter()
            .rev()
            .find(|(_, per_character)| xp >= f64::from(*per_character) * members)
            .map_or(BELOW_LOW_BUDGET, |(label, _)| *label);
        log::debug!("monster xp {xp} at party level {level:.2} -> {category}");

        Ok(Rating {
            category: category.to_string(),
            description: tables.xp_budget_description(category)?.to_string(),
            cost: None,
        })
    }
}

fn interpolated_cost(rows: &[DifficultyRow], ratio: f64) -> f64 {
    let multipliers: Vec<f64> = rows.iter().map(|row| row.multiplier).collect();
    let costs: Vec<f64> = rows.iter().map(|row| row.cost).collect();
    interp(ratio, &multipliers, &costs)
}
