//! Monster power and experience.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::challenge::ChallengeRating;
use crate::constants::{BYPASS_RESISTANCE_CR_OFFSET, OHKO_CR_OFFSET};
use crate::error::{BalanceError, Result};
use crate::party::Tier;
use crate::tables::Tables;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    pub name: String,
    pub cr: ChallengeRating,
    /// Can ignore the party's resistances.
    #[serde(default)]
    pub bypass_resistance: bool,
    /// Can take a character out in a single exchange.
    #[serde(default)]
    pub ohko: bool,
}

impl Monster {
    #[must_use]
    pub fn new(name: &str, cr: ChallengeRating) -> Self {
        Self {
            name: name.to_string(),
            cr,
            bypass_resistance: false,
            ohko: false,
        }
    }

    #[must_use]
    pub const fn with_bypass_resistance(mut self, bypass: bool) -> Self {
        self.bypass_resistance = bypass;
        self
    }

    #[must_use]
    pub const fn with_ohko(mut self, ohko: bool) -> Self {
        self.ohko = ohko;
        self
    }

    /// CR used for power lookups: two lower when it bypasses resistances,
    /// four higher when it can one-shot a character.
    ///
    /// # Errors
    ///
    /// Returns `InvalidChallengeRating` when the shift overflows.
    pub fn effective_cr(&self) -> Result<ChallengeRating> {
        let mut offset = 0;
        if self.bypass_resistance {
            offset += BYPASS_RESISTANCE_CR_OFFSET;
        }
        if self.ohko {
            offset += OHKO_CR_OFFSET;
        }
        self.cr.offset(offset)
    }

    /// # Errors
    ///
    /// Returns `MissingKey` when the effective CR is outside the power table.
    pub fn power(&self, tables: &Tables, tier: Tier) -> Result<u32> {
        tables.monster_power(tier, self.effective_cr()?)
    }

    /// XP always uses the raw CR.
    ///
    /// # Errors
    ///
    /// Returns `MissingKey` when the CR is outside the XP table.
    pub fn xp(&self, tables: &Tables) -> Result<u32> {
        tables.xp_for_cr(self.cr)
    }
}

impl fmt::Display for Monster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (CR {})", self.name, self.cr)
    }
}

/// Roster file entry: a monster plus how many of it appear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterRecord {
    #[serde(flatten)]
    pub monster: Monster,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Roster file layout: `{"monsters": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RosterRecord {
    #[serde(default)]
    pub monsters: Vec<MonsterRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MonsterParty {
    monsters: Vec<(Monster, u32)>,
}

impl MonsterParty {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            monsters: Vec::new(),
        }
    }

    /// # Errors
    ///
    /// Returns `Data` for malformed JSON and `ZeroQuantity` for empty entries.
    pub fn from_json(json: &str) -> Result<Self> {
        let record: RosterRecord = serde_json::from_str(json)?;
        let mut party = Self::new();
        for entry in record.monsters {
            party.add(entry.monster, entry.quantity)?;
        }
        Ok(party)
    }

    /// One anonymous monster per CR string, named after its rating.
    ///
    /// # Errors
    ///
    /// Returns `InvalidChallengeRating` for an unparseable entry.
    pub fn from_challenge_ratings<S: AsRef<str>>(crs: &[S]) -> Result<Self> {
        let mut party = Self::new();
        for raw in crs {
            let cr: ChallengeRating = raw.as_ref().parse()?;
            party.add(Monster::new(&format!("CR {cr}"), cr), 1)?;
        }
        Ok(party)
    }

    /// # Errors
    ///
    /// Returns `ZeroQuantity` when `quantity` is zero.
    pub fn add(&mut self, monster: Monster, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(BalanceError::ZeroQuantity { name: monster.name });
        }
        self.monsters.push((monster, quantity));
        Ok(())
    }

    #[must_use]
    pub fn monsters(&self) -> &[(Monster, u32)] {
        &self.monsters
    }

    /// # Errors
    ///
    /// Returns the first lookup miss among the monsters, or `Overflow` when
    /// the total does not fit in a `u32`.
    pub fn power(&self, tables: &Tables, tier: Tier) -> Result<u32> {
        self.total("monster power", |monster| monster.power(tables, tier))
    }

    /// # Errors
    ///
    /// Returns the first lookup miss among the monsters, or `Overflow` when
    /// the total does not fit in a `u32`.
    pub fn xp(&self, tables: &Tables) -> Result<u32> {
        self.total("monster xp", |monster| monster.xp(tables))
    }

    fn total(&self, what: &'static str, value: impl Fn(&Monster) -> Result<u32>) -> Result<u32> {
        self.monsters.iter().try_fold(0_u32, |total, (monster, quantity)| {
            value(monster)?
                .checked_mul(*quantity)
                .and_then(|subtotal| total.checked_add(subtotal))
                .ok_or(BalanceError::Overflow { what })
        })
    }
}

impl fmt::Display for MonsterParty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (monster, quantity) in &self.monsters {
            writeln!(f, "{quantity} x {monster}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whole(cr: i32) -> ChallengeRating {
        ChallengeRating::from_whole(cr).unwrap()
    }

    #[test]
    fn traits_shift_effective_cr() {
        let tables = Tables::global();
        let dragon = Monster::new("YOUNG_GREEN_DRAGON", whole(8))
            .with_bypass_resistance(true)
            .with_ohko(true);
        assert_eq!(dragon.effective_cr().unwrap(), whole(10));
        assert_eq!(dragon.power(tables, Tier::Three).unwrap(), 75);

        let drake = Monster::new("GUARD_DRAKE", whole(2));
        assert_eq!(drake.power(tables, Tier::Three).unwrap(), 19);

        let mut party = MonsterParty::new();
        party.add(dragon, 1).unwrap();
        party.add(drake, 2).unwrap();
        assert_eq!(party.power(tables, Tier::Three).unwrap(), 75 + 19 * 2);
    }

    #[test]
    fn xp_uses_raw_cr() {
        let tables = Tables::global();
        let dragon = Monster::new("YOUNG_GREEN_DRAGON", whole(8)).with_ohko(true);
        assert_eq!(dragon.xp(tables).unwrap(), 3900);
        let mut party = MonsterParty::new();
        party.add(dragon, 2).unwrap();
        assert_eq!(party.xp(tables).unwrap(), 7800);
    }

    #[test]
    fn out_of_table_effective_cr_is_an_error() {
        let tables = Tables::global();
        let imp = Monster::new("IMP", whole(1)).with_bypass_resistance(true);
        assert!(matches!(
            imp.power(tables, Tier::One),
            Err(BalanceError::MissingKey { table: "monster_power", .. })
        ));
        let cat = Monster::new("CAT", ChallengeRating::from_eighths(2)).with_ohko(true);
        assert!(cat.power(tables, Tier::One).is_err());
        assert_eq!(cat.xp(tables).unwrap(), 50);
    }

    #[test]
    fn roster_json_accepts_numeric_and_string_crs() {
        let tables = Tables::global();
        let json = r#"{
            "monsters": [
                {"name": "YOUNG_GREEN_DRAGON", "cr": 8, "bypass_resistance": true, "ohko": true},
                {"name": "GUARD_DRAKE", "cr": "2", "quantity": 2},
                {"name": "GOBLIN", "cr": 0.25, "quantity": 4}
            ]
        }"#;
        let party = MonsterParty::from_json(json).unwrap();
        assert_eq!(party.monsters().len(), 3);
        assert_eq!(party.power(tables, Tier::Three).unwrap(), 75 + 19 * 2 + 3 * 4);
        assert_eq!(party.xp(tables).unwrap(), 3900 + 450 * 2 + 50 * 4);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let json = r#"{"monsters": [{"name": "GHOST", "cr": 4, "quantity": 0}]}"#;
        assert!(matches!(
            MonsterParty::from_json(json),
            Err(BalanceError::ZeroQuantity { .. })
        ));
    }

    #[test]
    fn anonymous_roster_from_crs() {
        let tables = Tables::global();
        let party = MonsterParty::from_challenge_ratings(&["15", "1/4"]).unwrap();
        assert_eq!(party.monsters()[1].0.name, "CR 1/4");
        assert_eq!(party.xp(tables).unwrap(), 13000 + 50);
        assert!(MonsterParty::from_challenge_ratings(&["lich"]).is_err());
    }

    #[test]
    fn totals_that_overflow_are_errors() {
        let tables = Tables::global();
        let json = r#"{"monsters":[{"name":"T","cr":30,"quantity":40000}]}"#;
        let party = MonsterParty::from_json(json).unwrap();
        assert!(matches!(
            party.xp(tables),
            Err(BalanceError::Overflow { what: "monster xp" })
        ));

        let mut horde = MonsterParty::new();
        horde.add(Monster::new("TARRASQUE", whole(30)), u32::MAX).unwrap();
        horde.add(Monster::new("GOBLIN", whole(1)), 1).unwrap();
        assert!(matches!(
            horde.power(tables, Tier::Four),
            Err(BalanceError::Overflow { what: "monster power" })
        ));
    }

    #[test]
    fn extreme_trait_offsets_are_errors() {
        let giant = Monster::new("GIANT", ChallengeRating::from_eighths(i32::MAX)).with_ohko(true);
        assert!(matches!(
            giant.effective_cr(),
            Err(BalanceError::InvalidChallengeRating(_))
        ));
        assert!(giant.power(Tables::global(), Tier::One).is_err());
    }
}
