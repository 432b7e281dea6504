//! Error type shared by every scoring and search operation.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BalanceError>;

/// Failures raised while scoring parties, encounters and sorlock conversions.
///
/// Every variant is fatal for the call that produced it: nothing here is
/// retried or defaulted.
#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("unknown class name: {0}")]
    UnknownClass(String),
    #[error("character {0} has no class levels")]
    NoClassLevels(String),
    #[error("unexpected difficulty method: {0}")]
    UnknownMethod(String),
    #[error("party level {0:.2} is outside the supported range 1-20")]
    LevelOutOfRange(f64),
    #[error("party has no characters")]
    EmptyParty,
    #[error("no entry for key {key} in {table}")]
    MissingKey { table: &'static str, key: String },
    #[error("invalid challenge rating: {0}")]
    InvalidChallengeRating(String),
    #[error("monster {name} has a quantity of zero")]
    ZeroQuantity { name: String },
    #[error("unknown rarity: {0}")]
    UnknownRarity(String),
    #[error("unknown consumable category: {0}")]
    UnknownConsumableKind(String),
    #[error("encounter {index} has no numeric cost and cannot count toward fatigue")]
    UncostedEncounter { index: usize },
    #[error("{table} is not sorted ascending by its threshold column")]
    UnsortedTable { table: &'static str },
    #[error("{table} has no rows")]
    EmptyTable { table: &'static str },
    #[error("no sorcerer/warlock split for character level {0}")]
    UnsupportedLevel(u32),
    #[error("more pact slots than allowable ({requested} > {max})")]
    PactSlotsExceeded { requested: u32, max: u32 },
    #[error("more sorcery points than allowable ({requested} > {max})")]
    SorceryPointsExceeded { requested: u32, max: u32 },
    #[error("{what} total does not fit in 32 bits")]
    Overflow { what: &'static str },
    #[error("conversion search exceeded depth {0}")]
    SearchTooDeep(usize),
    #[error("invalid JSON: {0}")]
    Data(#[from] serde_json::Error),
}

impl BalanceError {
    pub(crate) fn missing(table: &'static str, key: impl ToString) -> Self {
        Self::MissingKey {
            table,
            key: key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let err = BalanceError::missing("power_by_level_points", 99);
        assert_eq!(err.to_string(), "no entry for key 99 in power_by_level_points");

        let err = BalanceError::PactSlotsExceeded {
            requested: 3,
            max: 2,
        };
        assert_eq!(err.to_string(), "more pact slots than allowable (3 > 2)");

        let err = BalanceError::Overflow { what: "monster xp" };
        assert_eq!(err.to_string(), "monster xp total does not fit in 32 bits");
    }

    #[test]
    fn json_errors_convert() {
        let parse = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: BalanceError = parse.into();
        assert!(matches!(err, BalanceError::Data(_)));
    }
}
