//! Centralized balance constants for encounter scoring and sorlock search.
//!
//! The reference tables live in `data/*.json`; the values here are the fixed
//! rules that sit around those tables and only change with the code.

// Situational bonuses ------------------------------------------------------
pub(crate) const PC_ADVANTAGE_BONUS: u32 = 2;
pub(crate) const MONSTER_DISADVANTAGE_BONUS: u32 = 3;

// Challenge rating adjustments (whole CR steps) ----------------------------
pub(crate) const BYPASS_RESISTANCE_CR_OFFSET: i32 = -2;
pub(crate) const OHKO_CR_OFFSET: i32 = 4;

/// Challenge ratings are stored in eighths so 1/8, 1/4 and 1/2 stay exact.
pub(crate) const CR_DENOMINATOR: i32 = 8;

// Party level bands ----------------------------------------------------------
pub(crate) const MIN_PARTY_LEVEL: f64 = 1.0;
pub(crate) const MAX_PARTY_LEVEL: f64 = 20.0;
pub(crate) const TIER_TWO_MIN_LEVEL: f64 = 5.0;
pub(crate) const TIER_THREE_MIN_LEVEL: f64 = 11.0;
pub(crate) const TIER_FOUR_MIN_LEVEL: f64 = 17.0;

// Sorlock search ---------------------------------------------------------------
/// Hard ceiling on purchase steps along a single branch of the conversion search.
pub(crate) const MAX_SEARCH_DEPTH: usize = 64;

// Reference data keys -----------------------------------------------------------
pub(crate) const TABLE_PRIMARY_POINTS: &str = "primary_level_points";
pub(crate) const TABLE_AUX_POINTS: &str = "aux_level_points";
pub(crate) const TABLE_ITEM_BONUS: &str = "item_bonus_points";
pub(crate) const TABLE_POWER: &str = "power_by_level_points";
pub(crate) const TABLE_MONSTER_POWER: &str = "monster_power";
pub(crate) const TABLE_XP: &str = "xp_by_cr";
pub(crate) const TABLE_DIFFICULTY: &str = "difficulty";
pub(crate) const TABLE_XP_BUDGET: &str = "xp_budget";
pub(crate) const TABLE_XP_BUDGET_DESCRIPTIONS: &str = "xp_budget_descriptions";
pub(crate) const TABLE_FATIGUE: &str = "fatigue";
pub(crate) const TABLE_CONSUMABLES: &str = "consumables";
pub(crate) const TABLE_PACT_MAGIC: &str = "pact_magic";
