//! Warlock/sorcerer ("sorlock") resource conversion.
//!
//! A sorlock can burn a pact slot for sorcery points, or spend sorcery points
//! on a sorcerer spell slot. [`spend_pact_slots`] explores every sequence of
//! those purchases until no pact slots remain, and [`ConversionTable`] boils
//! the leaves down to the outcomes that are not strictly worse than another.
use serde::Serialize;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use crate::constants::MAX_SEARCH_DEPTH;
use crate::error::{BalanceError, Result};
use crate::tables::Tables;

/// Levels of purchased sorcerer spell slots, kept sorted.
pub type SpellBag = SmallVec<[u32; 8]>;

/// One node of the conversion search. Purchases return new states.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SorlockState {
    pub pact_slots: u32,
    pub pact_level: u32,
    pub spells: SpellBag,
    pub sorcery_points: u32,
    pub sorcery_points_max: u32,
}

impl SorlockState {
    #[must_use]
    pub fn new(pact_slots: u32, pact_level: u32, sorcery_points: u32, sorcery_points_max: u32) -> Self {
        Self {
            pact_slots,
            pact_level,
            spells: SpellBag::new(),
            sorcery_points,
            sorcery_points_max,
        }
    }

    /// Starting state for a character level, checked against the legal pool sizes.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedLevel` for levels without a sorcerer/warlock split,
    /// and `PactSlotsExceeded` / `SorceryPointsExceeded` when the request is
    /// larger than the character can hold.
    pub fn from_level(
        tables: &Tables,
        level: u32,
        pact_slots: u32,
        sorcery_points: u32,
    ) -> Result<Self> {
        let split = tables.class_split(level)?;
        let pact = tables.pact_magic(split.warlock)?;
        // One sorcery point per sorcerer level.
        let sorcery_points_max = split.sorcerer;
        if pact_slots > pact.num_slots {
            return Err(BalanceError::PactSlotsExceeded {
                requested: pact_slots,
                max: pact.num_slots,
            });
        }
        if sorcery_points > sorcery_points_max {
            return Err(BalanceError::SorceryPointsExceeded {
                requested: sorcery_points,
                max: sorcery_points_max,
            });
        }
        Ok(Self::new(
            pact_slots,
            pact.slot_level,
            sorcery_points,
            sorcery_points_max,
        ))
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.pact_slots == 0
    }

    /// Burn one pact slot for sorcery points; points above the cap are lost.
    #[must_use]
    pub fn buy_sorcery_points(&self) -> Option<Self> {
        if self.is_terminal() {
            return None;
        }
        let mut next = self.clone();
        next.pact_slots -= 1;
        next.sorcery_points = (self.sorcery_points + self.pact_level).min(self.sorcery_points_max);
        Some(next)
    }

    /// One successor per sorcery-point amount that buys a spell slot.
    #[must_use]
    pub fn buy_spell_slots(&self, tables: &Tables) -> Vec<Self> {
        (0..=self.sorcery_points)
            .filter_map(|spent| {
                let level = tables.spell_slot_for_sorcery_points(spent)?;
                let mut next = self.clone();
                next.sorcery_points -= spent;
                let at = next.spells.partition_point(|&held| held <= level);
                next.spells.insert(at, level);
                Some(next)
            })
            .collect()
    }

    /// Every state reachable by a single purchase. Terminal states have none.
    #[must_use]
    pub fn successors(&self, tables: &Tables) -> Vec<Self> {
        if self.is_terminal() {
            return Vec::new();
        }
        let mut next: Vec<Self> = self.buy_sorcery_points().into_iter().collect();
        next.extend(self.buy_spell_slots(tables));
        next
    }

    /// Spell slot counts for levels `1..=max_level`, followed by remaining sorcery points.
    #[must_use]
    pub fn signature(&self, max_level: u32) -> Vec<u32> {
        let mut row: Vec<u32> = (1..=max_level)
            .map(|level| {
                let count = self.spells.iter().filter(|&&held| held == level).count();
                u32::try_from(count).unwrap_or(u32::MAX)
            })
            .collect();
        row.push(self.sorcery_points);
        row
    }
}

/// Every terminal state reachable from `start`, in depth-first order.
///
/// # Errors
///
/// Returns `SearchTooDeep` if a branch takes more purchases than the search allows.
pub fn spend_pact_slots(start: &SorlockState, tables: &Tables) -> Result<Vec<SorlockState>> {
    let mut leaves = Vec::new();
    let mut pending = vec![(start.clone(), 0_usize)];
    while let Some((state, depth)) = pending.pop() {
        if state.is_terminal() {
            leaves.push(state);
            continue;
        }
        if depth >= MAX_SEARCH_DEPTH {
            return Err(BalanceError::SearchTooDeep(MAX_SEARCH_DEPTH));
        }
        let next = state.successors(tables);
        log::trace!(
            "expanding {} pact / {} sp at depth {depth}: {} successors",
            state.pact_slots,
            state.sorcery_points,
            next.len()
        );
        pending.extend(next.into_iter().rev().map(|succ| (succ, depth + 1)));
    }
    log::debug!("conversion search produced {} leaves", leaves.len());
    Ok(leaves)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Column {
    SpellLevel(u32),
    SorceryPoints,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpellLevel(level) => write!(f, "L{level}"),
            Self::SorceryPoints => f.write_str("SP"),
        }
    }
}

/// Non-dominated purchase outcomes, best high-level spells first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionTable {
    columns: Vec<Column>,
    rows: Vec<Vec<u32>>,
}

impl ConversionTable {
    #[must_use]
    pub fn from_states(states: &[SorlockState], max_spell_level: u32) -> Self {
        let mut columns: Vec<Column> = (1..=max_spell_level).map(Column::SpellLevel).collect();
        columns.push(Column::SorceryPoints);

        let mut seen = HashSet::new();
        let mut rows: Vec<Vec<u32>> = states
            .iter()
            .map(|state| state.signature(max_spell_level))
            .filter(|row| seen.insert(row.clone()))
            .collect();

        let keep: Vec<usize> = (0..columns.len())
            .filter(|&col| rows.iter().any(|row| row[col] != 0))
            .collect();
        columns = keep.iter().map(|&col| columns[col]).collect();
        for row in &mut rows {
            *row = keep.iter().map(|&col| row[col]).collect();
        }

        let mut rows = prune_dominated(rows);
        rows.sort_by(|a, b| compare_rows(&columns, a, b));
        Self { columns, rows }
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<u32>] {
        &self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for ConversionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: Vec<String> = self.columns.iter().map(ToString::to_string).collect();
        writeln!(f, "{}", header.join("\t"))?;
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            writeln!(f, "{}", cells.join("\t"))?;
        }
        Ok(())
    }
}

/// `a` dominates `b` when it is at least as good everywhere and not identical.
#[must_use]
pub fn dominates(a: &[u32], b: &[u32]) -> bool {
    a != b && a.iter().zip(b).all(|(x, y)| x >= y)
}

/// Keep only rows no other row dominates.
#[must_use]
pub fn prune_dominated(rows: Vec<Vec<u32>>) -> Vec<Vec<u32>> {
    let survivors: Vec<bool> = rows
        .iter()
        .map(|row| !rows.iter().any(|other| dominates(other, row)))
        .collect();
    rows.into_iter()
        .zip(survivors)
        .filter_map(|(row, keep)| keep.then_some(row))
        .collect()
}

/// More high-level spells first, walking down the levels; then fewer
/// leftover sorcery points.
fn compare_rows(columns: &[Column], a: &[u32], b: &[u32]) -> Ordering {
    let mut spell_cols: Vec<(usize, u32)> = columns
        .iter()
        .enumerate()
        .filter_map(|(idx, col)| match col {
            Column::SpellLevel(level) => Some((idx, *level)),
            Column::SorceryPoints => None,
        })
        .collect();
    spell_cols.sort_by(|x, y| y.1.cmp(&x.1));

    for (idx, _) in spell_cols {
        match b[idx].cmp(&a[idx]) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    columns
        .iter()
        .position(|col| *col == Column::SorceryPoints)
        .map_or(Ordering::Equal, |idx| a[idx].cmp(&b[idx]))
}

/// Conversion table for a character level using the embedded reference data.
///
/// # Errors
///
/// See [`SorlockState::from_level`] and [`spend_pact_slots`].
pub fn sorlock_table_level(level: u32, pact_slots: u32, sorcery_points: u32) -> Result<ConversionTable> {
    let tables = Tables::global();
    let start = SorlockState::from_level(tables, level, pact_slots, sorcery_points)?;
    let leaves = spend_pact_slots(&start, tables)?;
    Ok(ConversionTable::from_states(
        &leaves,
        tables.max_sorcerer_spell_level(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_level_enforces_pool_limits() {
        let tables = Tables::global();
        let state = SorlockState::from_level(tables, 8, 2, 3).unwrap();
        assert_eq!(state.pact_level, 3);
        assert_eq!(state.sorcery_points_max, 3);

        assert!(matches!(
            SorlockState::from_level(tables, 8, 3, 3),
            Err(BalanceError::PactSlotsExceeded { requested: 3, max: 2 })
        ));
        assert!(matches!(
            SorlockState::from_level(tables, 8, 2, 5),
            Err(BalanceError::SorceryPointsExceeded { requested: 5, max: 3 })
        ));
        assert!(matches!(
            SorlockState::from_level(tables, 6, 1, 0),
            Err(BalanceError::UnsupportedLevel(6))
        ));
    }

    #[test]
    fn sorcery_points_are_capped() {
        let state = SorlockState::new(2, 5, 4, 6);
        let next = state.buy_sorcery_points().unwrap();
        assert_eq!(next.pact_slots, 1);
        assert_eq!(next.sorcery_points, 6);
        assert_eq!(state.sorcery_points, 4, "purchases leave the source state alone");
        assert!(SorlockState::new(0, 5, 4, 6).buy_sorcery_points().is_none());
    }

    #[test]
    fn spell_purchases_skip_invalid_costs() {
        let tables = Tables::global();
        let state = SorlockState::new(1, 3, 5, 6);
        let bought = state.buy_spell_slots(tables);
        let outcomes: Vec<(u32, Vec<u32>)> = bought
            .iter()
            .map(|s| (s.sorcery_points, s.spells.to_vec()))
            .collect();
        assert_eq!(outcomes, vec![(3, vec![1]), (2, vec![2]), (0, vec![3])]);
        assert!(bought.iter().all(|s| s.pact_slots == 1));
    }

    #[test]
    fn spell_bag_stays_sorted() {
        let tables = Tables::global();
        let mut state = SorlockState::new(1, 3, 0, 15);
        state.spells = SpellBag::from_slice(&[1, 3]);
        state.sorcery_points = 3;
        let next = state.buy_spell_slots(tables);
        let bags: Vec<Vec<u32>> = next.iter().map(|s| s.spells.to_vec()).collect();
        assert_eq!(bags, vec![vec![1, 1, 3], vec![1, 2, 3]]);
    }

    #[test]
    fn search_returns_only_terminal_states() {
        let tables = Tables::global();
        let start = SorlockState::from_level(tables, 8, 2, 3).unwrap();
        let leaves = spend_pact_slots(&start, tables).unwrap();
        assert_eq!(leaves.len(), 9);
        assert!(leaves.iter().all(|s| s.pact_slots == 0));
    }

    #[test]
    fn terminal_start_is_its_own_leaf() {
        let tables = Tables::global();
        let start = SorlockState::new(0, 3, 2, 3);
        let leaves = spend_pact_slots(&start, tables).unwrap();
        assert_eq!(leaves, vec![start]);
    }

    #[test]
    fn runaway_branches_are_cut_off() {
        let tables = Tables::global();
        let start = SorlockState::new(100, 1, 0, 1);
        assert!(matches!(
            spend_pact_slots(&start, tables),
            Err(BalanceError::SearchTooDeep(MAX_SEARCH_DEPTH))
        ));
    }

    #[test]
    fn dominated_rows_are_pruned() {
        let rows = vec![vec![2, 0, 1], vec![1, 0, 1], vec![2, 1, 1]];
        assert!(dominates(&rows[0], &rows[1]));
        assert!(dominates(&rows[2], &rows[0]));
        assert!(!dominates(&rows[0], &rows[0]));
        assert_eq!(prune_dominated(rows), vec![vec![2, 1, 1]]);

        let incomparable = vec![vec![2, 0], vec![0, 2]];
        assert_eq!(prune_dominated(incomparable.clone()), incomparable);
    }

    #[test]
    fn level_eight_table() {
        let table = sorlock_table_level(8, 2, 3).unwrap();
        assert_eq!(
            table.columns(),
            &[Column::SpellLevel(1), Column::SpellLevel(2), Column::SorceryPoints]
        );
        assert_eq!(
            table.rows(),
            &[vec![0, 2, 3], vec![1, 1, 3], vec![2, 0, 3]]
        );
    }

    #[test]
    fn all_zero_columns_are_dropped() {
        let tables = Tables::global();
        let start = SorlockState::new(1, 3, 0, 3);
        let leaves = spend_pact_slots(&start, tables).unwrap();
        let table = ConversionTable::from_states(&leaves, tables.max_sorcerer_spell_level());
        assert_eq!(table.columns(), &[Column::SorceryPoints]);
        assert_eq!(table.rows(), &[vec![3]]);
        assert_eq!(table.to_string(), "SP\n3\n");
    }

    #[test]
    fn rows_sort_by_high_spells_then_fewer_points() {
        let columns = [Column::SpellLevel(1), Column::SpellLevel(2), Column::SorceryPoints];
        let mut rows = vec![vec![2, 0, 1], vec![0, 1, 3], vec![0, 1, 2], vec![1, 1, 0]];
        rows.sort_by(|a, b| compare_rows(&columns, a, b));
        assert_eq!(
            rows,
            vec![vec![1, 1, 0], vec![0, 1, 2], vec![0, 1, 3], vec![2, 0, 1]]
        );
    }
}
