use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;

use ebuilder_game::{ConversionTable, CostMode, DifficultyMethod, Party, Rating, Tables, Tier};

#[derive(Debug, Clone, Serialize)]
pub struct CharacterSummary {
    pub name: String,
    pub level: u32,
    pub total_level_points: u32,
    pub power: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartySummary {
    pub count: usize,
    pub level: f64,
    pub tier: Tier,
    pub power: u32,
    pub characters: Vec<CharacterSummary>,
}

impl PartySummary {
    pub fn from_party(party: &Party, tables: &Tables) -> ebuilder_game::Result<Self> {
        let characters = party
            .characters()
            .iter()
            .map(|pc| {
                Ok(CharacterSummary {
                    name: pc.name.clone(),
                    level: pc.level(),
                    total_level_points: pc.total_level_points(tables)?,
                    power: pc.power(tables)?,
                })
            })
            .collect::<ebuilder_game::Result<Vec<_>>>()?;
        Ok(Self {
            count: party.count(),
            level: party.level()?,
            tier: party.tier()?,
            power: party.power(tables)?,
            characters,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EncounterSummary {
    pub label: String,
    pub power: u32,
    pub xp: u32,
    pub rating: Rating,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayReport {
    pub method: DifficultyMethod,
    pub cost_mode: CostMode,
    pub party: PartySummary,
    pub encounters: Vec<EncounterSummary>,
    pub consumables: f64,
    pub fatigue: Option<Rating>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SorlockReport {
    pub level: u32,
    pub pact_slots: u32,
    pub sorcery_points: u32,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<u32>>,
}

impl SorlockReport {
    pub fn new(level: u32, pact_slots: u32, sorcery_points: u32, table: &ConversionTable) -> Self {
        Self {
            level,
            pact_slots,
            sorcery_points,
            columns: table.columns().iter().map(ToString::to_string).collect(),
            rows: table.rows().to_vec(),
        }
    }
}

pub fn write_json<T: Serialize>(out: &mut dyn Write, report: &T) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn write_day_console(out: &mut dyn Write, report: &DayReport) -> Result<()> {
    writeln!(out, "{}", "⚔️  Adventuring Day".bright_cyan().bold())?;
    writeln!(out, "{}", "==================".cyan())?;

    let party = &report.party;
    writeln!(
        out,
        "Party: {} characters, level {:.2} ({}), power {}",
        party.count, party.level, party.tier, party.power
    )?;
    for pc in &party.characters {
        writeln!(
            out,
            "   {} (level {}): {} level points, power {}",
            pc.name.bold(),
            pc.level,
            pc.total_level_points,
            pc.power
        )?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "{} [{}, {} cost]",
        "Encounters".bright_yellow().bold(),
        report.method,
        cost_mode_label(report.cost_mode)
    )?;
    if report.encounters.is_empty() {
        writeln!(out, "   No encounters.")?;
    }
    for (idx, encounter) in report.encounters.iter().enumerate() {
        writeln!(
            out,
            "{}. {} - power {}, xp {}",
            idx + 1,
            encounter.label,
            encounter.power,
            encounter.xp
        )?;
        writeln!(out, "   {}", encounter.rating.to_string().green())?;
    }
    writeln!(out)?;

    if report.consumables != 0.0 {
        writeln!(out, "Consumable offset: {:.2}", report.consumables)?;
    }
    match &report.fatigue {
        Some(fatigue) => writeln!(out, "Fatigue: {}", fatigue.to_string().bright_red().bold())?,
        None => writeln!(out, "Fatigue: {}", "not rated for this method".yellow())?,
    }
    Ok(())
}

const fn cost_mode_label(cost_mode: CostMode) -> &'static str {
    match cost_mode {
        CostMode::Floored => "floored",
        CostMode::Interpolated => "interpolated",
    }
}

pub fn write_sorlock_console(out: &mut dyn Write, report: &SorlockReport) -> Result<()> {
    writeln!(out, "{}", "🔮 Sorlock Conversions".bright_magenta().bold())?;
    writeln!(out, "{}", "======================".magenta())?;
    writeln!(
        out,
        "Level {}: {} pact slots, {} sorcery points",
        report.level, report.pact_slots, report.sorcery_points
    )?;
    writeln!(out, "{}", report.columns.join("\t").bold())?;
    for row in &report.rows {
        let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
        writeln!(out, "{}", cells.join("\t"))?;
    }
    Ok(())
}
