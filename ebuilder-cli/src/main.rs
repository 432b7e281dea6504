mod reports;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};

use ebuilder_game::{
    AdventuringDay, BalanceError, ConsumableKind, CostMode, DifficultyMethod, Encounter,
    MonsterParty, Party, Rarity, Tables, sorlock_table_level,
};
use reports::{DayReport, EncounterSummary, PartySummary, SorlockReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable colored output
    Console,
    /// Pretty-printed JSON
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "ebuilder", version)]
#[command(about = "Rate tabletop encounters, adventuring days and sorlock slot conversions")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output report format
    #[arg(long, value_enum, global = true, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long, global = true)]
    output: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rate every encounter of an adventuring day and the fatigue it causes
    Day(DayArgs),
    /// Print the pact slot conversion table for a warlock/sorcerer level
    Sorlock(SorlockArgs),
}

#[derive(Debug, clap::Args)]
struct DayArgs {
    /// Party description (JSON with a `characters` list)
    #[arg(long)]
    party: PathBuf,

    /// Monster roster file; each file is one encounter
    #[arg(long = "monsters")]
    monster_files: Vec<PathBuf>,

    /// Comma-separated challenge ratings forming one anonymous encounter
    #[arg(long = "crs")]
    cr_lists: Vec<String>,

    /// Rarity of a charged item used today (repeatable)
    #[arg(long = "charge")]
    charges: Vec<String>,

    /// Rarity of a consumable used today (repeatable)
    #[arg(long = "consumable")]
    consumables: Vec<String>,

    /// Scoring method: cr2 (power ratio) or 2024 (XP budget)
    #[arg(long, default_value = "cr2")]
    method: String,

    /// Charge the floored row cost per encounter, in the listing and the
    /// day's fatigue, instead of the interpolated one
    #[arg(long)]
    floored: bool,
}

#[derive(Debug, clap::Args)]
struct SorlockArgs {
    /// Total character level (7-20)
    #[arg(long)]
    level: u32,

    /// Pact slots available to spend
    #[arg(long)]
    pact_slots: u32,

    /// Sorcery points already in the pool
    #[arg(long, default_value_t = 0)]
    sorcery_points: u32,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut output_target = OutputTarget::new(args.output.clone())?;
    match &args.command {
        Command::Day(day_args) => run_day(day_args, args.report, &mut output_target)?,
        Command::Sorlock(sorlock_args) => {
            run_sorlock(sorlock_args, args.report, &mut output_target)?;
        }
    }
    output_target.flush_inner()?;
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_rosters(day_args: &DayArgs) -> Result<Vec<(String, MonsterParty)>> {
    let mut rosters = Vec::new();
    for path in &day_args.monster_files {
        let roster = MonsterParty::from_json(&read_file(path)?)
            .with_context(|| format!("invalid monster roster {}", path.display()))?;
        rosters.push((path.display().to_string(), roster));
    }
    for list in &day_args.cr_lists {
        let crs: Vec<&str> = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        let roster = MonsterParty::from_challenge_ratings(&crs)
            .with_context(|| format!("invalid challenge rating list '{list}'"))?;
        rosters.push((format!("CR {list}"), roster));
    }
    Ok(rosters)
}

fn run_day(day_args: &DayArgs, format: ReportFormat, out: &mut dyn Write) -> Result<()> {
    let tables = Tables::global();
    let party_path = &day_args.party;
    let party = Party::from_json_with(tables, &read_file(party_path)?)
        .with_context(|| format!("invalid party file {}", party_path.display()))?;
    let method: DifficultyMethod = day_args
        .method
        .parse()
        .with_context(|| format!("unsupported method '{}'", day_args.method))?;
    let cost_mode = if day_args.floored {
        CostMode::Floored
    } else {
        CostMode::Interpolated
    };

    let rosters = load_rosters(day_args)?;
    let tier = party.tier().context("party has no valid tier")?;

    let mut day = AdventuringDay::new(&party)
        .with_tables(tables)
        .with_cost_mode(cost_mode);
    let mut encounters = Vec::with_capacity(rosters.len());
    for (label, roster) in rosters {
        let encounter = Encounter::new(&party, roster, method).with_tables(tables);
        let rating = encounter
            .difficulty_with(method, cost_mode)
            .with_context(|| format!("failed to rate {label}"))?;
        encounters.push(EncounterSummary {
            label,
            power: encounter.monsters().power(tables, tier)?,
            xp: encounter.monsters().xp(tables)?,
            rating,
        });
        day.add(encounter);
    }

    for (kind, rarities) in [
        (ConsumableKind::Charge, &day_args.charges),
        (ConsumableKind::Consumable, &day_args.consumables),
    ] {
        for raw in rarities {
            let rarity: Rarity = raw
                .parse()
                .with_context(|| format!("unknown {kind} rarity '{raw}'"))?;
            day.add_consumable(rarity, kind)?;
        }
    }

    let fatigue = match day.fatigue() {
        Ok(rating) => Some(rating),
        Err(BalanceError::UncostedEncounter { index }) => {
            log::warn!("encounter {index} has no numeric cost; day fatigue not rated");
            None
        }
        Err(err) => return Err(err).context("failed to rate the adventuring day"),
    };

    let report = DayReport {
        method,
        cost_mode,
        party: PartySummary::from_party(&party, tables)?,
        encounters,
        consumables: day.consumables(),
        fatigue,
    };
    match format {
        ReportFormat::Json => reports::write_json(out, &report)?,
        ReportFormat::Console => reports::write_day_console(out, &report)?,
    }
    Ok(())
}

fn run_sorlock(sorlock_args: &SorlockArgs, format: ReportFormat, out: &mut dyn Write) -> Result<()> {
    let table = sorlock_table_level(
        sorlock_args.level,
        sorlock_args.pact_slots,
        sorlock_args.sorcery_points,
    )
    .with_context(|| format!("cannot build conversion table for level {}", sorlock_args.level))?;
    let report = SorlockReport::new(
        sorlock_args.level,
        sorlock_args.pact_slots,
        sorlock_args.sorcery_points,
        &table,
    );
    match format {
        ReportFormat::Json => reports::write_json(out, &report)?,
        ReportFormat::Console => reports::write_sorlock_console(out, &report)?,
    }
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
