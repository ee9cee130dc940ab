//! Attendance CLI.
//!
//! # Responsibility
//! - Open (and migrate) the attendance database named by flags or env.
//! - Expose roster setup, marking and the read-only reports as subcommands.
//! - Print every result as JSON for scripting.

use anyhow::{anyhow, bail, Context, Result};
use attendance_core::db::open_db;
use attendance_core::repo::{PersonnelQuery, PersonnelRepository, TimeSlotQuery, TimeSlotRepository};
use attendance_core::{
    build_dashboard, build_date_report, build_person_history, build_slot_summary,
    flush_logs, init_logging, load_day_schedule, save_day_schedule, search_classes,
    Category, LogConfig, MarkingPhase, MarkingSession, Personnel, PersonnelDraft, RosterFilter,
    RosterService, SqliteStore, SubCategory, TimeSlot,
};
use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "attendance")]
#[command(about = "Attendance tracking - roster, marking and reports")]
#[command(version)]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "ATTENDANCE_DB", default_value = "attendance.sqlite3")]
    db: PathBuf,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "ATTENDANCE_LOG_DIR")]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "ATTENDANCE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage personnel and time slots
    Roster {
        #[command(subcommand)]
        command: RosterCommand,
    },

    /// Set one class name per slot for a day, or show the day's schedule
    Schedule {
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// SLOT=NAME pairs; SLOT is a slot label or id
        #[arg(long = "set", value_name = "SLOT=NAME")]
        set: Vec<String>,
    },

    /// Mark attendance for one class; everyone not listed is absent
    Mark {
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Slot label or id
        #[arg(long)]
        slot: String,

        /// Class name, used when the class does not exist yet
        #[arg(long)]
        class_name: Option<String>,

        /// Employee codes of present personnel
        #[arg(long = "present", value_name = "CODE")]
        present: Vec<String>,

        /// Mark the whole active roster present
        #[arg(long, conflicts_with = "present")]
        all: bool,
    },

    /// Personnel x slot matrix for one date
    Date {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Attendance history of one employee
    History {
        /// Employee code
        code: String,
    },

    /// Classes held in one slot with their counts
    Slot {
        /// Slot label or id
        slot: String,
    },

    /// Search classes by name
    Search { query: String },

    /// Headline counts for a day
    Stats {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum RosterCommand {
    /// List personnel in rank order
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        include_inactive: bool,
    },

    /// Add one personnel record
    AddPerson {
        code: String,
        name: String,
        /// RSI|ARSI|HC|PC
        category: String,
        /// PSO|MT|Staff|STF|"General Duty"
        #[arg(long)]
        sub_category: Option<String>,
    },

    /// List time slots
    Slots {
        #[arg(long)]
        include_inactive: bool,
    },

    /// Append a time slot after the current last one
    AddSlot {
        /// HH:MM, 24-hour
        time: String,
        #[arg(long)]
        label: Option<String>,
    },

    /// Flip a slot between active and inactive
    ToggleSlot { slot: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_settings(cli.log_dir.as_deref(), cli.log_level.as_deref())?;
    if let Some(config) = &log_config {
        init_logging(config)?;
    }
    let result = run(cli);
    flush_logs();
    result
}

fn run(cli: Cli) -> Result<()> {
    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    let store = SqliteStore::try_new(&conn).context("database is not an attendance store")?;

    let output = match cli.command {
        Commands::Roster { command } => run_roster(command, store)?,
        Commands::Schedule { date, set } => {
            let date = date.unwrap_or_else(today);
            if !set.is_empty() {
                let mut names = HashMap::new();
                for pair in &set {
                    let (slot, name) = pair
                        .split_once('=')
                        .ok_or_else(|| anyhow!("expected SLOT=NAME, got `{pair}`"))?;
                    names.insert(find_slot(&store, slot)?.id, name.to_string());
                }
                save_day_schedule(&store, date, &names)?;
            }
            serde_json::to_value(load_day_schedule(&store, date)?)?
        }
        Commands::Mark {
            date,
            slot,
            class_name,
            present,
            all,
        } => {
            let slot = find_slot(&store, &slot)?;
            let mut session = MarkingSession::open(&store)?;
            let phase = session.select(Some(date.unwrap_or_else(today)), Some(slot.id))?;
            if phase == MarkingPhase::ClassMissing {
                let class_name = class_name.ok_or_else(|| {
                    anyhow!("no class in slot `{}` on that date; pass --class-name", slot.label)
                })?;
                session.create_class(&class_name)?;
            }

            if all {
                session.mark_all_present()?;
            } else {
                session.mark_all_absent()?;
                for code in &present {
                    let person = find_personnel(&store, code)?;
                    session.mark_present(person.id)?;
                }
            }
            serde_json::to_value(session.save()?)?
        }
        Commands::Date { date } => {
            serde_json::to_value(build_date_report(&store, date.unwrap_or_else(today))?)?
        }
        Commands::History { code } => {
            let person = find_personnel(&store, &code)?;
            serde_json::to_value(build_person_history(&store, person.id)?)?
        }
        Commands::Slot { slot } => {
            let slot = find_slot(&store, &slot)?;
            serde_json::to_value(build_slot_summary(&store, slot.id)?)?
        }
        Commands::Search { query } => serde_json::to_value(search_classes(&store, &query)?)?,
        Commands::Stats { date } => {
            serde_json::to_value(build_dashboard(&store, date.unwrap_or_else(today))?)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_roster(command: RosterCommand, store: SqliteStore<'_>) -> Result<serde_json::Value> {
    let roster = RosterService::new(store);
    let value = match command {
        RosterCommand::List {
            search,
            category,
            include_inactive,
        } => serde_json::to_value(roster.list_personnel(&RosterFilter {
            search,
            category: category.as_deref().map(parse_category),
            include_inactive,
        })?)?,
        RosterCommand::AddPerson {
            code,
            name,
            category,
            sub_category,
        } => {
            let mut draft = PersonnelDraft::new(code, name, parse_category(&category));
            if let Some(raw) = sub_category.as_deref() {
                let parsed = SubCategory::parse(raw)
                    .ok_or_else(|| anyhow!("unknown sub-category `{raw}`"))?;
                draft = draft.with_sub_category(parsed);
            }
            serde_json::to_value(roster.create_personnel(&draft)?)?
        }
        RosterCommand::Slots { include_inactive } => {
            serde_json::to_value(roster.list_time_slots(include_inactive)?)?
        }
        RosterCommand::AddSlot { time, label } => {
            let time = NaiveTime::parse_from_str(&time, "%H:%M")
                .with_context(|| format!("invalid slot time `{time}`, expected HH:MM"))?;
            serde_json::to_value(roster.add_time_slot(time, label.as_deref())?)?
        }
        RosterCommand::ToggleSlot { slot } => {
            let id = roster
                .list_time_slots(true)?
                .into_iter()
                .find(|candidate| slot_matches(candidate, &slot))
                .map(|found| found.id)
                .ok_or_else(|| anyhow!("no time slot matches `{slot}`"))?;
            json!({ "slot_id": id, "is_active": roster.toggle_time_slot(id)? })
        }
    };
    Ok(value)
}

fn parse_category(raw: &str) -> Category {
    Category::parse(&raw.trim().to_ascii_uppercase())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn slot_matches(slot: &TimeSlot, key: &str) -> bool {
    let key = key.trim();
    slot.id.to_string() == key || slot.label.eq_ignore_ascii_case(key)
}

fn find_slot(store: &SqliteStore<'_>, key: &str) -> Result<TimeSlot> {
    let mut matches: Vec<TimeSlot> = store
        .list_time_slots(&TimeSlotQuery::default())?
        .into_iter()
        .filter(|slot| slot_matches(slot, key))
        .collect();
    match matches.len() {
        0 => bail!("no time slot matches `{key}`"),
        1 => Ok(matches.remove(0)),
        n => bail!("{n} time slots match `{key}`; use the slot id"),
    }
}

fn find_personnel(store: &SqliteStore<'_>, code: &str) -> Result<Personnel> {
    let code = code.trim();
    store
        .list_personnel(&PersonnelQuery::default())?
        .into_iter()
        .find(|person| person.employee_id == code)
        .ok_or_else(|| anyhow!("no personnel with employee code `{code}`"))
}
