//! CLI argument parsing for presenca

use crate::commands::{Section, DEFAULT_SUMMARY_DAYS};
use crate::config::{self, Config};
use crate::query::DEFAULT_LIST_LIMIT;
use crate::record::Status;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "presenca")]
#[command(version)]
#[command(
    about = "Attendance reports over the meeting's registration store",
    long_about = None
)]
pub struct Cli {
    /// Configuration file (defaults to ./presenca.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Read records from a JSON snapshot instead of Firestore
    #[arg(long, global = true, env = "PRESENCA_SNAPSHOT", value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Firestore project id
    #[arg(long, global = true, env = "FIRESTORE_PROJECT_ID", value_name = "ID")]
    pub project: Option<String>,

    /// Bearer token for the Firestore REST API
    #[arg(
        long,
        global = true,
        env = "FIRESTORE_ACCESS_TOKEN",
        hide_env_values = true,
        value_name = "TOKEN"
    )]
    pub access_token: Option<String>,

    /// File containing the bearer token
    #[arg(long, global = true, value_name = "FILE")]
    pub token_file: Option<PathBuf>,

    /// Firestore base URL (e.g. http://localhost:8080 for the emulator)
    #[arg(long, global = true, env = "FIRESTORE_ENDPOINT", value_name = "URL")]
    pub endpoint: Option<String>,

    /// Collection holding the attendance records
    #[arg(long, global = true, value_name = "NAME")]
    pub collection: Option<String>,

    /// Directory for CSV and JSON exports
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print debug logs to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List top-level collections
    #[command(visible_alias = "colecoes")]
    ListCollections,

    /// Most recent records, newest first
    #[command(visible_alias = "listar")]
    ListLatest {
        /// Number of records to show
        #[arg(default_value_t = DEFAULT_LIST_LIMIT, allow_negative_numbers = true)]
        limit: i64,
    },

    /// Counts and shares per status and region
    #[command(visible_alias = "estatisticas")]
    Stats,

    /// Records with one status (e.g. Justificado)
    #[command(visible_alias = "status")]
    FilterByStatus {
        status: String,
    },

    /// Export every record to a timestamped CSV file
    #[command(visible_alias = "exportar")]
    ExportCsv,

    /// Back up every document to a timestamped JSON snapshot
    ExportJson,

    /// Collections, stats and the latest five records
    #[command(visible_alias = "tudo")]
    RunAll,

    /// Full report for one meeting day
    DayReport {
        /// Day to report (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,

        /// UTC offset of the meeting zone (e.g. -04:00)
        #[arg(long, allow_hyphen_values = true)]
        utc_offset: Option<String>,
    },

    /// CPFs registered more than once
    Duplicates,

    /// Per-day totals for a window of days
    DailySummary {
        /// Last day of the window (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        end: Option<NaiveDate>,

        /// Window length in days
        #[arg(
            long,
            default_value_t = DEFAULT_SUMMARY_DAYS,
            value_parser = clap::value_parser!(u32).range(1..=366)
        )]
        days: u32,
    },
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    config::parse_date(s).map_err(|e| e.to_string())
}

impl Cli {
    /// Fold command-line and environment overrides into `config`
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(path) = &self.snapshot {
            config.store.snapshot = Some(path.clone());
        }
        if let Some(project) = &self.project {
            config.store.project_id = Some(project.clone());
        }
        if let Some(token) = &self.access_token {
            config.store.access_token = Some(token.clone());
        }
        if let Some(path) = &self.token_file {
            config.store.token_file = Some(path.clone());
        }
        if let Some(endpoint) = &self.endpoint {
            config.store.endpoint = endpoint.clone();
        }
        if let Some(collection) = &self.collection {
            config.meeting.collection = collection.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.export.output_dir = dir.clone();
        }
        if let Command::DayReport {
            utc_offset: Some(offset),
            ..
        } = &self.command
        {
            config.meeting.utc_offset = offset.clone();
        }
    }
}

impl Command {
    /// Sections to run, with defaults resolved against `config`
    pub fn sections(&self, config: &Config) -> Result<Vec<Section>, config::ConfigError> {
        let section = match self {
            Command::ListCollections => Section::Collections,
            Command::ListLatest { limit } => Section::Latest { limit: *limit },
            Command::Stats => Section::Stats,
            Command::FilterByStatus { status } => Section::ByStatus {
                status: status.parse::<Status>().unwrap_or_default(),
            },
            Command::ExportCsv => Section::ExportCsv,
            Command::ExportJson => Section::ExportJson,
            Command::RunAll => return Ok(crate::commands::run_all_sections()),
            Command::DayReport { date, .. } => Section::DayReport {
                date: resolve_date(*date, config)?,
            },
            Command::Duplicates => Section::Duplicates,
            Command::DailySummary { end, days } => Section::DailySummary {
                end: resolve_date(*end, config)?,
                days: *days,
            },
        };
        Ok(vec![section])
    }
}

fn resolve_date(date: Option<NaiveDate>, config: &Config) -> Result<NaiveDate, config::ConfigError> {
    match date {
        Some(date) => Ok(date),
        None => config.meeting.date(),
    }
}
