//! Report sections and their dispatch
//!
//! A section is one query plus one rendering. Sections fail independently:
//! a batch keeps going after a failure and hands every failure back to the
//! caller for reporting.

use crate::aggregate;
use crate::csv_output;
use crate::json_output;
use crate::query::{QueryPlanner, QueryShape};
use crate::record::Status;
use crate::report::{self, DayReport, RenderError};
use crate::store::QueryError;
use chrono::{Days, NaiveDate};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error};

/// Rows shown by the listing inside `run-all`
pub const RUN_ALL_LIST_LIMIT: i64 = 5;

/// Default window of `daily-summary`
pub const DEFAULT_SUMMARY_DAYS: u32 = 7;

#[derive(Error, Debug)]
pub enum SectionError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl From<std::io::Error> for SectionError {
    fn from(err: std::io::Error) -> Self {
        SectionError::Render(RenderError::Io(err))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Collections,
    Latest { limit: i64 },
    Stats,
    ByStatus { status: Status },
    DayReport { date: NaiveDate },
    ExportCsv,
    ExportJson,
    Duplicates,
    DailySummary { end: NaiveDate, days: u32 },
}

impl Section {
    /// Prefix of the diagnostic printed when the section fails
    pub fn failure_label(&self) -> &'static str {
        match self {
            Section::Collections => "Erro ao listar coleções",
            Section::Latest { .. } => "Erro ao listar registros",
            Section::Stats => "Erro ao gerar estatísticas",
            Section::ByStatus { .. } => "Erro ao filtrar por status",
            Section::DayReport { .. } => "Erro ao gerar relatório do dia",
            Section::ExportCsv => "Erro ao exportar CSV",
            Section::ExportJson => "Erro ao exportar backup JSON",
            Section::Duplicates => "Erro ao analisar duplicatas",
            Section::DailySummary { .. } => "Erro ao gerar síntese diária",
        }
    }
}

/// Sections of `run-all`, in order
pub fn run_all_sections() -> Vec<Section> {
    vec![
        Section::Collections,
        Section::Stats,
        Section::Latest {
            limit: RUN_ALL_LIST_LIMIT,
        },
    ]
}

/// A section that did not complete
#[derive(Debug)]
pub struct SectionFailure {
    pub section: Section,
    pub error: SectionError,
}

impl SectionFailure {
    /// One-line diagnostic, `❌ <label>: <error>`
    pub fn diagnostic(&self) -> String {
        format!("❌ {}: {}", self.section.failure_label(), self.error)
    }
}

/// Runs sections against one planner
pub struct Dispatcher<'a> {
    planner: QueryPlanner<'a>,
    output_dir: PathBuf,
}

impl<'a> Dispatcher<'a> {
    pub fn new(planner: QueryPlanner<'a>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            planner,
            output_dir: output_dir.into(),
        }
    }

    pub fn run(&self, out: &mut dyn Write, section: &Section) -> Result<(), SectionError> {
        debug!(?section, "running section");
        match section {
            Section::Collections => {
                let names = self.planner.list_collections()?;
                report::render_collections(out, &names)?;
            }
            Section::Latest { limit } => {
                let records = self.planner.fetch(&QueryShape::ListLatest { limit: *limit })?;
                report::render_latest(out, *limit, &records)?;
            }
            Section::Stats => {
                let records = self.planner.fetch(&QueryShape::All)?;
                report::render_stats(out, &records)?;
            }
            Section::ByStatus { status } => {
                let records = self.planner.fetch(&QueryShape::ByStatus {
                    status: status.clone(),
                })?;
                report::render_by_status(out, status, &records)?;
            }
            Section::DayReport { date } => {
                let records = self.planner.fetch(&QueryShape::ByDay { date: *date })?;
                let day = DayReport::build(*date, self.planner.zone(), records);
                report::render_day_report(out, &day)?;
            }
            Section::ExportCsv => {
                let records = self.planner.fetch(&QueryShape::AllLatestFirst)?;
                let path = csv_output::export_csv(&self.output_dir, &records)?;
                render_export(out, &path, records.len())?;
            }
            Section::ExportJson => {
                let docs = self.planner.fetch_raw(&QueryShape::AllLatestFirst)?;
                let path =
                    json_output::export_json(&self.output_dir, self.planner.collection(), &docs)?;
                render_export(out, &path, docs.len())?;
            }
            Section::Duplicates => {
                let records = self.planner.fetch(&QueryShape::All)?;
                report::render_duplicates(out, &aggregate::find_duplicates(&records))?;
            }
            Section::DailySummary { end, days } => {
                let first = summary_start(*end, *days);
                let records = self.planner.fetch(&QueryShape::DateRange { first, last: *end })?;
                let summary = match days {
                    0 => Vec::new(),
                    _ => aggregate::daily_summary(&records, first, *end),
                };
                report::render_daily_summary(out, &summary)?;
            }
        }
        Ok(())
    }

    /// Run every section, separated by a rule; failures do not stop the batch
    pub fn run_batch(&self, out: &mut dyn Write, sections: &[Section]) -> Vec<SectionFailure> {
        let mut failures = Vec::new();
        for (i, section) in sections.iter().enumerate() {
            if i > 0 {
                if let Err(err) = writeln!(out, "\n{}\n", "=".repeat(50)) {
                    failures.push(SectionFailure {
                        section: section.clone(),
                        error: err.into(),
                    });
                    continue;
                }
            }
            if let Err(err) = self.run(out, section) {
                error!(?section, error = %err, "section failed");
                failures.push(SectionFailure {
                    section: section.clone(),
                    error: err,
                });
            }
        }
        failures
    }
}

/// First day of a `days`-long window ending at `end`
fn summary_start(end: NaiveDate, days: u32) -> NaiveDate {
    let span = u64::from(days.saturating_sub(1));
    end.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN)
}

fn render_export(out: &mut dyn Write, path: &Path, count: usize) -> Result<(), RenderError> {
    writeln!(out, "✅ Dados exportados para: {}", path.display())?;
    writeln!(out, "📊 Total de registros exportados: {}", count)?;
    Ok(())
}
