//! CSV export of attendance records for spreadsheet use
//!
//! One header row followed by one row per record, in the order given.
//! Quoting of commas, quotes and newlines is left to the `csv` writer.

use crate::export;
use crate::record::AttendanceRecord;
use crate::report::{self, RenderError};
use chrono::{DateTime, Local};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const HEADER: [&str; 8] = [
    "Nome",
    "CPF",
    "Status",
    "Região",
    "Cargo",
    "Pastor",
    "Data",
    "Justificativa",
];

/// `firebase-export-YYYY-MM-DD_HH-MM-SS.csv`
pub fn export_file_name(now: &DateTime<Local>) -> String {
    format!("firebase-export-{}.csv", now.format("%Y-%m-%d_%H-%M-%S"))
}

fn row(record: &AttendanceRecord) -> [String; 8] {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    [
        record.full_name.clone(),
        record.cpf.clone(),
        record.status.to_string(),
        text(&record.region),
        text(&record.church_position),
        text(&record.pastor_name),
        record
            .timestamp
            .as_ref()
            .map(report::format_datetime)
            .unwrap_or_default(),
        text(&record.absent_reason),
    ]
}

/// Write the header and one row per record
pub fn write_csv<W: Write>(out: W, records: &[AttendanceRecord]) -> Result<(), RenderError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);

    writer.write_record(HEADER)?;
    for record in records {
        writer.write_record(row(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a timestamped CSV file into `dir` and return its path
pub fn export_csv(dir: &Path, records: &[AttendanceRecord]) -> Result<PathBuf, RenderError> {
    let path = export::write_atomically(dir, &export_file_name(&Local::now()), |out| {
        write_csv(out, records)
    })?;
    info!(path = %path.display(), rows = records.len(), "CSV export written");
    Ok(path)
}
