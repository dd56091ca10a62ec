//! JSON backup of a collection
//!
//! The backup uses the snapshot layout, so a backup file can be fed back
//! with `--snapshot` and queried offline.

use crate::document::RawDocument;
use crate::export;
use crate::report::RenderError;
use crate::store::snapshot::Snapshot;
use chrono::{DateTime, Local};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// `firebase-backup-YYYY-MM-DD_HH-MM-SS.json`
pub fn backup_file_name(now: &DateTime<Local>) -> String {
    format!("firebase-backup-{}.json", now.format("%Y-%m-%d_%H-%M-%S"))
}

/// Pretty-printed snapshot holding `docs` under `collection`
pub fn write_backup<W: Write>(
    mut out: W,
    collection: &str,
    docs: &[RawDocument],
) -> Result<(), RenderError> {
    let snapshot = Snapshot::from_documents(collection, docs);
    serde_json::to_writer_pretty(&mut out, &snapshot)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Write a timestamped backup file into `dir` and return its path
pub fn export_json(
    dir: &Path,
    collection: &str,
    docs: &[RawDocument],
) -> Result<PathBuf, RenderError> {
    let path = export::write_atomically(dir, &backup_file_name(&Local::now()), |out| {
        write_backup(BufWriter::new(out), collection, docs)
    })?;
    info!(path = %path.display(), documents = docs.len(), "JSON backup written");
    Ok(path)
}
