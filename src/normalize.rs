//! Normalization boundary: raw documents in, typed records out
//!
//! All defaulting and coercion happens here. Downstream code only sees
//! `AttendanceRecord`.

use crate::document::{FieldValue, RawDocument};
use crate::record::{AttendanceRecord, Status, NOT_AVAILABLE};
use chrono::{DateTime, FixedOffset};
use tracing::debug;

/// Field names as stored in the `attendance` collection
pub mod fields {
    pub const FULL_NAME: &str = "fullName";
    pub const CPF: &str = "cpf";
    pub const STATUS: &str = "status";
    pub const REGION: &str = "region";
    pub const CHURCH_POSITION: &str = "churchPosition";
    pub const PASTOR_NAME: &str = "pastorName";
    pub const TIMESTAMP: &str = "timestamp";
    pub const ABSENT_REASON: &str = "absentReason";
}

/// Converts raw documents into records in one time zone
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    zone: FixedOffset,
}

impl Normalizer {
    pub fn new(zone: FixedOffset) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> FixedOffset {
        self.zone
    }

    /// Normalize one document; never fails
    pub fn normalize(&self, doc: &RawDocument) -> AttendanceRecord {
        AttendanceRecord {
            id: doc.id.clone(),
            full_name: text(doc, fields::FULL_NAME).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            cpf: text(doc, fields::CPF).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            status: text(doc, fields::STATUS)
                .map(|s| s.parse::<Status>().unwrap_or_default())
                .unwrap_or_default(),
            region: text(doc, fields::REGION),
            church_position: text(doc, fields::CHURCH_POSITION),
            pastor_name: text(doc, fields::PASTOR_NAME),
            timestamp: self.timestamp(doc),
            absent_reason: text(doc, fields::ABSENT_REASON),
        }
    }

    pub fn normalize_all(&self, docs: &[RawDocument]) -> Vec<AttendanceRecord> {
        docs.iter().map(|doc| self.normalize(doc)).collect()
    }

    fn timestamp(&self, doc: &RawDocument) -> Option<DateTime<FixedOffset>> {
        match doc.get(fields::TIMESTAMP)? {
            FieldValue::Timestamp(ts) => Some(ts.with_timezone(&self.zone)),
            FieldValue::String(s) => match DateTime::parse_from_rfc3339(s) {
                Ok(ts) => Some(ts.with_timezone(&self.zone)),
                Err(e) => {
                    debug!(id = %doc.id, value = %s, error = %e, "dropping unparsable timestamp");
                    None
                }
            },
            FieldValue::Null => None,
            other => {
                debug!(id = %doc.id, value = %other, "dropping non-timestamp value in timestamp field");
                None
            }
        }
    }
}

/// Scalar field as text; null counts as absent, other types pass through
/// as their display form
fn text(doc: &RawDocument, name: &str) -> Option<String> {
    match doc.get(name)? {
        FieldValue::Null => None,
        FieldValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
