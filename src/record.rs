//! Canonical attendance record

use chrono::{DateTime, FixedOffset};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Placeholder shown for missing names, CPFs and regions in listings
pub const NOT_AVAILABLE: &str = "N/A";

/// Placeholder used for the region group of records without a region
pub const NO_REGION: &str = "Sem região";

/// Attendance status as recorded by the registration app
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Presente,
    Justificado,
    Ausente,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Presente => "Presente",
            Status::Justificado => "Justificado",
            Status::Ausente => "Ausente",
            Status::Other(s) => s,
        }
    }

    /// Console marker for this status
    pub fn marker(&self) -> &'static str {
        match self {
            Status::Presente => "✅",
            Status::Justificado => "📝",
            _ => "❌",
        }
    }

    /// Marker for a status given by name (used on grouped keys)
    pub fn marker_for(name: &str) -> &'static str {
        name.parse::<Status>()
            .map(|s| s.marker())
            .unwrap_or("❌")
    }
}

impl FromStr for Status {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Presente" => Status::Presente,
            "Justificado" => Status::Justificado,
            "Ausente" => Status::Ausente,
            other => Status::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attendance registration, normalized into the meeting time zone
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRecord {
    pub id: String,
    pub full_name: String,
    pub cpf: String,
    pub status: Status,
    pub region: Option<String>,
    pub church_position: Option<String>,
    pub pastor_name: Option<String>,
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub absent_reason: Option<String>,
}

impl AttendanceRecord {
    /// Region label with a context-dependent fallback
    pub fn region_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.region.as_deref().unwrap_or(fallback)
    }

    /// Justification to show on the console (only for `Justificado`)
    pub fn displayed_reason(&self) -> Option<&str> {
        match (&self.status, self.absent_reason.as_deref()) {
            (Status::Justificado, Some(reason)) if !reason.is_empty() => Some(reason),
            _ => None,
        }
    }
}
