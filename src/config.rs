//! Configuration: optional TOML file plus command-line/environment overrides
//!
//! ```toml
//! [store]
//! project_id = "reuniao-ministerial"
//! timeout_secs = 30
//!
//! [meeting]
//! collection = "attendance"
//! utc_offset = "-04:00"
//! report_date = "2025-08-17"
//!
//! [export]
//! output_dir = "."
//! ```

use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "presenca.toml";

pub const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid UTC offset '{0}' (expected e.g. -04:00 or +0530)")]
    InvalidOffset(String),

    #[error("Invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid store timeout: timeout_secs must be at least 1")]
    InvalidTimeout,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreSettings,
    pub meeting: MeetingSettings,
    pub export: ExportSettings,
}

/// Where records come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Read from this JSON snapshot instead of Firestore
    pub snapshot: Option<PathBuf>,
    pub project_id: Option<String>,
    pub database: String,
    /// Base URL; point at the emulator for local runs
    pub endpoint: String,
    /// Opaque bearer token; never read from the config file
    #[serde(skip)]
    pub access_token: Option<String>,
    /// File containing the bearer token
    pub token_file: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            snapshot: None,
            project_id: None,
            database: "(default)".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            access_token: None,
            token_file: None,
            timeout_secs: 30,
        }
    }
}

/// Backend selected by the settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend<'a> {
    Snapshot(&'a Path),
    Firestore,
}

impl StoreSettings {
    pub fn backend(&self) -> StoreBackend<'_> {
        match &self.snapshot {
            Some(path) => StoreBackend::Snapshot(path),
            None => StoreBackend::Firestore,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetingSettings {
    pub collection: String,
    /// Fixed UTC offset of the meeting's local zone
    pub utc_offset: String,
    /// Date used by `day-report` when none is given
    pub report_date: String,
}

impl Default for MeetingSettings {
    fn default() -> Self {
        Self {
            collection: "attendance".to_string(),
            utc_offset: "-04:00".to_string(),
            report_date: "2025-08-17".to_string(),
        }
    }
}

impl MeetingSettings {
    pub fn zone(&self) -> Result<FixedOffset, ConfigError> {
        parse_utc_offset(&self.utc_offset)
    }

    pub fn date(&self) -> Result<NaiveDate, ConfigError> {
        parse_date(&self.report_date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub output_dir: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load `path`, or `presenca.toml` if present, or defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check derived values early so bad settings fail before any query
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        self.meeting.zone()?;
        self.meeting.date()?;
        Ok(())
    }
}

/// Parse `-04:00`, `+0530`, `-4` or `Z`
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError::InvalidOffset(s.to_string());
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1, &trimmed[1..]),
        Some(b'-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

pub fn parse_date(s: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate(s.to_string()))
}
