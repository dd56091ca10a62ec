//! Record store adapters
//!
//! The `RecordStore` trait is the only seam between the query engine and the
//! remote document database. Two backends are provided:
//!
//! - [`firestore::FirestoreStore`]: Firestore REST API (`runQuery`)
//! - [`snapshot::SnapshotStore`]: a JSON snapshot evaluated in memory
//!
//! A [`Session`] opens exactly one backend per process, lazily.

pub mod firestore;
pub mod snapshot;
pub mod wire;

use crate::config::{StoreBackend, StoreSettings};
use crate::document::{FieldValue, RawDocument};
use once_cell::unsync::OnceCell;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Failure opening the store session (fatal for the invocation)
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Credentials file not found: {}", .0.display())]
    CredentialsNotFound(PathBuf),

    #[error("Snapshot file not found: {}", .0.display())]
    SnapshotNotFound(PathBuf),

    #[error("Missing store setting: {0}")]
    MissingSetting(&'static str),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to read snapshot: {0}")]
    Snapshot(#[source] QueryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of one store call
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Request to collection '{collection}' failed: {source}")]
    Http {
        collection: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Store rejected query on '{collection}' (HTTP {status}): {message}")]
    Rejected {
        collection: String,
        status: u16,
        message: String,
    },

    #[error("Invalid document encoding: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Comparison operator for a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    GreaterOrEqual,
    LessOrEqual,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operator::Equal => "==",
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
        })
    }
}

/// `field op value`; a request's predicates form a conjunction
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub op: Operator,
    pub value: FieldValue,
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: Operator, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Parameters for one `stream` call
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub collection: String,
    pub predicates: Vec<Predicate>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl StreamRequest {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            predicates: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Read-only access to a document database
pub trait RecordStore {
    /// Fetch the documents matching `request`, fully materialized
    fn stream(&self, request: &StreamRequest) -> Result<Vec<RawDocument>, QueryError>;

    /// Names of the top-level collections
    fn list_collections(&self) -> Result<Vec<String>, QueryError>;
}

/// Process-wide store session with idempotent initialization
///
/// The backend is built on first use and reused afterwards; repeated calls to
/// [`Session::store`] never reconnect.
pub struct Session {
    settings: StoreSettings,
    store: OnceCell<Box<dyn RecordStore>>,
}

impl Session {
    pub fn new(settings: StoreSettings) -> Self {
        Self {
            settings,
            store: OnceCell::new(),
        }
    }

    /// Build a session around an already opened store
    pub fn with_store(settings: StoreSettings, store: Box<dyn RecordStore>) -> Self {
        Self {
            settings,
            store: OnceCell::with_value(store),
        }
    }

    pub fn is_open(&self) -> bool {
        self.store.get().is_some()
    }

    /// The store handle, opening it on first call
    pub fn store(&self) -> Result<&dyn RecordStore, SessionError> {
        let store = self.store.get_or_try_init(|| open(&self.settings))?;
        Ok(store.as_ref())
    }
}

fn open(settings: &StoreSettings) -> Result<Box<dyn RecordStore>, SessionError> {
    match settings.backend() {
        StoreBackend::Snapshot(path) => {
            debug!(path = %path.display(), "opening snapshot store");
            Ok(Box::new(snapshot::SnapshotStore::open(path)?))
        }
        StoreBackend::Firestore => {
            debug!(project = ?settings.project_id, "opening Firestore store");
            Ok(Box::new(firestore::FirestoreStore::connect(settings)?))
        }
    }
}
