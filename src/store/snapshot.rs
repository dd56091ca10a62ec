//! JSON snapshot backend
//!
//! A snapshot is a file of Firestore-encoded documents grouped by
//! collection:
//!
//! ```json
//! {"collections": {"attendance": [{"name": "abc", "fields": {...}}]}}
//! ```
//!
//! Queries are evaluated in memory with the semantics of the remote store.
//! A document lacking a filtered field never matches. Ordering by a field
//! drops documents that lack it, while an explicit null sorts below every
//! other value. Values of different types order by type first. Sorting is
//! stable.

use super::wire::Document;
use super::{Direction, Operator, Predicate, QueryError, RecordStore, SessionError, StreamRequest};
use crate::document::{FieldValue, RawDocument};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// On-disk snapshot layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub collections: BTreeMap<String, Vec<Document>>,
}

impl Snapshot {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, QueryError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Snapshot holding one collection of raw documents
    pub fn from_documents(collection: &str, docs: &[RawDocument]) -> Self {
        let mut collections = BTreeMap::new();
        collections.insert(
            collection.to_string(),
            docs.iter().map(Document::from_raw).collect(),
        );
        Self { collections }
    }
}

#[derive(Debug, Default)]
pub struct SnapshotStore {
    collections: BTreeMap<String, Vec<RawDocument>>,
}

impl SnapshotStore {
    pub fn open(path: &Path) -> Result<Self, SessionError> {
        if !path.exists() {
            return Err(SessionError::SnapshotNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        let snapshot = Snapshot::from_slice(&bytes).map_err(SessionError::Snapshot)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let collections = snapshot
            .collections
            .into_iter()
            .map(|(name, docs)| (name, docs.into_iter().map(Document::into_raw).collect()))
            .collect();
        Self { collections }
    }

    /// In-memory store with one collection, in the given order
    pub fn with_collection(name: impl Into<String>, docs: Vec<RawDocument>) -> Self {
        let mut collections = BTreeMap::new();
        collections.insert(name.into(), docs);
        Self { collections }
    }
}

impl RecordStore for SnapshotStore {
    fn stream(&self, request: &StreamRequest) -> Result<Vec<RawDocument>, QueryError> {
        let Some(docs) = self.collections.get(&request.collection) else {
            debug!(collection = %request.collection, "collection not in snapshot");
            return Ok(Vec::new());
        };

        let mut matched: Vec<RawDocument> = docs
            .iter()
            .filter(|doc| request.predicates.iter().all(|p| matches(doc, p)))
            .cloned()
            .collect();

        if let Some(order) = &request.order_by {
            matched.retain(|doc| doc.get(&order.field).is_some());
            matched.sort_by(|a, b| compare_field(a, b, &order.field, order.direction));
        }

        if let Some(limit) = request.limit {
            matched.truncate(limit);
        }

        debug!(
            collection = %request.collection,
            documents = matched.len(),
            "snapshot query complete"
        );
        Ok(matched)
    }

    fn list_collections(&self) -> Result<Vec<String>, QueryError> {
        Ok(self.collections.keys().cloned().collect())
    }
}

fn matches(doc: &RawDocument, predicate: &Predicate) -> bool {
    let Some(ordering) = doc
        .get(&predicate.field)
        .and_then(|value| value.compare(&predicate.value))
    else {
        return false;
    };
    match predicate.op {
        Operator::Equal => ordering == Ordering::Equal,
        Operator::GreaterOrEqual => ordering != Ordering::Less,
        Operator::LessOrEqual => ordering != Ordering::Greater,
    }
}

fn compare_field(a: &RawDocument, b: &RawDocument, field: &str, direction: Direction) -> Ordering {
    let ordering = match (a.get(field), b.get(field)) {
        (Some(x), Some(y)) => type_rank(x)
            .cmp(&type_rank(y))
            .then_with(|| x.compare(y).unwrap_or(Ordering::Equal)),
        _ => Ordering::Equal,
    };
    match direction {
        Direction::Ascending => ordering,
        Direction::Descending => ordering.reverse(),
    }
}

// Cross-type order: null, booleans, numbers, timestamps, strings, arrays, maps
fn type_rank(value: &FieldValue) -> u8 {
    match value {
        FieldValue::Null => 0,
        FieldValue::Boolean(_) => 1,
        FieldValue::Integer(_) | FieldValue::Double(_) => 2,
        FieldValue::Timestamp(_) => 3,
        FieldValue::String(_) => 4,
        FieldValue::Array(_) => 5,
        FieldValue::Map(_) => 6,
    }
}
