//! Query planner
//!
//! Translates each supported query shape into store parameters, runs it
//! against the session's store and normalizes the result.

use crate::document::{FieldValue, RawDocument};
use crate::normalize::{fields, Normalizer};
use crate::record::{AttendanceRecord, Status};
use crate::store::{Direction, Operator, Predicate, QueryError, RecordStore, StreamRequest};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use std::cmp::Ordering;
use tracing::debug;

/// Default bound for `list-latest`
pub const DEFAULT_LIST_LIMIT: i64 = 10;

/// Supported query shapes
#[derive(Debug, Clone, PartialEq)]
pub enum QueryShape {
    /// Newest first, bounded; `limit <= 0` yields nothing
    ListLatest { limit: i64 },
    /// Equality on status, newest first
    ByStatus { status: Status },
    /// One calendar day in the meeting zone, oldest first
    ByDay { date: NaiveDate },
    /// Inclusive run of calendar days in the meeting zone, oldest first
    DateRange { first: NaiveDate, last: NaiveDate },
    /// Whole collection, store order
    All,
    /// Whole collection, newest first
    AllLatestFirst,
}

/// Closed instant interval `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl DayRange {
    /// `first 00:00:00.000` to `last 23:59:59.999` in `zone`
    pub fn days(first: NaiveDate, last: NaiveDate, zone: FixedOffset) -> Self {
        let start_time = NaiveTime::MIN;
        let end_time = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
        Self {
            start: local(zone, first, start_time),
            end: local(zone, last, end_time),
        }
    }

    pub fn day(date: NaiveDate, zone: FixedOffset) -> Self {
        Self::days(date, date, zone)
    }

    pub fn contains<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> bool {
        *instant >= self.start && *instant <= self.end
    }
}

/// A fixed offset has exactly one mapping for every local time
fn local(zone: FixedOffset, date: NaiveDate, time: NaiveTime) -> DateTime<FixedOffset> {
    let naive = date.and_time(time);
    zone.from_utc_datetime(&(naive - Duration::seconds(i64::from(zone.local_minus_utc()))))
}

/// Runs query shapes against one collection
pub struct QueryPlanner<'a> {
    store: &'a dyn RecordStore,
    collection: String,
    normalizer: Normalizer,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(store: &'a dyn RecordStore, collection: impl Into<String>, zone: FixedOffset) -> Self {
        Self {
            store,
            collection: collection.into(),
            normalizer: Normalizer::new(zone),
        }
    }

    pub fn zone(&self) -> FixedOffset {
        self.normalizer.zone()
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Store parameters for a shape; `None` when the shape cannot match
    /// anything and no call should be made
    ///
    /// Only the bounded listing is ordered by the store. A store-side order
    /// drops documents without the order field, so the unbounded shapes are
    /// sorted after the call instead (see [`client_order`]).
    pub fn plan(&self, shape: &QueryShape) -> Option<StreamRequest> {
        let base = StreamRequest::new(self.collection.as_str());
        let request = match shape {
            QueryShape::ListLatest { limit } => {
                let limit = usize::try_from(*limit).ok().filter(|l| *l > 0)?;
                base.order_by(fields::TIMESTAMP, Direction::Descending)
                    .limit(limit)
            }
            QueryShape::ByStatus { status } => {
                base.filter(Predicate::new(fields::STATUS, Operator::Equal, status.as_str()))
            }
            QueryShape::ByDay { date } => self.range_request(base, *date, *date),
            QueryShape::DateRange { first, last } => {
                if last < first {
                    return None;
                }
                self.range_request(base, *first, *last)
            }
            QueryShape::All | QueryShape::AllLatestFirst => base,
        };
        Some(request)
    }

    fn range_request(&self, base: StreamRequest, first: NaiveDate, last: NaiveDate) -> StreamRequest {
        let range = DayRange::days(first, last, self.zone());
        base.filter(Predicate::new(
            fields::TIMESTAMP,
            Operator::GreaterOrEqual,
            range.start.with_timezone(&Utc),
        ))
        .filter(Predicate::new(
            fields::TIMESTAMP,
            Operator::LessOrEqual,
            range.end.with_timezone(&Utc),
        ))
    }

    fn stream(&self, shape: &QueryShape) -> Result<Vec<RawDocument>, QueryError> {
        let Some(request) = self.plan(shape) else {
            debug!(?shape, "query shape yields no results, skipping store call");
            return Ok(Vec::new());
        };
        debug!(?shape, predicates = request.predicates.len(), "executing query");
        self.store.stream(&request)
    }

    /// Raw documents for a shape, in the order the shape promises
    pub fn fetch_raw(&self, shape: &QueryShape) -> Result<Vec<RawDocument>, QueryError> {
        let mut docs = self.stream(shape)?;
        if let Some(direction) = client_order(shape) {
            sort_by_instant(docs.as_mut_slice(), raw_instant, direction);
        }
        Ok(docs)
    }

    /// Normalized records for a shape, in the order the shape promises
    pub fn fetch(&self, shape: &QueryShape) -> Result<Vec<AttendanceRecord>, QueryError> {
        let docs = self.stream(shape)?;
        let mut records = self.normalizer.normalize_all(&docs);
        match client_order(shape) {
            Some(Direction::Ascending) => sort_ascending(&mut records),
            Some(Direction::Descending) => sort_descending(&mut records),
            None => {}
        }
        Ok(records)
    }

    pub fn list_collections(&self) -> Result<Vec<String>, QueryError> {
        self.store.list_collections()
    }
}

/// Ordering applied after the store call, if any
pub fn client_order(shape: &QueryShape) -> Option<Direction> {
    match shape {
        QueryShape::ByDay { .. } | QueryShape::DateRange { .. } => Some(Direction::Ascending),
        QueryShape::ByStatus { .. } | QueryShape::AllLatestFirst => Some(Direction::Descending),
        QueryShape::ListLatest { .. } | QueryShape::All => None,
    }
}

/// Oldest first; untimed records last; stable
pub fn sort_ascending(records: &mut [AttendanceRecord]) {
    sort_by_instant(records, record_instant, Direction::Ascending);
}

/// Newest first; untimed records last; stable
pub fn sort_descending(records: &mut [AttendanceRecord]) {
    sort_by_instant(records, record_instant, Direction::Descending);
}

fn record_instant(record: &AttendanceRecord) -> Option<DateTime<Utc>> {
    record.timestamp.map(|ts| ts.with_timezone(&Utc))
}

/// Same timestamp forms the normalizer accepts
fn raw_instant(doc: &RawDocument) -> Option<DateTime<Utc>> {
    match doc.get(fields::TIMESTAMP)? {
        FieldValue::Timestamp(ts) => Some(*ts),
        FieldValue::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
        _ => None,
    }
}

fn sort_by_instant<T, F>(items: &mut [T], instant: F, direction: Direction)
where
    F: Fn(&T) -> Option<DateTime<Utc>>,
{
    items.sort_by(|a, b| match (instant(a), instant(b)) {
        (Some(x), Some(y)) => match direction {
            Direction::Ascending => x.cmp(&y),
            Direction::Descending => y.cmp(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
