//! Grouping, percentages and boundary timestamps over record sets

use crate::record::{AttendanceRecord, Status, NOT_AVAILABLE};
use chrono::{DateTime, FixedOffset, NaiveDate};
use std::collections::{BTreeMap, HashMap};

/// Presentation order of grouped keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOrder {
    /// Order in which keys first appear in the input
    FirstSeen,
    /// Lexicographic by key
    Alphabetical,
}

/// Occurrence counts per key, in presentation order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupCounts {
    entries: Vec<(String, usize)>,
}

impl GroupCounts {
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    /// Key with the highest count; ties go to the earlier key
    pub fn most_common(&self) -> Option<(&str, usize)> {
        self.iter()
            .fold(None, |best: Option<(&str, usize)>, (k, c)| match best {
                Some((_, bc)) if bc >= c => best,
                _ => Some((k, c)),
            })
    }
}

/// Count records per key
pub fn group_count<F>(records: &[AttendanceRecord], key: F, order: GroupOrder) -> GroupCounts
where
    F: Fn(&AttendanceRecord) -> String,
{
    let mut entries: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let k = key(record);
        match index.get(&k) {
            Some(&i) => entries[i].1 += 1,
            None => {
                index.insert(k.clone(), entries.len());
                entries.push((k, 1));
            }
        }
    }

    if order == GroupOrder::Alphabetical {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
    }

    GroupCounts { entries }
}

/// Group by status name
pub fn by_status(records: &[AttendanceRecord], order: GroupOrder) -> GroupCounts {
    group_count(records, |r| r.status.as_str().to_string(), order)
}

/// Group by region, using `fallback` for records without one
pub fn by_region(records: &[AttendanceRecord], fallback: &str, order: GroupOrder) -> GroupCounts {
    group_count(records, |r| r.region_or(fallback).to_string(), order)
}

/// Share of one group
#[derive(Debug, Clone, PartialEq)]
pub struct Percentage {
    pub key: String,
    pub count: usize,
    /// Unrounded; render with one decimal
    pub percent: f64,
}

/// `count / total * 100` per group; empty when `total == 0`
pub fn percentages(counts: &GroupCounts, total: usize) -> Vec<Percentage> {
    if total == 0 {
        return Vec::new();
    }
    counts
        .iter()
        .map(|(key, count)| Percentage {
            key: key.to_string(),
            count,
            percent: count as f64 / total as f64 * 100.0,
        })
        .collect()
}

/// First and last timestamp of an ordered record set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub first: DateTime<FixedOffset>,
    pub last: DateTime<FixedOffset>,
}

/// First and last non-null timestamps in sequence order
pub fn boundary_timestamps(records: &[AttendanceRecord]) -> Option<Boundary> {
    let first = records.iter().find_map(|r| r.timestamp)?;
    let last = records.iter().rev().find_map(|r| r.timestamp)?;
    Some(Boundary { first, last })
}

/// Records sharing one CPF
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup {
    pub cpf: String,
    pub records: Vec<AttendanceRecord>,
    /// Every record carries the same name (case- and space-insensitive)
    pub same_name: bool,
}

impl DuplicateGroup {
    /// Distinct normalized names, in first-seen order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for record in &self.records {
            let name = normalized_name(&record.full_name);
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// Outcome of a duplicate-CPF scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DuplicateAnalysis {
    pub unique_cpfs: usize,
    pub groups: Vec<DuplicateGroup>,
}

impl DuplicateAnalysis {
    pub fn duplicated_records(&self) -> usize {
        self.groups.iter().map(|g| g.records.len()).sum()
    }

    pub fn real_duplicates(&self) -> usize {
        self.groups.iter().filter(|g| g.same_name).count()
    }

    pub fn shared_cpfs(&self) -> usize {
        self.groups.iter().filter(|g| !g.same_name).count()
    }
}

fn normalized_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Group records by CPF and keep the CPFs seen more than once
///
/// Records without a CPF are ignored. Groups are ordered by CPF.
pub fn find_duplicates(records: &[AttendanceRecord]) -> DuplicateAnalysis {
    let mut by_cpf: BTreeMap<&str, Vec<&AttendanceRecord>> = BTreeMap::new();
    for record in records {
        let cpf = record.cpf.trim();
        if cpf.is_empty() || cpf == NOT_AVAILABLE {
            continue;
        }
        by_cpf.entry(cpf).or_default().push(record);
    }

    let unique_cpfs = by_cpf.len();
    let groups = by_cpf
        .into_iter()
        .filter(|(_, group)| group.len() > 1)
        .map(|(cpf, group)| {
            let first = normalized_name(&group[0].full_name);
            let same_name = group.iter().all(|r| normalized_name(&r.full_name) == first);
            DuplicateGroup {
                cpf: cpf.to_string(),
                records: group.into_iter().cloned().collect(),
                same_name,
            }
        })
        .collect();

    DuplicateAnalysis { unique_cpfs, groups }
}

/// Totals for one local calendar day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub total: usize,
    pub presente: usize,
    pub justificado: usize,
    pub ausente: usize,
}

impl DaySummary {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total: 0,
            presente: 0,
            justificado: 0,
            ausente: 0,
        }
    }

    /// Share of `Presente` among the day's records (0 for an empty day)
    pub fn presence_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.presente as f64 / self.total as f64 * 100.0
        }
    }
}

/// One summary per day in `first..=last`, including days without records
///
/// Records are bucketed by the local date of their timestamp; untimed
/// records and records outside the window are ignored.
pub fn daily_summary(records: &[AttendanceRecord], first: NaiveDate, last: NaiveDate) -> Vec<DaySummary> {
    let mut days: Vec<DaySummary> = first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(DaySummary::empty)
        .collect();

    for record in records {
        let Some(ts) = record.timestamp else {
            continue;
        };
        let date = ts.date_naive();
        let Some(day) = days.iter_mut().find(|d| d.date == date) else {
            continue;
        };
        day.total += 1;
        match record.status {
            Status::Presente => day.presente += 1,
            Status::Justificado => day.justificado += 1,
            Status::Ausente => day.ausente += 1,
            Status::Other(_) => {}
        }
    }

    days
}
