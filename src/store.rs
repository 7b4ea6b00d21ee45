use chrono::NaiveDate;
use tracing::warn;

use crate::record::{RawRecord, Record};

/// Read-only, insertion-ordered collection of normalized records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    records: Vec<Record>,
}

/// Parses every raw record's date, dropping the ones without a usable date.
///
/// A record with no governing date header, or whose date is not a calendar
/// date, is excluded; the rest of the batch is kept in order.
pub fn normalize(raw: Vec<RawRecord>) -> RecordStore {
    let total = raw.len();
    let records: Vec<Record> = raw
        .into_iter()
        .filter_map(|r| match Record::try_from(r) {
            Ok(record) => Some(record),
            Err(rejected) => {
                match rejected.date {
                    None => warn!("Dropping entry with no date header: {}", rejected.url),
                    Some(ref d) => warn!("Dropping entry with unparseable date '{}': {}", d, rejected.url),
                }
                None
            }
        })
        .collect();

    if records.len() < total {
        warn!("Normalized {} of {} records", records.len(), total);
    }

    RecordStore { records }
}

impl RecordStore {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Records satisfying `predicate`, in store order.
    pub fn select<P>(&self, predicate: P) -> Vec<&Record>
    where
        P: Fn(&Record) -> bool,
    {
        self.records.iter().filter(|r| predicate(r)).collect()
    }

    /// Distinct sources in order of first appearance.
    pub fn sources(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.source.as_str()) {
                seen.push(&record.source);
            }
        }
        seen
    }

    /// Earliest and latest dates, or `None` for an empty store.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
