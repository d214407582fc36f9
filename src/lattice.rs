//! The dense (network, month) key set the monthly report is built on.

use crate::types::{LookupEntry, MonthBucket};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LatticeRow {
    pub entry: LookupEntry,
    pub month: MonthBucket,
}

/// Distinct months covered by a date axis, ascending.
pub fn months_of(dates: &[NaiveDate]) -> Vec<MonthBucket> {
    dates
        .iter()
        .map(|d| MonthBucket::of(*d))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Cartesian product of the distinct lookup entries and the distinct months.
///
/// Entries keep their first-occurrence order and, within each entry, months
/// run ascending.
pub fn cross_join(entries: &[LookupEntry], months: &[MonthBucket]) -> Vec<LatticeRow> {
    let mut seen_entries = HashSet::new();
    let entries: Vec<&LookupEntry> = entries.iter().filter(|e| seen_entries.insert(*e)).collect();
    let months: BTreeSet<MonthBucket> = months.iter().copied().collect();

    let mut rows = Vec::with_capacity(entries.len() * months.len());
    for entry in &entries {
        for month in &months {
            rows.push(LatticeRow {
                entry: (*entry).clone(),
                month: *month,
            });
        }
    }
    rows
}
