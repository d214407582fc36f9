//! Sums purchases, spend and lift per network (and per network per month) and
//! left-joins them onto the lookup table.
//!
//! Every key is normalized before it is compared: lookup labels and purchase
//! networks lower-case, lookup and airings tickers upper-case.

use crate::error::{PipelineError, Result};
use crate::lattice::LatticeRow;
use crate::normalize;
use crate::types::{AiringRecord, LookupEntry, MonthBucket, PurchaseTable, Totals};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpendLift {
    pub spend: f64,
    pub lift: f64,
}

/// Identifiers present in a source but absent from the lookup table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unmatched {
    pub survey_sources: Vec<String>,
    pub tickers: Vec<String>,
}

/// Normalize the lookup table and reject keys that would fan out a join.
pub fn normalized_lookup(entries: &[LookupEntry]) -> Result<Vec<LookupEntry>> {
    let mut labels = HashSet::new();
    let mut tickers = HashSet::new();
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let entry = normalize::lookup_entry(entry);
        if !labels.insert(entry.exit_survey.clone()) {
            return Err(PipelineError::ambiguity(
                entry.exit_survey,
                "exit-survey label appears on more than one lookup row",
            ));
        }
        if let Some(ticker) = &entry.airings {
            if !tickers.insert(ticker.clone()) {
                return Err(PipelineError::ambiguity(
                    ticker.clone(),
                    "airings ticker appears on more than one lookup row",
                ));
            }
        }
        out.push(entry);
    }
    Ok(out)
}

pub fn purchases_by_network(table: &PurchaseTable) -> HashMap<String, f64> {
    table
        .networks
        .iter()
        .enumerate()
        .map(|(n, name)| (name.clone(), table.network_total(n)))
        .collect()
}

pub fn purchases_by_network_month(table: &PurchaseTable) -> HashMap<(String, MonthBucket), f64> {
    let mut sums: HashMap<(String, MonthBucket), f64> = HashMap::new();
    for (date, row) in table.dates.iter().zip(&table.counts) {
        let month = MonthBucket::of(*date);
        for (name, count) in table.networks.iter().zip(row) {
            *sums.entry((name.clone(), month)).or_default() += count;
        }
    }
    sums
}

/// Airings without a ticker belong to no network and are left out.
pub fn spend_lift_by_ticker(airings: &[AiringRecord]) -> HashMap<String, SpendLift> {
    let mut sums: HashMap<String, SpendLift> = HashMap::new();
    for record in airings {
        let Some(ticker) = normalize::ticker(record.network.as_deref()) else {
            continue;
        };
        let e = sums.entry(ticker).or_default();
        e.spend += record.spend;
        e.lift += record.lift;
    }
    sums
}

/// Airings without a timestamp belong to no month and are left out.
pub fn spend_lift_by_ticker_month(
    airings: &[AiringRecord],
) -> HashMap<(String, MonthBucket), SpendLift> {
    let mut sums: HashMap<(String, MonthBucket), SpendLift> = HashMap::new();
    for record in airings {
        let (Some(ticker), Some(ts)) = (normalize::ticker(record.network.as_deref()), record.aired_at)
        else {
            continue;
        };
        let e = sums.entry((ticker, MonthBucket::of_datetime(ts))).or_default();
        e.spend += record.spend;
        e.lift += record.lift;
    }
    sums
}

/// Dated airings whose month is not in `months`, as a count and their summed
/// spend and lift. The monthly grid has no cell for them.
pub fn outside_months(airings: &[AiringRecord], months: &[MonthBucket]) -> (usize, SpendLift) {
    let months: HashSet<&MonthBucket> = months.iter().collect();
    let mut count = 0;
    let mut sums = SpendLift::default();
    for record in airings {
        let Some(ts) = record.aired_at else {
            continue;
        };
        if !months.contains(&MonthBucket::of_datetime(ts)) {
            count += 1;
            sums.spend += record.spend;
            sums.lift += record.lift;
        }
    }
    (count, sums)
}

/// One row per lookup entry, in lookup order. Fields with no matching
/// purchases or airings stay `None`.
pub fn overall(
    entries: &[LookupEntry],
    table: &PurchaseTable,
    airings: &[AiringRecord],
) -> Result<Vec<Totals>> {
    let entries = normalized_lookup(entries)?;
    let purchases = purchases_by_network(table);
    let spend_lift = spend_lift_by_ticker(airings);

    let rows: Vec<Totals> = entries
        .into_iter()
        .map(|entry| {
            let sl = entry.airings.as_ref().and_then(|t| spend_lift.get(t));
            Totals {
                purchases: purchases.get(&entry.exit_survey).copied(),
                spend: sl.map(|s| s.spend),
                lift: sl.map(|s| s.lift),
                network: entry.exit_survey,
                ticker: entry.airings,
                month: None,
            }
        })
        .collect();
    debug!(rows = rows.len(), "aggregated overall totals");
    Ok(rows)
}

/// One row per lattice cell, in lattice order.
pub fn monthly(
    lattice: &[LatticeRow],
    table: &PurchaseTable,
    airings: &[AiringRecord],
) -> Result<Vec<Totals>> {
    let mut distinct = HashSet::new();
    let entries: Vec<LookupEntry> = lattice
        .iter()
        .filter(|r| distinct.insert(&r.entry))
        .map(|r| r.entry.clone())
        .collect();
    normalized_lookup(&entries)?;

    let purchases = purchases_by_network_month(table);
    let spend_lift = spend_lift_by_ticker_month(airings);

    let rows: Vec<Totals> = lattice
        .iter()
        .map(|cell| {
            let entry = normalize::lookup_entry(&cell.entry);
            let sl = entry
                .airings
                .as_ref()
                .and_then(|t| spend_lift.get(&(t.clone(), cell.month)));
            Totals {
                purchases: purchases.get(&(entry.exit_survey.clone(), cell.month)).copied(),
                spend: sl.map(|s| s.spend),
                lift: sl.map(|s| s.lift),
                network: entry.exit_survey,
                ticker: entry.airings,
                month: Some(cell.month),
            }
        })
        .collect();
    debug!(rows = rows.len(), "aggregated monthly totals");
    Ok(rows)
}

pub fn unmatched(
    entries: &[LookupEntry],
    table: &PurchaseTable,
    airings: &[AiringRecord],
) -> Unmatched {
    let entries: Vec<LookupEntry> = entries.iter().map(normalize::lookup_entry).collect();
    let labels: HashSet<&str> = entries.iter().map(|e| e.exit_survey.as_str()).collect();
    let tickers: HashSet<&str> = entries.iter().filter_map(|e| e.airings.as_deref()).collect();

    let survey_sources: BTreeSet<String> = table
        .networks
        .iter()
        .filter_map(|n| normalize::survey_label(Some(n.as_str())))
        .filter(|n| !labels.contains(n.as_str()))
        .collect();
    let unmatched_tickers: BTreeSet<String> = airings
        .iter()
        .filter_map(|a| normalize::ticker(a.network.as_deref()))
        .filter(|t| !tickers.contains(t.as_str()))
        .collect();

    Unmatched {
        survey_sources: survey_sources.into_iter().collect(),
        tickers: unmatched_tickers.into_iter().collect(),
    }
}
