//! Turns the wide purchase sheet (networks as rows, dates as columns) into a
//! date-indexed table with one column per network.

use crate::error::{PipelineError, Result};
use crate::normalize;
use crate::types::{PurchaseTable, RawWideSheet};
use crate::util::parse_f64_safe;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::debug;

pub fn transpose(sheet: &RawWideSheet, dates: &[NaiveDate]) -> Result<PurchaseTable> {
    let mut networks: Vec<String> = Vec::new();
    let mut series: Vec<Vec<f64>> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (r, row) in sheet.rows.iter().enumerate().skip(RawWideSheet::FIRST_DATA_ROW) {
        let data = row.get(RawWideSheet::FIRST_DATA_COL..).unwrap_or(&[]);
        let label = normalize::survey_label(sheet.cell(r, RawWideSheet::LABEL_COL));
        let Some(label) = label else {
            if data.iter().any(|c| c.is_some()) {
                return Err(PipelineError::format(
                    format!("row {} has purchase counts but no network label", r),
                    "",
                ));
            }
            continue;
        };
        if label == RawWideSheet::LABEL_MARKER {
            continue;
        }
        if let Some(extra) = data.iter().skip(dates.len()).flatten().next() {
            return Err(PipelineError::format(
                format!("network {:?} has a value past the last dated column", label),
                extra,
            ));
        }
        let values = data_values(&label, data, dates.len())?;
        if !seen.insert(label.clone()) {
            return Err(PipelineError::ambiguity(
                label,
                "network appears on more than one row of the purchase sheet",
            ));
        }
        networks.push(label);
        series.push(values);
    }

    let mut order: Vec<usize> = (0..dates.len()).collect();
    order.sort_by_key(|&i| dates[i]);
    if let Some(w) = order.windows(2).find(|w| dates[w[0]] == dates[w[1]]) {
        return Err(PipelineError::format(
            "reconstructed date axis contains a duplicate date",
            dates[w[0]],
        ));
    }

    let sorted_dates: Vec<NaiveDate> = order.iter().map(|&i| dates[i]).collect();
    let counts: Vec<Vec<f64>> = order
        .iter()
        .map(|&col| series.iter().map(|values| values[col]).collect())
        .collect();

    debug!(dates = sorted_dates.len(), networks = networks.len(), "transposed purchase sheet");
    Ok(PurchaseTable {
        dates: sorted_dates,
        networks,
        counts,
    })
}

fn data_values(label: &str, data: &[Option<String>], width: usize) -> Result<Vec<f64>> {
    (0..width)
        .map(|c| match data.get(c).and_then(|v| v.as_deref()) {
            None => Ok(0.0),
            Some(raw) => parse_f64_safe(Some(raw)).ok_or_else(|| {
                PipelineError::format(
                    format!(
                        "non-numeric purchase count for {:?} in column {}",
                        label,
                        c + RawWideSheet::FIRST_DATA_COL
                    ),
                    raw,
                )
            }),
        })
        .collect()
}

/// Back to one series per network, values in date order.
pub fn to_wide(table: &PurchaseTable) -> Vec<(String, Vec<f64>)> {
    table
        .networks
        .iter()
        .enumerate()
        .map(|(n, name)| {
            let values = table.counts.iter().map(|row| row[n]).collect();
            (name.clone(), values)
        })
        .collect()
}
