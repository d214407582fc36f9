//! Date axis reconstruction for the wide purchase sheet.
//!
//! The sheet carries no real dates: only a year, the list of month names in
//! first-occurrence order and one day-of-month per column. A day number that
//! is greater than the one after it marks the last day of a month.

use crate::error::{PipelineError, Result};
use crate::types::RawWideSheet;
use crate::util::parse_whole_safe;
use chrono::{Month, NaiveDate};
use tracing::debug;

/// The three header rows of the purchase sheet, parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetHeader {
    pub year: i32,
    pub months: Vec<Month>,
    pub days: Vec<u32>,
}

impl SheetHeader {
    pub fn month_names(&self) -> Vec<String> {
        self.months.iter().map(|m| m.name().to_string()).collect()
    }
}

pub fn read_header(sheet: &RawWideSheet) -> Result<SheetHeader> {
    let year = read_year(sheet)?;
    let months = read_months(sheet)?;
    let days = read_days(sheet)?;
    debug!(year, months = months.len(), columns = days.len(), "parsed sheet header");
    Ok(SheetHeader { year, months, days })
}

fn read_year(sheet: &RawWideSheet) -> Result<i32> {
    let cells: Vec<&str> = sheet
        .row(RawWideSheet::YEAR_ROW)
        .iter()
        .filter_map(|c| c.as_deref())
        .collect();
    let [cell] = cells.as_slice() else {
        return Err(PipelineError::format(
            "year row must hold exactly one value",
            cells.join(", "),
        ));
    };
    parse_whole_safe(Some(*cell))
        .and_then(|y| i32::try_from(y).ok())
        .ok_or_else(|| PipelineError::format("year is not an integer", cell))
}

fn read_months(sheet: &RawWideSheet) -> Result<Vec<Month>> {
    let row = sheet.row(RawWideSheet::MONTH_ROW);
    let mut months: Vec<Month> = Vec::new();
    for cell in row.iter().skip(RawWideSheet::FIRST_DATA_COL).flatten() {
        let month: Month = cell
            .trim()
            .parse()
            .map_err(|_| PipelineError::format("unrecognized month name", cell))?;
        if let Some(prev) = months.last().copied() {
            if month.number_from_month() <= prev.number_from_month() {
                return Err(PipelineError::format(
                    "month names are not in calendar order within one year",
                    format!("{} then {}", prev.name(), month.name()),
                ));
            }
        }
        months.push(month);
    }
    if months.is_empty() {
        return Err(PipelineError::format("month row is empty", ""));
    }
    Ok(months)
}

fn read_days(sheet: &RawWideSheet) -> Result<Vec<u32>> {
    let row = sheet.row(RawWideSheet::DAY_ROW);
    let cells = row.get(RawWideSheet::FIRST_DATA_COL..).unwrap_or(&[]);
    let width = cells.iter().rposition(|c| c.is_some()).map_or(0, |i| i + 1);
    cells[..width]
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let col = i + RawWideSheet::FIRST_DATA_COL;
            let raw = cell.as_deref().ok_or_else(|| {
                PipelineError::format(format!("missing day number in column {}", col), "")
            })?;
            parse_whole_safe(Some(raw))
                .filter(|d| (1..=31).contains(d))
                .map(|d| d as u32)
                .ok_or_else(|| {
                    PipelineError::format(format!("bad day number in column {}", col), raw)
                })
        })
        .collect()
}

/// Assign a calendar date to every data column.
///
/// Walks the day numbers with a month cursor starting at `months[0]`. When a
/// day is greater than its successor, that day is emitted in the current month
/// and the cursor then advances. The final column has no successor and is
/// always emitted in the current month.
pub fn build_date_axis(year: i32, months: &[Month], days: &[u32]) -> Result<Vec<NaiveDate>> {
    let Some(first) = months.first() else {
        return Err(PipelineError::format("no month names supplied", ""));
    };
    let mut cursor = 0usize;
    let mut current = *first;
    let mut dates = Vec::with_capacity(days.len());

    for (i, &day) in days.iter().enumerate() {
        let date = NaiveDate::from_ymd_opt(year, current.number_from_month(), day)
            .ok_or_else(|| {
                PipelineError::format(
                    "header produces an invalid calendar date",
                    format!("{}-{}-{}", year, current.name(), day),
                )
            })?;
        dates.push(date);

        if matches!(days.get(i + 1), Some(&next) if day > next) {
            cursor += 1;
            current = *months.get(cursor).ok_or_else(|| {
                PipelineError::format(
                    format!(
                        "day sequence rolls over more often than the {} month(s) listed",
                        months.len()
                    ),
                    format!("column {}: {} -> {}", i, day, days[i + 1]),
                )
            })?;
        }
    }

    if cursor + 1 != months.len() {
        return Err(PipelineError::format(
            format!(
                "{} month(s) listed but the day sequence rolls over {} time(s)",
                months.len(),
                cursor
            ),
            months.iter().map(|m| m.name()).collect::<Vec<_>>().join(", "),
        ));
    }
    Ok(dates)
}

/// Read the header rows and reconstruct the date of every data column.
pub fn date_axis(sheet: &RawWideSheet) -> Result<(SheetHeader, Vec<NaiveDate>)> {
    let header = read_header(sheet)?;
    let dates = build_date_axis(header.year, &header.months, &header.days)?;
    Ok((header, dates))
}
