use crate::error::{PipelineError, Result};
use crate::types::{AiringRecord, LookupEntry, RawWideSheet};
use crate::util::{parse_datetime_safe, parse_f64_safe};
use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub blank_rows: usize,
}

#[derive(Debug, Deserialize)]
struct RawAiringRow {
    #[serde(rename = "Network")]
    network: Option<String>,
    #[serde(rename = "Date/Time ET", alias = "Date/Time")]
    date_time: Option<String>,
    #[serde(rename = "Spend")]
    spend: Option<String>,
    #[serde(rename = "Lift")]
    lift: Option<String>,
}

fn blank_to_none(field: &str) -> Option<String> {
    let trimmed = field.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn non_blank(field: Option<String>) -> Option<String> {
    field.as_deref().and_then(blank_to_none)
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|f| f.trim().is_empty())
}

/// Read the purchase sheet as a headerless, ragged grid.
///
/// The reader skips lines that are completely empty, so blank sheet rows must
/// be exported with their delimiters (`,,,`) to keep row positions intact. A
/// sheet whose header rows have moved is rejected.
pub fn read_wide_sheet<R: Read>(reader: R) -> Result<RawWideSheet> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(blank_to_none).collect());
    }
    let sheet = RawWideSheet::new(rows);
    check_header_rows(&sheet)?;
    Ok(sheet)
}

/// The day row carries either nothing or the `Source` marker in the network
/// column. A network label there means a blank line was lost and every header
/// row shifted up.
fn check_header_rows(sheet: &RawWideSheet) -> Result<()> {
    if sheet.rows.len() < RawWideSheet::FIRST_DATA_ROW {
        return Err(PipelineError::format(
            format!(
                "purchase sheet has {} rows, expected at least {} header rows",
                sheet.rows.len(),
                RawWideSheet::FIRST_DATA_ROW
            ),
            "",
        ));
    }
    match sheet.cell(RawWideSheet::DAY_ROW, RawWideSheet::LABEL_COL) {
        Some(label) if !label.eq_ignore_ascii_case(RawWideSheet::LABEL_MARKER) => {
            Err(PipelineError::format(
                format!(
                    "expected the day row on line {} (blank lines must keep their delimiters)",
                    RawWideSheet::DAY_ROW + 1
                ),
                label,
            ))
        }
        _ => Ok(()),
    }
}

pub fn load_wide_sheet(path: &Path) -> Result<RawWideSheet> {
    let sheet = read_wide_sheet(std::fs::File::open(path)?)?;
    info!(path = %path.display(), rows = sheet.rows.len(), "loaded purchase sheet");
    Ok(sheet)
}

pub fn read_airings<R: Read>(reader: R) -> Result<(Vec<AiringRecord>, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        report.total_rows += 1;
        // Header is line 1, so the first record is line 2.
        let line = idx + 2;
        let record = result?;
        if is_blank(&record) {
            report.blank_rows += 1;
            continue;
        }
        let row: RawAiringRow = record.deserialize(Some(&headers))?;
        let network = non_blank(row.network);
        let aired_at = match non_blank(row.date_time) {
            None => None,
            Some(raw) => Some(parse_datetime_safe(Some(&raw)).ok_or_else(|| {
                PipelineError::format(format!("unparseable airing timestamp on line {}", line), &raw)
            })?),
        };
        let spend = number_or_zero(row.spend, "Spend", line)?;
        let lift = number_or_zero(row.lift, "Lift", line)?;
        records.push(AiringRecord {
            network,
            aired_at,
            spend,
            lift,
        });
    }
    report.kept_rows = records.len();
    Ok((records, report))
}

fn number_or_zero(field: Option<String>, column: &str, line: usize) -> Result<f64> {
    match non_blank(field) {
        None => Ok(0.0),
        Some(raw) => parse_f64_safe(Some(&raw)).ok_or_else(|| {
            PipelineError::format(format!("non-numeric {} on line {}", column, line), &raw)
        }),
    }
}

pub fn load_airings(path: &Path) -> Result<(Vec<AiringRecord>, LoadReport)> {
    let (records, report) = read_airings(std::fs::File::open(path)?)?;
    info!(
        path = %path.display(),
        rows = report.total_rows,
        kept = report.kept_rows,
        blank = report.blank_rows,
        "loaded airings"
    );
    Ok((records, report))
}

/// Read the lookup sheet. Its first row is a description and the second the
/// header; only the first `Exit Survey` column and the `Airings` column are
/// kept, which drops the duplicated description column.
pub fn read_lookup<R: Read>(reader: R) -> Result<(Vec<LookupEntry>, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = rdr.records();
    // Description row.
    records.next().transpose()?;
    let header = records
        .next()
        .transpose()?
        .ok_or_else(|| PipelineError::format("lookup sheet has no header row", ""))?;
    let column = |name: &str| {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                PipelineError::format(
                    format!("lookup sheet has no {:?} column", name),
                    header.iter().collect::<Vec<_>>().join(","),
                )
            })
    };
    let survey_col = column("Exit Survey")?;
    let airings_col = column("Airings")?;

    let mut report = LoadReport::default();
    let mut entries = Vec::new();
    for (idx, result) in records.enumerate() {
        report.total_rows += 1;
        let line = idx + 3;
        let record = result?;
        if is_blank(&record) {
            report.blank_rows += 1;
            continue;
        }
        let survey = record.get(survey_col).and_then(blank_to_none);
        let ticker = record.get(airings_col).and_then(blank_to_none);
        match (survey, ticker) {
            (Some(exit_survey), airings) => entries.push(LookupEntry {
                exit_survey,
                airings,
            }),
            (None, Some(ticker)) => {
                return Err(PipelineError::format(
                    format!("lookup line {} has a ticker but no exit-survey label", line),
                    ticker,
                ));
            }
            // Only the description column is filled in.
            (None, None) => report.blank_rows += 1,
        }
    }
    report.kept_rows = entries.len();
    Ok((entries, report))
}

pub fn load_lookup(path: &Path) -> Result<(Vec<LookupEntry>, LoadReport)> {
    let (entries, report) = read_lookup(std::fs::File::open(path)?)?;
    info!(
        path = %path.display(),
        rows = report.total_rows,
        kept = report.kept_rows,
        blank = report.blank_rows,
        "loaded lookup"
    );
    Ok((entries, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_read_wide_sheet_ragged() {
        let csv = "2021,,\n,,\n,,September\n,Source,29,30\n,CNBC,1, \n";
        let sheet = read_wide_sheet(csv.as_bytes()).unwrap();
        assert_eq!(sheet.cell(0, 0), Some("2021"));
        assert_eq!(sheet.cell(2, 2), Some("September"));
        assert_eq!(sheet.cell(3, 1), Some("Source"));
        assert_eq!(sheet.cell(4, 3), None);
        assert_eq!(sheet.cell(9, 9), None);
    }

    #[test]
    fn test_read_wide_sheet_rejects_shifted_header() {
        // The blank second row was exported as an empty line and dropped.
        let csv = "2021,,\n\n,,September\n,Source,29,30\n,CNBC,1,2\n";
        match read_wide_sheet(csv.as_bytes()).unwrap_err() {
            PipelineError::Format { message, value } => {
                assert!(message.contains("line 4"));
                assert_eq!(value, "CNBC");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            read_wide_sheet("2021\n,,September\n".as_bytes()),
            Err(PipelineError::Format { .. })
        ));
    }

    #[test]
    fn test_read_airings() {
        let csv = "Network,Date/Time ET,Spend,Lift,Creative\n\
                   cnbc,2021-09-29 20:15:00,\"$1,200.50\",12,A\n\
                   ,,,,\n\
                   FOOD,,300,,B\n";
        let (records, report) = read_airings(csv.as_bytes()).unwrap();
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.blank_rows, 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].network.as_deref(), Some("cnbc"));
        assert_eq!(records[0].spend, 1200.5);
        assert_eq!(
            records[0].aired_at,
            NaiveDate::from_ymd_opt(2021, 9, 29).and_then(|d| d.and_hms_opt(20, 15, 0))
        );
        assert_eq!(records[1].aired_at, None);
        assert_eq!(records[1].lift, 0.0);
    }

    #[test]
    fn test_read_airings_rejects_bad_spend() {
        let csv = "Network,Date/Time,Spend,Lift\nCNBC,2021-09-29,lots,1\n";
        let err = read_airings(csv.as_bytes()).unwrap_err();
        match err {
            PipelineError::Format { message, value } => {
                assert!(message.contains("line 2"));
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_lookup_drops_description_and_empty_rows() {
        let csv = "Map exit survey answers to airings networks,,\n\
                   Exit Survey,Airings,Exit Survey\n\
                   cnbc,CNBC,CNBC (business)\n\
                   ,,\n\
                   other,,Other answers\n";
        let (entries, report) = read_lookup(csv.as_bytes()).unwrap();
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.blank_rows, 1);
        assert_eq!(
            entries,
            vec![
                LookupEntry {
                    exit_survey: "cnbc".to_string(),
                    airings: Some("CNBC".to_string()),
                },
                LookupEntry {
                    exit_survey: "other".to_string(),
                    airings: None,
                },
            ]
        );
    }

    #[test]
    fn test_read_lookup_ticker_without_label() {
        let csv = "desc\nExit Survey,Airings\n,CNBC\n";
        assert!(matches!(
            read_lookup(csv.as_bytes()),
            Err(PipelineError::Format { .. })
        ));
    }
}
