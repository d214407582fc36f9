use crate::error::Result;
use crate::pipeline::CampaignReports;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

pub fn write_csv_to<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    write_csv_to(std::fs::File::create(path)?, rows)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Paths of the files written by [`write_reports`].
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenReports {
    pub by_network: PathBuf,
    pub by_network_month: PathBuf,
    pub summary: PathBuf,
}

/// Write both report tables as CSV and the summary as JSON into `dir`.
pub fn write_reports(dir: &Path, reports: &CampaignReports) -> Result<WrittenReports> {
    std::fs::create_dir_all(dir)?;
    let suffix = reports.file_suffix();
    let written = WrittenReports {
        by_network: dir.join(format!("purchases_spend_lift_by_network_{}.csv", suffix)),
        by_network_month: dir.join(format!(
            "purchases_spend_lift_by_network_and_month_{}.csv",
            suffix
        )),
        summary: dir.join("summary.json"),
    };
    write_csv(&written.by_network, &reports.by_network)?;
    write_csv(&written.by_network_month, &reports.by_network_month)?;
    write_json(&written.summary, &reports.summary)?;
    info!(dir = %dir.display(), "reports written");
    Ok(written)
}

/// Markdown rendering of the first `max_rows` rows, or `None` when there are
/// no rows.
pub fn render_preview<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    match render_preview(rows, max_rows) {
        Some(table) => println!("{}\n", table),
        None => println!("(no rows)\n"),
    }
}
