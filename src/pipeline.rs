//! End-to-end report generation: header reconstruction, transposition,
//! aggregation, metrics and final assembly. Nothing is returned unless every
//! stage succeeds.

use crate::aggregate;
use crate::calendar::{self, SheetHeader};
use crate::error::Result;
use crate::lattice;
use crate::normalize;
use crate::reports;
use crate::transpose;
use crate::types::{
    AiringRecord, CampaignSummary, LookupEntry, MonthlyReportRow, NetworkReportRow, RawWideSheet,
};
use tracing::{info, warn};

/// The three source tables as handed over by ingestion.
#[derive(Debug, Clone, Default)]
pub struct CampaignInputs {
    pub sheet: RawWideSheet,
    pub airings: Vec<AiringRecord>,
    pub lookup: Vec<LookupEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignReports {
    pub header: SheetHeader,
    pub by_network: Vec<NetworkReportRow>,
    pub by_network_month: Vec<MonthlyReportRow>,
    pub summary: CampaignSummary,
}

impl CampaignReports {
    /// `2024_January_February`: campaign year followed by its month names.
    pub fn file_suffix(&self) -> String {
        let mut parts = vec![self.header.year.to_string()];
        parts.extend(self.header.month_names());
        parts.join("_")
    }
}

pub fn run(inputs: &CampaignInputs) -> Result<CampaignReports> {
    let (header, dates) = calendar::date_axis(&inputs.sheet)?;
    let table = transpose::transpose(&inputs.sheet, &dates)?;

    let lookup = aggregate::normalized_lookup(&inputs.lookup)?;
    let airings: Vec<AiringRecord> = inputs.airings.iter().map(normalize::airing).collect();

    let unmatched = aggregate::unmatched(&lookup, &table, &airings);
    if !unmatched.survey_sources.is_empty() {
        warn!(sources = ?unmatched.survey_sources, "purchase networks missing from lookup");
    }
    if !unmatched.tickers.is_empty() {
        warn!(tickers = ?unmatched.tickers, "airings tickers missing from lookup");
    }

    let overall_totals = aggregate::overall(&lookup, &table, &airings)?;
    let months = lattice::months_of(&table.dates);
    let grid = lattice::cross_join(&lookup, &months);
    let (stray, stray_sums) = aggregate::outside_months(&airings, &months);
    if stray > 0 {
        warn!(
            airings = stray,
            spend = stray_sums.spend,
            lift = stray_sums.lift,
            "airings outside the purchase months are left out of the monthly report"
        );
    }
    let monthly_totals = aggregate::monthly(&grid, &table, &airings)?;

    let overall_metrics = reports::compute_metrics(&overall_totals);
    let monthly_metrics = reports::compute_metrics(&monthly_totals);

    let by_network = reports::network_report(&overall_metrics);
    let by_network_month = reports::monthly_report(&monthly_metrics, &by_network);
    let summary = reports::generate_summary(
        header.year,
        header.month_names(),
        &by_network,
        &overall_metrics,
        &table,
        unmatched,
    );

    info!(
        networks = by_network.len(),
        months = months.len(),
        monthly_rows = by_network_month.len(),
        "reports assembled"
    );
    Ok(CampaignReports {
        header,
        by_network,
        by_network_month,
        summary,
    })
}
