use crate::util::{display_count, display_metric, display_money, display_rate, display_ticker};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::fmt;
use tabled::Tabled;

/// The purchase exit-survey sheet as an untyped grid.
///
/// Row 0 holds the campaign year, row 2 the month names, row 3 one day number
/// per data column. Every row from 4 on is one network: column 1 is its label
/// and columns from 2 on are its daily purchase counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawWideSheet {
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawWideSheet {
    pub const YEAR_ROW: usize = 0;
    pub const MONTH_ROW: usize = 2;
    pub const DAY_ROW: usize = 3;
    pub const FIRST_DATA_ROW: usize = 4;
    pub const LABEL_COL: usize = 1;
    pub const FIRST_DATA_COL: usize = 2;
    /// Header label that sits in the network column of the day row.
    pub const LABEL_MARKER: &'static str = "source";

    pub fn new(rows: Vec<Vec<Option<String>>>) -> Self {
        Self { rows }
    }

    /// A row by index; missing rows read as empty.
    pub fn row(&self, idx: usize) -> &[Option<String>] {
        self.rows.get(idx).map(|r| r.as_slice()).unwrap_or(&[])
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.row(row).get(col).and_then(|c| c.as_deref())
    }
}

/// Pairs an exit-survey network label with its airings ticker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupEntry {
    pub exit_survey: String,
    pub airings: Option<String>,
}

/// One ad airing.
#[derive(Debug, Clone, PartialEq)]
pub struct AiringRecord {
    pub network: Option<String>,
    pub aired_at: Option<NaiveDateTime>,
    pub spend: f64,
    pub lift: f64,
}

/// Purchases by date (rows, ascending) and network (columns).
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseTable {
    pub dates: Vec<NaiveDate>,
    pub networks: Vec<String>,
    /// `counts[date_idx][network_idx]`
    pub counts: Vec<Vec<f64>>,
}

impl PurchaseTable {
    /// Total purchases of one network over every date.
    pub fn network_total(&self, network_idx: usize) -> f64 {
        self.counts.iter().map(|row| row[network_idx]).sum()
    }

    pub fn grand_total(&self) -> f64 {
        self.counts.iter().flat_map(|row| row.iter()).sum()
    }
}

/// A calendar month, keyed by its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthBucket(NaiveDate);

impl MonthBucket {
    pub fn of(date: NaiveDate) -> Self {
        // Day 1 exists in every month, so with_day(1) cannot fail here.
        MonthBucket(date.with_day(1).unwrap_or(date))
    }

    pub fn of_datetime(ts: NaiveDateTime) -> Self {
        Self::of(ts.date())
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn name(&self) -> String {
        self.0.format("%B").to_string()
    }
}

impl fmt::Display for MonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

impl Serialize for MonthBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Joined purchase/spend/lift sums for one network (and optionally one month).
/// `None` means the join found no matching row.
#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub network: String,
    pub ticker: Option<String>,
    pub month: Option<MonthBucket>,
    pub purchases: Option<f64>,
    pub spend: Option<f64>,
    pub lift: Option<f64>,
}

/// Totals with missing values filled and every derived metric computed,
/// still unrounded.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub network: String,
    pub ticker: Option<String>,
    pub month: Option<MonthBucket>,
    pub purchases: f64,
    pub spend: f64,
    pub lift: f64,
    pub conversion_rate: Option<f64>,
    pub cost_per_acquisition: Option<f64>,
    pub cost_per_visitor: Option<f64>,
    pub percent_of_purchases: Option<f64>,
    pub percent_of_spend: Option<f64>,
    pub purchase_share_exceeds_spend_share: bool,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct NetworkReportRow {
    #[serde(skip)]
    #[tabled(skip)]
    pub network: String,
    #[serde(rename = "Exit Survey Source")]
    #[tabled(rename = "Exit Survey Source")]
    pub source: String,
    #[serde(rename = "Network")]
    #[tabled(rename = "Network", display_with = "display_ticker")]
    pub ticker: Option<String>,
    #[serde(rename = "Purchases")]
    #[tabled(rename = "Purchases", display_with = "display_count")]
    pub purchases: i64,
    #[serde(rename = "Spend")]
    #[tabled(rename = "Spend", display_with = "display_money")]
    pub spend: f64,
    #[serde(rename = "Lift")]
    #[tabled(rename = "Lift", display_with = "display_count")]
    pub lift: i64,
    #[serde(rename = "Conversion Rate (Purchases/Lift)%")]
    #[tabled(rename = "Conversion Rate %", display_with = "display_rate")]
    pub conversion_rate: Option<f64>,
    #[serde(rename = "Cost Per Acquisition (Spend/Purchases)")]
    #[tabled(rename = "CPA", display_with = "display_metric")]
    pub cost_per_acquisition: Option<f64>,
    #[serde(rename = "Cost Per Visitor (Spend/Lift)")]
    #[tabled(rename = "CPV", display_with = "display_metric")]
    pub cost_per_visitor: Option<f64>,
    #[serde(rename = "Percent of Purchases")]
    #[tabled(rename = "% Purchases", display_with = "display_metric")]
    pub percent_of_purchases: Option<f64>,
    #[serde(rename = "Percent of Spend")]
    #[tabled(rename = "% Spend", display_with = "display_metric")]
    pub percent_of_spend: Option<f64>,
    #[serde(rename = "Percent Pur > Percent Spend")]
    #[tabled(rename = "% Pur > % Spend")]
    pub purchase_share_exceeds_spend_share: bool,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct MonthlyReportRow {
    #[serde(skip)]
    #[tabled(skip)]
    pub network: String,
    #[serde(rename = "Exit Survey Source")]
    #[tabled(rename = "Exit Survey Source")]
    pub source: String,
    #[serde(rename = "Network")]
    #[tabled(rename = "Network", display_with = "display_ticker")]
    pub ticker: Option<String>,
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: MonthBucket,
    #[serde(rename = "Purchases")]
    #[tabled(rename = "Purchases", display_with = "display_count")]
    pub purchases: i64,
    #[serde(rename = "Spend")]
    #[tabled(rename = "Spend", display_with = "display_money")]
    pub spend: f64,
    #[serde(rename = "Lift")]
    #[tabled(rename = "Lift", display_with = "display_count")]
    pub lift: i64,
    #[serde(rename = "Conversion Rate (Purchases/Lift)%")]
    #[tabled(rename = "Conversion Rate %", display_with = "display_rate")]
    pub conversion_rate: Option<f64>,
    #[serde(rename = "Cost Per Acquisition (Spend/Purchases)")]
    #[tabled(rename = "CPA", display_with = "display_metric")]
    pub cost_per_acquisition: Option<f64>,
    #[serde(rename = "Cost Per Visitor (Spend/Lift)")]
    #[tabled(rename = "CPV", display_with = "display_metric")]
    pub cost_per_visitor: Option<f64>,
    #[serde(rename = "Percent of Purchases")]
    #[tabled(rename = "% Purchases", display_with = "display_metric")]
    pub percent_of_purchases: Option<f64>,
    #[serde(rename = "Percent of Spend")]
    #[tabled(rename = "% Spend", display_with = "display_metric")]
    pub percent_of_spend: Option<f64>,
    #[serde(rename = "Percent Pur > Percent Spend")]
    #[tabled(rename = "% Pur > % Spend")]
    pub purchase_share_exceeds_spend_share: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NoSpendShare {
    pub source: String,
    pub purchases: f64,
    pub share_pct: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CampaignSummary {
    pub year: i32,
    pub months: Vec<String>,
    pub total_spend: f64,
    pub total_lift: f64,
    pub purchases_with_spend: f64,
    pub cost_per_acquisition: Option<f64>,
    pub cost_per_visitor: Option<f64>,
    pub conversion_rate: Option<f64>,
    pub total_campaign_purchases: f64,
    pub cost_per_acquisition_all_purchases: Option<f64>,
    pub conversion_rate_all_purchases: Option<f64>,
    pub no_spend_purchase_shares: Vec<NoSpendShare>,
    pub unmatched_survey_sources: Vec<String>,
    pub unmatched_tickers: Vec<String>,
}
