use crate::types::{
    CampaignSummary, MetricRow, MonthlyReportRow, NetworkReportRow, NoSpendShare, PurchaseTable,
    Totals,
};
use crate::aggregate::Unmatched;
use crate::util::{ratio, round_to, round_to_int, title_case};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Fill missing sums with zero and derive every ratio metric.
pub fn compute_metrics(rows: &[Totals]) -> Vec<MetricRow> {
    let mut out: Vec<MetricRow> = rows
        .iter()
        .map(|r| {
            let purchases = r.purchases.unwrap_or(0.0);
            let spend = r.spend.unwrap_or(0.0);
            let lift = r.lift.unwrap_or(0.0);
            MetricRow {
                network: r.network.clone(),
                ticker: r.ticker.clone(),
                month: r.month,
                purchases,
                spend,
                lift,
                conversion_rate: ratio(purchases, lift).map(|v| v * 100.0),
                cost_per_acquisition: ratio(spend, purchases),
                cost_per_visitor: ratio(spend, lift),
                percent_of_purchases: None,
                percent_of_spend: None,
                purchase_share_exceeds_spend_share: false,
            }
        })
        .collect();
    assign_shares(&mut out);
    out
}

/// Recompute both percentage fields against the grand totals of `rows`.
///
/// Runs again after a report drops rows, so the emitted percentages always
/// add up to 100 over the rows that are actually emitted.
fn assign_shares(rows: &mut [MetricRow]) {
    let total_purchases: f64 = rows.iter().map(|r| r.purchases).sum();
    let total_spend: f64 = rows.iter().map(|r| r.spend).sum();
    for r in rows.iter_mut() {
        r.percent_of_purchases = ratio(r.purchases, total_purchases).map(|v| v * 100.0);
        r.percent_of_spend = ratio(r.spend, total_spend).map(|v| v * 100.0);
        r.purchase_share_exceeds_spend_share = matches!(
            (r.percent_of_purchases, r.percent_of_spend),
            (Some(p), Some(s)) if p > s
        );
    }
}

/// The rounded, integer-typed view of one metric row.
struct Rounded {
    purchases: i64,
    spend: f64,
    lift: i64,
    conversion_rate: Option<f64>,
    cost_per_acquisition: Option<f64>,
    cost_per_visitor: Option<f64>,
    percent_of_purchases: Option<f64>,
    percent_of_spend: Option<f64>,
}

fn rounded(row: &MetricRow) -> Rounded {
    Rounded {
        purchases: round_to_int(row.purchases),
        spend: round_to(row.spend, 2),
        lift: round_to_int(row.lift),
        conversion_rate: row.conversion_rate.map(|v| round_to(v, 1)),
        cost_per_acquisition: row.cost_per_acquisition.map(|v| round_to(v, 2)),
        cost_per_visitor: row.cost_per_visitor.map(|v| round_to(v, 2)),
        percent_of_purchases: row.percent_of_purchases.map(|v| round_to(v, 2)),
        percent_of_spend: row.percent_of_spend.map(|v| round_to(v, 2)),
    }
}

/// Overall report: networks with spend, sorted by identifier. Percentages
/// are shares of the networks that remain.
pub fn network_report(rows: &[MetricRow]) -> Vec<NetworkReportRow> {
    let mut kept: Vec<MetricRow> = rows.iter().filter(|r| r.spend > 0.0).cloned().collect();
    assign_shares(&mut kept);
    let mut out: Vec<NetworkReportRow> = kept
        .iter()
        .map(|r| {
            let v = rounded(r);
            NetworkReportRow {
                network: r.network.clone(),
                source: title_case(&r.network),
                ticker: r.ticker.clone(),
                purchases: v.purchases,
                spend: v.spend,
                lift: v.lift,
                conversion_rate: v.conversion_rate,
                cost_per_acquisition: v.cost_per_acquisition,
                cost_per_visitor: v.cost_per_visitor,
                percent_of_purchases: v.percent_of_purchases,
                percent_of_spend: v.percent_of_spend,
                purchase_share_exceeds_spend_share: r.purchase_share_exceeds_spend_share,
            }
        })
        .collect();
    out.sort_by(|a, b| a.network.cmp(&b.network));
    out
}

/// Monthly report restricted to the networks of the overall report, in the
/// same network order, months ascending. No monthly row is filtered on its
/// own values; percentages are shares of the rows that remain.
pub fn monthly_report(rows: &[MetricRow], overall: &[NetworkReportRow]) -> Vec<MonthlyReportRow> {
    let mut by_network: HashMap<&str, Vec<&MetricRow>> = HashMap::new();
    for r in rows.iter().filter(|r| r.month.is_some()) {
        by_network.entry(r.network.as_str()).or_default().push(r);
    }

    let mut kept: Vec<MetricRow> = Vec::new();
    for net in overall {
        let Some(months) = by_network.get_mut(net.network.as_str()) else {
            continue;
        };
        months.sort_by_key(|r| r.month);
        kept.extend(months.iter().map(|r| (*r).clone()));
    }
    assign_shares(&mut kept);

    kept.iter()
        .filter_map(|r| {
            let month = r.month?;
            let v = rounded(r);
            Some(MonthlyReportRow {
                network: r.network.clone(),
                source: title_case(&r.network),
                ticker: r.ticker.clone(),
                month,
                purchases: v.purchases,
                spend: v.spend,
                lift: v.lift,
                conversion_rate: v.conversion_rate,
                cost_per_acquisition: v.cost_per_acquisition,
                cost_per_visitor: v.cost_per_visitor,
                percent_of_purchases: v.percent_of_purchases,
                percent_of_spend: v.percent_of_spend,
                purchase_share_exceeds_spend_share: r.purchase_share_exceeds_spend_share,
            })
        })
        .collect()
}

pub fn generate_summary(
    year: i32,
    months: Vec<String>,
    overall: &[NetworkReportRow],
    metrics: &[MetricRow],
    table: &PurchaseTable,
    unmatched: Unmatched,
) -> CampaignSummary {
    let total_spend: f64 = overall.iter().map(|r| r.spend).sum();
    let total_lift: f64 = overall.iter().map(|r| r.lift as f64).sum();
    let purchases_with_spend: f64 = overall.iter().map(|r| r.purchases as f64).sum();
    let total_campaign_purchases = table.grand_total();

    let no_spend: Vec<&MetricRow> = metrics
        .iter()
        .filter(|r| r.spend == 0.0 && r.purchases > 0.0)
        .collect();
    let no_spend_total: f64 = no_spend.iter().map(|r| r.purchases).sum();
    let mut no_spend_purchase_shares: Vec<NoSpendShare> = no_spend
        .iter()
        .map(|r| NoSpendShare {
            source: title_case(&r.network),
            purchases: r.purchases,
            share_pct: round_to(r.purchases / no_spend_total * 100.0, 2),
        })
        .collect();
    no_spend_purchase_shares.sort_by(|a, b| {
        b.share_pct
            .partial_cmp(&a.share_pct)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.source.cmp(&b.source))
    });

    CampaignSummary {
        year,
        months,
        total_spend: round_to(total_spend, 2),
        total_lift,
        purchases_with_spend,
        cost_per_acquisition: ratio(total_spend, purchases_with_spend).map(|v| round_to(v, 2)),
        cost_per_visitor: ratio(total_spend, total_lift).map(|v| round_to(v, 2)),
        conversion_rate: ratio(purchases_with_spend, total_lift).map(|v| round_to(v * 100.0, 1)),
        total_campaign_purchases,
        cost_per_acquisition_all_purchases: ratio(total_spend, total_campaign_purchases)
            .map(|v| round_to(v, 2)),
        conversion_rate_all_purchases: ratio(total_campaign_purchases, total_lift)
            .map(|v| round_to(v * 100.0, 1)),
        no_spend_purchase_shares,
        unmatched_survey_sources: unmatched.survey_sources,
        unmatched_tickers: unmatched.tickers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MonthBucket;
    use chrono::NaiveDate;

    fn totals(network: &str, p: Option<f64>, s: Option<f64>, l: Option<f64>) -> Totals {
        Totals {
            network: network.to_string(),
            ticker: Some(network.to_uppercase()),
            month: None,
            purchases: p,
            spend: s,
            lift: l,
        }
    }

    fn month(m: u32) -> MonthBucket {
        MonthBucket::of(NaiveDate::from_ymd_opt(2024, m, 1).unwrap())
    }

    #[test]
    fn test_metrics_for_single_network() {
        let m = compute_metrics(&[totals("foo", Some(8.0), Some(300.0), Some(50.0))]);
        assert_eq!(m[0].conversion_rate, Some(16.0));
        assert_eq!(m[0].cost_per_acquisition, Some(37.5));
        assert_eq!(m[0].cost_per_visitor, Some(6.0));
        assert_eq!(m[0].percent_of_purchases, Some(100.0));
        assert!(!m[0].purchase_share_exceeds_spend_share);
    }

    #[test]
    fn test_zero_purchases_gives_undefined_cpa() {
        let m = compute_metrics(&[
            totals("a", Some(0.0), Some(100.0), Some(10.0)),
            totals("b", Some(4.0), Some(0.0), Some(0.0)),
        ]);
        assert_eq!(m[0].cost_per_acquisition, None);
        assert_eq!(m[0].conversion_rate, Some(0.0));
        assert_eq!(m[1].conversion_rate, None);
        assert_eq!(m[1].cost_per_visitor, None);
        assert_eq!(m[1].cost_per_acquisition, Some(0.0));
        assert!(m[1].purchase_share_exceeds_spend_share);
    }

    #[test]
    fn test_missing_values_filled_with_zero() {
        let m = compute_metrics(&[totals("orphan", None, None, None)]);
        assert_eq!((m[0].purchases, m[0].spend, m[0].lift), (0.0, 0.0, 0.0));
        assert_eq!(m[0].percent_of_purchases, None);
        assert_eq!(m[0].percent_of_spend, None);
        assert!(!m[0].purchase_share_exceeds_spend_share);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let m = compute_metrics(&[
            totals("a", Some(3.0), Some(10.0), Some(1.0)),
            totals("b", Some(7.0), Some(20.0), Some(1.0)),
            totals("c", Some(11.0), None, None),
        ]);
        let pur: f64 = m.iter().filter_map(|r| r.percent_of_purchases).sum();
        let spend: f64 = m.iter().filter_map(|r| r.percent_of_spend).sum();
        assert!((pur - 100.0).abs() < 1e-9);
        assert!((spend - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_filtered_reports_rescale_percentages() {
        let overall_metrics = compute_metrics(&[
            totals("foo", Some(8.0), Some(300.0), Some(50.0)),
            totals("bar", Some(2.0), Some(100.0), Some(10.0)),
            totals("no_spend", Some(4.0), Some(0.0), Some(0.0)),
        ]);
        let overall = network_report(&overall_metrics);
        let pur: f64 = overall.iter().filter_map(|r| r.percent_of_purchases).sum();
        let spend: f64 = overall.iter().filter_map(|r| r.percent_of_spend).sum();
        assert!((pur - 100.0).abs() < 0.05);
        assert!((spend - 100.0).abs() < 0.05);
        assert_eq!(overall[1].percent_of_purchases, Some(80.0));
        assert_eq!(overall[1].percent_of_spend, Some(75.0));
        assert!(overall[1].purchase_share_exceeds_spend_share);

        let mut rows = Vec::new();
        for (name, p, s) in [("foo", 4.0, 150.0), ("bar", 1.0, 50.0), ("no_spend", 2.0, 0.0)] {
            for m in [1, 2] {
                let mut t = totals(name, Some(p), Some(s), Some(5.0));
                t.month = Some(month(m));
                rows.push(t);
            }
        }
        let monthly = monthly_report(&compute_metrics(&rows), &overall);
        assert_eq!(monthly.len(), 4);
        let pur: f64 = monthly.iter().filter_map(|r| r.percent_of_purchases).sum();
        assert!((pur - 100.0).abs() < 0.05);
        assert_eq!(monthly[0].percent_of_purchases, Some(10.0));
    }

    #[test]
    fn test_network_report_filters_and_sorts() {
        let m = compute_metrics(&[
            totals("zeetv", Some(1.0), Some(10.004), Some(3.4)),
            totals("no_spend", Some(9.0), Some(0.0), Some(0.0)),
            totals("abc", Some(2.6), Some(5.0), Some(2.5)),
        ]);
        let report = network_report(&m);
        let names: Vec<&str> = report.iter().map(|r| r.network.as_str()).collect();
        assert_eq!(names, vec!["abc", "zeetv"]);
        assert_eq!(report[0].purchases, 3);
        assert_eq!(report[0].lift, 2);
        assert_eq!(report[1].spend, 10.0);
        assert_eq!(report[1].source, "Zeetv");
    }

    #[test]
    fn test_monthly_report_follows_overall_networks() {
        let mut rows = Vec::new();
        for (name, spend) in [("b", 5.0), ("a", 0.0), ("c", 1.0)] {
            for m in [2, 1] {
                let mut t = totals(name, Some(1.0), Some(spend), Some(1.0));
                t.month = Some(month(m));
                rows.push(t);
            }
        }
        let monthly = compute_metrics(&rows);
        let overall = network_report(&compute_metrics(&[
            totals("b", Some(2.0), Some(10.0), Some(2.0)),
            totals("a", Some(2.0), Some(0.0), Some(2.0)),
            totals("c", Some(2.0), Some(2.0), Some(2.0)),
        ]));
        let report = monthly_report(&monthly, &overall);
        let keys: Vec<(&str, MonthBucket)> =
            report.iter().map(|r| (r.network.as_str(), r.month)).collect();
        assert_eq!(
            keys,
            vec![("b", month(1)), ("b", month(2)), ("c", month(1)), ("c", month(2))]
        );
    }

    #[test]
    fn test_summary() {
        let table = PurchaseTable {
            dates: vec![NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()],
            networks: vec!["foo".into(), "bar".into(), "baz".into(), "stray".into()],
            counts: vec![vec![8.0, 3.0, 1.0, 2.0]],
        };
        let metrics = compute_metrics(&[
            totals("foo", Some(8.0), Some(300.0), Some(50.0)),
            totals("bar", Some(3.0), None, None),
            totals("baz", Some(1.0), Some(0.0), None),
        ]);
        let overall = network_report(&metrics);
        let summary = generate_summary(
            2024,
            vec!["January".into()],
            &overall,
            &metrics,
            &table,
            Unmatched {
                survey_sources: vec!["stray".into()],
                tickers: vec![],
            },
        );
        assert_eq!(summary.total_spend, 300.0);
        assert_eq!(summary.purchases_with_spend, 8.0);
        assert_eq!(summary.cost_per_acquisition, Some(37.5));
        assert_eq!(summary.cost_per_visitor, Some(6.0));
        assert_eq!(summary.conversion_rate, Some(16.0));
        assert_eq!(summary.total_campaign_purchases, 14.0);
        assert_eq!(summary.cost_per_acquisition_all_purchases, Some(21.43));
        assert_eq!(summary.conversion_rate_all_purchases, Some(28.0));
        assert_eq!(summary.no_spend_purchase_shares.len(), 2);
        assert_eq!(summary.no_spend_purchase_shares[0].source, "Bar");
        assert_eq!(summary.no_spend_purchase_shares[0].share_pct, 75.0);
        assert_eq!(summary.unmatched_survey_sources, vec!["stray"]);
    }
}
