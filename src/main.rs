// Entry point and high-level CLI flow.
//
// Loads the three campaign exports, runs the report pipeline, writes the CSV
// reports and JSON summary, and prints markdown previews of each table.
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use tv_campaign_report::config::Args;
use tv_campaign_report::util::{format_amount, format_count};
use tv_campaign_report::{loader, output, pipeline, CampaignInputs};

fn print_summary(reports: &pipeline::CampaignReports) {
    let s = &reports.summary;
    let money = |v: Option<f64>| v.map_or("n/a".to_string(), |v| format!("${}", format_amount(v, 2)));
    let pct = |v: Option<f64>| v.map_or("n/a".to_string(), |v| format!("{}%", format_amount(v, 1)));

    println!("If we only consider purchases from channels where spend > 0");
    println!("{}", "-".repeat(60));
    println!("The overall cost per acquisition was: {}", money(s.cost_per_acquisition));
    println!("The overall cost per visitor was: {}", money(s.cost_per_visitor));
    println!("The overall conversion rate was: {}", pct(s.conversion_rate));
    println!();
    println!("If we consider all purchases from channels, even if spend = 0");
    println!("{}", "-".repeat(60));
    println!(
        "The overall cost per acquisition was: {}",
        money(s.cost_per_acquisition_all_purchases)
    );
    println!(
        "The overall conversion rate was: {}",
        pct(s.conversion_rate_all_purchases)
    );
    println!();
}

fn main() -> Result<()> {
    let args = Args::parse();

    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.default_log_filter()));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let sheet = loader::load_wide_sheet(&args.purchases)
        .with_context(|| format!("Failed to load purchase sheet {}", args.purchases.display()))?;
    let (airings, _) = loader::load_airings(&args.airings)
        .with_context(|| format!("Failed to load airings {}", args.airings.display()))?;
    let (lookup, _) = loader::load_lookup(&args.lookup)
        .with_context(|| format!("Failed to load lookup {}", args.lookup.display()))?;

    let inputs = CampaignInputs {
        sheet,
        airings,
        lookup,
    };
    let reports = pipeline::run(&inputs).context("Failed to build reports")?;
    let written = output::write_reports(&args.output_dir, &reports)
        .with_context(|| format!("Failed to write reports to {}", args.output_dir.display()))?;

    println!(
        "Processed campaign {} ({} networks with spend, {} network-month rows)",
        reports.file_suffix(),
        format_count(reports.by_network.len()),
        format_count(reports.by_network_month.len())
    );
    output::preview_table(
        "Purchases, Spend and Lift by Network",
        Some("Networks with spend > 0"),
        &reports.by_network,
        args.preview_rows,
    );
    println!("(Full table exported to {})\n", written.by_network.display());
    output::preview_table(
        "Purchases, Spend and Lift by Network and Month",
        None,
        &reports.by_network_month,
        args.preview_rows,
    );
    println!("(Full table exported to {})\n", written.by_network_month.display());

    print_summary(&reports);
    info!(summary = %written.summary.display(), "done");
    Ok(())
}
