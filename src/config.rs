use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "tv_campaign_report")]
#[command(about = "Purchases, spend and lift per network for a TV advertising campaign")]
pub struct Args {
    /// Purchase exit-survey sheet exported as CSV (dates as columns)
    #[arg(long, default_value = "purchase_exit_survey.csv")]
    pub purchases: PathBuf,

    /// Airings log exported as CSV
    #[arg(long, default_value = "airings.csv")]
    pub airings: PathBuf,

    /// Exit-survey to airings lookup exported as CSV
    #[arg(long, default_value = "lookup.csv")]
    pub lookup: PathBuf,

    /// Directory for the generated reports
    #[arg(short, long, default_value = "./cleaned_output")]
    pub output_dir: PathBuf,

    /// Rows shown in each console preview
    #[arg(long, default_value_t = 5)]
    pub preview_rows: usize,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["tv_campaign_report"]);
        assert_eq!(args.purchases, PathBuf::from("purchase_exit_survey.csv"));
        assert_eq!(args.output_dir, PathBuf::from("./cleaned_output"));
        assert_eq!(args.preview_rows, 5);
        assert_eq!(args.default_log_filter(), "info");
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "tv_campaign_report",
            "--lookup",
            "data/lookup.csv",
            "-o",
            "out",
            "--preview-rows",
            "2",
            "-v",
        ]);
        assert_eq!(args.lookup, PathBuf::from("data/lookup.csv"));
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert_eq!(args.preview_rows, 2);
        assert_eq!(args.default_log_filter(), "debug");
    }
}
