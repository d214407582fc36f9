//! Per-network and per-network-per-month purchase, spend and lift reports for
//! a TV advertising campaign, built from a wide exit-survey sheet, an airings
//! log and a survey-to-ticker lookup table.

pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod error;
pub mod lattice;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod reports;
pub mod transpose;
pub mod types;
pub mod util;

pub use error::{PipelineError, Result};
pub use pipeline::{run, CampaignInputs, CampaignReports};
