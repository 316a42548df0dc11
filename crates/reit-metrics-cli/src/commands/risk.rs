use chrono::{NaiveDate, Utc};
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use reit_metrics_core::reit::acfo::calculate_acfo_metrics;
use reit_metrics_core::reit::afcf::{calculate_afcf, AcfoBasis};
use reit_metrics_core::reit::burn_rate::analyze_burn_rate;
use reit_metrics_core::reit::coverage::calculate_coverage;
use reit_metrics_core::reit::dilution::analyze_dilution;
use reit_metrics_core::reit::leverage::calculate_leverage;
use reit_metrics_core::MetricsConfig;

use super::{load_record, RecordArgs};

/// Arguments for burn rate and cash runway
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct BurnRateArgs {
    #[command(flatten)]
    pub record: RecordArgs,

    /// Valuation date for depletion dates (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Sustainable AFCF for the period (skips the ACFO and AFCF steps)
    #[arg(long)]
    pub afcf: Option<Decimal>,

    /// ACFO to start the AFCF step from
    #[arg(long)]
    pub acfo: Option<Decimal>,
}

pub fn run_leverage(args: RecordArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let record = load_record(&args)?;
    let result = calculate_leverage(&record)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_coverage(args: RecordArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let record = load_record(&args)?;
    let result = calculate_coverage(&record)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_dilution(
    args: RecordArgs,
    config: &MetricsConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let record = load_record(&args)?;
    let result = analyze_dilution(&record, config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_burn_rate(
    args: BurnRateArgs,
    config: &MetricsConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let record = load_record(&args.record)?;
    let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let afcf = match args.afcf {
        Some(afcf) => afcf,
        None => {
            let calculated = match args.acfo {
                Some(_) => None,
                None => calculate_acfo_metrics(&record, config).ok().map(|out| out.result.acfo),
            };
            let basis = match args.acfo {
                Some(acfo) => Some(AcfoBasis::reported(acfo)),
                None => AcfoBasis::resolve(&record, calculated.as_ref()),
            };
            calculate_afcf(&record, basis, &config.afcf)?.sustainable_afcf
        }
    };

    let result = analyze_burn_rate(&record, afcf, as_of, config)?;
    Ok(serde_json::to_value(result)?)
}
