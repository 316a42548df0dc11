use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use reit_metrics_core::reit::acfo::calculate_acfo_metrics;
use reit_metrics_core::reit::afcf::{calculate_afcf_metrics, AcfoBasis};
use reit_metrics_core::reit::ffo_affo::calculate_ffo_affo;
use reit_metrics_core::MetricsConfig;

use super::{load_record, RecordArgs};

/// Arguments for AFCF, which needs an ACFO starting point
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AfcfArgs {
    #[command(flatten)]
    pub record: RecordArgs,

    /// ACFO to start from (overrides the calculated or reported figure)
    #[arg(long)]
    pub acfo: Option<Decimal>,
}

pub fn run_ffo_affo(
    args: RecordArgs,
    config: &MetricsConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let record = load_record(&args)?;
    let result = calculate_ffo_affo(&record, config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_acfo(
    args: RecordArgs,
    config: &MetricsConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let record = load_record(&args)?;
    let result = calculate_acfo_metrics(&record, config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_afcf(
    args: AfcfArgs,
    config: &MetricsConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let record = load_record(&args.record)?;

    if let Some(acfo) = args.acfo {
        let result = calculate_afcf_metrics(&record, Some(AcfoBasis::reported(acfo)), config)?;
        return Ok(serde_json::to_value(result)?);
    }

    let calculated = match calculate_acfo_metrics(&record, config) {
        Ok(out) => Some(out.result.acfo),
        Err(e) => {
            tracing::debug!(error = %e, "ACFO not calculable; falling back to reported ACFO");
            None
        }
    };
    let basis = AcfoBasis::resolve(&record, calculated.as_ref());

    let result = calculate_afcf_metrics(&record, basis, config)?;
    Ok(serde_json::to_value(result)?)
}
