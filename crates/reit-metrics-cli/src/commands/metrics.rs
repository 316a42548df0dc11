use chrono::NaiveDate;
use clap::Args;
use serde_json::{json, Value};

use reit_metrics_core::reit::orchestrator::{calculate_reit_metrics, calculate_reit_metrics_as_of};
use reit_metrics_core::reit::validation::{
    missing_fields, COVERAGE_REQUIRED_FIELDS, LEVERAGE_REQUIRED_FIELDS,
};
use reit_metrics_core::MetricsConfig;

use super::{load_raw, load_record, RecordArgs};

/// Arguments for the full metrics run
#[derive(Args)]
pub struct MetricsArgs {
    #[command(flatten)]
    pub record: RecordArgs,

    /// Valuation date for runway projections (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

/// Arguments for the required-field check
#[derive(Args)]
pub struct CheckFieldsArgs {
    #[command(flatten)]
    pub record: RecordArgs,

    /// Comma-separated dot paths (defaults to the leverage and coverage inputs)
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,
}

pub fn run_metrics(
    args: MetricsArgs,
    config: &MetricsConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let record = load_record(&args.record)?;
    let output = match args.as_of {
        Some(date) => calculate_reit_metrics_as_of(&record, config, date)?,
        None => calculate_reit_metrics(&record, config)?,
    };
    Ok(serde_json::to_value(output)?)
}

pub fn run_check_fields(args: CheckFieldsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = load_raw(&args.record)?;

    let paths: Vec<&str> = if args.fields.is_empty() {
        LEVERAGE_REQUIRED_FIELDS
            .iter()
            .chain(COVERAGE_REQUIRED_FIELDS)
            .copied()
            .collect()
    } else {
        args.fields.iter().map(|f| f.trim()).filter(|f| !f.is_empty()).collect()
    };

    let missing = missing_fields(&raw, &paths);
    Ok(json!({
        "result": {
            "checked": paths.len(),
            "complete": missing.is_empty(),
            "missing": missing,
        }
    }))
}
