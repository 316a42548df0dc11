use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Serialize;

use reit_metrics_core::reit::acfo::calculate_acfo_metrics;
use reit_metrics_core::reit::afcf::{calculate_afcf_metrics, AcfoBasis};
use reit_metrics_core::reit::coverage::calculate_coverage;
use reit_metrics_core::reit::dilution::analyze_dilution;
use reit_metrics_core::reit::ffo_affo::calculate_ffo_affo;
use reit_metrics_core::reit::leverage::calculate_leverage;
use reit_metrics_core::reit::orchestrator::calculate_reit_metrics;
use reit_metrics_core::{FinancialRecord, MetricsConfig};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_record(record_json: &str) -> NapiResult<FinancialRecord> {
    serde_json::from_str(record_json).map_err(to_napi_error)
}

/// Missing or empty config JSON means defaults.
fn parse_config(config_json: Option<String>) -> NapiResult<MetricsConfig> {
    match config_json.as_deref().map(str::trim) {
        Some(json) if !json.is_empty() => serde_json::from_str(json).map_err(to_napi_error),
        _ => Ok(MetricsConfig::default()),
    }
}

fn to_json<T: Serialize>(output: &T) -> NapiResult<String> {
    serde_json::to_string(output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Composite
// ---------------------------------------------------------------------------

#[napi]
pub fn reit_metrics(record_json: String, config_json: Option<String>) -> NapiResult<String> {
    let record = parse_record(&record_json)?;
    let config = parse_config(config_json)?;
    let output = calculate_reit_metrics(&record, &config).map_err(to_napi_error)?;
    to_json(&output)
}

// ---------------------------------------------------------------------------
// Individual metrics
// ---------------------------------------------------------------------------

#[napi]
pub fn leverage_metrics(record_json: String) -> NapiResult<String> {
    let record = parse_record(&record_json)?;
    let output = calculate_leverage(&record).map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn coverage_metrics(record_json: String) -> NapiResult<String> {
    let record = parse_record(&record_json)?;
    let output = calculate_coverage(&record).map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn ffo_affo_metrics(record_json: String, config_json: Option<String>) -> NapiResult<String> {
    let record = parse_record(&record_json)?;
    let config = parse_config(config_json)?;
    let output = calculate_ffo_affo(&record, &config).map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn acfo_metrics(record_json: String, config_json: Option<String>) -> NapiResult<String> {
    let record = parse_record(&record_json)?;
    let config = parse_config(config_json)?;
    let output = calculate_acfo_metrics(&record, &config).map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn afcf_metrics(record_json: String, config_json: Option<String>) -> NapiResult<String> {
    let record = parse_record(&record_json)?;
    let config = parse_config(config_json)?;
    let calculated = calculate_acfo_metrics(&record, &config)
        .ok()
        .map(|out| out.result.acfo);
    let basis = AcfoBasis::resolve(&record, calculated.as_ref());
    let output = calculate_afcf_metrics(&record, basis, &config).map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn dilution_metrics(record_json: String, config_json: Option<String>) -> NapiResult<String> {
    let record = parse_record(&record_json)?;
    let config = parse_config(config_json)?;
    let output = analyze_dilution(&record, &config).map_err(to_napi_error)?;
    to_json(&output)
}
