use serde_json::Value;

use crate::error::ReitMetricsError;
use crate::record::FinancialRecord;
use crate::ReitMetricsResult;

/// Fields every leverage calculation needs.
pub const LEVERAGE_REQUIRED_FIELDS: &[&str] = &[
    "balance_sheet.total_assets",
    "balance_sheet.mortgages_noncurrent",
    "balance_sheet.mortgages_current",
    "balance_sheet.credit_facilities",
    "balance_sheet.cash",
];

/// Fields every coverage calculation needs.
pub const COVERAGE_REQUIRED_FIELDS: &[&str] =
    &["income_statement.noi", "income_statement.interest_expense"];

/// Look up a dot-separated path. A JSON `null` counts as absent.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Fail with [`ReitMetricsError::MissingField`] on the first absent path.
pub fn require_fields(value: &Value, paths: &[&str]) -> ReitMetricsResult<()> {
    match paths.iter().find(|p| lookup(value, p).is_none()) {
        Some(path) => Err(ReitMetricsError::missing_field(*path)),
        None => Ok(()),
    }
}

/// Same as [`require_fields`] but over a typed record.
pub fn require_record_fields(record: &FinancialRecord, paths: &[&str]) -> ReitMetricsResult<()> {
    let value = serde_json::to_value(record)?;
    require_fields(&value, paths)
}

/// Every absent path, for diagnostics that should not stop at the first gap.
pub fn missing_fields(value: &Value, paths: &[&str]) -> Vec<String> {
    paths
        .iter()
        .filter(|p| lookup(value, p).is_none())
        .map(|p| p.to_string())
        .collect()
}
