use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ReitMetricsError;
use crate::record::FinancialRecord;
use crate::reit::validation::{require_record_fields, COVERAGE_REQUIRED_FIELDS};
use crate::types::{round2, with_metadata, ComputationOutput, Money, Multiple};
use crate::ReitMetricsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where the period length came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodSource {
    /// `period_months` supplied on the record.
    Explicit,
    /// Matched a keyword in `reporting_period`.
    Keyword,
    /// Nothing matched; quarterly assumed.
    DefaultQuarterly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub months: u32,
    /// Multiplier that turns period figures into annual figures.
    pub annualization_factor: Decimal,
    pub source: PeriodSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageRatios {
    pub noi: Money,
    pub interest_expense: Money,
    /// NOI / interest expense, 2 dp.
    pub noi_interest_coverage: Multiple,
    pub annualized_noi: Money,
    pub annualized_interest_expense: Money,
    pub period_months: u32,
    pub annualization_factor: Decimal,
    pub period_source: PeriodSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporting_period: Option<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// NOI interest coverage with period detection and annualization.
pub fn calculate_coverage(
    record: &FinancialRecord,
) -> ReitMetricsResult<ComputationOutput<CoverageRatios>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_record_fields(record, COVERAGE_REQUIRED_FIELDS)?;
    let is = record
        .income_statement
        .as_ref()
        .ok_or_else(|| ReitMetricsError::missing_field("income_statement"))?;
    let noi = is.noi.unwrap_or_default();
    let interest_expense = is.interest_expense.unwrap_or_default();

    if interest_expense <= Decimal::ZERO {
        return Err(ReitMetricsError::invalid(
            "income_statement.interest_expense",
            "Interest expense must be strictly positive to compute coverage.",
        ));
    }
    if noi < Decimal::ZERO {
        warnings.push(format!("NOI of {noi} is negative; coverage is below zero."));
    }

    let (period, period_warning) = detect_period(record)?;
    warnings.extend(period_warning);

    let noi_interest_coverage = round2(noi / interest_expense);
    if noi_interest_coverage < dec!(1.5) {
        warnings.push(format!(
            "NOI interest coverage of {noi_interest_coverage}x is below 1.5x."
        ));
    }

    let output = CoverageRatios {
        noi,
        interest_expense,
        noi_interest_coverage,
        annualized_noi: round2(noi * period.annualization_factor),
        annualized_interest_expense: round2(interest_expense * period.annualization_factor),
        period_months: period.months,
        annualization_factor: period.annualization_factor,
        period_source: period.source,
        reporting_period: record.reporting_period.clone(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "coverage": "NOI / interest expense (period figures)",
        "annualization": "12 / period months",
        "unrecognized_period": "quarterly (x4)",
    });

    Ok(with_metadata(
        "NOI Interest Coverage",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Period length from `period_months`, else keyword matching on `reporting_period`.
///
/// Unrecognized or absent text falls back to a quarter (x4) and returns a
/// warning; downstream annualization relies on that default.
pub fn detect_period(
    record: &FinancialRecord,
) -> ReitMetricsResult<(ReportingPeriod, Option<String>)> {
    if let Some(months) = record.period_months {
        if months == 0 || months > 12 {
            return Err(ReitMetricsError::invalid(
                "period_months",
                "Period length must be between 1 and 12 months.",
            ));
        }
        return Ok((period_of(months, PeriodSource::Explicit), None));
    }

    let text = record.reporting_period.as_deref().unwrap_or_default();
    match months_from_text(text) {
        Some(months) => Ok((period_of(months, PeriodSource::Keyword), None)),
        None => {
            let warning = format!(
                "Reporting period '{text}' not recognized; assuming quarterly (annualization x4)."
            );
            tracing::warn!(reporting_period = text, "defaulting to quarterly period");
            Ok((period_of(3, PeriodSource::DefaultQuarterly), Some(warning)))
        }
    }
}

/// Whole-word phrases naming a period length. Hyphens and punctuation are
/// treated as word breaks, so "six-month" matches "six month".
const PERIOD_KEYWORDS: &[(&str, u32)] = &[
    ("nine months", 9),
    ("nine month", 9),
    ("9 months", 9),
    ("six months", 6),
    ("six month", 6),
    ("6 months", 6),
    ("half", 6),
    ("semi annual", 6),
    ("three months", 3),
    ("three month", 3),
    ("3 months", 3),
    ("quarter", 3),
    ("quarterly", 3),
    ("q1", 3),
    ("q2", 3),
    ("q3", 3),
    ("q4", 3),
    ("twelve months", 12),
    ("12 months", 12),
    ("year", 12),
    ("annual", 12),
    ("fiscal", 12),
];

/// The keyword that appears first in the label decides the period.
fn months_from_text(text: &str) -> Option<u32> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    (0..words.len()).find_map(|start| {
        PERIOD_KEYWORDS.iter().find_map(|&(phrase, months)| {
            let len = phrase.split(' ').count();
            let window = words.get(start..start + len)?;
            window
                .iter()
                .copied()
                .eq(phrase.split(' '))
                .then_some(months)
        })
    })
}

fn period_of(months: u32, source: PeriodSource) -> ReportingPeriod {
    ReportingPeriod {
        months,
        annualization_factor: (dec!(12) / Decimal::from(months)).round_dp(4),
        source,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::IncomeStatement;
    use rust_decimal_macros::dec;

    fn record(period: Option<&str>, interest: Decimal) -> FinancialRecord {
        FinancialRecord {
            reporting_period: period.map(str::to_string),
            income_statement: Some(IncomeStatement {
                noi: Some(dec!(30_000)),
                interest_expense: Some(interest),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_coverage_six_months() {
        let out = calculate_coverage(&record(Some("Six months ended June 30, 2025"), dec!(10_000)))
            .unwrap();
        let c = &out.result;
        assert_eq!(c.noi_interest_coverage, dec!(3));
        assert_eq!(c.annualization_factor, dec!(2));
        assert_eq!(c.annualized_noi, dec!(60_000));
        assert_eq!(c.period_months, 6);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_zero_interest_is_invalid() {
        match calculate_coverage(&record(Some("Q2 2025"), Decimal::ZERO)).unwrap_err() {
            ReitMetricsError::InvalidData { field, .. } => {
                assert_eq!(field, "income_statement.interest_expense")
            }
            other => panic!("Expected InvalidData, got {other:?}"),
        }
    }

    #[test]
    fn test_period_keywords() {
        assert_eq!(months_from_text("Three months ended March 31"), Some(3));
        assert_eq!(months_from_text("Second Quarter 2025"), Some(3));
        assert_eq!(months_from_text("Year ended December 31, 2024"), Some(12));
        assert_eq!(months_from_text("Annual"), Some(12));
        assert_eq!(months_from_text("Nine months ended September 30"), Some(9));
        assert_eq!(months_from_text("H1"), None);
        assert_eq!(months_from_text("First half-year 2025"), Some(6));
        assert_eq!(months_from_text("Six-month period"), Some(6));
    }

    #[test]
    fn test_period_keywords_match_whole_words_in_order() {
        assert_eq!(months_from_text("Fiscal year 2024 (Q4 restated)"), Some(12));
        assert_eq!(months_from_text("Q4 2024, fiscal year to date"), Some(3));
        assert_eq!(months_from_text("Headquarters relocation period"), None);
        assert_eq!(months_from_text("Sq4 reissue"), None);
    }

    #[test]
    fn test_unrecognized_period_defaults_quarterly_with_warning() {
        let out = calculate_coverage(&record(Some("Stub period"), dec!(10_000))).unwrap();
        assert_eq!(out.result.annualization_factor, dec!(4));
        assert_eq!(out.result.period_source, PeriodSource::DefaultQuarterly);
        assert!(out.warnings.iter().any(|w| w.contains("quarterly")));
    }

    #[test]
    fn test_explicit_period_months_wins() {
        let mut r = record(Some("Three months ended"), dec!(10_000));
        r.period_months = Some(12);
        let (period, warning) = detect_period(&r).unwrap();
        assert_eq!(period.months, 12);
        assert_eq!(period.annualization_factor, dec!(1));
        assert!(warning.is_none());
    }

    #[test]
    fn test_missing_noi_is_missing_field() {
        let mut r = record(None, dec!(1));
        r.income_statement.as_mut().unwrap().noi = None;
        assert!(matches!(
            calculate_coverage(&r).unwrap_err(),
            ReitMetricsError::MissingField { .. }
        ));
    }
}
