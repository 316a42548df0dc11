//! Composes every calculator into one metrics record.
//!
//! Each metric runs independently over the same borrowed record. A failure is
//! recorded as a [`MetricDiagnostic`] and the section is left out of
//! [`ReitMetricsOutput`]; siblings still run. Dependencies are explicit: AFCF
//! needs ACFO (calculated or reported), and the burn-rate chain needs AFCF.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::MetricsConfig;
use crate::error::{ReasonKind, ReitMetricsError};
use crate::record::{FinancialRecord, PortfolioData};
use crate::reit::acfo::{calculate_acfo_metrics, AcfoMetrics};
use crate::reit::afcf::{calculate_afcf_metrics, AcfoBasis, AfcfCoverage, AfcfResult};
use crate::reit::burn_rate::{
    analyze_burn_rate, BurnRateAnalysis, CashRunway, LiquidityRisk, SustainableBurn,
};
use crate::reit::coverage::{calculate_coverage, CoverageRatios};
use crate::reit::dilution::{analyze_dilution, DilutionAnalysis};
use crate::reit::ffo_affo::{calculate_ffo_affo, FfoAffoMetrics};
use crate::reit::leverage::{calculate_leverage, LeverageMetrics};
use crate::reit::reconciliation::{build_reconciliation, Reconciliation};
use crate::types::{
    round2, with_metadata, ComputationOutput, Currency, Money, Percent, ValidationResult,
};
use crate::ReitMetricsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    Reported,
    Calculated,
}

/// The figure to publish for a metric, with both sides kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedValue {
    pub value: Money,
    pub source: ValueSource,
    pub calculated: Option<Money>,
    pub reported: Option<Money>,
    pub variance_amount: Option<Money>,
    pub variance_percent: Option<Percent>,
    pub within_threshold: Option<bool>,
}

impl SelectedValue {
    /// Reported wins when disclosed; calculated is the fallback.
    fn select(calculated: Option<Money>, reported: Option<Money>) -> Option<Self> {
        let (value, source) = match (reported, calculated) {
            (Some(r), _) => (r, ValueSource::Reported),
            (None, Some(c)) => (c, ValueSource::Calculated),
            (None, None) => return None,
        };
        Some(Self {
            value,
            source,
            calculated,
            reported,
            variance_amount: None,
            variance_percent: None,
            within_threshold: None,
        })
    }

    fn with_variance(mut self, v: &ValidationResult) -> Self {
        self.variance_amount = v.variance_amount;
        self.variance_percent = v.variance_percent;
        self.within_threshold = v.within_threshold;
        self
    }
}

/// FFO, AFFO and ACFO as published, plus the detailed waterfalls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReitMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ffo: Option<SelectedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affo: Option<SelectedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acfo: Option<SelectedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ffo_per_unit: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affo_per_unit: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acfo_per_unit: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distributions_per_unit: Option<Money>,
    /// Distributions per unit / FFO per unit x 100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ffo_payout_ratio: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affo_payout_ratio: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acfo_payout_ratio: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ffo_affo_detail: Option<FfoAffoMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acfo_detail: Option<AcfoMetrics>,
}

/// Composite metrics record. Absent keys mean "not computed".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReitMetricsOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leverage_metrics: Option<LeverageMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reit_metrics: Option<ReitMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_ratios: Option<CoverageRatios>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio_metrics: Option<PortfolioData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub afcf_metrics: Option<AfcfResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub afcf_coverage: Option<AfcfCoverage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burn_rate_analysis: Option<BurnRateAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidity_risk: Option<LiquidityRisk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_runway: Option<CashRunway>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sustainable_burn: Option<SustainableBurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dilution_analysis: Option<DilutionAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciliation: Option<Reconciliation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricStatus {
    Computed,
    NotDisclosed,
    Invalid,
    Inconsistent,
}

impl From<ReasonKind> for MetricStatus {
    fn from(kind: ReasonKind) -> Self {
        match kind {
            ReasonKind::NotDisclosed => MetricStatus::NotDisclosed,
            ReasonKind::Invalid => MetricStatus::Invalid,
            ReasonKind::Inconsistent => MetricStatus::Inconsistent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDiagnostic {
    pub metric: String,
    pub status: MetricStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReitMetricsReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporting_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporting_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    pub metrics: ReitMetricsOutput,
    pub diagnostics: Vec<MetricDiagnostic>,
}

impl ReitMetricsReport {
    pub fn diagnostic(&self, metric: &str) -> Option<&MetricDiagnostic> {
        self.diagnostics.iter().find(|d| d.metric == metric)
    }
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

struct Run {
    warnings: Vec<String>,
    diagnostics: Vec<MetricDiagnostic>,
}

impl Run {
    /// Record the outcome of one metric; keep its value and prefixed warnings on success.
    fn record<T: Serialize>(
        &mut self,
        metric: &str,
        outcome: ReitMetricsResult<ComputationOutput<T>>,
    ) -> Option<T> {
        match outcome {
            Ok(out) => {
                tracing::debug!(metric, "metric computed");
                self.warnings
                    .extend(out.warnings.into_iter().map(|w| format!("{metric}: {w}")));
                self.diagnostics.push(MetricDiagnostic {
                    metric: metric.to_string(),
                    status: MetricStatus::Computed,
                    reason: None,
                });
                Some(out.result)
            }
            Err(e) => {
                self.fail(metric, &e);
                None
            }
        }
    }

    fn fail(&mut self, metric: &str, e: &ReitMetricsError) {
        let status = MetricStatus::from(e.reason_kind());
        if status == MetricStatus::NotDisclosed {
            tracing::debug!(metric, error = %e, "metric not computed");
        } else {
            tracing::warn!(metric, error = %e, "metric failed");
        }
        self.diagnostics.push(MetricDiagnostic {
            metric: metric.to_string(),
            status,
            reason: Some(e.to_string()),
        });
    }

    fn not_disclosed(&mut self, metric: &str, reason: &str) {
        self.diagnostics.push(MetricDiagnostic {
            metric: metric.to_string(),
            status: MetricStatus::NotDisclosed,
            reason: Some(reason.to_string()),
        });
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// All metrics for one record, projecting runway dates from today.
pub fn calculate_reit_metrics(
    record: &FinancialRecord,
    config: &MetricsConfig,
) -> ReitMetricsResult<ComputationOutput<ReitMetricsReport>> {
    calculate_reit_metrics_as_of(record, config, chrono::Utc::now().date_naive())
}

/// All metrics for one record with runway dates projected from `as_of`.
pub fn calculate_reit_metrics_as_of(
    record: &FinancialRecord,
    config: &MetricsConfig,
    as_of: NaiveDate,
) -> ReitMetricsResult<ComputationOutput<ReitMetricsReport>> {
    let start = Instant::now();
    let mut run = Run {
        warnings: Vec::new(),
        diagnostics: Vec::new(),
    };
    let span = tracing::debug_span!(
        "reit_metrics",
        issuer = record.issuer_name.as_deref().unwrap_or("unknown")
    );
    let _guard = span.enter();

    let mut output = ReitMetricsOutput::default();

    output.leverage_metrics = run.record("leverage_metrics", calculate_leverage(record));
    output.coverage_ratios = run.record("coverage_ratios", calculate_coverage(record));
    output.portfolio_metrics = record.portfolio.clone();

    // FFO/AFFO and ACFO
    let ffo_affo = if record.ffo_affo_components.is_some() {
        run.record("ffo_affo", calculate_ffo_affo(record, config))
    } else {
        run.not_disclosed("ffo_affo", "ffo_affo_components section not disclosed");
        None
    };
    let acfo = if record.acfo_components.is_some() {
        run.record("acfo", calculate_acfo_metrics(record, config))
    } else {
        run.not_disclosed("acfo", "acfo_components section not disclosed");
        None
    };
    output.reit_metrics = build_reit_metrics(record, ffo_affo.as_ref(), acfo.as_ref());

    // AFCF depends on ACFO; burn rate depends on AFCF.
    let mut afcf_reconciliation = None;
    if record.cash_flow_investing.is_some() {
        let basis = AcfoBasis::resolve(record, acfo.as_ref().map(|m| &m.acfo));
        let afcf = run.record("afcf_metrics", calculate_afcf_metrics(record, basis, config));
        if let Some(afcf) = afcf {
            let sustainable = afcf.afcf.sustainable_afcf;
            output.afcf_metrics = Some(afcf.afcf);
            output.afcf_coverage = afcf.coverage;
            afcf_reconciliation = Some(afcf.reconciliation);

            if record.cash_flow_financing.is_some() {
                let burn = run.record(
                    "burn_rate_analysis",
                    analyze_burn_rate(record, sustainable, as_of, config),
                );
                if let Some(report) = burn {
                    output.burn_rate_analysis = Some(report.burn_rate);
                    output.cash_runway = report.cash_runway;
                    output.liquidity_risk = report.liquidity_risk;
                    output.sustainable_burn = report.sustainable_burn;
                }
            } else {
                run.not_disclosed("burn_rate_analysis", "cash_flow_financing not disclosed");
            }
        }
    } else {
        run.not_disclosed("afcf_metrics", "no CFI data: cash_flow_investing not disclosed");
    }

    if record.dilution_detail.is_some() {
        output.dilution_analysis =
            run.record("dilution_analysis", analyze_dilution(record, config));
    } else {
        run.not_disclosed("dilution_analysis", "dilution_detail not disclosed");
    }

    let reconciliation = build_reconciliation(
        ffo_affo.as_ref(),
        acfo.as_ref(),
        afcf_reconciliation.as_ref(),
    );
    if !reconciliation.is_empty() {
        output.reconciliation = Some(reconciliation);
    }

    let report = ReitMetricsReport {
        issuer_name: record.issuer_name.clone(),
        reporting_date: record.reporting_date.clone(),
        reporting_period: record.reporting_period.clone(),
        currency: record.currency.clone(),
        metrics: output,
        diagnostics: run.diagnostics,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "value_selection": "reported preferred when disclosed, calculated otherwise; both retained",
        "afcf_acfo_basis": "calculated ACFO, else reported ACFO",
        "as_of": as_of.to_string(),
    });

    Ok(with_metadata(
        "REIT credit metrics (REALPAC FFO/AFFO 2022, ACFO 2023, AFCF, burn rate)",
        &assumptions,
        run.warnings,
        elapsed,
        report,
    ))
}

fn build_reit_metrics(
    record: &FinancialRecord,
    ffo_affo: Option<&FfoAffoMetrics>,
    acfo: Option<&AcfoMetrics>,
) -> Option<ReitMetrics> {
    let reported = record.ffo_affo.as_ref();
    if reported.is_none() && ffo_affo.is_none() && acfo.is_none() {
        return None;
    }

    let ffo = SelectedValue::select(ffo_affo.map(|m| m.ffo.ffo), reported.and_then(|r| r.ffo))
        .map(|s| match ffo_affo {
            Some(m) => s.with_variance(&m.validation.ffo),
            None => s,
        });
    let affo = SelectedValue::select(ffo_affo.map(|m| m.affo.affo), reported.and_then(|r| r.affo))
        .map(|s| match ffo_affo {
            Some(m) => s.with_variance(&m.validation.affo),
            None => s,
        });
    let acfo_value = SelectedValue::select(acfo.map(|m| m.acfo.acfo), reported.and_then(|r| r.acfo))
        .map(|s| match acfo {
            Some(m) => s.with_variance(&m.validation),
            None => s,
        });

    let ffo_per_unit = reported
        .and_then(|r| r.ffo_per_unit)
        .or_else(|| ffo_affo.and_then(|m| m.ffo.ffo_per_unit_diluted.or(m.ffo.ffo_per_unit_basic)));
    let affo_per_unit = reported
        .and_then(|r| r.affo_per_unit)
        .or_else(
            || ffo_affo.and_then(|m| m.affo.affo_per_unit_diluted.or(m.affo.affo_per_unit_basic)),
        );
    let acfo_per_unit = reported
        .and_then(|r| r.acfo_per_unit)
        .or_else(|| acfo.and_then(|m| m.acfo.acfo_per_unit_diluted.or(m.acfo.acfo_per_unit_basic)));
    let distributions_per_unit = reported.and_then(|r| r.distributions_per_unit);

    let payout = |per_unit: Option<Money>| match (distributions_per_unit, per_unit) {
        (Some(d), Some(p)) if p > Decimal::ZERO => Some(round2(d / p * Decimal::ONE_HUNDRED)),
        _ => None,
    };

    Some(ReitMetrics {
        ffo,
        affo,
        acfo: acfo_value,
        ffo_payout_ratio: payout(ffo_per_unit),
        affo_payout_ratio: payout(affo_per_unit),
        acfo_payout_ratio: payout(acfo_per_unit),
        ffo_per_unit,
        affo_per_unit,
        acfo_per_unit,
        distributions_per_unit,
        ffo_affo_detail: ffo_affo.cloned(),
        acfo_detail: acfo.cloned(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{BalanceSheet, IncomeStatement, ReportedFfoAffo};
    use rust_decimal_macros::dec;

    fn core_record() -> FinancialRecord {
        FinancialRecord {
            reporting_period: Some("Three months ended March 31, 2025".into()),
            balance_sheet: Some(BalanceSheet {
                total_assets: Some(dec!(1_000_000)),
                mortgages_noncurrent: Some(dec!(300_000)),
                mortgages_current: Some(dec!(50_000)),
                credit_facilities: Some(dec!(100_000)),
                cash: Some(dec!(50_000)),
                ..Default::default()
            }),
            income_statement: Some(IncomeStatement {
                noi: Some(dec!(30_000)),
                interest_expense: Some(dec!(10_000)),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
    }

    #[test]
    fn test_minimal_record_only_core_sections() {
        let out = calculate_reit_metrics_as_of(&core_record(), &MetricsConfig::default(), as_of())
            .unwrap();
        let m = &out.result.metrics;
        assert!(m.leverage_metrics.is_some());
        assert!(m.coverage_ratios.is_some());
        assert!(m.reit_metrics.is_none());
        assert!(m.afcf_metrics.is_none());
        assert!(m.dilution_analysis.is_none());
        assert!(m.reconciliation.is_none());
        assert_eq!(
            out.result.diagnostic("afcf_metrics").unwrap().status,
            MetricStatus::NotDisclosed
        );
    }

    #[test]
    fn test_failed_metric_does_not_abort_siblings() {
        let mut record = core_record();
        record.income_statement.as_mut().unwrap().interest_expense = Some(Decimal::ZERO);
        let out = calculate_reit_metrics_as_of(&record, &MetricsConfig::default(), as_of())
            .unwrap();
        assert!(out.result.metrics.coverage_ratios.is_none());
        assert!(out.result.metrics.leverage_metrics.is_some());
        let d = out.result.diagnostic("coverage_ratios").unwrap();
        assert_eq!(d.status, MetricStatus::Invalid);
        assert!(d.reason.as_ref().unwrap().contains("interest_expense"));
    }

    #[test]
    fn test_reported_only_reit_metrics() {
        let mut record = core_record();
        record.ffo_affo = Some(ReportedFfoAffo {
            ffo: Some(dec!(20_000)),
            ffo_per_unit: Some(dec!(0.40)),
            distributions_per_unit: Some(dec!(0.30)),
            ..Default::default()
        });
        let out = calculate_reit_metrics_as_of(&record, &MetricsConfig::default(), as_of())
            .unwrap();
        let reit = out.result.metrics.reit_metrics.unwrap();
        let ffo = reit.ffo.unwrap();
        assert_eq!(ffo.source, ValueSource::Reported);
        assert_eq!(ffo.calculated, None);
        assert_eq!(reit.ffo_payout_ratio, Some(dec!(75)));
        assert!(reit.affo.is_none());
    }

    #[test]
    fn test_select_prefers_reported() {
        let s = SelectedValue::select(Some(dec!(10)), Some(dec!(11))).unwrap();
        assert_eq!(s.value, dec!(11));
        assert_eq!(s.source, ValueSource::Reported);
        let s = SelectedValue::select(Some(dec!(10)), None).unwrap();
        assert_eq!(s.source, ValueSource::Calculated);
        assert!(SelectedValue::select(None, None).is_none());
    }
}
