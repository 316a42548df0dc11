//! Adjusted Free Cash Flow (AFCF).
//!
//! AFCF extends ACFO with investing-activity cash flows in two tiers:
//!
//! - **Sustainable AFCF** = ACFO + recurring investing items (development
//!   capex, acquisitions, JV contributions, other outflows). Primary measure.
//! - **Total AFCF** = ACFO + every investing item, including one-off
//!   dispositions, JV returns of capital, business combinations and other
//!   inflows. Comparison only.
//!
//! Sustaining capex, sustaining tenant improvements, external leasing costs and
//! JV distributions are already inside ACFO. [`CashFlowInvesting`] does not
//! accept them, so they cannot be counted twice.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{AfcfConfig, MetricsConfig};
use crate::error::ReitMetricsError;
use crate::record::{AcfoComponents, CashFlowInvesting, FinancialRecord};
use crate::reit::acfo::{item_amount, AcfoResult};
use crate::reit::ffo_affo::per_unit;
use crate::types::{round2, with_metadata, ComputationOutput, DataQuality, Money, Multiple, Percent};
use crate::ReitMetricsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcfoSource {
    Calculated,
    Reported,
}

/// The ACFO figure AFCF builds on.
#[derive(Debug, Clone, Copy)]
pub struct AcfoBasis<'a> {
    pub value: Money,
    pub source: AcfoSource,
    pub detail: Option<&'a AcfoResult>,
}

impl<'a> AcfoBasis<'a> {
    pub fn calculated(result: &'a AcfoResult) -> Self {
        Self {
            value: result.acfo,
            source: AcfoSource::Calculated,
            detail: Some(result),
        }
    }

    pub fn reported(value: Money) -> Self {
        Self {
            value,
            source: AcfoSource::Reported,
            detail: None,
        }
    }

    /// Calculated ACFO when available, else the issuer-reported figure.
    pub fn resolve(record: &FinancialRecord, calculated: Option<&'a AcfoResult>) -> Option<Self> {
        match calculated {
            Some(result) => Some(Self::calculated(result)),
            None => record
                .ffo_affo
                .as_ref()
                .and_then(|r| r.acfo)
                .map(Self::reported),
        }
    }
}

/// One classified investing line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfiItem {
    pub field: String,
    pub description: String,
    pub amount: Option<Money>,
    pub recurring: bool,
}

/// An item already inside ACFO, listed so readers can see it was not re-added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedAcfoItem {
    pub acfo_code: String,
    pub description: String,
    pub amount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceCheck {
    pub expected: Money,
    pub actual: Money,
    pub difference: Money,
    pub tolerance: Money,
    pub passed: bool,
}

impl ToleranceCheck {
    fn new(expected: Money, actual: Money, tolerance: Money) -> Self {
        let difference = actual - expected;
        Self {
            expected,
            actual,
            difference,
            tolerance,
            passed: difference.abs() <= tolerance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AfcfResult {
    pub acfo: Money,
    pub acfo_source: AcfoSource,
    /// ACFO + recurring investing items. Primary measure.
    pub sustainable_afcf: Money,
    /// ACFO + all investing items.
    pub total_afcf: Money,
    pub sustainable_net_cfi: Money,
    pub total_net_cfi: Money,
    /// Total net CFI - sustainable net CFI.
    pub non_recurring_cfi: Money,
    pub items: Vec<CfiItem>,
    pub afcf_per_unit_basic: Option<Money>,
    pub afcf_per_unit_diluted: Option<Money>,
    pub data_quality: DataQuality,
    pub items_available: usize,
    pub missing_items: Vec<String>,
    /// Check against issuer-reported total CFI, when disclosed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cfi_check: Option<ToleranceCheck>,
    pub embedded_in_acfo: Vec<EmbeddedAcfoItem>,
}

/// Debt service and distributions for the period; new financing excluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObligationBreakdown {
    pub interest: Money,
    pub principal_repayments: Money,
    pub distributions_common: Money,
    pub distributions_preferred: Money,
    pub distributions_nci: Money,
    pub debt_service: Money,
    pub distributions: Money,
    pub total: Money,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AfcfCoverage {
    pub afcf: Money,
    pub obligations: ObligationBreakdown,
    /// AFCF / (interest + principal).
    pub debt_service_coverage: Option<Multiple>,
    /// AFCF / total distributions.
    pub distribution_coverage: Option<Multiple>,
    /// Distributions / AFCF x 100.
    pub payout_ratio_percent: Option<Percent>,
    /// AFCF / (debt service + distributions).
    pub self_funding_ratio: Option<Multiple>,
    /// AFCF - (debt service + distributions); negative is a funding gap.
    pub self_funding_capacity: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashChangeCheck {
    pub cfo: Money,
    pub cfi: Money,
    pub cff: Money,
    pub implied_change_in_cash: Money,
    /// No reported change in cash is available, so this is always true.
    pub assumed_reconciled: bool,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AfcfReconciliation {
    pub recomputed_sustainable_net_cfi: Money,
    pub recomputed_total_net_cfi: Money,
    /// AFCF = ACFO + sustainable net CFI.
    pub afcf_identity: ToleranceCheck,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub development_capex: Option<ToleranceCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_change: Option<CashChangeCheck>,
    pub passed: bool,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AfcfMetrics {
    pub afcf: AfcfResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<AfcfCoverage>,
    pub reconciliation: AfcfReconciliation,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// AFCF tiers, coverage (when financing data exists) and reconciliation.
pub fn calculate_afcf_metrics(
    record: &FinancialRecord,
    acfo: Option<AcfoBasis<'_>>,
    config: &MetricsConfig,
) -> ReitMetricsResult<ComputationOutput<AfcfMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let afcf = calculate_afcf(record, acfo, &config.afcf)?;
    let coverage = match calculate_afcf_coverage(record, &afcf) {
        Ok(c) => Some(c),
        Err(ReitMetricsError::NoData(reason)) => {
            warnings.push(format!("AFCF coverage not computed: {reason}"));
            None
        }
        Err(e) => return Err(e),
    };
    let reconciliation = validate_afcf_reconciliation(record, &afcf, &config.afcf);

    if afcf.sustainable_afcf < Decimal::ZERO {
        warnings.push(format!(
            "Sustainable AFCF is negative ({}); recurring investment exceeds ACFO.",
            afcf.sustainable_afcf
        ));
    }
    if let Some(check) = &afcf.total_cfi_check {
        if !check.passed {
            warnings.push(format!(
                "Classified CFI items differ from reported total CFI by {}.",
                check.difference
            ));
        }
    }
    if !reconciliation.passed {
        warnings.extend(reconciliation.notes.iter().cloned());
    }

    let output = AfcfMetrics {
        afcf,
        coverage,
        reconciliation,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "sustainable_afcf": "ACFO + recurring CFI items",
        "total_afcf": "ACFO + all CFI items",
        "excluded_from_cfi": [
            "sustaining capex",
            "sustaining tenant improvements",
            "external leasing costs",
            "JV distributions",
        ],
        "total_cfi_tolerance": config.afcf.total_cfi_tolerance,
    });

    Ok(with_metadata(
        "Adjusted Free Cash Flow (ACFO + classified investing activities)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Sustainable and total AFCF from ACFO and the classified investing items.
pub fn calculate_afcf(
    record: &FinancialRecord,
    acfo: Option<AcfoBasis<'_>>,
    config: &AfcfConfig,
) -> ReitMetricsResult<AfcfResult> {
    let cfi = record.cash_flow_investing.as_ref().ok_or_else(|| {
        ReitMetricsError::NoData("no CFI data: cash_flow_investing not disclosed".into())
    })?;
    if let Some(key) = cfi.extra.keys().next() {
        return Err(ReitMetricsError::invalid(
            format!("cash_flow_investing.{key}"),
            "Not a classified investing item; items already inside ACFO must not be repeated here.",
        ));
    }
    let acfo = acfo.ok_or_else(|| {
        ReitMetricsError::MissingDependency(
            "ACFO must precede AFCF; no calculated or reported ACFO".into(),
        )
    })?;

    let items = cfi_items(cfi);
    let sustainable_net_cfi: Money = items
        .iter()
        .filter(|i| i.recurring)
        .filter_map(|i| i.amount)
        .sum();
    let total_net_cfi: Money = items.iter().filter_map(|i| i.amount).sum();
    let non_recurring_cfi = total_net_cfi - sustainable_net_cfi;

    let sustainable_afcf = acfo.value + sustainable_net_cfi;
    let total_afcf = acfo.value + total_net_cfi;

    let items_available = items.iter().filter(|i| i.amount.is_some()).count();
    let data_quality = if items_available == 0 {
        DataQuality::Insufficient
    } else {
        DataQuality::classify(items_available, &config.quality)
    };
    let missing_items = items
        .iter()
        .filter(|i| i.amount.is_none())
        .map(|i| i.field.clone())
        .collect();

    let total_cfi_check = cfi
        .total_cfi
        .map(|reported| ToleranceCheck::new(reported, total_net_cfi, config.total_cfi_tolerance));

    let embedded_in_acfo = [
        ("4", "Sustaining capital expenditures"),
        ("5", "Sustaining tenant improvements"),
        ("6", "External leasing costs"),
        ("3a", "Distributions received from joint ventures"),
    ]
    .iter()
    .map(|(code, description)| EmbeddedAcfoItem {
        acfo_code: code.to_string(),
        description: description.to_string(),
        amount: acfo.detail.and_then(|d| item_amount(d, code)),
    })
    .collect();

    let (afcf_per_unit_basic, afcf_per_unit_diluted) = per_unit(sustainable_afcf, record);

    tracing::debug!(%sustainable_afcf, %total_afcf, "calculated AFCF");

    Ok(AfcfResult {
        acfo: acfo.value,
        acfo_source: acfo.source,
        sustainable_afcf,
        total_afcf,
        sustainable_net_cfi,
        total_net_cfi,
        non_recurring_cfi,
        items,
        afcf_per_unit_basic,
        afcf_per_unit_diluted,
        data_quality,
        items_available,
        missing_items,
        total_cfi_check,
        embedded_in_acfo,
    })
}

/// Mandatory debt service and distributions for the period.
///
/// Outflows may be recorded with either sign; magnitudes are used. New debt
/// and equity issuance are deliberately ignored.
pub fn mandatory_obligations(record: &FinancialRecord) -> ReitMetricsResult<ObligationBreakdown> {
    let cff = record.cash_flow_financing.as_ref().ok_or_else(|| {
        ReitMetricsError::NoData("cash_flow_financing not disclosed".into())
    })?;
    let mut notes = Vec::new();

    let interest = match record.income_statement.as_ref().and_then(|i| i.interest_expense) {
        Some(i) => i.abs(),
        None => {
            notes.push(
                "income_statement.interest_expense not disclosed; interest treated as zero.".into(),
            );
            Decimal::ZERO
        }
    };
    let magnitude = |v: Option<Money>| v.map(|x| x.abs()).unwrap_or(Decimal::ZERO);

    let principal_repayments = magnitude(cff.debt_principal_repayments);
    let distributions_common = magnitude(cff.distributions_common);
    let distributions_preferred = magnitude(cff.distributions_preferred);
    let distributions_nci = magnitude(cff.distributions_nci);

    let debt_service = interest + principal_repayments;
    let distributions = distributions_common + distributions_preferred + distributions_nci;

    Ok(ObligationBreakdown {
        interest,
        principal_repayments,
        distributions_common,
        distributions_preferred,
        distributions_nci,
        debt_service,
        distributions,
        total: debt_service + distributions,
        notes,
    })
}

/// Coverage ratios built on sustainable AFCF. Ratios are `None` for a zero denominator.
pub fn calculate_afcf_coverage(
    record: &FinancialRecord,
    afcf: &AfcfResult,
) -> ReitMetricsResult<AfcfCoverage> {
    let obligations = mandatory_obligations(record)?;
    let value = afcf.sustainable_afcf;

    let divide = |n: Money, d: Money| {
        if d.is_zero() {
            None
        } else {
            Some(round2(n / d))
        }
    };

    Ok(AfcfCoverage {
        afcf: value,
        debt_service_coverage: divide(value, obligations.debt_service),
        distribution_coverage: divide(value, obligations.distributions),
        payout_ratio_percent: divide(obligations.distributions * dec!(100), value),
        self_funding_ratio: divide(value, obligations.total),
        self_funding_capacity: value - obligations.total,
        obligations,
    })
}

/// Independently re-derive net CFI and check the AFCF identities.
pub fn validate_afcf_reconciliation(
    record: &FinancialRecord,
    afcf: &AfcfResult,
    config: &AfcfConfig,
) -> AfcfReconciliation {
    let mut notes = Vec::new();
    let cfi = record.cash_flow_investing.clone().unwrap_or_default();
    let z = |v: Option<Money>| v.unwrap_or(Decimal::ZERO);

    let recomputed_sustainable_net_cfi = z(cfi.development_capex)
        + z(cfi.property_acquisitions)
        + z(cfi.jv_capital_contributions)
        + z(cfi.other_investing_outflows);
    let recomputed_total_net_cfi = recomputed_sustainable_net_cfi
        + z(cfi.property_dispositions)
        + z(cfi.jv_return_of_capital)
        + z(cfi.business_combinations)
        + z(cfi.other_investing_inflows);

    let afcf_identity = ToleranceCheck::new(
        afcf.acfo + recomputed_sustainable_net_cfi,
        afcf.sustainable_afcf,
        config.afcf_identity_tolerance,
    );
    if !afcf_identity.passed {
        notes.push(format!(
            "AFCF does not equal ACFO + sustainable net CFI (difference {}).",
            afcf_identity.difference
        ));
    }
    let non_recurring_cfi = recomputed_total_net_cfi - recomputed_sustainable_net_cfi;
    if afcf.total_afcf - afcf.sustainable_afcf != non_recurring_cfi {
        notes.push("Total and sustainable AFCF gap does not equal non-recurring CFI.".into());
    }

    let development_capex = match (
        record.acfo_components.as_ref().and_then(|a| a.capex_development),
        cfi.development_capex,
    ) {
        (Some(acfo_dev), Some(cfi_dev)) => {
            let check = ToleranceCheck::new(
                acfo_dev.abs(),
                cfi_dev.abs(),
                config.development_capex_tolerance,
            );
            if !check.passed {
                notes.push(format!(
                    "Development capex differs between ACFO ({acfo_dev}) and CFI ({cfi_dev}) records."
                ));
            }
            Some(check)
        }
        _ => None,
    };

    let cash_change = cash_change_check(record, record.acfo_components.as_ref());

    let passed = notes.is_empty();

    AfcfReconciliation {
        recomputed_sustainable_net_cfi,
        recomputed_total_net_cfi,
        afcf_identity,
        development_capex,
        cash_change,
        passed,
        notes,
    }
}

fn cash_change_check(
    record: &FinancialRecord,
    acfo: Option<&AcfoComponents>,
) -> Option<CashChangeCheck> {
    let cfo = record
        .cash_flow_operating
        .as_ref()
        .and_then(|c| c.total_cfo)
        .or_else(|| acfo.and_then(|a| a.cash_flow_from_operations))?;
    let cfi = record.cash_flow_investing.as_ref()?.total_cfi?;
    let cff = record.cash_flow_financing.as_ref()?.total_cff?;

    Some(CashChangeCheck {
        cfo,
        cfi,
        cff,
        implied_change_in_cash: cfo + cfi + cff,
        assumed_reconciled: true,
        note: "No reported change in cash available; verify against the cash flow statement."
            .into(),
    })
}

fn cfi_items(cfi: &CashFlowInvesting) -> Vec<CfiItem> {
    let item = |field: &str, description: &str, amount: Option<Money>, recurring: bool| CfiItem {
        field: field.to_string(),
        description: description.to_string(),
        amount,
        recurring,
    };
    vec![
        item("development_capex", "Development capital expenditures", cfi.development_capex, true),
        item("property_acquisitions", "Property acquisitions", cfi.property_acquisitions, true),
        item(
            "jv_capital_contributions",
            "Capital contributions to joint ventures",
            cfi.jv_capital_contributions,
            true,
        ),
        item(
            "other_investing_outflows",
            "Other investing outflows",
            cfi.other_investing_outflows,
            true,
        ),
        item(
            "property_dispositions",
            "Proceeds from property dispositions",
            cfi.property_dispositions,
            false,
        ),
        item(
            "jv_return_of_capital",
            "Return of capital from joint ventures",
            cfi.jv_return_of_capital,
            false,
        ),
        item("business_combinations", "Business combinations", cfi.business_combinations, false),
        item(
            "other_investing_inflows",
            "Other investing inflows",
            cfi.other_investing_inflows,
            false,
        ),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CashFlowFinancing, IncomeStatement};
    use rust_decimal_macros::dec;

    fn sample_record() -> FinancialRecord {
        FinancialRecord {
            income_statement: Some(IncomeStatement {
                interest_expense: Some(dec!(10_000)),
                ..Default::default()
            }),
            cash_flow_investing: Some(CashFlowInvesting {
                development_capex: Some(dec!(-20_000)),
                property_acquisitions: Some(dec!(-15_000)),
                jv_capital_contributions: Some(dec!(-2_000)),
                other_investing_outflows: Some(dec!(-500)),
                property_dispositions: Some(dec!(30_000)),
                jv_return_of_capital: Some(dec!(1_000)),
                business_combinations: None,
                other_investing_inflows: Some(dec!(250)),
                total_cfi: Some(dec!(-6_250)),
                ..Default::default()
            }),
            cash_flow_financing: Some(CashFlowFinancing {
                debt_principal_repayments: Some(dec!(-8_000)),
                new_debt_issuances: Some(dec!(50_000)),
                distributions_common: Some(dec!(-18_000)),
                distributions_preferred: Some(dec!(-1_000)),
                distributions_nci: Some(dec!(-500)),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_two_tier_afcf() {
        let r = calculate_afcf(
            &sample_record(),
            Some(AcfoBasis::reported(dec!(60_000))),
            &AfcfConfig::default(),
        )
        .unwrap();
        assert_eq!(r.sustainable_net_cfi, dec!(-37_500));
        assert_eq!(r.total_net_cfi, dec!(-6_250));
        assert_eq!(r.non_recurring_cfi, dec!(31_250));
        assert_eq!(r.sustainable_afcf, dec!(22_500));
        assert_eq!(r.total_afcf, dec!(53_750));
        assert_eq!(r.total_afcf - r.sustainable_afcf, r.non_recurring_cfi);
        assert_eq!(r.items_available, 7);
        assert_eq!(r.missing_items, vec!["business_combinations".to_string()]);
        assert!(r.total_cfi_check.unwrap().passed);
    }

    #[test]
    fn test_afcf_preconditions() {
        let no_cfi = FinancialRecord::default();
        assert!(matches!(
            calculate_afcf(
                &no_cfi,
                Some(AcfoBasis::reported(dec!(1))),
                &AfcfConfig::default(),
            )
            .unwrap_err(),
            ReitMetricsError::NoData(_)
        ));
        assert!(matches!(
            calculate_afcf(&sample_record(), None, &AfcfConfig::default()).unwrap_err(),
            ReitMetricsError::MissingDependency(_)
        ));
    }

    #[test]
    fn test_total_cfi_outside_tolerance() {
        let mut record = sample_record();
        record.cash_flow_investing.as_mut().unwrap().total_cfi = Some(dec!(-6_400));
        let r = calculate_afcf(
            &record,
            Some(AcfoBasis::reported(dec!(60_000))),
            &AfcfConfig::default(),
        )
        .unwrap();
        let check = r.total_cfi_check.unwrap();
        assert_eq!(check.difference, dec!(150));
        assert!(!check.passed);
    }

    #[test]
    fn test_afcf_coverage_ratios() {
        let record = sample_record();
        let afcf = calculate_afcf(
            &record,
            Some(AcfoBasis::reported(dec!(60_000))),
            &AfcfConfig::default(),
        )
        .unwrap();
        let c = calculate_afcf_coverage(&record, &afcf).unwrap();
        assert_eq!(c.obligations.debt_service, dec!(18_000));
        assert_eq!(c.obligations.distributions, dec!(19_500));
        assert_eq!(c.obligations.total, dec!(37_500));
        assert_eq!(c.debt_service_coverage, Some(dec!(1.25)));
        assert_eq!(c.distribution_coverage, Some(dec!(1.15)));
        assert_eq!(c.payout_ratio_percent, Some(dec!(86.67)));
        assert_eq!(c.self_funding_ratio, Some(dec!(0.6)));
        assert_eq!(c.self_funding_capacity, dec!(-15_000));
    }

    #[test]
    fn test_coverage_ratios_null_on_zero_denominator() {
        let mut record = sample_record();
        record.cash_flow_financing = Some(CashFlowFinancing::default());
        record.income_statement = None;
        let afcf = calculate_afcf(
            &record,
            Some(AcfoBasis::reported(dec!(60_000))),
            &AfcfConfig::default(),
        )
        .unwrap();
        let c = calculate_afcf_coverage(&record, &afcf).unwrap();
        assert_eq!(c.debt_service_coverage, None);
        assert_eq!(c.distribution_coverage, None);
        assert_eq!(c.self_funding_ratio, None);
        assert_eq!(c.obligations.notes.len(), 1);
    }

    #[test]
    fn test_reconciliation_checks() {
        let mut record = sample_record();
        record.acfo_components = Some(AcfoComponents {
            cash_flow_from_operations: Some(dec!(70_000)),
            capex_development: Some(dec!(-20_050)),
            ..Default::default()
        });
        record.cash_flow_financing.as_mut().unwrap().total_cff = Some(dec!(-40_000));
        let afcf = calculate_afcf(
            &record,
            Some(AcfoBasis::reported(dec!(60_000))),
            &AfcfConfig::default(),
        )
        .unwrap();
        let rec = validate_afcf_reconciliation(&record, &afcf, &AfcfConfig::default());
        assert!(rec.afcf_identity.passed);
        assert!(rec.development_capex.as_ref().unwrap().passed);
        let cash = rec.cash_change.unwrap();
        assert_eq!(cash.implied_change_in_cash, dec!(23_750));
        assert!(cash.assumed_reconciled);
        assert!(rec.passed);
    }

    #[test]
    fn test_reconciliation_flags_development_capex_gap() {
        let mut record = sample_record();
        record.acfo_components = Some(AcfoComponents {
            capex_development: Some(dec!(-25_000)),
            ..Default::default()
        });
        let afcf = calculate_afcf(
            &record,
            Some(AcfoBasis::reported(dec!(60_000))),
            &AfcfConfig::default(),
        )
        .unwrap();
        let rec = validate_afcf_reconciliation(&record, &afcf, &AfcfConfig::default());
        assert!(!rec.development_capex.unwrap().passed);
        assert!(!rec.passed);
    }

    #[test]
    fn test_basis_prefers_calculated_then_reported() {
        let mut record = sample_record();
        assert!(AcfoBasis::resolve(&record, None).is_none());

        record.ffo_affo = Some(crate::record::ReportedFfoAffo {
            acfo: Some(dec!(41_000)),
            ..Default::default()
        });
        let reported = AcfoBasis::resolve(&record, None).unwrap();
        assert_eq!(reported.source, AcfoSource::Reported);
        assert_eq!(reported.value, dec!(41_000));

        let acfo = crate::reit::acfo::calculate_acfo(
            &FinancialRecord {
                acfo_components: Some(AcfoComponents {
                    cash_flow_from_operations: Some(dec!(45_000)),
                    ..Default::default()
                }),
                ..Default::default()
            },
            &crate::config::AcfoConfig::default(),
        )
        .unwrap();
        let calculated = AcfoBasis::resolve(&record, Some(&acfo)).unwrap();
        assert_eq!(calculated.source, AcfoSource::Calculated);
        assert_eq!(calculated.value, dec!(45_000));
        assert!(calculated.detail.is_some());
    }
}
