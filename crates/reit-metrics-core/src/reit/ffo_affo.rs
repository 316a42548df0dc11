//! REALPAC Funds From Operations (FFO) and Adjusted FFO (AFFO).
//!
//! FFO starts from IFRS net income and applies the 21 lettered adjustments
//! A..U. Adjustment U (non-controlling interests) is deducted; the other twenty
//! are signed add-backs. AFFO then deducts the five lettered items V..Z from
//! FFO as a single block.
//!
//! Undisclosed adjustments contribute zero to the sum but are listed in
//! `missing_adjustments` and lower the data-quality grade.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{FfoAffoConfig, MetricsConfig};
use crate::error::ReitMetricsError;
use crate::record::{FfoAffoComponents, FinancialRecord};
use crate::types::{
    with_metadata, AdjustmentSet, ComputationOutput, DataQuality, Money, ValidationResult,
};
use crate::ReitMetricsResult;

/// Number of FFO adjustments (A..U).
pub const FFO_ADJUSTMENT_COUNT: usize = 21;
/// Number of AFFO adjustments (V..Z).
pub const AFFO_ADJUSTMENT_COUNT: usize = 5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FfoResult {
    pub ffo: Money,
    pub net_income_ifrs: Money,
    pub adjustments: AdjustmentSet,
    pub total_adjustments: Money,
    pub ffo_per_unit_basic: Option<Money>,
    pub ffo_per_unit_diluted: Option<Money>,
    pub data_quality: DataQuality,
    pub adjustments_available: usize,
    pub adjustments_total: usize,
    pub missing_adjustments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffoResult {
    pub affo: Money,
    pub ffo: Money,
    pub adjustments: AdjustmentSet,
    /// Sum of V..Z, deducted from FFO.
    pub total_deductions: Money,
    pub affo_per_unit_basic: Option<Money>,
    pub affo_per_unit_diluted: Option<Money>,
    pub data_quality: DataQuality,
    pub adjustments_available: usize,
    pub adjustments_total: usize,
    pub missing_adjustments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserve_methodology: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FfoAffoValidation {
    pub ffo: ValidationResult,
    pub affo: ValidationResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FfoAffoMetrics {
    pub ffo: FfoResult,
    pub affo: AffoResult,
    pub validation: FfoAffoValidation,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// FFO, AFFO and their validation against reported figures in one envelope.
pub fn calculate_ffo_affo(
    record: &FinancialRecord,
    config: &MetricsConfig,
) -> ReitMetricsResult<ComputationOutput<FfoAffoMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let ffo = calculate_ffo(record, &config.ffo_affo)?;
    let affo = calculate_affo(record, &ffo, &config.ffo_affo)?;

    let reported = record.ffo_affo.as_ref();
    let validation = validate_ffo_affo(
        Some(ffo.ffo),
        Some(affo.affo),
        reported.and_then(|r| r.ffo),
        reported.and_then(|r| r.affo),
        config.ffo_affo.variance_threshold_percent,
    );

    if matches!(ffo.data_quality, DataQuality::Limited | DataQuality::None) {
        warnings.push(format!(
            "Only {}/{} FFO adjustments disclosed; calculated FFO has limited reliability.",
            ffo.adjustments_available, ffo.adjustments_total
        ));
    }
    for v in [&validation.ffo, &validation.affo] {
        if v.within_threshold == Some(false) {
            warnings.extend(v.notes.iter().cloned());
        }
    }

    let output = FfoAffoMetrics {
        ffo,
        affo,
        validation,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "ffo": "net_income_ifrs + sum(A..T) - U",
        "affo": "FFO - sum(V..Z)",
        "missing_adjustments": "treated as zero, counted against data quality",
        "variance_threshold_percent": config.ffo_affo.variance_threshold_percent,
    });

    Ok(with_metadata(
        "REALPAC FFO/AFFO (February 2022)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// FFO from IFRS net income and adjustments A..U.
pub fn calculate_ffo(
    record: &FinancialRecord,
    config: &FfoAffoConfig,
) -> ReitMetricsResult<FfoResult> {
    let components = record.ffo_affo_components.as_ref().ok_or_else(|| {
        ReitMetricsError::NoData("ffo_affo_components section not disclosed".into())
    })?;
    let net_income_ifrs = components.net_income_ifrs.ok_or_else(|| {
        ReitMetricsError::InsufficientData(
            "ffo_affo_components.net_income_ifrs is required as the FFO starting point".into(),
        )
    })?;

    let adjustments = ffo_adjustments(components);
    let total_adjustments = adjustments.total();
    let ffo = net_income_ifrs + total_adjustments;
    let available = adjustments.present_count();
    let (ffo_per_unit_basic, ffo_per_unit_diluted) = per_unit(ffo, record);

    tracing::debug!(%ffo, available, "calculated FFO");

    Ok(FfoResult {
        ffo,
        net_income_ifrs,
        total_adjustments,
        ffo_per_unit_basic,
        ffo_per_unit_diluted,
        data_quality: DataQuality::classify(available, &config.ffo_quality),
        adjustments_available: available,
        adjustments_total: adjustments.len(),
        missing_adjustments: adjustments.missing_fields(),
        adjustments,
    })
}

/// AFFO = FFO - sum(V..Z).
pub fn calculate_affo(
    record: &FinancialRecord,
    ffo: &FfoResult,
    config: &FfoAffoConfig,
) -> ReitMetricsResult<AffoResult> {
    let components = record.ffo_affo_components.as_ref().ok_or_else(|| {
        ReitMetricsError::NoData("ffo_affo_components section not disclosed".into())
    })?;

    let adjustments = affo_adjustments(components);
    // Every entry is a deduction, so the signed total is -sum(V..Z).
    let total_deductions = -adjustments.total();
    let affo = ffo.ffo - total_deductions;
    let available = adjustments.present_count();
    let (affo_per_unit_basic, affo_per_unit_diluted) = per_unit(affo, record);

    Ok(AffoResult {
        affo,
        ffo: ffo.ffo,
        total_deductions,
        affo_per_unit_basic,
        affo_per_unit_diluted,
        data_quality: DataQuality::classify(available, &config.affo_quality),
        adjustments_available: available,
        adjustments_total: adjustments.len(),
        missing_adjustments: adjustments.missing_fields(),
        adjustments,
        calculation_method: components.calculation_method.clone(),
        reserve_methodology: components.reserve_methodology.clone(),
    })
}

/// Compare calculated FFO/AFFO against the issuer's published figures.
pub fn validate_ffo_affo(
    calculated_ffo: Option<Money>,
    calculated_affo: Option<Money>,
    reported_ffo: Option<Money>,
    reported_affo: Option<Money>,
    threshold_percent: Decimal,
) -> FfoAffoValidation {
    FfoAffoValidation {
        ffo: ValidationResult::compare("FFO", calculated_ffo, reported_ffo, threshold_percent),
        affo: ValidationResult::compare("AFFO", calculated_affo, reported_affo, threshold_percent),
    }
}

// ---------------------------------------------------------------------------
// Adjustment tables
// ---------------------------------------------------------------------------

pub(crate) fn ffo_adjustments(c: &FfoAffoComponents) -> AdjustmentSet {
    let mut set = AdjustmentSet::new();
    set.add(
        "A",
        "unrealized_fv_changes",
        "Unrealized fair value changes on investment properties",
        c.unrealized_fv_changes,
    );
    set.add(
        "B",
        "depreciation_real_estate",
        "Depreciation of depreciable real estate assets",
        c.depreciation_real_estate,
    );
    set.add(
        "C",
        "amortization_tenant_allowances",
        "Amortization of tenant allowances",
        c.amortization_tenant_allowances,
    );
    set.add(
        "D",
        "amortization_intangibles",
        "Amortization of tenant and customer relationship intangibles",
        c.amortization_intangibles,
    );
    set.add(
        "E",
        "gains_losses_property_sales",
        "Gains or losses from sales of investment properties",
        c.gains_losses_property_sales,
    );
    set.add("F", "tax_on_disposals", "Tax on gains or losses on disposals", c.tax_on_disposals);
    set.add("G", "deferred_taxes", "Deferred taxes", c.deferred_taxes);
    set.add(
        "H",
        "impairment_losses_reversals",
        "Impairment losses or reversals",
        c.impairment_losses_reversals,
    );
    set.add(
        "I",
        "revaluation_gains_losses",
        "Revaluation gains or losses on owner-occupied property",
        c.revaluation_gains_losses,
    );
    set.add(
        "J",
        "transaction_costs_business_comb",
        "Transaction costs on business combinations",
        c.transaction_costs_business_comb,
    );
    set.add(
        "K",
        "foreign_exchange_gains_losses",
        "Foreign exchange gains or losses",
        c.foreign_exchange_gains_losses,
    );
    set.add(
        "L",
        "sale_foreign_operations",
        "Gain or loss on sale of foreign operations",
        c.sale_foreign_operations,
    );
    set.add(
        "M",
        "fair_value_changes_financial_instruments",
        "Fair value changes on financial instruments",
        c.fair_value_changes_financial_instruments,
    );
    set.add(
        "N",
        "goodwill_impairment",
        "Goodwill impairment or negative goodwill",
        c.goodwill_impairment,
    );
    set.add(
        "O",
        "puttable_instruments_effects",
        "Effects of puttable instruments classified as liabilities",
        c.puttable_instruments_effects,
    );
    set.add(
        "P",
        "discontinued_operations",
        "Results of discontinued operations",
        c.discontinued_operations,
    );
    set.add(
        "Q",
        "equity_accounted_adjustments",
        "Adjustments for equity-accounted entities",
        c.equity_accounted_adjustments,
    );
    set.add(
        "R",
        "incremental_leasing_costs",
        "Incremental leasing costs",
        c.incremental_leasing_costs,
    );
    set.add(
        "S",
        "property_taxes_ifric21",
        "Property taxes accounted for under IFRIC 21",
        c.property_taxes_ifric21,
    );
    set.add(
        "T",
        "rou_asset_revenue_expense",
        "Right-of-use asset revenue and expense",
        c.rou_asset_revenue_expense,
    );
    set.subtract(
        "U",
        "non_controlling_interests_ffo",
        "Non-controlling interests share of FFO adjustments",
        c.non_controlling_interests_ffo,
    );
    set
}

pub(crate) fn affo_adjustments(c: &FfoAffoComponents) -> AdjustmentSet {
    let mut set = AdjustmentSet::new();
    set.subtract("V", "capex_sustaining", "Sustaining capital expenditures", c.capex_sustaining);
    set.subtract("W", "leasing_costs", "Leasing costs", c.leasing_costs);
    set.subtract(
        "X",
        "tenant_improvements",
        "Sustaining tenant improvements",
        c.tenant_improvements,
    );
    set.subtract("Y", "straight_line_rent", "Straight-line rent", c.straight_line_rent);
    set.subtract(
        "Z",
        "non_controlling_interests_affo",
        "Non-controlling interests share of AFFO adjustments",
        c.non_controlling_interests_affo,
    );
    set
}

/// Per-unit values on basic and diluted units; `None` for zero or absent counts.
pub(crate) fn per_unit(value: Money, record: &FinancialRecord) -> (Option<Money>, Option<Money>) {
    let bs = record.balance_sheet.as_ref();
    let divide = |units: Option<Decimal>| match units {
        Some(u) if !u.is_zero() => Some((value / u).round_dp(4)),
        _ => None,
    };
    (
        divide(bs.and_then(|b| b.common_units_outstanding)),
        divide(bs.and_then(|b| b.diluted_units_outstanding)),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
