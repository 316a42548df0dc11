//! REALPAC Adjusted Cash Flow from Operations (ACFO, January 2023).
//!
//! ACFO starts from IFRS cash flow from operations and adds 17 adjustment
//! groups (some split into lettered sub-items). All items are signed and
//! added; there is no deduction exception as there is for FFO's item U.
//!
//! Sustaining capex (4) and sustaining tenant improvements (5) also appear in
//! the AFFO waterfall as V and X. The two sources are compared, never merged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Instant;

use crate::config::{AcfoConfig, MetricsConfig};
use crate::error::ReitMetricsError;
use crate::record::{AcfoComponents, FfoAffoComponents, FinancialRecord};
use crate::reit::ffo_affo::per_unit;
use crate::types::{
    with_metadata, AdjustmentSet, ComputationOutput, DataQuality, Money, ValidationResult,
};
use crate::ReitMetricsResult;

/// Number of ACFO adjustment groups (1..17).
pub const ACFO_ADJUSTMENT_GROUPS: usize = 17;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How joint-venture cash flows enter ACFO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum JvTreatment {
    /// Cash distributions received from JVs (item 3a).
    Distributions { amount: Option<Money> },
    /// Proportionate share of JV ACFO (3b) with notional interest on JV development (3c).
    AcfoShare {
        acfo_share: Option<Money>,
        notional_interest: Option<Money>,
    },
    /// No method declared.
    None,
}

impl JvTreatment {
    fn from_components(c: &AcfoComponents) -> Self {
        let method = c
            .jv_treatment_method
            .as_deref()
            .map(|m| m.trim().to_ascii_lowercase());
        match method.as_deref() {
            Some("distributions") | Some("distribution") | Some("distributions_received") => {
                JvTreatment::Distributions {
                    amount: c.adj_3a_jv_distributions,
                }
            }
            Some("acfo_share")
            | Some("acfo")
            | Some("proportionate")
            | Some("proportionate_share") => {
                JvTreatment::AcfoShare {
                    acfo_share: c.adj_3b_jv_acfo,
                    notional_interest: c.adj_3c_jv_notional_interest,
                }
            }
            _ => JvTreatment::None,
        }
    }

    /// Whether a JV item code belongs to this treatment.
    fn includes(&self, code: &str) -> bool {
        match self {
            JvTreatment::Distributions { .. } => code == "3a",
            JvTreatment::AcfoShare { .. } => code == "3b" || code == "3c",
            JvTreatment::None => true,
        }
    }
}

/// A JV item left out of the sum because it contradicts the declared treatment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedJvItem {
    pub code: String,
    pub field: String,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcfoResult {
    pub acfo: Money,
    pub cash_flow_from_operations: Money,
    pub adjustments: AdjustmentSet,
    pub total_adjustments: Money,
    pub acfo_per_unit_basic: Option<Money>,
    pub acfo_per_unit_diluted: Option<Money>,
    pub data_quality: DataQuality,
    /// Groups with at least one disclosed item.
    pub groups_available: usize,
    pub groups_total: usize,
    pub missing_adjustments: Vec<String>,
    pub jv_treatment: JvTreatment,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub excluded_jv_items: Vec<ExcludedJvItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation_method: Option<String>,
}

/// One item compared across the ACFO and AFFO waterfalls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyCheck {
    pub item: String,
    pub acfo_amount: Option<Money>,
    pub affo_amount: Option<Money>,
    /// `None` when either side is not disclosed.
    pub matches: Option<bool>,
    /// |ACFO| - |AFFO|.
    pub variance_amount: Option<Money>,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcfoAffoConsistency {
    pub capex_sustaining: ConsistencyCheck,
    pub tenant_improvements: ConsistencyCheck,
    /// False if any comparable item disagrees.
    pub consistent: bool,
    pub tolerance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcfoMetrics {
    pub acfo: AcfoResult,
    pub validation: ValidationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistency: Option<AcfoAffoConsistency>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// ACFO with reported-figure validation and the AFFO consistency check.
pub fn calculate_acfo_metrics(
    record: &FinancialRecord,
    config: &MetricsConfig,
) -> ReitMetricsResult<ComputationOutput<AcfoMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let acfo = calculate_acfo(record, &config.acfo)?;

    for item in &acfo.excluded_jv_items {
        warnings.push(format!(
            "JV item {} ({}) of {} excluded: inconsistent with the declared JV treatment.",
            item.code, item.field, item.amount
        ));
    }
    if acfo.jv_treatment == JvTreatment::None && jv_items_present(&acfo.adjustments) > 1 {
        warnings.push(
            "Multiple JV items disclosed without a jv_treatment_method; all were summed.".into(),
        );
    }

    let validation = ValidationResult::compare(
        "ACFO",
        Some(acfo.acfo),
        record.ffo_affo.as_ref().and_then(|r| r.acfo),
        config.acfo.variance_threshold_percent,
    );
    if validation.within_threshold == Some(false) {
        warnings.extend(validation.notes.iter().cloned());
    }

    let consistency = match (&record.acfo_components, &record.ffo_affo_components) {
        (Some(acfo_c), Some(ffo_c)) => {
            let check =
                check_acfo_affo_consistency(acfo_c, ffo_c, config.acfo.consistency_tolerance);
            if !check.consistent {
                warnings.push(
                    "Sustaining capex or tenant improvements differ between ACFO and AFFO inputs; verify upstream data entry."
                        .into(),
                );
            }
            Some(check)
        }
        _ => None,
    };

    let output = AcfoMetrics {
        acfo,
        validation,
        consistency,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "acfo": "cash_flow_from_operations + sum(adjustments 1..17)",
        "data_quality": "counted per adjustment group",
        "strict_jv_treatment": config.acfo.strict_jv_treatment,
        "consistency_tolerance": config.acfo.consistency_tolerance,
    });

    Ok(with_metadata(
        "REALPAC ACFO (January 2023)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// ACFO from cash flow from operations and adjustments 1..17.
pub fn calculate_acfo(
    record: &FinancialRecord,
    config: &AcfoConfig,
) -> ReitMetricsResult<AcfoResult> {
    let components = record
        .acfo_components
        .as_ref()
        .ok_or_else(|| ReitMetricsError::NoData("acfo_components section not disclosed".into()))?;
    let cfo = components.cash_flow_from_operations.ok_or_else(|| {
        ReitMetricsError::InsufficientData(
            "acfo_components.cash_flow_from_operations is required as the ACFO starting point"
                .into(),
        )
    })?;

    let jv_treatment = JvTreatment::from_components(components);
    let all = acfo_adjustments(components);

    let mut adjustments = AdjustmentSet::new();
    let mut excluded_jv_items = Vec::new();
    for adj in all.entries {
        let is_jv = adj.code.starts_with('3');
        if config.strict_jv_treatment && is_jv && !jv_treatment.includes(&adj.code) {
            if let Some(amount) = adj.amount {
                excluded_jv_items.push(ExcludedJvItem {
                    code: adj.code.clone(),
                    field: adj.field.clone(),
                    amount,
                });
            }
            continue;
        }
        adjustments.entries.push(adj);
    }

    let total_adjustments = adjustments.total();
    let acfo = cfo + total_adjustments;
    let groups_available = present_groups(&adjustments);
    let (acfo_per_unit_basic, acfo_per_unit_diluted) = per_unit(acfo, record);

    tracing::debug!(%acfo, groups_available, "calculated ACFO");

    Ok(AcfoResult {
        acfo,
        cash_flow_from_operations: cfo,
        total_adjustments,
        acfo_per_unit_basic,
        acfo_per_unit_diluted,
        data_quality: DataQuality::classify(groups_available, &config.quality),
        groups_available,
        groups_total: ACFO_ADJUSTMENT_GROUPS,
        missing_adjustments: adjustments.missing_fields(),
        adjustments,
        jv_treatment,
        excluded_jv_items,
        calculation_method: components.calculation_method.clone(),
    })
}

/// Compare sustaining capex and tenant improvements across ACFO and AFFO inputs.
///
/// AFFO carries these as positive deductions and ACFO as signed outflows, so
/// magnitudes are compared.
pub fn check_acfo_affo_consistency(
    acfo: &AcfoComponents,
    ffo_affo: &FfoAffoComponents,
    tolerance: Money,
) -> AcfoAffoConsistency {
    let capex_sustaining = compare_item(
        "capex_sustaining",
        acfo.adj_4_capex_sustaining,
        ffo_affo.capex_sustaining,
        tolerance,
    );
    let tenant_improvements = compare_item(
        "tenant_improvements",
        acfo.adj_5_tenant_improvements,
        ffo_affo.tenant_improvements,
        tolerance,
    );
    let consistent = capex_sustaining.matches != Some(false)
        && tenant_improvements.matches != Some(false);

    AcfoAffoConsistency {
        capex_sustaining,
        tenant_improvements,
        consistent,
        tolerance,
    }
}

fn compare_item(
    item: &str,
    acfo_amount: Option<Money>,
    affo_amount: Option<Money>,
    tolerance: Money,
) -> ConsistencyCheck {
    let (matches, variance_amount, note) = match (acfo_amount, affo_amount) {
        (Some(a), Some(b)) => {
            let variance = a.abs() - b.abs();
            let ok = variance.abs() <= tolerance;
            let note = if ok {
                format!("{item} agrees between ACFO and AFFO.")
            } else {
                format!("{item} differs by {variance} between ACFO ({a}) and AFFO ({b}).")
            };
            (Some(ok), Some(variance), note)
        }
        _ => (
            None,
            None,
            format!("{item} not disclosed in both waterfalls; not compared."),
        ),
    };
    ConsistencyCheck {
        item: item.to_string(),
        acfo_amount,
        affo_amount,
        matches,
        variance_amount,
        note,
    }
}

// ---------------------------------------------------------------------------
// Adjustment table
// ---------------------------------------------------------------------------

pub(crate) fn acfo_adjustments(c: &AcfoComponents) -> AdjustmentSet {
    let mut set = AdjustmentSet::new();
    set.add(
        "1",
        "adj_1_working_capital",
        "Eliminate changes in non-cash working capital",
        c.adj_1_working_capital,
    );
    set.add(
        "2",
        "adj_2_interest_financing",
        "Interest expense included in financing activities",
        c.adj_2_interest_financing,
    );
    set.add(
        "3a",
        "adj_3a_jv_distributions",
        "Distributions received from joint ventures",
        c.adj_3a_jv_distributions,
    );
    set.add("3b", "adj_3b_jv_acfo", "Share of joint venture ACFO", c.adj_3b_jv_acfo);
    set.add(
        "3c",
        "adj_3c_jv_notional_interest",
        "Notional interest on joint venture development",
        c.adj_3c_jv_notional_interest,
    );
    set.add(
        "4",
        "adj_4_capex_sustaining",
        "Sustaining capital expenditures",
        c.adj_4_capex_sustaining,
    );
    set.add(
        "5",
        "adj_5_tenant_improvements",
        "Sustaining tenant improvements",
        c.adj_5_tenant_improvements,
    );
    set.add(
        "6",
        "adj_6_external_leasing_costs",
        "External leasing costs",
        c.adj_6_external_leasing_costs,
    );
    set.add(
        "7",
        "adj_7_investment_gains_losses",
        "Realized investment gains or losses",
        c.adj_7_investment_gains_losses,
    );
    set.add(
        "8",
        "adj_8_taxes_on_disposals",
        "Taxes on property disposals",
        c.adj_8_taxes_on_disposals,
    );
    set.add(
        "9",
        "adj_9_transaction_costs",
        "Transaction costs on acquisitions",
        c.adj_9_transaction_costs,
    );
    set.add(
        "10",
        "adj_10_deferred_financing_costs",
        "Deferred financing costs",
        c.adj_10_deferred_financing_costs,
    );
    set.add(
        "11",
        "adj_11_capitalized_interest",
        "Capitalized interest on development",
        c.adj_11_capitalized_interest,
    );
    set.add(
        "12",
        "adj_12_lease_principal",
        "Principal portion of lease payments",
        c.adj_12_lease_principal,
    );
    set.add(
        "13a",
        "adj_13a_puttable_distributions",
        "Distributions on puttable instruments",
        c.adj_13a_puttable_distributions,
    );
    set.add(
        "13b",
        "adj_13b_puttable_other",
        "Other puttable instrument effects",
        c.adj_13b_puttable_other,
    );
    set.add(
        "14a",
        "adj_14a_nci_distributions",
        "Distributions to non-controlling interests",
        c.adj_14a_nci_distributions,
    );
    set.add(
        "14b",
        "adj_14b_nci_other",
        "Other non-controlling interest adjustments",
        c.adj_14b_nci_other,
    );
    set.add(
        "15",
        "adj_15_property_taxes_ifric21",
        "Property taxes under IFRIC 21",
        c.adj_15_property_taxes_ifric21,
    );
    set.add(
        "16a",
        "adj_16a_unit_compensation",
        "Unit-based compensation",
        c.adj_16a_unit_compensation,
    );
    set.add(
        "16b",
        "adj_16b_employee_benefits",
        "Employee future benefits",
        c.adj_16b_employee_benefits,
    );
    set.add("16c", "adj_16c_restructuring", "Restructuring and severance", c.adj_16c_restructuring);
    set.add(
        "16d",
        "adj_16d_other_non_recurring",
        "Other non-recurring items",
        c.adj_16d_other_non_recurring,
    );
    set.add(
        "17a",
        "adj_17a_realized_hedges",
        "Realized hedge gains or losses",
        c.adj_17a_realized_hedges,
    );
    set.add(
        "17b",
        "adj_17b_realized_fx",
        "Realized foreign exchange gains or losses",
        c.adj_17b_realized_fx,
    );
    set
}

/// Group of an item code: "16c" -> "16".
fn group_of(code: &str) -> &str {
    code.trim_end_matches(|c: char| c.is_ascii_alphabetic())
}

fn present_groups(set: &AdjustmentSet) -> usize {
    set.entries
        .iter()
        .filter(|a| a.is_present())
        .map(|a| group_of(&a.code))
        .collect::<BTreeSet<_>>()
        .len()
}

fn jv_items_present(set: &AdjustmentSet) -> usize {
    set.entries
        .iter()
        .filter(|a| a.code.starts_with('3') && a.is_present())
        .count()
}

/// Signed amount of a single ACFO item, if disclosed.
pub(crate) fn item_amount(result: &AcfoResult, code: &str) -> Option<Money> {
    result.adjustments.get(code).and_then(|a| a.amount)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
