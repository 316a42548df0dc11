use pretty_assertions::assert_eq;
use reit_metrics_core::config::{AcfoConfig, AfcfConfig, FfoAffoConfig};
use reit_metrics_core::record::{
    AcfoComponents, CashFlowFinancing, CashFlowInvesting, FfoAffoComponents, IncomeStatement,
};
use reit_metrics_core::reit::acfo::{calculate_acfo, check_acfo_affo_consistency};
use reit_metrics_core::reit::afcf::{calculate_afcf, validate_afcf_reconciliation, AcfoBasis};
use reit_metrics_core::reit::burn_rate::calculate_burn_rate;
use reit_metrics_core::reit::coverage::calculate_coverage;
use reit_metrics_core::reit::ffo_affo::{calculate_affo, calculate_ffo};
use reit_metrics_core::reit::leverage::calculate_leverage;
use reit_metrics_core::{DataQuality, FinancialRecord, ReitMetricsError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Map, Value};

const FFO_FIELDS: [&str; 21] = [
    "unrealized_fv_changes",
    "depreciation_real_estate",
    "amortization_tenant_allowances",
    "amortization_intangibles",
    "gains_losses_property_sales",
    "tax_on_disposals",
    "deferred_taxes",
    "impairment_losses_reversals",
    "revaluation_gains_losses",
    "transaction_costs_business_comb",
    "foreign_exchange_gains_losses",
    "sale_foreign_operations",
    "fair_value_changes_financial_instruments",
    "goodwill_impairment",
    "puttable_instruments_effects",
    "discontinued_operations",
    "equity_accounted_adjustments",
    "incremental_leasing_costs",
    "property_taxes_ifric21",
    "rou_asset_revenue_expense",
    "non_controlling_interests_ffo",
];

const AFFO_FIELDS: [&str; 5] = [
    "capex_sustaining",
    "leasing_costs",
    "tenant_improvements",
    "straight_line_rent",
    "non_controlling_interests_affo",
];

const CFI_FIELDS: [&str; 8] = [
    "development_capex",
    "property_acquisitions",
    "jv_capital_contributions",
    "other_investing_outflows",
    "property_dispositions",
    "jv_return_of_capital",
    "business_combinations",
    "other_investing_inflows",
];

const ACFO_GROUP_FIELDS: [&str; 17] = [
    "adj_1_working_capital",
    "adj_2_interest_financing",
    "adj_3a_jv_distributions",
    "adj_4_capex_sustaining",
    "adj_5_tenant_improvements",
    "adj_6_external_leasing_costs",
    "adj_7_investment_gains_losses",
    "adj_8_taxes_on_disposals",
    "adj_9_transaction_costs",
    "adj_10_deferred_financing_costs",
    "adj_11_capitalized_interest",
    "adj_12_lease_principal",
    "adj_13a_puttable_distributions",
    "adj_14a_nci_distributions",
    "adj_15_property_taxes_ifric21",
    "adj_16a_unit_compensation",
    "adj_17a_realized_hedges",
];

fn with_fields(start_field: &str, start: i64, fields: &[&str], value: i64) -> Value {
    let mut map = Map::new();
    map.insert(start_field.to_string(), json!(start));
    for f in fields {
        map.insert(f.to_string(), json!(value));
    }
    Value::Object(map)
}

fn ffo_record(present: usize) -> FinancialRecord {
    let components: FfoAffoComponents =
        serde_json::from_value(with_fields("net_income_ifrs", 10_000, &FFO_FIELDS[..present], 100))
            .unwrap();
    FinancialRecord {
        ffo_affo_components: Some(components),
        ..Default::default()
    }
}

fn acfo_record(groups: usize) -> FinancialRecord {
    let components: AcfoComponents = serde_json::from_value(with_fields(
        "cash_flow_from_operations",
        20_000,
        &ACFO_GROUP_FIELDS[..groups],
        50,
    ))
    .unwrap();
    FinancialRecord {
        acfo_components: Some(components),
        ..Default::default()
    }
}

// ===========================================================================
// FFO / AFFO
// ===========================================================================

#[test]
fn test_ffo_identity_subtracts_only_u() {
    let ffo = calculate_ffo(&ffo_record(21), &FfoAffoConfig::default()).unwrap();
    // 10,000 + 20 x 100 - 100
    assert_eq!(ffo.ffo, dec!(11_900));
    assert_eq!(ffo.ffo, ffo.net_income_ifrs + ffo.total_adjustments);
    assert!(ffo.missing_adjustments.is_empty());
}

#[test]
fn test_ffo_quality_boundaries() {
    let cfg = FfoAffoConfig::default();
    let grade = |n: usize| calculate_ffo(&ffo_record(n), &cfg).unwrap().data_quality;
    assert_eq!(grade(15), DataQuality::Strong);
    assert_eq!(grade(14), DataQuality::Moderate);
    assert_eq!(grade(8), DataQuality::Moderate);
    assert_eq!(grade(7), DataQuality::Limited);
    assert_eq!(grade(0), DataQuality::None);
}

#[test]
fn test_affo_deducts_v_to_z() {
    let mut record = ffo_record(2);
    let c = record.ffo_affo_components.as_mut().unwrap();
    c.capex_sustaining = Some(dec!(300));
    c.leasing_costs = Some(dec!(50));
    c.tenant_improvements = Some(dec!(150));
    c.straight_line_rent = Some(dec!(25));

    let cfg = FfoAffoConfig::default();
    let ffo = calculate_ffo(&record, &cfg).unwrap();
    let affo = calculate_affo(&record, &ffo, &cfg).unwrap();
    assert_eq!(affo.total_deductions, dec!(525));
    assert_eq!(affo.affo, ffo.ffo - dec!(525));
    // 4 of 5 present.
    assert_eq!(affo.data_quality, DataQuality::Strong);
}

#[test]
fn test_ffo_no_data_vs_insufficient_data() {
    let cfg = FfoAffoConfig::default();
    assert!(matches!(
        calculate_ffo(&FinancialRecord::default(), &cfg).unwrap_err(),
        ReitMetricsError::NoData(_)
    ));
    let record = FinancialRecord {
        ffo_affo_components: Some(FfoAffoComponents::default()),
        ..Default::default()
    };
    assert!(matches!(
        calculate_ffo(&record, &cfg).unwrap_err(),
        ReitMetricsError::InsufficientData(_)
    ));
}

#[test]
fn test_affo_quality_boundaries() {
    let cfg = FfoAffoConfig::default();
    let grade = |n: usize| {
        let components: FfoAffoComponents = serde_json::from_value(with_fields(
            "net_income_ifrs",
            10_000,
            &AFFO_FIELDS[..n],
            100,
        ))
        .unwrap();
        let record = FinancialRecord {
            ffo_affo_components: Some(components),
            ..Default::default()
        };
        let ffo = calculate_ffo(&record, &cfg).unwrap();
        calculate_affo(&record, &ffo, &cfg).unwrap().data_quality
    };
    assert_eq!(grade(5), DataQuality::Strong);
    assert_eq!(grade(4), DataQuality::Strong);
    assert_eq!(grade(3), DataQuality::Moderate);
    assert_eq!(grade(2), DataQuality::Moderate);
    assert_eq!(grade(1), DataQuality::Limited);
    assert_eq!(grade(0), DataQuality::None);
}

// ===========================================================================
// ACFO
// ===========================================================================

#[test]
fn test_acfo_group_boundaries() {
    let cfg = AcfoConfig::default();
    let grade = |n: usize| calculate_acfo(&acfo_record(n), &cfg).unwrap().data_quality;
    assert_eq!(grade(12), DataQuality::Strong);
    assert_eq!(grade(11), DataQuality::Moderate);
    assert_eq!(grade(6), DataQuality::Moderate);
    assert_eq!(grade(5), DataQuality::Limited);
}

#[test]
fn test_acfo_sums_every_item() {
    let acfo = calculate_acfo(&acfo_record(17), &AcfoConfig::default()).unwrap();
    assert_eq!(acfo.acfo, dec!(20_850));
    assert_eq!(acfo.groups_available, 17);
}

#[test]
fn test_capex_consistency_is_reported_not_reconciled() {
    let acfo = AcfoComponents {
        adj_4_capex_sustaining: Some(dec!(-3_000)),
        adj_5_tenant_improvements: Some(dec!(-1_000)),
        ..Default::default()
    };
    let ffo = FfoAffoComponents {
        capex_sustaining: Some(dec!(3_200)),
        tenant_improvements: Some(dec!(1_000)),
        ..Default::default()
    };
    let check = check_acfo_affo_consistency(&acfo, &ffo, dec!(1));
    assert_eq!(check.capex_sustaining.matches, Some(false));
    assert_eq!(check.capex_sustaining.variance_amount, Some(dec!(-200)));
    assert_eq!(check.tenant_improvements.matches, Some(true));
    assert!(!check.consistent);
}

// ===========================================================================
// AFCF
// ===========================================================================

#[test]
fn test_afcf_tier_identity() {
    let record = FinancialRecord {
        cash_flow_investing: Some(CashFlowInvesting {
            development_capex: Some(dec!(-12_000)),
            property_acquisitions: Some(dec!(-40_000)),
            property_dispositions: Some(dec!(55_000)),
            business_combinations: Some(dec!(-5_000)),
            other_investing_inflows: Some(dec!(750)),
            ..Default::default()
        }),
        ..Default::default()
    };
    let cfg = AfcfConfig::default();
    let afcf = calculate_afcf(&record, Some(AcfoBasis::reported(dec!(70_000))), &cfg).unwrap();

    let recurring: Decimal = dec!(-12_000) + dec!(-40_000);
    let non_recurring: Decimal = dec!(55_000) + dec!(-5_000) + dec!(750);
    assert_eq!(afcf.sustainable_afcf, dec!(70_000) + recurring);
    assert_eq!(afcf.total_afcf, dec!(70_000) + recurring + non_recurring);
    assert_eq!(afcf.total_afcf - afcf.sustainable_afcf, non_recurring);
    assert_eq!(afcf.non_recurring_cfi, non_recurring);

    let rec = validate_afcf_reconciliation(&record, &afcf, &cfg);
    assert!(rec.afcf_identity.passed);
    assert!(rec.cash_change.is_none());
}

#[test]
fn test_afcf_quality_boundaries() {
    let cfg = AfcfConfig::default();
    let grade = |n: usize| {
        let mut map = Map::new();
        for f in &CFI_FIELDS[..n] {
            map.insert(f.to_string(), json!(-100));
        }
        let record = FinancialRecord {
            cash_flow_investing: Some(serde_json::from_value(Value::Object(map)).unwrap()),
            ..Default::default()
        };
        calculate_afcf(&record, Some(AcfoBasis::reported(dec!(5_000))), &cfg)
            .unwrap()
            .data_quality
    };
    assert_eq!(grade(8), DataQuality::Strong);
    assert_eq!(grade(6), DataQuality::Strong);
    assert_eq!(grade(5), DataQuality::Moderate);
    assert_eq!(grade(3), DataQuality::Moderate);
    assert_eq!(grade(2), DataQuality::Limited);
    assert_eq!(grade(0), DataQuality::Insufficient);
}

#[test]
fn test_cfi_rejects_items_already_in_acfo() {
    let record: FinancialRecord = serde_json::from_value(json!({
        "cash_flow_investing": {
            "development_capex": -1000,
            "capex_sustaining": -500
        }
    }))
    .unwrap();
    let cfi = record.cash_flow_investing.as_ref().unwrap();
    assert!(cfi.extra.contains_key("capex_sustaining"));

    let err = calculate_afcf(
        &record,
        Some(AcfoBasis::reported(dec!(10_000))),
        &AfcfConfig::default(),
    )
    .unwrap_err();
    match err {
        ReitMetricsError::InvalidData { field, .. } => {
            assert_eq!(field, "cash_flow_investing.capex_sustaining")
        }
        other => panic!("expected InvalidData, got {other:?}"),
    }
}

#[test]
fn test_unknown_cfi_key_only_blocks_afcf() {
    let record: FinancialRecord = serde_json::from_value(json!({
        "balance_sheet": {
            "total_assets": 1000,
            "mortgages_noncurrent": 300,
            "mortgages_current": 50,
            "credit_facilities": 100,
            "cash": 50
        },
        "income_statement": { "noi": 300, "interest_expense": 100 },
        "cash_flow_investing": { "development_capex": -1, "capex_sustaining": -5 }
    }))
    .unwrap();

    assert_eq!(calculate_leverage(&record).unwrap().result.total_debt, dec!(450));
    assert_eq!(
        calculate_coverage(&record).unwrap().result.noi_interest_coverage,
        dec!(3)
    );
    assert!(matches!(
        calculate_afcf(&record, Some(AcfoBasis::reported(dec!(10))), &AfcfConfig::default())
            .unwrap_err(),
        ReitMetricsError::InvalidData { .. }
    ));
}

// ===========================================================================
// Coverage and burn rate
// ===========================================================================

#[test]
fn test_zero_interest_is_invalid_data() {
    let record = FinancialRecord {
        income_statement: Some(IncomeStatement {
            noi: Some(dec!(25_000)),
            interest_expense: Some(Decimal::ZERO),
            ..Default::default()
        }),
        ..Default::default()
    };
    assert!(matches!(
        calculate_coverage(&record).unwrap_err(),
        ReitMetricsError::InvalidData { .. }
    ));
}

#[test]
fn test_burn_rate_six_month_example() {
    let record = FinancialRecord {
        reporting_period: Some("Six months ended June 30, 2025".into()),
        income_statement: Some(IncomeStatement {
            interest_expense: Some(dec!(15_000)),
            ..Default::default()
        }),
        cash_flow_financing: Some(CashFlowFinancing {
            debt_principal_repayments: Some(dec!(-25_000)),
            distributions_common: Some(dec!(-18_000)),
            distributions_preferred: Some(dec!(-2_000)),
            ..Default::default()
        }),
        ..Default::default()
    };
    let burn = calculate_burn_rate(&record, dec!(50_000)).unwrap();
    assert_eq!(burn.mandatory_obligations, dec!(60_000));
    assert!(burn.applicable);
    assert_eq!(burn.monthly_burn_rate, Some(dec!(-1666.67)));

    let covered = calculate_burn_rate(&record, dec!(60_000)).unwrap();
    assert!(!covered.applicable);
    assert_eq!(covered.monthly_burn_rate, None);
}
