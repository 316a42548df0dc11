//! The per-period financial record consumed by every calculator.
//!
//! Every leaf is optional: an absent value means "not disclosed", which the
//! calculators track separately from an explicit zero. Which fields are
//! required is decided per metric (see [`crate::reit::validation`]).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Currency, Money, Percent, Units};

/// One issuer, one reporting period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub issuer_name: Option<String>,
    pub reporting_date: Option<String>,
    /// Free-text period label, e.g. "Six months ended June 30, 2025".
    pub reporting_period: Option<String>,
    /// Explicit period length; takes precedence over `reporting_period` text.
    pub period_months: Option<u32>,
    pub currency: Option<Currency>,
    pub balance_sheet: Option<BalanceSheet>,
    pub income_statement: Option<IncomeStatement>,
    pub ffo_affo: Option<ReportedFfoAffo>,
    pub ffo_affo_components: Option<FfoAffoComponents>,
    pub acfo_components: Option<AcfoComponents>,
    pub cash_flow_operating: Option<CashFlowOperating>,
    pub cash_flow_investing: Option<CashFlowInvesting>,
    pub cash_flow_financing: Option<CashFlowFinancing>,
    pub liquidity: Option<Liquidity>,
    pub dilution_detail: Option<DilutionDetail>,
    pub portfolio: Option<PortfolioData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub total_assets: Option<Money>,
    pub mortgages_noncurrent: Option<Money>,
    pub mortgages_current: Option<Money>,
    pub credit_facilities: Option<Money>,
    pub senior_unsecured_debentures: Option<Money>,
    pub cash: Option<Money>,
    /// Basic units outstanding (denominator for per-unit figures).
    pub common_units_outstanding: Option<Units>,
    pub diluted_units_outstanding: Option<Units>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub noi: Option<Money>,
    /// Period (not annualized) interest expense.
    pub interest_expense: Option<Money>,
    pub revenue: Option<Money>,
    pub net_income: Option<Money>,
}

/// Figures as published by the issuer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportedFfoAffo {
    pub ffo: Option<Money>,
    pub affo: Option<Money>,
    pub acfo: Option<Money>,
    pub ffo_per_unit: Option<Money>,
    pub affo_per_unit: Option<Money>,
    pub acfo_per_unit: Option<Money>,
    pub distributions_per_unit: Option<Money>,
}

/// Granular REALPAC FFO (A..U) and AFFO (V..Z) adjustments.
///
/// FFO items are signed add-backs; U and every AFFO item are deductions
/// supplied as positive amounts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FfoAffoComponents {
    pub net_income_ifrs: Option<Money>,
    pub unrealized_fv_changes: Option<Money>,
    pub depreciation_real_estate: Option<Money>,
    pub amortization_tenant_allowances: Option<Money>,
    pub amortization_intangibles: Option<Money>,
    pub gains_losses_property_sales: Option<Money>,
    pub tax_on_disposals: Option<Money>,
    pub deferred_taxes: Option<Money>,
    pub impairment_losses_reversals: Option<Money>,
    pub revaluation_gains_losses: Option<Money>,
    pub transaction_costs_business_comb: Option<Money>,
    pub foreign_exchange_gains_losses: Option<Money>,
    pub sale_foreign_operations: Option<Money>,
    pub fair_value_changes_financial_instruments: Option<Money>,
    pub goodwill_impairment: Option<Money>,
    pub puttable_instruments_effects: Option<Money>,
    pub discontinued_operations: Option<Money>,
    pub equity_accounted_adjustments: Option<Money>,
    pub incremental_leasing_costs: Option<Money>,
    pub property_taxes_ifric21: Option<Money>,
    pub rou_asset_revenue_expense: Option<Money>,
    pub non_controlling_interests_ffo: Option<Money>,
    pub capex_sustaining: Option<Money>,
    pub leasing_costs: Option<Money>,
    pub tenant_improvements: Option<Money>,
    pub straight_line_rent: Option<Money>,
    pub non_controlling_interests_affo: Option<Money>,
    pub calculation_method: Option<String>,
    pub reserve_methodology: Option<String>,
}

/// REALPAC ACFO adjustments, all signed and added to CFO.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcfoComponents {
    pub cash_flow_from_operations: Option<Money>,
    pub adj_1_working_capital: Option<Money>,
    pub adj_2_interest_financing: Option<Money>,
    pub adj_3a_jv_distributions: Option<Money>,
    pub adj_3b_jv_acfo: Option<Money>,
    pub adj_3c_jv_notional_interest: Option<Money>,
    pub adj_4_capex_sustaining: Option<Money>,
    pub adj_5_tenant_improvements: Option<Money>,
    pub adj_6_external_leasing_costs: Option<Money>,
    pub adj_7_investment_gains_losses: Option<Money>,
    pub adj_8_taxes_on_disposals: Option<Money>,
    pub adj_9_transaction_costs: Option<Money>,
    pub adj_10_deferred_financing_costs: Option<Money>,
    pub adj_11_capitalized_interest: Option<Money>,
    pub adj_12_lease_principal: Option<Money>,
    pub adj_13a_puttable_distributions: Option<Money>,
    pub adj_13b_puttable_other: Option<Money>,
    pub adj_14a_nci_distributions: Option<Money>,
    pub adj_14b_nci_other: Option<Money>,
    pub adj_15_property_taxes_ifric21: Option<Money>,
    pub adj_16a_unit_compensation: Option<Money>,
    pub adj_16b_employee_benefits: Option<Money>,
    pub adj_16c_restructuring: Option<Money>,
    pub adj_16d_other_non_recurring: Option<Money>,
    pub adj_17a_realized_hedges: Option<Money>,
    pub adj_17b_realized_fx: Option<Money>,
    /// "distributions", "acfo_share" or "none".
    pub jv_treatment_method: Option<String>,
    pub calculation_method: Option<String>,
    /// Development spend disclosed alongside ACFO; excluded from the sum.
    pub capex_development: Option<Money>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowOperating {
    pub total_cfo: Option<Money>,
}

/// Investing cash flows, signed (outflows negative).
///
/// Sustaining capex, sustaining tenant improvements, external leasing costs
/// and JV distributions are already inside ACFO. Any key outside the eight
/// classified items lands in `extra`, and AFCF refuses to run while it is
/// non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowInvesting {
    pub development_capex: Option<Money>,
    pub property_acquisitions: Option<Money>,
    pub jv_capital_contributions: Option<Money>,
    pub other_investing_outflows: Option<Money>,
    pub property_dispositions: Option<Money>,
    pub jv_return_of_capital: Option<Money>,
    pub business_combinations: Option<Money>,
    pub other_investing_inflows: Option<Money>,
    /// Issuer-reported net CFI.
    pub total_cfi: Option<Money>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Financing cash flows; outflows may be signed either way, magnitudes are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowFinancing {
    pub debt_principal_repayments: Option<Money>,
    pub new_debt_issuances: Option<Money>,
    pub distributions_common: Option<Money>,
    pub distributions_preferred: Option<Money>,
    pub distributions_nci: Option<Money>,
    pub equity_issuances: Option<Money>,
    pub other_financing: Option<Money>,
    pub total_cff: Option<Money>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Liquidity {
    pub cash_and_equivalents: Option<Money>,
    pub marketable_securities: Option<Money>,
    pub restricted_cash: Option<Money>,
    pub undrawn_credit_facilities: Option<Money>,
    pub credit_facility_limit: Option<Money>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DilutionDetail {
    pub basic_units: Option<Units>,
    pub diluted_units: Option<Units>,
    pub dilution_percentage: Option<Percent>,
    pub restricted_units: Option<Units>,
    pub deferred_units: Option<Units>,
    pub unit_options: Option<Units>,
    pub convertible_debentures_units: Option<Units>,
    pub warrants: Option<Units>,
}

/// Portfolio statistics, passed through to the output untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_gla_sf: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupancy_rate: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weighted_average_lease_term: Option<Decimal>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_absent_sections_deserialize_as_none() {
        let record: FinancialRecord =
            serde_json::from_str(r#"{"balance_sheet": {"total_assets": 1000}}"#).unwrap();
        let bs = record.balance_sheet.unwrap();
        assert_eq!(bs.total_assets, Some(dec!(1000)));
        assert_eq!(bs.cash, None);
        assert!(record.acfo_components.is_none());
    }

    #[test]
    fn test_cfi_sets_aside_items_already_inside_acfo() {
        let cfi: CashFlowInvesting =
            serde_json::from_str(r#"{"development_capex": -100, "capex_sustaining": -50}"#)
                .unwrap();
        assert_eq!(cfi.development_capex, Some(dec!(-100)));
        assert_eq!(cfi.extra.keys().collect::<Vec<_>>(), vec!["capex_sustaining"]);
    }

    #[test]
    fn test_portfolio_keeps_unknown_keys() {
        let p: PortfolioData =
            serde_json::from_str(r#"{"property_count": 42, "markets": ["Toronto"]}"#).unwrap();
        assert_eq!(p.property_count, Some(42));
        assert!(p.extra.contains_key("markets"));
    }
}
