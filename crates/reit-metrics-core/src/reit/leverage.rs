use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ReitMetricsError;
use crate::record::FinancialRecord;
use crate::reit::validation::{require_record_fields, LEVERAGE_REQUIRED_FIELDS};
use crate::types::{round2, with_metadata, ComputationOutput, Money, Percent};
use crate::ReitMetricsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One debt instrument's share of total debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtComponent {
    pub name: String,
    pub amount: Money,
    pub share_of_total_percent: Option<Percent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeverageMetrics {
    pub total_assets: Money,
    pub total_debt: Money,
    pub cash: Money,
    pub net_debt: Money,
    /// Total debt / total assets x 100, 2 dp.
    pub debt_to_assets_percent: Percent,
    /// Net debt / total assets x 100, 2 dp.
    pub net_debt_ratio: Percent,
    pub debt_breakdown: Vec<DebtComponent>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Total debt, net debt and leverage ratios from the balance sheet.
pub fn calculate_leverage(
    record: &FinancialRecord,
) -> ReitMetricsResult<ComputationOutput<LeverageMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_record_fields(record, LEVERAGE_REQUIRED_FIELDS)?;
    let bs = record
        .balance_sheet
        .as_ref()
        .ok_or_else(|| ReitMetricsError::missing_field("balance_sheet"))?;

    // Presence is guaranteed by the required-field check above.
    let total_assets = bs.total_assets.unwrap_or_default();
    let cash = bs.cash.unwrap_or_default();

    let mut components: Vec<(&str, Money)> = vec![
        ("mortgages_noncurrent", bs.mortgages_noncurrent.unwrap_or_default()),
        ("mortgages_current", bs.mortgages_current.unwrap_or_default()),
        ("credit_facilities", bs.credit_facilities.unwrap_or_default()),
    ];
    if let Some(debentures) = bs.senior_unsecured_debentures {
        components.push(("senior_unsecured_debentures", debentures));
    }

    validate_balances(total_assets, &components)?;

    if cash < Decimal::ZERO {
        warnings.push(format!("Cash balance {cash} is negative; net debt will exceed total debt."));
    }

    let total_debt: Money = components.iter().map(|(_, amount)| *amount).sum();
    let net_debt = total_debt - cash;

    if net_debt < Decimal::ZERO {
        warnings.push("Cash exceeds total debt; issuer is in a net cash position.".into());
    }

    let debt_to_assets_percent = round2(total_debt / total_assets * dec!(100));
    let net_debt_ratio = round2(net_debt / total_assets * dec!(100));

    if debt_to_assets_percent > dec!(60) {
        warnings.push(format!(
            "Debt to assets of {debt_to_assets_percent}% exceeds 60%, above typical REIT declaration of trust limits."
        ));
    }

    let debt_breakdown = components
        .iter()
        .map(|(name, amount)| DebtComponent {
            name: name.to_string(),
            amount: *amount,
            share_of_total_percent: if total_debt.is_zero() {
                None
            } else {
                Some(round2(*amount / total_debt * dec!(100)))
            },
        })
        .collect();

    let output = LeverageMetrics {
        total_assets,
        total_debt,
        cash,
        net_debt,
        debt_to_assets_percent,
        net_debt_ratio,
        debt_breakdown,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "total_debt": "mortgages (current + non-current) + credit facilities + senior unsecured debentures",
        "net_debt": "total_debt - cash",
        "rounding": "2 dp"
    });

    Ok(with_metadata(
        "REIT Leverage (balance sheet debt / total assets)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_balances(total_assets: Money, components: &[(&str, Money)]) -> ReitMetricsResult<()> {
    if total_assets <= Decimal::ZERO {
        return Err(ReitMetricsError::invalid(
            "balance_sheet.total_assets",
            "Total assets must be positive.",
        ));
    }
    for (name, amount) in components {
        if *amount < Decimal::ZERO {
            return Err(ReitMetricsError::invalid(
                format!("balance_sheet.{name}"),
                "Debt components cannot be negative.",
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
