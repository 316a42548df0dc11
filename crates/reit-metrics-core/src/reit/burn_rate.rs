//! Cash burn, runway and liquidity risk.
//!
//! A stress test that assumes no further capital-market access: sustainable
//! AFCF is compared with mandatory obligations (interest, principal,
//! distributions) while new debt and equity issuance are ignored. Only a
//! deficit makes burn "applicable" and unlocks runway, risk and
//! sustainable-burn outputs.

use chrono::{Days, Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{BurnRateConfig, MetricsConfig};
use crate::error::ReitMetricsError;
use crate::record::FinancialRecord;
use crate::reit::afcf::{mandatory_obligations, ObligationBreakdown};
use crate::reit::coverage::detect_period;
use crate::types::{
    round2, with_metadata, ComputationOutput, Money, Multiple, Percent,
};
use crate::ReitMetricsResult;

/// Average days per month used when projecting fractional months.
const DAYS_PER_MONTH: Decimal = dec!(30.4375);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BurnState {
    /// AFCF covers mandatory obligations.
    Surplus,
    /// AFCF falls short; burn rate applies.
    Deficit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnRateAnalysis {
    pub applicable: bool,
    pub state: BurnState,
    pub afcf: Money,
    pub obligations: ObligationBreakdown,
    pub mandatory_obligations: Money,
    /// AFCF - obligations for the period (negative in deficit).
    pub period_gap: Money,
    pub period_months: u32,
    /// Negative monthly shortfall; only set in deficit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_burn_rate: Option<Money>,
    /// Positive monthly cushion; only set in surplus.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_surplus: Option<Money>,
    pub self_funding_ratio: Option<Multiple>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashRunway {
    pub cash_and_equivalents: Money,
    pub marketable_securities: Money,
    pub restricted_cash: Money,
    /// Cash + marketable securities - restricted cash.
    pub available_cash: Money,
    pub undrawn_credit_facilities: Money,
    pub monthly_burn_rate: Money,
    pub runway_months: Decimal,
    pub runway_years: Decimal,
    /// Runway including undrawn credit facilities.
    pub extended_runway_months: Decimal,
    pub as_of: NaiveDate,
    pub depletion_date: Option<NaiveDate>,
    pub extended_depletion_date: Option<NaiveDate>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Critical,
    High,
    Moderate,
    Low,
}

impl RiskLevel {
    /// 4 = critical, 1 = low.
    pub fn score(self) -> u8 {
        match self {
            RiskLevel::Critical => 4,
            RiskLevel::High => 3,
            RiskLevel::Moderate => 2,
            RiskLevel::Low => 1,
        }
    }

    fn recommendations(self) -> Vec<String> {
        let items: &[&str] = match self {
            RiskLevel::Critical => &[
                "Immediate financing required: draw on credit facilities or arrange bridge financing",
                "Suspend or materially reduce distributions",
                "Defer all non-committed development and acquisition spending",
                "Pursue asset sales to raise liquidity",
            ],
            RiskLevel::High => &[
                "Arrange committed financing within the next two quarters",
                "Review distribution policy against AFCF",
                "Prioritize capital spending and defer discretionary development",
            ],
            RiskLevel::Moderate => &[
                "Monitor liquidity quarterly and extend debt maturities where possible",
                "Plan refinancing ahead of the 24-month horizon",
                "Consider capital recycling through selective dispositions",
            ],
            RiskLevel::Low => &[
                "Maintain current liquidity management",
                "Continue monitoring burn rate against AFCF",
            ],
        };
        items.iter().map(|s| s.to_string()).collect()
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskLevel::Critical => "CRITICAL",
            RiskLevel::High => "HIGH",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::Low => "LOW",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityRisk {
    pub risk_level: RiskLevel,
    pub risk_score: u8,
    pub runway_months: Decimal,
    pub extended_runway_months: Decimal,
    pub recommendations: Vec<String>,
    pub warning_flags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BurnStatus {
    #[serde(rename = "Above sustainable")]
    AboveSustainable,
    #[serde(rename = "Within sustainable")]
    WithinSustainable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SustainableBurn {
    pub target_runway_months: Decimal,
    pub available_cash: Money,
    /// Largest monthly burn that still lasts the target horizon.
    pub sustainable_monthly_burn: Money,
    /// Magnitude of the current monthly burn.
    pub actual_monthly_burn: Money,
    /// Positive when burning faster than sustainable.
    pub excess_burn: Money,
    pub status: BurnStatus,
    pub required_burn_reduction_percent: Option<Percent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnRateReport {
    pub burn_rate: BurnRateAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_runway: Option<CashRunway>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidity_risk: Option<LiquidityRisk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sustainable_burn: Option<SustainableBurn>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Burn state plus, in deficit with liquidity data, runway, risk and target burn.
pub fn analyze_burn_rate(
    record: &FinancialRecord,
    afcf: Money,
    as_of: NaiveDate,
    config: &MetricsConfig,
) -> ReitMetricsResult<ComputationOutput<BurnRateReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let (burn_rate, period_warning) = calculate_burn_rate_with_warning(record, afcf)?;
    warnings.extend(period_warning);
    warnings.extend(burn_rate.obligations.notes.iter().cloned());

    let mut report = BurnRateReport {
        burn_rate,
        cash_runway: None,
        liquidity_risk: None,
        sustainable_burn: None,
    };

    if report.burn_rate.applicable {
        match calculate_cash_runway(record, &report.burn_rate, as_of) {
            Ok(runway) => {
                warnings.extend(runway.notes.iter().cloned());
                let risk = assess_liquidity_risk(record, &runway, &config.burn_rate);
                if matches!(risk.risk_level, RiskLevel::Critical | RiskLevel::High) {
                    warnings.push(format!(
                        "Liquidity risk {} with {} months of runway.",
                        risk.risk_level, runway.runway_months
                    ));
                }
                report.sustainable_burn = Some(calculate_sustainable_burn(
                    &runway,
                    config.burn_rate.target_runway_months,
                ));
                report.liquidity_risk = Some(risk);
                report.cash_runway = Some(runway);
            }
            Err(ReitMetricsError::NoData(reason)) => {
                warnings.push(format!("Cash runway not computed: {reason}"));
            }
            Err(e) => return Err(e),
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "mandatory_obligations": "interest + principal repayments + distributions (common, preferred, NCI)",
        "new_financing": "excluded",
        "available_cash": "cash + marketable securities - restricted cash",
        "risk_bands_months": [
            config.burn_rate.critical_months,
            config.burn_rate.high_months,
            config.burn_rate.moderate_months,
        ],
        "target_runway_months": config.burn_rate.target_runway_months,
    });

    Ok(with_metadata(
        "Burn rate stress test (AFCF vs mandatory obligations, no new financing)",
        &assumptions,
        warnings,
        elapsed,
        report,
    ))
}

/// Surplus or deficit of AFCF against mandatory obligations for the period.
pub fn calculate_burn_rate(
    record: &FinancialRecord,
    afcf: Money,
) -> ReitMetricsResult<BurnRateAnalysis> {
    calculate_burn_rate_with_warning(record, afcf).map(|(analysis, _)| analysis)
}

fn calculate_burn_rate_with_warning(
    record: &FinancialRecord,
    afcf: Money,
) -> ReitMetricsResult<(BurnRateAnalysis, Option<String>)> {
    let obligations = mandatory_obligations(record)?;
    let (period, period_warning) = detect_period(record)?;
    let months = Decimal::from(period.months);

    let total = obligations.total;
    let period_gap = afcf - total;
    let applicable = afcf < total;
    let monthly = round2(period_gap / months);

    let self_funding_ratio = if total.is_zero() {
        None
    } else {
        Some(round2(afcf / total))
    };

    tracing::debug!(%afcf, obligations = %total, applicable, "burn rate state");

    let analysis = BurnRateAnalysis {
        applicable,
        state: if applicable {
            BurnState::Deficit
        } else {
            BurnState::Surplus
        },
        afcf,
        mandatory_obligations: total,
        obligations,
        period_gap,
        period_months: period.months,
        monthly_burn_rate: applicable.then_some(monthly),
        monthly_surplus: (!applicable).then_some(monthly),
        self_funding_ratio,
    };
    Ok((analysis, period_warning))
}

/// Months of available liquidity at the current burn, projected from `as_of`.
pub fn calculate_cash_runway(
    record: &FinancialRecord,
    burn: &BurnRateAnalysis,
    as_of: NaiveDate,
) -> ReitMetricsResult<CashRunway> {
    if !burn.applicable || burn.period_gap >= Decimal::ZERO || burn.period_months == 0 {
        return Err(ReitMetricsError::NoData(
            "burn rate not applicable; AFCF covers mandatory obligations".into(),
        ));
    }
    // Runway divides by the unrounded rate; deficits under half a cent a
    // month still round to zero in the reported figure.
    let exact_monthly_burn = burn.period_gap / Decimal::from(burn.period_months);
    let monthly_burn_rate = round2(exact_monthly_burn);
    let liquidity = record
        .liquidity
        .as_ref()
        .ok_or_else(|| ReitMetricsError::NoData("liquidity not disclosed".into()))?;

    let z = |v: Option<Money>| v.unwrap_or(Decimal::ZERO);
    let cash_and_equivalents = z(liquidity.cash_and_equivalents);
    let marketable_securities = z(liquidity.marketable_securities);
    let restricted_cash = z(liquidity.restricted_cash);
    let undrawn_credit_facilities = z(liquidity.undrawn_credit_facilities);
    let available_cash = cash_and_equivalents + marketable_securities - restricted_cash;

    let mut notes = Vec::new();
    let burn = exact_monthly_burn.abs();
    let runway_months = if available_cash <= Decimal::ZERO {
        notes.push(format!(
            "Available cash is {available_cash}; no runway without new financing."
        ));
        Decimal::ZERO
    } else {
        round2(available_cash / burn)
    };
    let extended_runway_months =
        round2((available_cash.max(Decimal::ZERO) + undrawn_credit_facilities) / burn);

    Ok(CashRunway {
        cash_and_equivalents,
        marketable_securities,
        restricted_cash,
        available_cash,
        undrawn_credit_facilities,
        monthly_burn_rate,
        runway_years: round2(runway_months / dec!(12)),
        depletion_date: project_date(as_of, runway_months),
        extended_depletion_date: project_date(as_of, extended_runway_months),
        runway_months,
        extended_runway_months,
        as_of,
        notes,
    })
}

/// Risk band from runway, with recommendations and warning flags.
pub fn assess_liquidity_risk(
    record: &FinancialRecord,
    runway: &CashRunway,
    config: &BurnRateConfig,
) -> LiquidityRisk {
    let months = runway.runway_months;
    let risk_level = if months < config.critical_months {
        RiskLevel::Critical
    } else if months < config.high_months {
        RiskLevel::High
    } else if months < config.moderate_months {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    };

    let mut warning_flags = Vec::new();
    if runway.cash_and_equivalents > Decimal::ZERO {
        let restricted_share = runway.restricted_cash / runway.cash_and_equivalents * dec!(100);
        if restricted_share > config.restricted_cash_flag_percent {
            warning_flags.push(format!(
                "Restricted cash is {}% of cash and equivalents.",
                round2(restricted_share)
            ));
        }
    }
    if runway.extended_runway_months < config.high_months {
        warning_flags.push(format!(
            "Runway including undrawn facilities is only {} months.",
            runway.extended_runway_months
        ));
    }
    if runway.undrawn_credit_facilities.is_zero() {
        warning_flags.push("No undrawn credit facilities disclosed.".into());
    }
    if let Some(limit) = record.liquidity.as_ref().and_then(|l| l.credit_facility_limit) {
        if limit > Decimal::ZERO && runway.undrawn_credit_facilities / limit < dec!(0.25) {
            warning_flags.push("Less than 25% of the credit facility remains undrawn.".into());
        }
    }
    if runway.available_cash <= Decimal::ZERO {
        warning_flags.push("Available cash is non-positive.".into());
    }

    LiquidityRisk {
        risk_level,
        risk_score: risk_level.score(),
        runway_months: runway.runway_months,
        extended_runway_months: runway.extended_runway_months,
        recommendations: risk_level.recommendations(),
        warning_flags,
    }
}

/// Maximum monthly burn that lasts `target_months`, compared with actual burn.
pub fn calculate_sustainable_burn(runway: &CashRunway, target_months: Decimal) -> SustainableBurn {
    let target = if target_months > Decimal::ZERO {
        target_months
    } else {
        dec!(24)
    };
    let sustainable_monthly_burn = round2(runway.available_cash.max(Decimal::ZERO) / target);
    let actual_monthly_burn = runway.monthly_burn_rate.abs();
    let excess_burn = actual_monthly_burn - sustainable_monthly_burn;

    let status = if excess_burn > Decimal::ZERO {
        BurnStatus::AboveSustainable
    } else {
        BurnStatus::WithinSustainable
    };
    let required_burn_reduction_percent = match status {
        BurnStatus::AboveSustainable if !actual_monthly_burn.is_zero() => {
            Some(round2(excess_burn / actual_monthly_burn * dec!(100)))
        }
        _ => None,
    };

    SustainableBurn {
        target_runway_months: target,
        available_cash: runway.available_cash,
        sustainable_monthly_burn,
        actual_monthly_burn,
        excess_burn,
        status,
        required_burn_reduction_percent,
    }
}

fn project_date(as_of: NaiveDate, months: Decimal) -> Option<NaiveDate> {
    let whole = months.trunc();
    let days = ((months - whole) * DAYS_PER_MONTH).round().to_u64()?;
    as_of
        .checked_add_months(Months::new(whole.to_u32()?))?
        .checked_add_days(Days::new(days))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CashFlowFinancing, IncomeStatement, Liquidity};
    use rust_decimal_macros::dec;

    fn deficit_record() -> FinancialRecord {
        FinancialRecord {
            period_months: Some(6),
            income_statement: Some(IncomeStatement {
                interest_expense: Some(dec!(10_000)),
                ..Default::default()
            }),
            cash_flow_financing: Some(CashFlowFinancing {
                debt_principal_repayments: Some(dec!(-20_000)),
                distributions_common: Some(dec!(-30_000)),
                new_debt_issuances: Some(dec!(500_000)),
                ..Default::default()
            }),
            liquidity: Some(Liquidity {
                cash_and_equivalents: Some(dec!(10_000)),
                marketable_securities: Some(dec!(2_000)),
                restricted_cash: Some(dec!(2_000)),
                undrawn_credit_facilities: Some(dec!(20_000)),
                credit_facility_limit: Some(dec!(100_000)),
            }),
            ..Default::default()
        }
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[test]
    fn test_monthly_burn_for_six_month_deficit() {
        let b = calculate_burn_rate(&deficit_record(), dec!(50_000)).unwrap();
        assert!(b.applicable);
        assert_eq!(b.state, BurnState::Deficit);
        assert_eq!(b.mandatory_obligations, dec!(60_000));
        assert_eq!(b.monthly_burn_rate, Some(dec!(-1666.67)));
        assert_eq!(b.monthly_surplus, None);
    }

    #[test]
    fn test_surplus_is_terminal() {
        let b = calculate_burn_rate(&deficit_record(), dec!(72_000)).unwrap();
        assert!(!b.applicable);
        assert_eq!(b.monthly_surplus, Some(dec!(2000)));
        assert!(matches!(
            calculate_cash_runway(&deficit_record(), &b, as_of()).unwrap_err(),
            ReitMetricsError::NoData(_)
        ));

        let out = analyze_burn_rate(
            &deficit_record(),
            dec!(72_000),
            as_of(),
            &MetricsConfig::default(),
        )
        .unwrap();
        assert!(out.result.cash_runway.is_none());
        assert!(out.result.liquidity_risk.is_none());
        assert!(out.result.sustainable_burn.is_none());
    }

    #[test]
    fn test_runway_and_depletion_date() {
        let record = deficit_record();
        let b = calculate_burn_rate(&record, dec!(50_000)).unwrap();
        let r = calculate_cash_runway(&record, &b, as_of()).unwrap();
        assert_eq!(r.available_cash, dec!(10_000));
        assert_eq!(r.runway_months, dec!(6));
        assert_eq!(r.runway_years, dec!(0.5));
        assert_eq!(r.extended_runway_months, dec!(18));
        assert_eq!(r.depletion_date, NaiveDate::from_ymd_opt(2025, 7, 1));
        assert_eq!(r.extended_depletion_date, NaiveDate::from_ymd_opt(2026, 7, 1));
    }

    #[test]
    fn test_sub_cent_deficit_still_has_runway() {
        let record = FinancialRecord {
            period_months: Some(3),
            income_statement: Some(IncomeStatement {
                interest_expense: Some(dec!(10_000)),
                ..Default::default()
            }),
            cash_flow_financing: Some(CashFlowFinancing::default()),
            liquidity: Some(Liquidity {
                cash_and_equivalents: Some(dec!(1_000)),
                ..Default::default()
            }),
            ..Default::default()
        };
        let burn = calculate_burn_rate(&record, dec!(9_999.99)).unwrap();
        assert_eq!(burn.state, BurnState::Deficit);
        assert_eq!(burn.period_gap, dec!(-0.01));

        let runway = calculate_cash_runway(&record, &burn, as_of()).unwrap();
        assert!(runway.monthly_burn_rate.is_zero());
        // 1,000 / (0.01 / 3)
        assert!(runway.runway_months > dec!(299_999) && runway.runway_months < dec!(300_001));
    }

    #[test]
    fn test_risk_bands() {
        let record = deficit_record();
        let b = calculate_burn_rate(&record, dec!(50_000)).unwrap();
        let mut r = calculate_cash_runway(&record, &b, as_of()).unwrap();
        let cfg = BurnRateConfig::default();

        // Exactly 6 months sits in the HIGH band.
        let risk = assess_liquidity_risk(&record, &r, &cfg);
        assert_eq!(risk.risk_level, RiskLevel::High);
        assert_eq!(risk.risk_score, 3);
        assert!(risk.warning_flags.iter().any(|f| f.contains("Restricted cash")));
        assert!(risk.warning_flags.iter().any(|f| f.contains("25%")));

        r.runway_months = dec!(5.99);
        assert_eq!(assess_liquidity_risk(&record, &r, &cfg).risk_level, RiskLevel::Critical);
        r.runway_months = dec!(23.99);
        assert_eq!(assess_liquidity_risk(&record, &r, &cfg).risk_level, RiskLevel::Moderate);
        r.runway_months = dec!(24);
        let low = assess_liquidity_risk(&record, &r, &cfg);
        assert_eq!(low.risk_level, RiskLevel::Low);
        assert_eq!(low.recommendations.len(), 2);
    }

    #[test]
    fn test_sustainable_burn() {
        let record = deficit_record();
        let b = calculate_burn_rate(&record, dec!(50_000)).unwrap();
        let r = calculate_cash_runway(&record, &b, as_of()).unwrap();
        let s = calculate_sustainable_burn(&r, dec!(24));
        assert_eq!(s.sustainable_monthly_burn, dec!(416.67));
        assert_eq!(s.actual_monthly_burn, dec!(1666.67));
        assert_eq!(s.excess_burn, dec!(1250));
        assert_eq!(s.status, BurnStatus::AboveSustainable);
        assert_eq!(s.required_burn_reduction_percent, Some(dec!(75)));
    }

    #[test]
    fn test_non_positive_available_cash() {
        let mut record = deficit_record();
        record.liquidity.as_mut().unwrap().restricted_cash = Some(dec!(15_000));
        let b = calculate_burn_rate(&record, dec!(50_000)).unwrap();
        let r = calculate_cash_runway(&record, &b, as_of()).unwrap();
        assert_eq!(r.runway_months, Decimal::ZERO);
        assert_eq!(r.notes.len(), 1);
        assert_eq!(r.depletion_date, Some(as_of()));
    }

    #[test]
    fn test_full_report_in_deficit() {
        let out = analyze_burn_rate(
            &deficit_record(),
            dec!(50_000),
            as_of(),
            &MetricsConfig::default(),
        )
        .unwrap();
        assert!(out.result.cash_runway.is_some());
        assert_eq!(out.result.liquidity_risk.unwrap().risk_level, RiskLevel::High);
        assert!(out.result.sustainable_burn.is_some());
    }
}
