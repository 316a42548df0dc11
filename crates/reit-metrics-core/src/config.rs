//! Thresholds and tolerances used across the REIT metric calculators.
//!
//! Every cut-off lives here rather than as a literal in the calculators, so a
//! caller can override a single value (e.g. from a JSON or YAML file) while
//! the defaults reproduce the published REALPAC-style behaviour.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Present-count cut-offs for a data-quality classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityThresholds {
    pub strong: usize,
    pub moderate: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FfoAffoConfig {
    /// 21 FFO adjustments: >=15 strong, >=8 moderate.
    pub ffo_quality: QualityThresholds,
    /// 5 AFFO adjustments: >=4 strong, >=2 moderate.
    pub affo_quality: QualityThresholds,
    /// Maximum absolute variance (%) between calculated and reported figures.
    pub variance_threshold_percent: Decimal,
}

impl Default for FfoAffoConfig {
    fn default() -> Self {
        Self {
            ffo_quality: QualityThresholds {
                strong: 15,
                moderate: 8,
            },
            affo_quality: QualityThresholds {
                strong: 4,
                moderate: 2,
            },
            variance_threshold_percent: dec!(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcfoConfig {
    /// 17 adjustment groups: >=12 strong, >=6 moderate.
    pub quality: QualityThresholds,
    pub variance_threshold_percent: Decimal,
    /// Allowed gap between the ACFO and AFFO sustaining capex / TI figures.
    pub consistency_tolerance: Decimal,
    /// Sum only the JV items consistent with `jv_treatment_method`.
    pub strict_jv_treatment: bool,
}

impl Default for AcfoConfig {
    fn default() -> Self {
        Self {
            quality: QualityThresholds {
                strong: 12,
                moderate: 6,
            },
            variance_threshold_percent: dec!(5),
            consistency_tolerance: dec!(1),
            strict_jv_treatment: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AfcfConfig {
    /// 8 classified investing items.
    pub quality: QualityThresholds,
    /// Tolerance against the issuer-reported total CFI.
    pub total_cfi_tolerance: Decimal,
    /// Tolerance for AFCF = ACFO + sustainable net CFI.
    pub afcf_identity_tolerance: Decimal,
    /// Tolerance for development capex between the ACFO and CFI records.
    pub development_capex_tolerance: Decimal,
}

impl Default for AfcfConfig {
    fn default() -> Self {
        Self {
            quality: QualityThresholds {
                strong: 6,
                moderate: 3,
            },
            total_cfi_tolerance: dec!(100),
            afcf_identity_tolerance: dec!(1),
            development_capex_tolerance: dec!(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurnRateConfig {
    /// Runway (months) below which liquidity risk is CRITICAL.
    pub critical_months: Decimal,
    pub high_months: Decimal,
    pub moderate_months: Decimal,
    /// Horizon used for the sustainable-burn target.
    pub target_runway_months: Decimal,
    /// Restricted cash above this share of cash raises a flag.
    pub restricted_cash_flag_percent: Decimal,
}

impl Default for BurnRateConfig {
    fn default() -> Self {
        Self {
            critical_months: dec!(6),
            high_months: dec!(12),
            moderate_months: dec!(24),
            target_runway_months: dec!(24),
            restricted_cash_flag_percent: dec!(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DilutionConfig {
    /// Dilution % cut-offs: <minimal, <low, <moderate, else high.
    pub minimal_percent: Decimal,
    pub low_percent: Decimal,
    pub moderate_percent: Decimal,
    /// A single instrument above this share of basic units is material.
    pub material_instrument_percent: Decimal,
    /// Convertible debt share of basic units: <low, <moderate, else high.
    pub convertible_low_percent: Decimal,
    pub convertible_moderate_percent: Decimal,
}

impl Default for DilutionConfig {
    fn default() -> Self {
        Self {
            minimal_percent: dec!(1),
            low_percent: dec!(3),
            moderate_percent: dec!(7),
            material_instrument_percent: dec!(1),
            convertible_low_percent: dec!(3),
            convertible_moderate_percent: dec!(7),
        }
    }
}

/// Top-level configuration threaded through the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub ffo_affo: FfoAffoConfig,
    pub acfo: AcfoConfig,
    pub afcf: AfcfConfig,
    pub burn_rate: BurnRateConfig,
    pub dilution: DilutionConfig,
}
