use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{DilutionConfig, MetricsConfig};
use crate::error::ReitMetricsError;
use crate::record::{DilutionDetail, FinancialRecord};
use crate::types::{round2, with_metadata, ComputationOutput, Percent, Units};
use crate::ReitMetricsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Materiality {
    Minimal,
    Low,
    Moderate,
    High,
    /// No dilution disclosure; not the same as zero dilution.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvertibleRisk {
    None,
    Low,
    Moderate,
    High,
    /// Units disclosed but no basic units to measure them against.
    Unknown,
    /// `convertible_debentures_units` absent from the disclosure.
    NotDisclosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DilutionSource {
    Reported,
    Computed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DilutiveInstrument {
    pub instrument: String,
    pub units: Units,
    pub percent_of_basic: Option<Percent>,
    pub material: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DilutionAnalysis {
    pub has_dilution_detail: bool,
    pub basic_units: Option<Units>,
    pub diluted_units: Option<Units>,
    pub dilution_percentage: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dilution_source: Option<DilutionSource>,
    pub materiality: Materiality,
    pub instruments: Vec<DilutiveInstrument>,
    pub material_instruments: Vec<String>,
    pub convertible_percent_of_basic: Option<Percent>,
    pub convertible_risk: ConvertibleRisk,
    pub notes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Dilution materiality, material instruments and convertible-debt risk.
pub fn analyze_dilution(
    record: &FinancialRecord,
    config: &MetricsConfig,
) -> ReitMetricsResult<ComputationOutput<DilutionAnalysis>> {
    let start = Instant::now();
    let cfg = &config.dilution;

    let analysis = match record.dilution_detail.as_ref() {
        Some(detail) => analyze_detail(record, detail, cfg)?,
        None => DilutionAnalysis {
            has_dilution_detail: false,
            basic_units: None,
            diluted_units: None,
            dilution_percentage: None,
            dilution_source: None,
            materiality: Materiality::Unknown,
            instruments: Vec::new(),
            material_instruments: Vec::new(),
            convertible_percent_of_basic: None,
            convertible_risk: ConvertibleRisk::Unknown,
            notes: vec!["dilution_detail not disclosed; materiality unknown.".into()],
        },
    };

    let mut warnings = Vec::new();
    if analysis.materiality == Materiality::High {
        warnings.push(format!(
            "Dilution of {}% is high.",
            analysis.dilution_percentage.unwrap_or_default()
        ));
    }
    if analysis.convertible_risk == ConvertibleRisk::High {
        warnings.push("Convertible debentures carry high dilution risk.".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "dilution_percent": "(diluted - basic) / basic x 100 unless reported",
        "materiality_cutoffs": [cfg.minimal_percent, cfg.low_percent, cfg.moderate_percent],
        "material_instrument_percent": cfg.material_instrument_percent,
        "convertible_cutoffs": [cfg.convertible_low_percent, cfg.convertible_moderate_percent],
    });

    Ok(with_metadata(
        "Unit dilution materiality",
        &assumptions,
        warnings,
        elapsed,
        analysis,
    ))
}

pub fn classify_materiality(dilution_percent: Percent, cfg: &DilutionConfig) -> Materiality {
    if dilution_percent < cfg.minimal_percent {
        Materiality::Minimal
    } else if dilution_percent < cfg.low_percent {
        Materiality::Low
    } else if dilution_percent < cfg.moderate_percent {
        Materiality::Moderate
    } else {
        Materiality::High
    }
}

pub fn classify_convertible_risk(share_percent: Percent, cfg: &DilutionConfig) -> ConvertibleRisk {
    if share_percent <= Decimal::ZERO {
        ConvertibleRisk::None
    } else if share_percent < cfg.convertible_low_percent {
        ConvertibleRisk::Low
    } else if share_percent < cfg.convertible_moderate_percent {
        ConvertibleRisk::Moderate
    } else {
        ConvertibleRisk::High
    }
}

fn analyze_detail(
    record: &FinancialRecord,
    detail: &DilutionDetail,
    cfg: &DilutionConfig,
) -> ReitMetricsResult<DilutionAnalysis> {
    let mut notes = Vec::new();
    let bs = record.balance_sheet.as_ref();

    let basic_units = detail
        .basic_units
        .or_else(|| bs.and_then(|b| b.common_units_outstanding));
    let diluted_units = detail
        .diluted_units
        .or_else(|| bs.and_then(|b| b.diluted_units_outstanding));

    if let Some(b) = basic_units {
        if b < Decimal::ZERO {
            return Err(ReitMetricsError::invalid(
                "dilution_detail.basic_units",
                "Basic units cannot be negative.",
            ));
        }
    }
    let basic = basic_units.filter(|b| !b.is_zero());
    let share_of_basic = |units: Units| basic.map(|b| round2(units / b * dec!(100)));

    let reported = detail.dilution_percentage;
    let (dilution_percentage, dilution_source) = match (reported, basic, diluted_units) {
        (Some(pct), _, _) => (Some(pct), Some(DilutionSource::Reported)),
        (None, Some(b), Some(d)) => (
            Some(round2((d - b) / b * dec!(100))),
            Some(DilutionSource::Computed),
        ),
        _ => {
            notes.push("Neither dilution percentage nor basic and diluted units disclosed.".into());
            (None, None)
        }
    };

    let materiality = dilution_percentage
        .map(|p| classify_materiality(p, cfg))
        .unwrap_or(Materiality::Unknown);

    let instruments: Vec<DilutiveInstrument> = [
        ("restricted_units", detail.restricted_units),
        ("deferred_units", detail.deferred_units),
        ("unit_options", detail.unit_options),
        ("convertible_debentures_units", detail.convertible_debentures_units),
        ("warrants", detail.warrants),
    ]
    .into_iter()
    .filter_map(|(name, units)| units.map(|u| (name, u)))
    .map(|(name, units)| {
        let percent_of_basic = share_of_basic(units);
        DilutiveInstrument {
            instrument: name.to_string(),
            units,
            material: percent_of_basic.is_some_and(|p| p > cfg.material_instrument_percent),
            percent_of_basic,
        }
    })
    .collect();

    let material_instruments = instruments
        .iter()
        .filter(|i| i.material)
        .map(|i| i.instrument.clone())
        .collect();

    let convertibles = detail.convertible_debentures_units;
    let (convertible_percent_of_basic, convertible_risk) = match convertibles {
        Some(units) => match share_of_basic(units) {
            Some(p) => (Some(p), classify_convertible_risk(p, cfg)),
            None if units.is_zero() => (None, ConvertibleRisk::None),
            None => {
                notes.push("Convertible units disclosed without basic units; risk unknown.".into());
                (None, ConvertibleRisk::Unknown)
            }
        },
        None => {
            notes.push("Convertible debenture units not disclosed.".into());
            (None, ConvertibleRisk::NotDisclosed)
        }
    };

    Ok(DilutionAnalysis {
        has_dilution_detail: true,
        basic_units,
        diluted_units,
        dilution_percentage,
        dilution_source,
        materiality,
        instruments,
        material_instruments,
        convertible_percent_of_basic,
        convertible_risk,
        notes,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
