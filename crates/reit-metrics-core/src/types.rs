use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::QualityThresholds;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Ratios expressed as percentages (45.0 = 45%) unless the field name says otherwise.
pub type Percent = Decimal;

/// Coverage multiples (e.g., 2.4x NOI / interest)
pub type Multiple = Decimal;

/// Unit (share) counts
pub type Units = Decimal;

/// Reporting currency
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    CAD,
    USD,
    GBP,
    EUR,
    AUD,
    Other(String),
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Data quality
// ---------------------------------------------------------------------------

/// Confidence signal derived from how many optional adjustments were supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    Strong,
    Moderate,
    Limited,
    Insufficient,
    None,
}

impl DataQuality {
    /// Step function over the count of present adjustments.
    ///
    /// Zero present is always `None`; otherwise `strong` and `moderate` cut-offs
    /// come from the metric's thresholds and everything below is `limited`.
    pub fn classify(present: usize, thresholds: &QualityThresholds) -> Self {
        if present == 0 {
            DataQuality::None
        } else if present >= thresholds.strong {
            DataQuality::Strong
        } else if present >= thresholds.moderate {
            DataQuality::Moderate
        } else {
            DataQuality::Limited
        }
    }
}

impl std::fmt::Display for DataQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Strong => "strong",
            Self::Moderate => "moderate",
            Self::Limited => "limited",
            Self::Insufficient => "insufficient",
            Self::None => "none",
        };
        write!(f, "{}", s)
    }
}

// ---------------------------------------------------------------------------
// Adjustments
// ---------------------------------------------------------------------------

/// One named methodology adjustment (e.g. FFO "B", ACFO "3a").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub code: String,
    pub field: String,
    pub description: String,
    /// `None` when the issuer did not disclose the item.
    pub amount: Option<Money>,
    /// Deducted from the running total rather than added.
    pub subtracted: bool,
}

impl Adjustment {
    /// Signed contribution to the derived metric; undisclosed items contribute zero.
    pub fn contribution(&self) -> Money {
        let amount = self.amount.unwrap_or(Decimal::ZERO);
        if self.subtracted {
            -amount
        } else {
            amount
        }
    }

    pub fn is_present(&self) -> bool {
        self.amount.is_some()
    }
}

/// Ordered collection of adjustments bridging a starting point to a derived metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentSet {
    pub entries: Vec<Adjustment>,
}

impl AdjustmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, code: &str, field: &str, description: &str, amount: Option<Money>) {
        self.push(code, field, description, amount, false);
    }

    pub fn subtract(&mut self, code: &str, field: &str, description: &str, amount: Option<Money>) {
        self.push(code, field, description, amount, true);
    }

    fn push(
        &mut self,
        code: &str,
        field: &str,
        description: &str,
        amount: Option<Money>,
        subtracted: bool,
    ) {
        self.entries.push(Adjustment {
            code: code.to_string(),
            field: field.to_string(),
            description: description.to_string(),
            amount,
            subtracted,
        });
    }

    /// Net signed total: derived metric minus starting point.
    pub fn total(&self) -> Money {
        self.entries.iter().map(Adjustment::contribution).sum()
    }

    pub fn present_count(&self) -> usize {
        self.entries.iter().filter(|a| a.is_present()).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn missing_fields(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|a| !a.is_present())
            .map(|a| a.field.clone())
            .collect()
    }

    pub fn get(&self, code: &str) -> Option<&Adjustment> {
        self.entries.iter().find(|a| a.code == code)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Comparison of a calculated figure against the issuer-reported figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub calculated: Option<Money>,
    pub reported: Option<Money>,
    pub variance_amount: Option<Money>,
    pub variance_percent: Option<Percent>,
    pub within_threshold: Option<bool>,
    pub threshold_percent: Percent,
    pub notes: Vec<String>,
}

impl ValidationResult {
    /// Variance of `calculated` against `reported`; `within_threshold` when
    /// `|variance %| <= threshold_percent`. Absent sides produce notes, not errors.
    pub fn compare(
        label: &str,
        calculated: Option<Money>,
        reported: Option<Money>,
        threshold_percent: Percent,
    ) -> Self {
        let mut notes = Vec::new();
        let (variance_amount, variance_percent, within_threshold) = match (calculated, reported) {
            (Some(calc), Some(rep)) => {
                let variance = calc - rep;
                if rep.is_zero() {
                    notes.push(format!(
                        "Reported {label} is zero; variance percent is undefined."
                    ));
                    (Some(variance), None, None)
                } else {
                    let pct = round2(variance / rep.abs() * Decimal::ONE_HUNDRED);
                    let within = pct.abs() <= threshold_percent;
                    if !within {
                        notes.push(format!(
                            "Calculated {label} differs from reported by {pct}% (threshold {threshold_percent}%)."
                        ));
                    }
                    (Some(variance), Some(pct), Some(within))
                }
            }
            (Some(_), None) => {
                notes.push(format!("Reported {label} not disclosed; nothing to validate against."));
                (None, None, None)
            }
            (None, Some(_)) => {
                notes.push(format!("Calculated {label} not available; reported figure only."));
                (None, None, None)
            }
            (None, None) => {
                notes.push(format!("Neither calculated nor reported {label} available."));
                (None, None, None)
            }
        };

        ValidationResult {
            calculated,
            reported,
            variance_amount,
            variance_percent,
            within_threshold,
            threshold_percent,
            notes,
        }
    }
}

// ---------------------------------------------------------------------------
// Numeric helpers
// ---------------------------------------------------------------------------

/// Round to the 2 dp used for every published ratio.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp(2)
}

/// Division that yields `None` for a zero or absent denominator.
pub fn ratio(numerator: Decimal, denominator: Option<Decimal>) -> Option<Decimal> {
    match denominator {
        Some(d) if !d.is_zero() => Some(numerator / d),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_adjustment_set_total_respects_sign() {
        let mut set = AdjustmentSet::new();
        set.add("A", "a", "first", Some(dec!(100)));
        set.add("B", "b", "second", None);
        set.subtract("C", "c", "third", Some(dec!(30)));
        assert_eq!(set.total(), dec!(70));
        assert_eq!(set.present_count(), 2);
        assert_eq!(set.missing_fields(), vec!["b".to_string()]);
    }

    #[test]
    fn test_ratio_guards_zero_and_absent() {
        assert_eq!(ratio(dec!(10), Some(dec!(4))), Some(dec!(2.5)));
        assert_eq!(ratio(dec!(10), Some(Decimal::ZERO)), None);
        assert_eq!(ratio(dec!(10), None), None);
    }

    #[test]
    fn test_validation_compare() {
        let v = ValidationResult::compare("FFO", Some(dec!(104)), Some(dec!(100)), dec!(5));
        assert_eq!(v.variance_amount, Some(dec!(4)));
        assert_eq!(v.variance_percent, Some(dec!(4)));
        assert_eq!(v.within_threshold, Some(true));

        let v = ValidationResult::compare("FFO", Some(dec!(94)), Some(dec!(-100)), dec!(5));
        // (94 - -100) / 100 = 194%
        assert_eq!(v.variance_percent, Some(dec!(194)));
        assert_eq!(v.within_threshold, Some(false));
    }

    #[test]
    fn test_validation_absent_reported_is_a_note() {
        let v = ValidationResult::compare("AFFO", Some(dec!(10)), None, dec!(5));
        assert_eq!(v.within_threshold, None);
        assert_eq!(v.notes.len(), 1);
    }

    #[test]
    fn test_data_quality_zero_present_is_none() {
        let t = QualityThresholds {
            strong: 15,
            moderate: 8,
        };
        assert_eq!(DataQuality::classify(0, &t), DataQuality::None);
        assert_eq!(DataQuality::classify(1, &t), DataQuality::Limited);
    }
}
