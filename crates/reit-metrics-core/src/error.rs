use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Remediation hint attached to every missing-field failure.
pub const MISSING_FIELD_HINT: &str = "ensure upstream extraction included this field";

#[derive(Debug, Error)]
pub enum ReitMetricsError {
    #[error("Missing required field: {path} ({hint})")]
    MissingField { path: String, hint: String },

    #[error("Invalid data: {field}: {reason}")]
    InvalidData { field: String, reason: String },

    #[error("No data: {0}")]
    NoData(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Inconsistent data in {context}: {detail}")]
    Inconsistent { context: String, detail: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Coarse classification of why a metric could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonKind {
    /// The issuer did not disclose the inputs.
    NotDisclosed,
    /// Inputs were disclosed but violate a domain constraint.
    Invalid,
    /// Inputs were disclosed but disagree with, or depend on, a sibling metric.
    Inconsistent,
}

impl ReitMetricsError {
    pub fn missing_field(path: impl Into<String>) -> Self {
        ReitMetricsError::MissingField {
            path: path.into(),
            hint: MISSING_FIELD_HINT.to_string(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ReitMetricsError::InvalidData {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn reason_kind(&self) -> ReasonKind {
        match self {
            ReitMetricsError::MissingField { .. }
            | ReitMetricsError::NoData(_)
            | ReitMetricsError::InsufficientData(_) => ReasonKind::NotDisclosed,
            ReitMetricsError::InvalidData { .. } | ReitMetricsError::SerializationError(_) => {
                ReasonKind::Invalid
            }
            ReitMetricsError::MissingDependency(_) | ReitMetricsError::Inconsistent { .. } => {
                ReasonKind::Inconsistent
            }
        }
    }
}

impl From<serde_json::Error> for ReitMetricsError {
    fn from(e: serde_json::Error) -> Self {
        ReitMetricsError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_data_message() {
        let e = ReitMetricsError::invalid(
            "cash_flow_investing.capex_sustaining",
            "Not classified.",
        );
        assert_eq!(
            e.to_string(),
            "Invalid data: cash_flow_investing.capex_sustaining: Not classified."
        );
        assert_eq!(e.reason_kind(), ReasonKind::Invalid);
    }
}
