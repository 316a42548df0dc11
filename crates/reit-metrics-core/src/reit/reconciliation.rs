//! Bridge tables from starting point to derived metric.
//!
//! Pure assembly over results that were already computed; nothing here
//! changes a figure. AFCF identity checks are carried alongside the bridges.

use serde::{Deserialize, Serialize};

use crate::reit::acfo::AcfoMetrics;
use crate::reit::afcf::AfcfReconciliation;
use crate::reit::ffo_affo::FfoAffoMetrics;
use crate::types::{AdjustmentSet, Money, ValidationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeRowKind {
    StartingPoint,
    Adjustment,
    Total,
    Reported,
    Variance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeRow {
    pub kind: BridgeRowKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub label: String,
    /// Signed effect on the running total; `None` when not disclosed.
    pub amount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bridge {
    pub metric: String,
    pub rows: Vec<BridgeRow>,
}

impl Bridge {
    fn new(metric: &str, starting_label: &str, starting_amount: Money) -> Self {
        Self {
            metric: metric.to_string(),
            rows: vec![BridgeRow {
                kind: BridgeRowKind::StartingPoint,
                code: None,
                label: starting_label.to_string(),
                amount: Some(starting_amount),
            }],
        }
    }

    fn adjustments(mut self, set: &AdjustmentSet) -> Self {
        for adj in &set.entries {
            self.rows.push(BridgeRow {
                kind: BridgeRowKind::Adjustment,
                code: Some(adj.code.clone()),
                label: adj.description.clone(),
                amount: adj.is_present().then(|| adj.contribution()),
            });
        }
        self
    }

    fn total(mut self, amount: Money) -> Self {
        let label = self.metric.clone();
        self.rows.push(BridgeRow {
            kind: BridgeRowKind::Total,
            code: None,
            label,
            amount: Some(amount),
        });
        self
    }

    fn validation(mut self, v: &ValidationResult) -> Self {
        if let Some(reported) = v.reported {
            self.rows.push(BridgeRow {
                kind: BridgeRowKind::Reported,
                code: None,
                label: format!("{} (reported)", self.metric),
                amount: Some(reported),
            });
        }
        if let Some(variance) = v.variance_amount {
            self.rows.push(BridgeRow {
                kind: BridgeRowKind::Variance,
                code: None,
                label: match v.variance_percent {
                    Some(pct) => format!("Variance ({pct}%)"),
                    None => "Variance".to_string(),
                },
                amount: Some(variance),
            });
        }
        self
    }

    /// Starting point plus every disclosed adjustment.
    pub fn rows_sum(&self) -> Money {
        self.rows
            .iter()
            .filter(|r| matches!(r.kind, BridgeRowKind::StartingPoint | BridgeRowKind::Adjustment))
            .filter_map(|r| r.amount)
            .sum()
    }

    pub fn total_amount(&self) -> Option<Money> {
        self.rows
            .iter()
            .find(|r| r.kind == BridgeRowKind::Total)
            .and_then(|r| r.amount)
    }

    pub fn undisclosed_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.kind == BridgeRowKind::Adjustment && r.amount.is_none())
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ffo: Option<Bridge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affo: Option<Bridge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acfo: Option<Bridge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub afcf: Option<AfcfReconciliation>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.ffo.is_none() && self.affo.is_none() && self.acfo.is_none() && self.afcf.is_none()
    }
}

pub fn build_ffo_bridge(m: &FfoAffoMetrics) -> Bridge {
    Bridge::new("FFO", "Net income (IFRS)", m.ffo.net_income_ifrs)
        .adjustments(&m.ffo.adjustments)
        .total(m.ffo.ffo)
        .validation(&m.validation.ffo)
}

pub fn build_affo_bridge(m: &FfoAffoMetrics) -> Bridge {
    Bridge::new("AFFO", "FFO", m.affo.ffo)
        .adjustments(&m.affo.adjustments)
        .total(m.affo.affo)
        .validation(&m.validation.affo)
}

pub fn build_acfo_bridge(m: &AcfoMetrics) -> Bridge {
    Bridge::new("ACFO", "Cash flow from operations (IFRS)", m.acfo.cash_flow_from_operations)
        .adjustments(&m.acfo.adjustments)
        .total(m.acfo.acfo)
        .validation(&m.validation)
}

pub fn build_reconciliation(
    ffo_affo: Option<&FfoAffoMetrics>,
    acfo: Option<&AcfoMetrics>,
    afcf: Option<&AfcfReconciliation>,
) -> Reconciliation {
    Reconciliation {
        ffo: ffo_affo.map(build_ffo_bridge),
        affo: ffo_affo.map(build_affo_bridge),
        acfo: acfo.map(build_acfo_bridge),
        afcf: afcf.cloned(),
    }
}
