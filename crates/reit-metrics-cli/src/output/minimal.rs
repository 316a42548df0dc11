use serde_json::Value;

use super::{format_scalar, result_of};

/// Headline figures for the composite metrics record, in display order.
const SUMMARY_PATHS: [(&str, &str); 8] = [
    ("debt_to_assets", "leverage_metrics.debt_to_assets_percent"),
    ("noi_coverage", "coverage_ratios.noi_interest_coverage"),
    ("ffo", "reit_metrics.ffo.value"),
    ("affo", "reit_metrics.affo.value"),
    ("acfo", "reit_metrics.acfo.value"),
    ("afcf", "afcf_metrics.sustainable_afcf"),
    ("monthly_burn", "burn_rate_analysis.monthly_burn_rate"),
    ("liquidity_risk", "liquidity_risk.risk_level"),
];

/// Print just the key answer value from the output.
///
/// The composite record prints a one-line summary; single-metric outputs
/// print the first well-known field found.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);

    if let Some(metrics) = result.get("metrics") {
        println!("{}", summary_line(metrics));
        return;
    }

    let priority_keys = [
        "sustainable_afcf",
        "acfo",
        "affo",
        "ffo",
        "noi_interest_coverage",
        "debt_to_assets_percent",
        "monthly_burn_rate",
        "monthly_surplus",
        "materiality",
        "missing",
    ];

    if let Value::Object(map) = result {
        for key in &priority_keys {
            if let Some(val) = find_key(result, key) {
                if !val.is_null() {
                    println!("{}", format_scalar(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_scalar(val));
            return;
        }
    }

    println!("{}", format_scalar(result));
}

fn summary_line(metrics: &Value) -> String {
    SUMMARY_PATHS
        .iter()
        .filter_map(|(label, path)| {
            path.split('.')
                .try_fold(metrics, |v, seg| v.get(seg))
                .filter(|v| !v.is_null())
                .map(|v| format!("{}={}", label, format_scalar(v)))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Depth-first search for the first scalar under `key`.
fn find_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let map = value.as_object()?;
    if let Some(v) = map.get(key) {
        if !v.is_object() {
            return Some(v);
        }
    }
    map.values().filter(|v| v.is_object()).find_map(|v| find_key(v, key))
}
