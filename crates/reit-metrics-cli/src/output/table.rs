use colored::Colorize;
use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::format_scalar;

/// Format output as tables using the tabled crate.
///
/// The composite metrics record prints one table per section, then the
/// per-metric diagnostics. Other envelopes print a single field/value table.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => {
                match result.get("metrics").and_then(Value::as_object) {
                    Some(sections) => print_sections(sections, result.get("diagnostics")),
                    None => print_object(result),
                }
                print_envelope_notes(map);
            }
            None => print_object(value),
        },
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", format_scalar(value)),
    }
}

fn print_sections(sections: &Map<String, Value>, diagnostics: Option<&Value>) {
    for (name, section) in sections {
        println!("{}", name.bold());
        if name == "reconciliation" {
            print_bridges(section);
        } else {
            print_object(section);
        }
        println!();
    }

    if let Some(Value::Array(diags)) = diagnostics {
        println!("{}", "diagnostics".bold());
        print_array_table(diags);
    }
}

/// Bridge tables render row by row; the AFCF checks fall back to field/value.
fn print_bridges(reconciliation: &Value) {
    let Some(map) = reconciliation.as_object() else {
        return;
    };
    for (metric, bridge) in map {
        match bridge.get("rows").and_then(Value::as_array) {
            Some(rows) => {
                println!("  {}", metric.to_uppercase());
                print_array_table(rows);
            }
            None => {
                println!("  {}", metric.to_uppercase());
                print_object(bridge);
            }
        }
    }
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\n{}", "Warnings:".yellow());
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_cell(val)]);
        }
        println!("{}", Table::from(builder));
    } else {
        println!("{}", format_cell(value));
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_cell).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_cell(item));
        }
    }
}

fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => "n/a".to_string(),
        Value::Array(arr) => arr.iter().map(format_cell).collect::<Vec<_>>().join(", "),
        _ => format_scalar(value),
    }
}
