use serde_json::Value;
use std::io;

use super::{format_scalar, result_of};

/// Write the result as two-column CSV (dotted field path, value) to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let mut rows = Vec::new();
    flatten("", result_of(value), &mut rows);

    let _ = wtr.write_record(["field", "value"]);
    for (field, val) in rows {
        let _ = wtr.write_record([field.as_str(), val.as_str()]);
    }
    let _ = wtr.flush();
}

/// Flatten nested objects and arrays into `a.b[0].c` paths.
pub(crate) fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&path, val, out);
            }
        }
        Value::Array(arr) if !arr.is_empty() => {
            for (i, val) in arr.iter().enumerate() {
                flatten(&format!("{}[{}]", prefix, i), val, out);
            }
        }
        _ => out.push((prefix.to_string(), format_scalar(value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_flatten_paths() {
        let mut rows = Vec::new();
        flatten(
            "",
            &json!({
                "leverage": {"total_debt": "450000", "breakdown": [{"name": "mortgages"}]},
                "warnings": []
            }),
            &mut rows,
        );
        assert_eq!(
            rows,
            vec![
                ("leverage.breakdown[0].name".to_string(), "mortgages".to_string()),
                ("leverage.total_debt".to_string(), "450000".to_string()),
                ("warnings".to_string(), "[]".to_string()),
            ]
        );
    }
}
