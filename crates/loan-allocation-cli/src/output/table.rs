use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Arrays longer than this are summarised instead of rendered.
const MAX_ROWS: usize = 50;

/// Format output as tables using the tabled crate.
///
/// Scalars of the result go into one Field/Value table. Nested objects and
/// arrays of objects each get their own titled table.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => {
                print_section(None, result);
                print_envelope(map);
            }
            None => print_section(None, value),
        },
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_section(title: Option<&str>, value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(t) = title {
                println!("\n{}:", t);
            }
            print_scalars(map);
            for (key, val) in map {
                if is_nested(val) {
                    print_section(Some(key.as_str()), val);
                }
            }
        }
        Value::Array(arr) => {
            if let Some(t) = title {
                println!("\n{} ({}):", t, arr.len());
            }
            print_array_table(arr);
        }
        _ => println!("{}", format_value(value)),
    }
}

fn print_scalars(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut rows = 0;
    for (key, val) in map {
        if !is_nested(val) {
            builder.push_record([key.as_str(), &format_value(val)]);
            rows += 1;
        }
    }
    if rows > 0 {
        println!("{}", Table::from(builder));
    }
}

fn print_envelope(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
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

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }
    if arr.len() > MAX_ROWS {
        println!("({} rows; use --output csv or json for the full list)", arr.len());
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
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

/// Objects and arrays of objects are rendered as their own tables.
fn is_nested(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(arr) => arr.first().is_some_and(Value::is_object),
        _ => false,
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{:.4}", f)
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string(),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_value(&json!(0.036666666)), "0.0367");
        assert_eq!(format_value(&json!(300.0)), "300");
        assert_eq!(format_value(&json!(12)), "12");
        assert_eq!(format_value(&Value::Null), "-");
    }

    #[test]
    fn test_nested_detection() {
        assert!(is_nested(&json!({"a": 1})));
        assert!(is_nested(&json!([{"a": 1}])));
        assert!(!is_nested(&json!([1, 2])));
        assert!(!is_nested(&json!([])));
    }
}
