use serde_json::Value;

/// Headline figures, in priority order, looked up in `result` and then in
/// `result.summary`.
const PRIORITY_KEYS: [&str; 6] = [
    "expected_revenue",
    "highest_revenue",
    "eligible_count",
    "final_count",
    "implausible_records",
    "presets",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        let summary = map.get("summary").and_then(Value::as_object);
        for key in &PRIORITY_KEYS {
            let hit = map
                .get(*key)
                .or_else(|| summary.and_then(|s| s.get(*key)))
                .filter(|v| !v.is_null());
            if let Some(val) = hit {
                println!("{}", format_minimal(val));
                return;
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    if let Value::Array(items) = result_obj {
        println!("{}", items.len());
        return;
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
