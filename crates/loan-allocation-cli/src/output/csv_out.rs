use serde_json::{Map, Value};
use std::io;

/// Arrays in the result that make a natural CSV body, by priority.
const ROW_KEYS: [&str; 5] = ["decisions", "results", "actions", "rules", "checks"];

/// Write output as CSV to stdout.
///
/// A top-level array (records, synthetic pools) becomes one row per element.
/// Otherwise the first array listed in `ROW_KEYS` is written as rows, and
/// failing that the result's scalars as field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        Value::Object(map) => match row_array(map) {
            Some(rows) => write_array_csv(&mut wtr, rows),
            None => write_pairs(&mut wtr, map),
        },
        _ => {
            let _ = wtr.write_record([&format_csv_value(result)]);
        }
    }

    let _ = wtr.flush();
}

fn row_array(map: &Map<String, Value>) -> Option<&[Value]> {
    ROW_KEYS
        .iter()
        .find_map(|k| map.get(*k).and_then(Value::as_array))
        .map(Vec::as_slice)
}

fn write_pairs<W: io::Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        if let Value::Object(inner) = val {
            for (k, v) in inner {
                let name = format!("{key}.{k}");
                let _ = wtr.write_record([name.as_str(), &format_csv_value(v)]);
            }
        } else {
            let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
        }
    }
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        let result = value.get("result").unwrap_or(value);
        match result {
            Value::Array(arr) => write_array_csv(&mut wtr, arr),
            Value::Object(map) => match row_array(map) {
                Some(rows) => write_array_csv(&mut wtr, rows),
                None => write_pairs(&mut wtr, map),
            },
            _ => unreachable!(),
        }
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_decisions_preferred_over_scalars() {
        let v = json!({"result": {
            "scenario": "x",
            "decisions": [{"index": 0, "allocation_decision": true}],
        }});
        assert_eq!(render(&v), "allocation_decision,index\ntrue,0\n");
    }

    #[test]
    fn test_scalars_flatten_one_level() {
        let v = json!({"result": {"total": 3, "summary": {"count": 2}}});
        assert_eq!(render(&v), "field,value\nsummary.count,2\ntotal,3\n");
    }
}
