use serde_json::Value;

/// Headline fields, most specific first.
const PRIORITY_KEYS: [&str; 8] = [
    "risk_score",
    "overall_risk_level",
    "mean_risk_score",
    "high_risk_count",
    "npa_rate",
    "total_exposure",
    "low_max",
    "weights",
];

/// Print just the key answer value from the output.
///
/// Looks for a well-known headline field in the result, then falls back to
/// a count for list results or the first field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result_obj {
        Value::Object(map) => {
            for key in &PRIORITY_KEYS {
                if let Some(val) = map.get(*key) {
                    if !val.is_null() {
                        println!("{}", format_minimal(val));
                        return;
                    }
                }
            }
            if let Some(Value::Array(assessments)) = map.get("assessments") {
                let unscoreable = map
                    .get("unscoreable")
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len);
                println!("scored: {}, unscoreable: {}", assessments.len(), unscoreable);
                return;
            }
            if let Some((key, val)) = map.iter().next() {
                println!("{}: {}", key, format_minimal(val));
            }
        }
        Value::Array(items) => println!("{}", items.len()),
        other => println!("{}", format_minimal(other)),
    }
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
