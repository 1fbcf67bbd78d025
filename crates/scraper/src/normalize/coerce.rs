//! Scalar coercion for values converted from XML text.

use serde_json::{Map, Number, Value};

/// Recursively turn numeric strings into numbers and `"true"`/`"false"` into
/// booleans. Everything else is kept as is.
pub fn coerce(value: Value) -> Value {
    match value {
        Value::String(s) => coerce_str(s),
        Value::Array(items) => Value::Array(items.into_iter().map(coerce).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, coerce(value)))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

fn coerce_str(s: String) -> Value {
    match s.as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if !looks_numeric(&s) {
        return Value::String(s);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Number(i.into());
    }
    match s.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(n) => Value::Number(n),
        None => Value::String(s),
    }
}

/// Plain decimal notation only. Codes with leading zeros stay strings.
fn looks_numeric(s: &str) -> bool {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    if unsigned.is_empty() || unsigned.starts_with('.') || unsigned.ends_with('.') {
        return false;
    }
    if unsigned.len() > 1 && unsigned.starts_with('0') && !unsigned.starts_with("0.") {
        return false;
    }

    let mut dots = 0;
    for c in unsigned.chars() {
        match c {
            '0'..='9' => {}
            '.' => dots += 1,
            _ => return false,
        }
    }
    dots <= 1
}
