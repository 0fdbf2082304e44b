//! Lenient coercion of loosely-typed JSON payload fields.

use serde_json::Value;

/// Integer value of a field: JSON integers, floats (truncated toward zero)
/// and numeric strings (surrounding whitespace ignored). Booleans, objects
/// and out-of-range values are rejected.
pub fn as_int(value: &Value) -> Option<i32> {
    let wide = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    i32::try_from(wide).ok()
}

/// Non-empty text value of a field. Numbers are accepted in their JSON text
/// form; empty strings, null and every other type count as missing.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First field among `keys` holding usable text.
pub fn first_text(payload: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| payload.get(key).and_then(as_text))
}
