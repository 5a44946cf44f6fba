//! Loose numeric coercion for hand-written JSON documents.
//!
//! Exported datasets carry coordinates and proportions as numbers, numeric
//! strings, or occasionally booleans. These helpers read a value the way a
//! lenient exporter intended it, and report `None` where nothing numeric can
//! be recovered.

use serde_json::Value;

/// Coerce a JSON value to `f64`.
///
/// - numbers pass through
/// - strings are trimmed; an empty string is `0.0`
/// - `true`/`false` are `1.0`/`0.0`
/// - `null` is `0.0`
/// - arrays and objects are not numeric
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Some(0.0)
            } else {
                s.parse::<f64>().ok()
            }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Coerce to a finite `f64`, substituting `fallback` for anything else.
pub fn finite_or(value: Option<&Value>, fallback: f64) -> f64 {
    value
        .and_then(to_number)
        .filter(|n| n.is_finite())
        .unwrap_or(fallback)
}

/// First field among `aliases` that is present and not `null`.
pub fn first_present<'a>(
    object: &'a serde_json::Map<String, Value>,
    aliases: &[&str],
) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|key| object.get(*key))
        .find(|v| !v.is_null())
}
