//! Loose conversions for untrusted JSON input.
//!
//! Upstream product records and client-supplied profiles are not typed: numbers
//! arrive as JSON numbers, numeric strings, or booleans, and flags arrive as
//! anything at all. These helpers give those inputs one consistent reading.

use serde_json::Value;

/// Reads a finite number out of a JSON value.
///
/// Accepts numbers, numeric strings (surrounding whitespace ignored) and
/// booleans (`true` = 1). Returns `None` for everything else, including NaN
/// and infinities.
pub fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => return None,
    };

    n.is_finite().then_some(n)
}

/// Truthiness of a JSON value: null, false, zero, "" and empty containers are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Renders a scalar as text: strings verbatim, null as "", anything else as JSON.
pub fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
