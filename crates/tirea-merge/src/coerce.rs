//! Value coercion for leaf assignment.
//!
//! A leaf is first assigned the candidate value as-is. `null` into an
//! `Option` member succeeds at that point. If the direct assignment fails,
//! a short list of converted candidates is tried in order: integral floats
//! narrowed to integers, integers widened to floats, numeric and boolean
//! strings parsed, and scalars rendered as strings.

use serde_json::{Number, Value};

/// Assign `value` through `assign`, retrying with converted candidates.
///
/// Returns `true` as soon as one attempt succeeds.
pub(crate) fn assign_with<F>(value: &Value, mut assign: F) -> bool
where
    F: FnMut(Value) -> Result<(), serde_json::Error>,
{
    if assign(value.clone()).is_ok() {
        return true;
    }
    candidates(value)
        .into_iter()
        .any(|candidate| assign(candidate).is_ok())
}

/// Converted forms of `value`, most specific first.
pub(crate) fn candidates(value: &Value) -> Vec<Value> {
    match value {
        Value::Number(n) => number_candidates(n),
        Value::String(s) => string_candidates(s),
        Value::Bool(b) => vec![
            Value::String(b.to_string()),
            Value::Number(Number::from(u8::from(*b))),
        ],
        Value::Null | Value::Array(_) | Value::Object(_) => Vec::new(),
    }
}

fn number_candidates(n: &Number) -> Vec<Value> {
    let mut out = Vec::with_capacity(3);
    if let Some(f) = n.as_f64().filter(|_| n.is_f64()) {
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
            out.push(Value::Number(Number::from(f as i64)));
        }
    } else if let Some(f) = n.as_f64().and_then(Number::from_f64) {
        out.push(Value::Number(f));
    }
    out.push(Value::String(n.to_string()));
    out
}

fn string_candidates(s: &str) -> Vec<Value> {
    let trimmed = s.trim();
    let mut out = Vec::with_capacity(2);
    if let Ok(i) = trimmed.parse::<i64>() {
        out.push(Value::Number(Number::from(i)));
    } else if let Ok(u) = trimmed.parse::<u64>() {
        out.push(Value::Number(Number::from(u)));
    } else if let Some(f) = trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
    {
        out.push(Value::Number(f));
    }
    if trimmed.eq_ignore_ascii_case("true") {
        out.push(Value::Bool(true));
    } else if trimmed.eq_ignore_ascii_case("false") {
        out.push(Value::Bool(false));
    }
    out
}
