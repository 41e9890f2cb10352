//! Report values: numeric classification and normalization of merged totals.
//!
//! A report leaf is one of Number, nested object (one level), Scalar
//! (string/bool/array) or Null. Booleans are scalars here, never counts.

use serde_json::{Map, Number, Value};

/// One parsed report document (statistics or performance), in source key order.
pub type Report = Map<String, Value>;

/// A report together with a label naming where it came from (usually a path).
#[derive(Clone, Debug)]
pub struct SourcedReport {
    pub source: String,
    pub report: Report,
}

impl SourcedReport {
    pub fn new(source: impl Into<String>, report: Report) -> Self {
        Self { source: source.into(), report }
    }
}

/// Returns the value as a finite real if it is a JSON number.
#[inline]
pub fn as_real(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()),
        _ => None,
    }
}

#[inline]
pub fn is_numeric(v: &Value) -> bool {
    as_real(v).is_some()
}

/// Looks up `key` in `report` and returns it as a real, if numeric.
#[inline]
pub fn real_at(report: &Report, key: &str) -> Option<f64> {
    report.get(key).and_then(as_real)
}

/// Encode a real as a JSON number. Non-finite inputs become `null`.
#[inline]
pub fn real_value(x: f64) -> Value {
    Number::from_f64(x).map(Value::Number).unwrap_or(Value::Null)
}

/// Encode `Option<f64>` as number-or-null.
#[inline]
pub fn real_or_null(x: Option<f64>) -> Value {
    x.map(real_value).unwrap_or(Value::Null)
}

/// Normalize a merged total: integral totals are emitted as integers so pure
/// counts never print as `12.0`; everything else stays real.
pub fn normalize_total(total: f64) -> Value {
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound.
    const LOWER: f64 = i64::MIN as f64;
    const UPPER: f64 = i64::MAX as f64;
    if total.is_finite() && total.fract() == 0.0 && (LOWER..UPPER).contains(&total) {
        Value::from(total as i64)
    } else {
        real_value(total)
    }
}

/// `num / den` over reals; `None` when the denominator is zero.
#[inline]
pub fn safe_ratio(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 {
        None
    } else {
        Some(num / den)
    }
}

/// Scalar equality for conflict detection: numbers compare by value, so
/// `1` and `1.0` agree, including inside arrays and objects.
pub fn same_scalar(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_scalar(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs.iter().all(|(k, x)| ys.get(k).is_some_and(|y| same_scalar(x, y)))
        }
        _ => a == b,
    }
}

/// Compact JSON text of a value, used in conflict messages.
pub fn describe(v: &Value) -> String {
    serde_json::to_string(v).unwrap_or_else(|_| format!("{v:?}"))
}
