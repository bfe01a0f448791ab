//! Lenient numeric coercion for channel payloads.
//!
//! Progress fields arrive as numbers or number-shaped strings depending on
//! the publisher. Coercion is explicit and failure is visible: anything that
//! does not parse surfaces as `NaN`, never as a silent zero.

use serde_json::Value;

/// Coerces a JSON value to `f64`.
///
/// # Arguments
/// * `value` - A number, a number-shaped string, or anything else.
///
/// # Returns
/// The numeric value, or `NaN` when it cannot be read as one.
pub fn to_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Coerces a JSON value to a non-negative integer, truncating fractions.
///
/// Step indices and runtime seconds use this; they have no `NaN`
/// representation, so unreadable input maps to 0.
pub fn to_u64(value: &Value) -> u64 {
    let n = to_f64(value);
    if n.is_finite() && n >= 0.0 {
        n as u64
    } else {
        0
    }
}

/// Rounds a percentage to two decimal places, the precision the status
/// indicator displays. `NaN` passes through.
pub fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_pass_through() {
        assert_eq!(to_f64(&json!(42.5)), 42.5);
        assert_eq!(to_u64(&json!(7)), 7);
    }

    #[test]
    fn numeric_strings_parse() {
        assert_eq!(to_f64(&json!("99.25")), 99.25);
        assert_eq!(to_u64(&json!("12")), 12);
        assert_eq!(to_u64(&json!("12.9")), 12);
    }

    #[test]
    fn garbage_becomes_nan_not_zero() {
        assert!(to_f64(&json!("accuracy")).is_nan());
        assert!(to_f64(&json!(null)).is_nan());
        assert!(to_f64(&json!({"a": 1})).is_nan());
    }

    #[test]
    fn nan_string_is_preserved_as_nan() {
        assert!(to_f64(&json!("NaN")).is_nan());
    }

    #[test]
    fn integer_coercion_clamps_unreadable_input() {
        assert_eq!(to_u64(&json!("NaN")), 0);
        assert_eq!(to_u64(&json!(-3)), 0);
    }

    #[test]
    fn rounding_matches_display_precision() {
        assert_eq!(round2(33.333_333), 33.33);
        assert_eq!(round2(66.666_666), 66.67);
        assert!(round2(f64::NAN).is_nan());
    }
}
