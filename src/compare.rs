use itertools::{EitherOrBoth, Itertools};
use serde_json::Value;
use std::cmp::Ordering;

/// Compares two JSON values, ordering numbers by magnitude regardless of
/// their underlying representation (`1` and `1.0` compare equal). Returns
/// None for values of incompatible types.
pub fn json_cmp(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        // Simple scalar comparisons:
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(lhs), Value::Bool(rhs)) => Some(lhs.cmp(rhs)),
        (Value::String(lhs), Value::String(rhs)) => Some(lhs.cmp(rhs)),
        // Compare numbers regardless of underlying representation (u64, i64, f64).
        (Value::Number(lhs), Value::Number(rhs)) => number_cmp(lhs, rhs),
        // Deeply compare array items in lexicographic order.
        (Value::Array(lhs), Value::Array(rhs)) => lhs
            .iter()
            .zip_longest(rhs)
            .map(|eob| match eob {
                EitherOrBoth::Both(lhs, rhs) => json_cmp(lhs, rhs),
                EitherOrBoth::Right(_) => Some(Ordering::Less),
                EitherOrBoth::Left(_) => Some(Ordering::Greater),
            })
            .find(|o| !matches!(o, Some(Ordering::Equal)))
            .unwrap_or(Some(Ordering::Equal)),
        // Deeply compare object properties and values in lexicographic order.
        (Value::Object(lhs), Value::Object(rhs)) => lhs
            .iter()
            .zip_longest(rhs)
            .map(|eob| match eob {
                EitherOrBoth::Both((lhs_p, lhs_v), (rhs_p, rhs_v)) => match lhs_p.cmp(rhs_p) {
                    Ordering::Equal => json_cmp(lhs_v, rhs_v),
                    ord => Some(ord),
                },
                EitherOrBoth::Right(_) => Some(Ordering::Less),
                EitherOrBoth::Left(_) => Some(Ordering::Greater),
            })
            .find(|o| !matches!(o, Some(Ordering::Equal)))
            .unwrap_or(Some(Ordering::Equal)),
        // Incompatible types.
        _ => None,
    }
}

/// Equality under the same numeric semantics as [`json_cmp`].
pub fn json_eq(lhs: &Value, rhs: &Value) -> bool {
    matches!(json_cmp(lhs, rhs), Some(Ordering::Equal))
}

fn number_cmp(lhs: &serde_json::Number, rhs: &serde_json::Number) -> Option<Ordering> {
    if let (Some(lhs), Some(rhs)) = (lhs.as_i64(), rhs.as_i64()) {
        return Some(lhs.cmp(&rhs));
    }
    if let (Some(lhs), Some(rhs)) = (lhs.as_u64(), rhs.as_u64()) {
        return Some(lhs.cmp(&rhs));
    }
    lhs.as_f64()?.partial_cmp(&rhs.as_f64()?)
}
