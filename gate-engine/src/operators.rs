//! Operator semantics over JSON facts.

use std::cmp::Ordering;

use gate_model::Operator;
use serde_json::{Number, Value};

use crate::error::OperandMismatch;
use crate::facts::Lookup;

/// Comparison bound to one operator: `(actual, expected) -> matched`.
pub(crate) type Comparator = fn(&Value, &Value) -> Result<bool, OperandMismatch>;

/// Resolves an operator to its comparison function.
pub(crate) fn comparator(operator: Operator) -> Comparator {
    match operator {
        Operator::Eq => equal,
        Operator::Ne => not_equal,
        Operator::Gt => greater,
        Operator::Lt => less,
        Operator::Ge => greater_or_equal,
        Operator::Le => less_or_equal,
        Operator::In => within,
        Operator::NotIn => not_in,
        Operator::Contains => contains,
    }
}

/// Applies a bound comparator to a looked-up fact.
///
/// An absent fact never matches, except under `!=`.
pub(crate) fn apply(
    operator: Operator,
    compare: Comparator,
    actual: Lookup<'_>,
    expected: &Value,
) -> Result<bool, OperandMismatch> {
    match actual {
        Lookup::Found(actual) => compare(actual, expected),
        Lookup::Absent => Ok(operator == Operator::Ne),
    }
}

#[allow(clippy::unnecessary_wraps)]
fn equal(actual: &Value, expected: &Value) -> Result<bool, OperandMismatch> {
    Ok(facts_equal(actual, expected))
}

#[allow(clippy::unnecessary_wraps)]
fn not_equal(actual: &Value, expected: &Value) -> Result<bool, OperandMismatch> {
    Ok(!facts_equal(actual, expected))
}

fn greater(actual: &Value, expected: &Value) -> Result<bool, OperandMismatch> {
    order(actual, expected).map(Ordering::is_gt)
}

fn less(actual: &Value, expected: &Value) -> Result<bool, OperandMismatch> {
    order(actual, expected).map(Ordering::is_lt)
}

fn greater_or_equal(actual: &Value, expected: &Value) -> Result<bool, OperandMismatch> {
    order(actual, expected).map(Ordering::is_ge)
}

fn less_or_equal(actual: &Value, expected: &Value) -> Result<bool, OperandMismatch> {
    order(actual, expected).map(Ordering::is_le)
}

fn within(actual: &Value, expected: &Value) -> Result<bool, OperandMismatch> {
    is_member(actual, expected)
}

fn contains(actual: &Value, expected: &Value) -> Result<bool, OperandMismatch> {
    is_member(expected, actual)
}

/// A list fact is checked for the literal's absence; any other fact is
/// checked for absence from the literal collection.
fn not_in(actual: &Value, expected: &Value) -> Result<bool, OperandMismatch> {
    if actual.is_array() {
        is_member(expected, actual).map(|found| !found)
    } else {
        is_member(actual, expected).map(|found| !found)
    }
}

fn is_member(needle: &Value, haystack: &Value) -> Result<bool, OperandMismatch> {
    match haystack {
        Value::Array(items) => Ok(items.iter().any(|item| facts_equal(item, needle))),
        Value::String(text) => match needle {
            Value::String(part) => Ok(text.contains(part.as_str())),
            other => Err(OperandMismatch::NotSubstring {
                needle: type_name(other),
            }),
        },
        Value::Object(map) => Ok(needle.as_str().is_some_and(|key| map.contains_key(key))),
        other => Err(OperandMismatch::NotIterable {
            operand: type_name(other),
        }),
    }
}

fn order(actual: &Value, expected: &Value) -> Result<Ordering, OperandMismatch> {
    let ordering = match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };

    ordering.ok_or(OperandMismatch::Unordered {
        actual: type_name(actual),
        expected: type_name(expected),
    })
}

fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return Some(a.cmp(&b));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

/// Structural equality in which `1` and `1.0` are the same number.
pub(crate) fn facts_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b) == Some(Ordering::Equal),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| facts_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| facts_equal(x, y)))
        }
        _ => a == b,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
