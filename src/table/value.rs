//! Typed cell values and records.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A record: column name → value.
///
/// A `BTreeMap` keeps snapshots deterministic (columns always serialize in
/// name order).
pub type Record = BTreeMap<String, Value>;

/// A single typed cell.
///
/// Serialized untagged, so a record persists as a plain JSON object such as
/// `{"id": 1, "name": "ada", "score": 9.5}`.
///
/// # Ordering
/// Values are totally ordered so they can key a B+Tree: first by variant
/// (`Integer < Float < Text`), then by content. Floats compare with
/// [`f64::total_cmp`], so `NaN` has a fixed place instead of breaking the
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    fn rank(&self) -> u8 {
        match self {
            Value::Integer(_) => 0,
            Value::Float(_) => 1,
            Value::Text(_) => 2,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// Build a [`Record`] from `(column, value)` pairs.
///
/// # Example
/// ```
/// use arbordb::{record, Value};
///
/// let row = record([("id", Value::from(1)), ("name", Value::from("ada"))]);
/// assert_eq!(row["name"], Value::from("ada"));
/// ```
pub fn record<const N: usize>(fields: [(&str, Value); N]) -> Record {
    fields
        .into_iter()
        .map(|(column, value)| (column.to_string(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_within_variant() {
        assert!(Value::from(1) < Value::from(2));
        assert!(Value::from(-0.5) < Value::from(0.25));
        assert!(Value::from("apple") < Value::from("banana"));
    }

    #[test]
    fn test_ordering_across_variants() {
        assert!(Value::from(1_000_000) < Value::from(0.0));
        assert!(Value::from(1e300) < Value::from(""));
    }

    #[test]
    fn test_nan_is_totally_ordered() {
        let nan = Value::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_eq!(nan.cmp(&Value::Float(f64::INFINITY)), Ordering::Greater);
    }

    #[test]
    fn test_untagged_json_shape() {
        let row = record([
            ("id", Value::from(7)),
            ("name", Value::from("ada")),
            ("score", Value::from(9.5)),
        ]);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"id":7,"name":"ada","score":9.5}"#);

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_whole_float_stays_float() {
        let json = serde_json::to_string(&Value::Float(2.0)).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_float(), Some(2.0));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from(3).as_integer(), Some(3));
        assert_eq!(Value::from(3).as_text(), None);
        assert_eq!(Value::from("x").as_text(), Some("x"));
        assert_eq!(format!("{}", Value::from("x")), "x");
    }
}
