//! Column types and table schemas.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};
use crate::table::value::{Record, Value};

/// The closed set of column types.
///
/// Type tags coming from users are mapped through [`ColumnType::from_str`];
/// there is no other way to name a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Text,
}

impl ColumnType {
    /// Canonical tag, as written to artifacts.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
        }
    }

    /// Check `value` against this type, widening integers into float columns.
    ///
    /// Float columns only hold finite values; NaN and infinities cannot be
    /// written to an artifact.
    ///
    /// # Errors
    /// Returns `Error::SchemaViolation` on any other mismatch.
    pub fn coerce(&self, value: Value) -> Result<Value> {
        match (self, value) {
            (ColumnType::Integer, v @ Value::Integer(_)) => Ok(v),
            (ColumnType::Float, Value::Float(f)) if !f.is_finite() => Err(Error::schema(
                format!("float value must be finite, got '{}'", f),
            )),
            (ColumnType::Float, v @ Value::Float(_)) => Ok(v),
            (ColumnType::Float, Value::Integer(i)) => Ok(Value::Float(i as f64)),
            (ColumnType::Text, v @ Value::Text(_)) => Ok(v),
            (expected, other) => Err(Error::schema(format!(
                "expected {} value, got '{}'",
                expected.name(),
                other
            ))),
        }
    }

    /// Parse user-typed text (e.g. a shell argument) into a value of this type.
    ///
    /// # Errors
    /// Returns `Error::SchemaViolation` if `raw` does not parse.
    pub fn parse_value(&self, raw: &str) -> Result<Value> {
        let raw = raw.trim();
        match self {
            ColumnType::Integer => raw
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| Error::schema(format!("'{}' is not an integer", raw))),
            ColumnType::Float => match raw.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Value::Float(f)),
                _ => Err(Error::schema(format!("'{}' is not a finite float", raw))),
            },
            ColumnType::Text => Ok(Value::Text(raw.to_string())),
        }
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    /// Accepts `integer`/`int`, `float`, `text`/`str`, case-insensitively.
    fn from_str(tag: &str) -> Result<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(ColumnType::Integer),
            "float" => Ok(ColumnType::Float),
            "text" | "str" => Ok(ColumnType::Text),
            other => Err(Error::schema(format!("unknown column type '{}'", other))),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column declarations plus the name of the primary-key column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: BTreeMap<String, ColumnType>,
    primary_key: String,
}

impl Schema {
    /// Build a schema.
    ///
    /// # Errors
    /// Returns `Error::SchemaViolation` if there are no columns or the
    /// primary key is not one of them.
    pub fn new<I, S>(columns: I, primary_key: impl Into<String>) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ColumnType)>,
        S: Into<String>,
    {
        let columns: BTreeMap<String, ColumnType> = columns
            .into_iter()
            .map(|(name, ty)| (name.into(), ty))
            .collect();
        let primary_key = primary_key.into();

        if columns.is_empty() {
            return Err(Error::schema("a table needs at least one column"));
        }
        if !columns.contains_key(&primary_key) {
            return Err(Error::schema(format!(
                "primary key '{}' is not a declared column",
                primary_key
            )));
        }

        Ok(Self {
            columns,
            primary_key,
        })
    }

    /// Parse a `name:type,name:type` declaration, e.g. `"id:int,name:str"`.
    ///
    /// # Errors
    /// Returns `Error::SchemaViolation` on a malformed pair, a duplicate
    /// column, an unknown type tag, or an undeclared primary key.
    pub fn parse(declaration: &str, primary_key: &str) -> Result<Self> {
        let mut columns = BTreeMap::new();
        for pair in declaration.split(',').filter(|p| !p.trim().is_empty()) {
            let (name, tag) = pair
                .split_once(':')
                .ok_or_else(|| Error::schema(format!("expected name:type, got '{}'", pair)))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::schema(format!("empty column name in '{}'", pair)));
            }
            if columns.insert(name.to_string(), tag.parse()?).is_some() {
                return Err(Error::schema(format!("duplicate column '{}'", name)));
            }
        }
        Self::new(columns, primary_key.trim())
    }

    pub fn columns(&self) -> &BTreeMap<String, ColumnType> {
        &self.columns
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.columns.get(column).copied()
    }

    /// Type of the primary-key column.
    pub fn key_type(&self) -> ColumnType {
        self.columns[&self.primary_key]
    }

    /// Normalize a lookup key to the primary-key column type when possible,
    /// so `Integer(1)` finds the row keyed `Float(1.0)`.
    pub fn normalize_key(&self, key: &Value) -> Value {
        self.key_type()
            .coerce(key.clone())
            .unwrap_or_else(|_| key.clone())
    }

    /// Check a full record for insertion and return it with values coerced.
    ///
    /// # Errors
    /// Returns `Error::SchemaViolation` if a declared column is missing, an
    /// undeclared column is present, or a value has the wrong type.
    pub fn validate_record(&self, record: Record) -> Result<Record> {
        if let Some(missing) = self.columns.keys().find(|c| !record.contains_key(*c)) {
            return Err(Error::schema(format!("missing column '{}'", missing)));
        }
        self.coerce_fields(record)
    }

    /// Check a partial record for an update and return it with values
    /// coerced.
    ///
    /// # Errors
    /// Returns `Error::SchemaViolation` if the primary-key column is named,
    /// a column is undeclared, or a value has the wrong type.
    pub fn validate_update(&self, fields: Record) -> Result<Record> {
        if fields.contains_key(&self.primary_key) {
            return Err(Error::schema(format!(
                "primary key '{}' cannot be modified",
                self.primary_key
            )));
        }
        self.coerce_fields(fields)
    }

    fn coerce_fields(&self, fields: Record) -> Result<Record> {
        fields
            .into_iter()
            .map(|(column, value)| {
                let ty = self
                    .column_type(&column)
                    .ok_or_else(|| Error::schema(format!("unknown column '{}'", column)))?;
                let value = ty
                    .coerce(value)
                    .map_err(|e| Error::schema(format!("column '{}': {}", column, e)))?;
                Ok((column, value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::value::record;

    fn people() -> Schema {
        Schema::new(
            [
                ("id", ColumnType::Integer),
                ("name", ColumnType::Text),
                ("score", ColumnType::Float),
            ],
            "id",
        )
        .unwrap()
    }

    #[test]
    fn test_type_tags() {
        assert_eq!("integer".parse::<ColumnType>().unwrap(), ColumnType::Integer);
        assert_eq!("INT".parse::<ColumnType>().unwrap(), ColumnType::Integer);
        assert_eq!(" float ".parse::<ColumnType>().unwrap(), ColumnType::Float);
        assert_eq!("str".parse::<ColumnType>().unwrap(), ColumnType::Text);
        assert!(matches!(
            "__import__('os')".parse::<ColumnType>(),
            Err(Error::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_type_tag_serialization() {
        let json = serde_json::to_string(&ColumnType::Float).unwrap();
        assert_eq!(json, r#""float""#);
    }

    #[test]
    fn test_coerce() {
        assert_eq!(
            ColumnType::Float.coerce(Value::from(2)).unwrap(),
            Value::Float(2.0)
        );
        assert!(ColumnType::Integer.coerce(Value::from(2.5)).is_err());
        assert!(ColumnType::Text.coerce(Value::from(1)).is_err());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(
            ColumnType::Integer.parse_value(" 42 ").unwrap(),
            Value::from(42)
        );
        assert_eq!(ColumnType::Float.parse_value("1.5").unwrap(), Value::from(1.5));
        assert_eq!(ColumnType::Text.parse_value("hi").unwrap(), Value::from("hi"));
        assert!(ColumnType::Integer.parse_value("4x").is_err());
    }

    #[test]
    fn test_non_finite_floats_rejected() {
        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                ColumnType::Float.coerce(Value::Float(f)),
                Err(Error::SchemaViolation(_))
            ));
        }
        for raw in ["NaN", "inf", "-infinity"] {
            assert!(ColumnType::Float.parse_value(raw).is_err(), "{}", raw);
        }
    }

    #[test]
    fn test_primary_key_must_be_declared() {
        let err = Schema::new([("id", ColumnType::Integer)], "uuid");
        assert!(matches!(err, Err(Error::SchemaViolation(_))));
    }

    #[test]
    fn test_parse_declaration() {
        let schema = Schema::parse("id:int, name:str ,score:float", "id").unwrap();
        assert_eq!(schema, people());

        assert!(Schema::parse("id:int,id:str", "id").is_err());
        assert!(Schema::parse("id", "id").is_err());
        assert!(Schema::parse("id:uuid", "id").is_err());
    }

    #[test]
    fn test_validate_record() {
        let schema = people();
        let row = record([
            ("id", Value::from(1)),
            ("name", Value::from("ada")),
            ("score", Value::from(3)),
        ]);
        let row = schema.validate_record(row).unwrap();
        assert_eq!(row["score"], Value::Float(3.0));

        let missing = record([("id", Value::from(1)), ("name", Value::from("ada"))]);
        assert!(schema.validate_record(missing).is_err());

        let extra = record([
            ("id", Value::from(1)),
            ("name", Value::from("ada")),
            ("score", Value::from(1.0)),
            ("email", Value::from("a@b")),
        ]);
        assert!(schema.validate_record(extra).is_err());
    }

    #[test]
    fn test_validate_update_rejects_primary_key() {
        let schema = people();
        assert!(schema
            .validate_update(record([("id", Value::from(2))]))
            .is_err());
        assert!(schema
            .validate_update(record([("name", Value::from("bob"))]))
            .is_ok());
    }

    #[test]
    fn test_normalize_key() {
        let schema = Schema::new([("k", ColumnType::Float)], "k").unwrap();
        assert_eq!(schema.normalize_key(&Value::from(1)), Value::Float(1.0));
        assert_eq!(schema.normalize_key(&Value::from("x")), Value::from("x"));
    }
}
