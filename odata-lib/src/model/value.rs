//! Value enum for dynamic key, filter and payload values

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ExpressionError;

/// A dynamic value used as a key value, filter operand or payload field.
///
/// # Type Mapping
///
/// | EDM Type | Rust Variant |
/// |----------|--------------|
/// | null | `Null` |
/// | Edm.Boolean | `Bool` |
/// | Edm.Int32 | `Int` |
/// | Edm.Int64 | `Long` |
/// | Edm.Double | `Float` |
/// | Edm.Decimal | `Decimal` |
/// | Edm.String | `String` |
/// | Edm.Guid | `Guid` |
/// | Edm.DateTimeOffset | `DateTime` |
/// | Edm.Date | `Date` |
///
/// # Example
///
/// ```
/// use odata_lib::model::Value;
///
/// let name = Value::from("Chai");
/// let id = Value::from(1);
/// let discontinued = Value::from(false);
/// let empty = Value::Null;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    Long(i64),
    /// 64-bit floating point.
    Float(f64),
    /// Arbitrary precision decimal.
    Decimal(Decimal),
    /// String value.
    String(String),
    /// GUID value.
    Guid(Uuid),
    /// Date and time with offset.
    DateTime(DateTime<Utc>),
    /// Calendar date.
    Date(NaiveDate),
    /// Fallback for JSON values with no dedicated variant.
    Json(serde_json::Value),
}

impl Value {
    /// Returns `true` if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Guid(_) => "guid",
            Value::DateTime(_) => "datetime",
            Value::Date(_) => "date",
            Value::Json(_) => "json",
        }
    }

    /// Converts a JSON value into the closest dynamic value.
    ///
    /// Integers that fit in 32 bits become `Int`, larger ones `Long`.
    /// Arrays and objects are kept as `Json`.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(small) => Value::Int(small),
                        Err(_) => Value::Long(i),
                    }
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::Json(serde_json::Value::Number(n))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            other => Value::Json(other),
        }
    }

    /// Converts the value to the variant matching a declared EDM type.
    ///
    /// Serialized structs carry GUIDs, decimals and timestamps as strings;
    /// this restores their typed form so they render as typed literals.
    /// Values that already match, or types with no dedicated variant, are
    /// returned unchanged.
    pub fn coerce(self, edm_type: &str) -> Result<Value, ExpressionError> {
        let invalid = |text: &str| ExpressionError::InvalidLiteral {
            type_name: edm_type.to_string(),
            value: text.to_string(),
        };
        let coerced = match (edm_type, self) {
            ("Edm.Guid", Value::String(s)) => Value::Guid(Uuid::parse_str(&s).map_err(|_| invalid(&s))?),
            ("Edm.Decimal", Value::String(s)) => Value::Decimal(s.parse::<Decimal>().map_err(|_| invalid(&s))?),
            ("Edm.DateTimeOffset", Value::String(s)) => Value::DateTime(
                DateTime::parse_from_rfc3339(&s)
                    .map_err(|_| invalid(&s))?
                    .with_timezone(&Utc),
            ),
            ("Edm.Date", Value::String(s)) => Value::Date(s.parse::<NaiveDate>().map_err(|_| invalid(&s))?),
            ("Edm.Int64", Value::String(s)) => Value::Long(s.parse::<i64>().map_err(|_| invalid(&s))?),
            ("Edm.Int64", Value::Int(n)) => Value::Long(i64::from(n)),
            (_, other) => other,
        };
        Ok(coerced)
    }
}

// =============================================================================
// From implementations
// =============================================================================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Guid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(Value::from_json(serde_json::json!(1)), Value::Int(1));
        assert_eq!(
            Value::from_json(serde_json::json!(5_000_000_000i64)),
            Value::Long(5_000_000_000)
        );
        assert_eq!(Value::from_json(serde_json::json!(1.5)), Value::Float(1.5));
    }

    #[test]
    fn test_from_json_keeps_objects() {
        let value = Value::from_json(serde_json::json!({"a": 1}));
        assert_eq!(value.type_name(), "json");
    }

    #[test]
    fn test_coerce_serialized_strings() {
        let id = Uuid::from_u128(0x1234);
        assert_eq!(Value::from(id.to_string()).coerce("Edm.Guid").unwrap(), Value::Guid(id));
        assert_eq!(
            Value::from("1.25").coerce("Edm.Decimal").unwrap(),
            Value::Decimal(Decimal::new(125, 2))
        );
        assert_eq!(
            Value::from("2024-03-01").coerce("Edm.Date").unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert_eq!(
            Value::from("2024-03-01T12:00:00+02:00").coerce("Edm.DateTimeOffset").unwrap().type_name(),
            "datetime"
        );
        assert_eq!(Value::Int(7).coerce("Edm.Int64").unwrap(), Value::Long(7));
    }

    #[test]
    fn test_coerce_leaves_other_values() {
        assert_eq!(Value::from("Chai").coerce("Edm.String").unwrap(), Value::from("Chai"));
        assert_eq!(Value::Int(1).coerce("Edm.Decimal").unwrap(), Value::Int(1));
        assert_eq!(Value::Null.coerce("Edm.Guid").unwrap(), Value::Null);
    }

    #[test]
    fn test_coerce_rejects_malformed() {
        let err = Value::from("not-a-guid").coerce("Edm.Guid").unwrap_err();
        assert_eq!(
            err,
            ExpressionError::InvalidLiteral {
                type_name: "Edm.Guid".to_string(),
                value: "not-a-guid".to_string(),
            }
        );
    }
}
