//! URI literal formatting and escaping.

use chrono::SecondsFormat;

use crate::ProtocolVersion;
use crate::error::ExpressionError;
use crate::model::Value;

/// Converts a `Value` to its OData URI literal representation.
pub fn value_literal(value: &Value, protocol: ProtocolVersion) -> Result<String, ExpressionError> {
    let v4 = protocol.is_v4();
    let literal = match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Long(n) if v4 => n.to_string(),
        Value::Long(n) => format!("{}L", n),
        Value::Float(n) => float_literal(*n),
        Value::Decimal(d) if v4 => d.to_string(),
        Value::Decimal(d) => format!("{}M", d),
        Value::String(s) => escape_string(s),
        Value::Guid(g) if v4 => g.to_string(),
        Value::Guid(g) => format!("guid'{}'", g),
        Value::DateTime(dt) => {
            let text = dt.to_rfc3339_opts(SecondsFormat::AutoSi, true);
            if v4 {
                text
            } else {
                format!("datetimeoffset'{}'", text)
            }
        }
        Value::Date(d) if v4 => d.format("%Y-%m-%d").to_string(),
        Value::Date(d) => format!("datetime'{}'", d.format("%Y-%m-%dT00:00:00")),
        Value::Json(json) => json_literal(json)?,
    };
    Ok(literal)
}

fn float_literal(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    // Ensure float has decimal point for OData
    let s = n.to_string();
    if s.contains('.') || s.contains('e') || s.contains('E') {
        s
    } else {
        format!("{}.0", s)
    }
}

fn json_literal(json: &serde_json::Value) -> Result<String, ExpressionError> {
    match json {
        serde_json::Value::Null => Ok("null".to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::String(s) => Ok(escape_string(s)),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            Err(ExpressionError::UnsupportedLiteral { type_name: "json" })
        }
    }
}

/// Escapes a string for use in OData queries.
///
/// OData strings are enclosed in single quotes, with internal single quotes doubled.
pub fn escape_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Percent-encodes text for a URI, keeping single quotes literal.
///
/// Unreserved characters and `'` pass through; everything else, spaces
/// included, is encoded.
pub fn escape_data(s: &str) -> String {
    urlencoding::encode(s).replace("%27", "'")
}

/// Formats a parenthesized key or parameter list.
///
/// A single pair renders as `(value)` when `bare_single` is set, otherwise
/// every pair renders as `Name=value`. Literals are percent-encoded.
pub fn format_pairs(
    pairs: &[(String, Value)],
    bare_single: bool,
    protocol: ProtocolVersion,
) -> Result<String, ExpressionError> {
    if bare_single && pairs.len() == 1 {
        let literal = value_literal(&pairs[0].1, protocol)?;
        return Ok(format!("({})", escape_data(&literal)));
    }
    let parts = pairs
        .iter()
        .map(|(name, value)| {
            let literal = value_literal(value, protocol)?;
            Ok(format!("{}={}", name, escape_data(&literal)))
        })
        .collect::<Result<Vec<_>, ExpressionError>>()?;
    Ok(format!("({})", parts.join(",")))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use chrono::TimeZone;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("O'Brien"), "'O''Brien'");
    }

    #[test]
    fn test_escape_data_keeps_quotes() {
        assert_eq!(escape_data("ProductName eq 'abc'"), "ProductName%20eq%20'abc'");
        assert_eq!(escape_data("a/b"), "a%2Fb");
    }

    #[test]
    fn test_v4_literals() {
        let v4 = ProtocolVersion::V4;
        assert_eq!(value_literal(&Value::Long(5), v4).unwrap(), "5");
        assert_eq!(value_literal(&Value::Float(2.0), v4).unwrap(), "2.0");
        assert_eq!(value_literal(&Value::Decimal(Decimal::new(125, 2)), v4).unwrap(), "1.25");
        let id = Uuid::nil();
        assert_eq!(
            value_literal(&Value::Guid(id), v4).unwrap(),
            "00000000-0000-0000-0000-000000000000"
        );
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(value_literal(&Value::DateTime(dt), v4).unwrap(), "2024-03-01T12:30:00Z");
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(value_literal(&Value::Date(date), v4).unwrap(), "2024-03-01");
    }

    #[test]
    fn test_v3_literals() {
        let v3 = ProtocolVersion::V3;
        assert_eq!(value_literal(&Value::Long(5), v3).unwrap(), "5L");
        assert_eq!(value_literal(&Value::Decimal(Decimal::new(125, 2)), v3).unwrap(), "1.25M");
        assert_eq!(
            value_literal(&Value::Guid(Uuid::nil()), v3).unwrap(),
            "guid'00000000-0000-0000-0000-000000000000'"
        );
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            value_literal(&Value::Date(date), v3).unwrap(),
            "datetime'2024-03-01T00:00:00'"
        );
    }

    #[test]
    fn test_json_object_is_not_a_literal() {
        let err = value_literal(&Value::Json(serde_json::json!({"a": 1})), ProtocolVersion::V4).unwrap_err();
        assert_eq!(err, ExpressionError::UnsupportedLiteral { type_name: "json" });
    }

    #[test]
    fn test_format_pairs() {
        let single = vec![("ProductID".to_string(), Value::Int(1))];
        assert_eq!(format_pairs(&single, true, ProtocolVersion::V4).unwrap(), "(1)");
        assert_eq!(
            format_pairs(&single, false, ProtocolVersion::V4).unwrap(),
            "(ProductID=1)"
        );

        let compound = vec![
            ("OrderID".to_string(), Value::Int(1)),
            ("ProductID".to_string(), Value::Int(2)),
        ];
        assert_eq!(
            format_pairs(&compound, true, ProtocolVersion::V4).unwrap(),
            "(OrderID=1,ProductID=2)"
        );
    }

    #[test]
    fn test_string_key_is_escaped() {
        let key = vec![("CustomerID".to_string(), Value::from("AL FKI"))];
        assert_eq!(format_pairs(&key, true, ProtocolVersion::V4).unwrap(), "('AL%20FKI')");
    }
}
