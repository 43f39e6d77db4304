//! Runtime value types carried by predicates, records and rows.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::Error;

/// ISO date format accepted for date filter values when the configured
/// format does not match.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// ISO datetime format used when a datetime is rendered without a
/// configured format.
pub const ISO_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A scalar value read from a record or parsed from a filter slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time without timezone.
    DateTime(NaiveDateTime),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a date or datetime.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Value::Date(_) | Value::DateTime(_))
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64. Integers widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the calendar date. Datetimes truncate to their date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::DateTime(dt) => Some(dt.date()),
            _ => None,
        }
    }

    /// Parse a numeric filter value: integers first, then floats.
    pub fn parse_number(raw: &str) -> Result<Value, Error> {
        let trimmed = raw.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return Ok(Value::Int(i));
        }
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float)
            .ok_or_else(|| Error::InvalidNumber(raw.to_string()))
    }

    /// Parse a date filter value with `format`, falling back to ISO.
    pub fn parse_date(raw: &str, format: &str) -> Result<Value, Error> {
        let trimmed = raw.trim();
        NaiveDate::parse_from_str(trimmed, format)
            .or_else(|_| NaiveDate::parse_from_str(trimmed, ISO_DATE_FORMAT))
            .map(Value::Date)
            .map_err(|_| Error::InvalidDate {
                value: raw.to_string(),
                format: format.to_string(),
            })
    }

    /// Parse a boolean filter value.
    pub fn parse_bool(raw: &str) -> Result<Value, Error> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(Error::InvalidBoolean(raw.to_string())),
        }
    }

    /// Convert to a JSON value. Temporal values use ISO formats.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::json!(i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Date(d) => serde_json::Value::String(d.format(ISO_DATE_FORMAT).to_string()),
            Value::DateTime(dt) => {
                serde_json::Value::String(dt.format(ISO_DATETIME_FORMAT).to_string())
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format(ISO_DATE_FORMAT)),
            Value::DateTime(dt) => write!(f, "{}", dt.format(ISO_DATETIME_FORMAT)),
        }
    }
}

// Conversion implementations
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
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

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(true).is_null());

        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(100).as_i64(), Some(100));
        assert_eq!(Value::Int(42).as_f64(), Some(42.0)); // Widening conversion
        assert_eq!(Value::String("hello".into()).as_str(), Some("hello"));

        let dt = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(
            Value::DateTime(dt).as_date(),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
    }

    #[test]
    fn test_value_conversions() {
        let v: Value = true.into();
        assert_eq!(v, Value::Bool(true));

        let v: Value = 42i32.into();
        assert_eq!(v, Value::Int(42));

        let v: Value = "hello".into();
        assert_eq!(v, Value::String("hello".into()));

        let v: Value = None::<i32>.into();
        assert_eq!(v, Value::Null);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(Value::parse_number("30"), Ok(Value::Int(30)));
        assert_eq!(Value::parse_number(" 2.5 "), Ok(Value::Float(2.5)));
        assert_eq!(
            Value::parse_number("thirty"),
            Err(Error::InvalidNumber("thirty".into()))
        );
        assert!(Value::parse_number("NaN").is_err());
    }

    #[test]
    fn test_parse_date_with_fallback() {
        let expected = Value::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(Value::parse_date("05/01/2024", "%d/%m/%Y"), Ok(expected.clone()));
        assert_eq!(Value::parse_date("2024-01-05", "%d/%m/%Y"), Ok(expected));
        assert!(Value::parse_date("5th of January", "%d/%m/%Y").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(Value::parse_bool("TRUE"), Ok(Value::Bool(true)));
        assert_eq!(Value::parse_bool("0"), Ok(Value::Bool(false)));
        assert!(Value::parse_bool("maybe").is_err());
    }

    #[test]
    fn test_to_json() {
        assert_eq!(Value::Int(3).to_json(), serde_json::json!(3));
        assert_eq!(Value::Float(f64::NAN).to_json(), serde_json::Value::Null);
        let d = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(Value::Date(d).to_json(), serde_json::json!("2024-01-05"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(7).to_string(), "7");
        assert_eq!(Value::String("abc".into()).to_string(), "abc");
        assert_eq!(Value::Null.to_string(), "null");
    }
}
