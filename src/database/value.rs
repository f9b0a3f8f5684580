//! Unified SQL value type for record fields
//!
//! Every field read from or written to a table goes through `SqlValue`,
//! whichever adapter holds the data.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Generic SQL value type for parameter binding and result extraction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i32),
    BigInt(i64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Json(JsonValue),
    Date(String),     // ISO date: "2024-01-15"
    DateTime(String), // ISO datetime: "2024-01-15T10:30:00"
}

impl SqlValue {
    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// NULL or a zero-length text value
    pub fn is_empty(&self) -> bool {
        match self {
            SqlValue::Null => true,
            SqlValue::String(s) | SqlValue::Date(s) | SqlValue::DateTime(s) => s.is_empty(),
            SqlValue::Bytes(b) => b.is_empty(),
            _ => false,
        }
    }

    /// Borrow the text of textual values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::String(s) | SqlValue::Date(s) | SqlValue::DateTime(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to an i64 if possible
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(i) => Some(*i as i64),
            SqlValue::BigInt(i) => Some(*i),
            SqlValue::Bool(b) => Some(*b as i64),
            SqlValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Convert to a String
    pub fn as_string(&self) -> Option<String> {
        match self {
            SqlValue::Null | SqlValue::Bytes(_) => None,
            SqlValue::String(s) | SqlValue::Date(s) | SqlValue::DateTime(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Compare the way a database compares a bound parameter with a column:
    /// numbers by value, everything else by text.
    pub fn loosely_eq(&self, other: &SqlValue) -> bool {
        match (self, other) {
            (SqlValue::Null, SqlValue::Null) => true,
            (SqlValue::Null, _) | (_, SqlValue::Null) => false,
            (SqlValue::Double(a), b) | (b, SqlValue::Double(a)) => match b {
                SqlValue::Double(b) => a == b,
                _ => b
                    .as_string()
                    .and_then(|s| s.trim().parse::<f64>().ok())
                    .is_some_and(|b| *a == b),
            },
            (a, b) => match (a.as_i64(), b.as_i64()) {
                (Some(a), Some(b)) => a == b,
                _ => match (a.as_string(), b.as_string()) {
                    (Some(a), Some(b)) => a == b,
                    _ => a == b,
                },
            },
        }
    }

    /// Build a value from a decoded JSON payload, keeping scalars scalar
    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => SqlValue::Null,
            JsonValue::Bool(b) => SqlValue::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::BigInt(i),
                None => n.as_f64().map(SqlValue::Double).unwrap_or(SqlValue::Null),
            },
            JsonValue::String(s) => SqlValue::String(s),
            other => SqlValue::Json(other),
        }
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            SqlValue::Null => JsonValue::Null,
            SqlValue::Bool(b) => JsonValue::Bool(*b),
            SqlValue::Int(i) => JsonValue::Number((*i).into()),
            SqlValue::BigInt(i) => JsonValue::Number((*i).into()),
            SqlValue::Double(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            SqlValue::String(s) | SqlValue::Date(s) | SqlValue::DateTime(s) => {
                JsonValue::String(s.clone())
            }
            SqlValue::Bytes(bytes) => JsonValue::String(hex_encode(bytes)),
            SqlValue::Json(j) => j.clone(),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::BigInt(i) => write!(f, "{}", i),
            SqlValue::Double(d) => write!(f, "{}", d),
            SqlValue::String(s) | SqlValue::Date(s) | SqlValue::DateTime(s) => write!(f, "{}", s),
            SqlValue::Json(j) => write!(f, "{}", j),
            SqlValue::Bytes(b) => write!(f, "<binary:{} bytes>", b.len()),
        }
    }
}

fn hex_encode(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02X}", b)).collect()
}

// From trait implementations for common types
impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::BigInt(v)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::BigInt(v as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Double(v)
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::String(s)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::String(s.to_string())
    }
}

impl From<&String> for SqlValue {
    fn from(s: &String) -> Self {
        SqlValue::String(s.clone())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl From<JsonValue> for SqlValue {
    fn from(v: JsonValue) -> Self {
        SqlValue::from_json(v)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => SqlValue::Null,
        }
    }
}

// Date/Time type conversions
impl From<chrono::NaiveDate> for SqlValue {
    fn from(date: chrono::NaiveDate) -> Self {
        SqlValue::Date(date.format("%Y-%m-%d").to_string())
    }
}

impl From<chrono::NaiveDateTime> for SqlValue {
    fn from(dt: chrono::NaiveDateTime) -> Self {
        SqlValue::DateTime(dt.format("%Y-%m-%dT%H:%M:%S").to_string())
    }
}

impl From<chrono::DateTime<chrono::Utc>> for SqlValue {
    fn from(dt: chrono::DateTime<chrono::Utc>) -> Self {
        SqlValue::DateTime(dt.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_loose_equality() {
        assert!(SqlValue::from("3").loosely_eq(&SqlValue::BigInt(3)));
        assert!(SqlValue::Int(7).loosely_eq(&SqlValue::BigInt(7)));
        assert!(SqlValue::Double(1.5).loosely_eq(&SqlValue::from("1.5")));
        assert!(SqlValue::Null.loosely_eq(&SqlValue::Null));
        assert!(!SqlValue::Null.loosely_eq(&SqlValue::from("")));
        assert!(!SqlValue::from("abc").loosely_eq(&SqlValue::from("abd")));
    }

    #[test]
    fn test_emptiness() {
        assert!(SqlValue::Null.is_empty());
        assert!(SqlValue::from("").is_empty());
        assert!(!SqlValue::from("0").is_empty());
        assert!(!SqlValue::Int(0).is_empty());
    }

    #[test]
    fn test_from_json_keeps_scalars() {
        assert_eq!(SqlValue::from_json(json!(null)), SqlValue::Null);
        assert_eq!(SqlValue::from_json(json!(12)), SqlValue::BigInt(12));
        assert_eq!(SqlValue::from_json(json!("x")), SqlValue::from("x"));
        assert_eq!(
            SqlValue::from_json(json!({"a": 1})),
            SqlValue::Json(json!({"a": 1}))
        );
    }

    #[test]
    fn test_dates() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(SqlValue::from(date), SqlValue::Date("2024-01-15".to_string()));
    }
}
