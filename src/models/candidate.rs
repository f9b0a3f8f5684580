//! Caller-supplied field data for one write attempt

use crate::database::SqlValue;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

/// The exact mapping handed to [`Record::save`](crate::models::Record::save)
///
/// Keys keep insertion order. A key that is not a column of the bound table
/// is never written but stays readable by before-write policies.
///
/// ```rust,ignore
/// let candidate = Candidate::new()
///     .with("email", "ann@example.com")
///     .with("password", "secret")
///     .with("verify_password", "secret");
/// user.save(Some(candidate)).await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    fields: IndexMap<String, SqlValue>,
}

impl Candidate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing any previous value of the same name
    pub fn with(mut self, field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<SqlValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&SqlValue> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Take a field out, keeping the order of the others
    pub fn remove(&mut self, field: &str) -> Option<SqlValue> {
        self.fields.shift_remove(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build from a decoded JSON object, e.g. a submitted form
    pub fn from_json(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Object(map) => Ok(map
                .into_iter()
                .map(|(k, v)| (k, SqlValue::from_json(v)))
                .collect()),
            other => Err(Error::field_invalid(format!(
                "Candidate data of type {}",
                json_type(&other)
            ))),
        }
    }
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

impl<K, V> FromIterator<(K, V)> for Candidate
where
    K: Into<String>,
    V: Into<SqlValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl TryFrom<JsonValue> for Candidate {
    type Error = Error;

    fn try_from(value: JsonValue) -> Result<Self> {
        Self::from_json(value)
    }
}

impl<'a> IntoIterator for &'a Candidate {
    type Item = (&'a String, &'a SqlValue);
    type IntoIter = indexmap::map::Iter<'a, String, SqlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_keeps_order() {
        let candidate = Candidate::new()
            .with("email", "a@example.com")
            .with("id", 3)
            .with("nickname", "ann");

        assert_eq!(candidate.keys().collect::<Vec<_>>(), vec!["email", "id", "nickname"]);
        assert_eq!(candidate.get("id"), Some(&SqlValue::Int(3)));
    }

    #[test]
    fn test_remove_keeps_remaining_order() {
        let mut candidate: Candidate = [("id", "7"), ("email", "a@b.c"), ("name", "x")]
            .into_iter()
            .collect();

        assert_eq!(candidate.remove("id"), Some(SqlValue::from("7")));
        assert_eq!(candidate.remove("id"), None);
        assert_eq!(candidate.keys().collect::<Vec<_>>(), vec!["email", "name"]);
    }

    #[test]
    fn test_from_json_object() {
        let candidate =
            Candidate::try_from(json!({"id": 4, "email": "a@b.c", "tags": ["x"], "note": null}))
                .unwrap();

        assert_eq!(candidate.get("id"), Some(&SqlValue::BigInt(4)));
        assert_eq!(candidate.get("note"), Some(&SqlValue::Null));
        assert!(matches!(candidate.get("tags"), Some(SqlValue::Json(_))));
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        let err = Candidate::from_json(json!(["email"])).unwrap_err();
        assert_eq!(err.to_string(), "Candidate data of type array is not valid.");
    }
}
