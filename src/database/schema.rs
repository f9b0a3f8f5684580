//! Table field metadata
//!
//! A [`Schema`] keeps the columns of one table in declaration order, which is
//! the order primary key discovery walks.

use crate::error::{Error, Result};
use dashmap::DashMap;
use indexmap::IndexMap;
use std::time::{Duration, Instant};

/// Metadata of one column
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMeta {
    pub name: String,
    pub sql_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub primary_key: bool,
    pub auto_increment: bool,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable: false,
            default: None,
            primary_key: false,
            auto_increment: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Columns of one table in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    table: String,
    fields: IndexMap<String, FieldMeta>,
}

impl Schema {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: IndexMap::new(),
        }
    }

    /// Append a column
    pub fn field(mut self, meta: FieldMeta) -> Self {
        self.push(meta);
        self
    }

    pub fn push(&mut self, meta: FieldMeta) {
        self.fields.insert(meta.name.clone(), meta);
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn get(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldMeta> {
        self.fields.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Every column flagged as primary key, in schema order
    pub fn primary_keys(&self) -> Vec<&str> {
        self.fields
            .values()
            .filter(|meta| meta.primary_key)
            .map(|meta| meta.name.as_str())
            .collect()
    }

    /// The single primary key column
    ///
    /// `Ok(None)` when no column is flagged. More than one flagged column is
    /// reported as [`Error::AmbiguousPrimaryKey`].
    pub fn primary_key(&self) -> Result<Option<&str>> {
        let keys = self.primary_keys();
        match keys.as_slice() {
            [] => Ok(None),
            [key] => Ok(Some(*key)),
            _ => Err(Error::AmbiguousPrimaryKey {
                table: self.table.clone(),
                fields: keys.iter().map(|k| k.to_string()).collect(),
            }),
        }
    }

    /// Keep only the listed columns, in schema order
    pub fn restrict(&self, names: &[String]) -> Self {
        Self {
            table: self.table.clone(),
            fields: self
                .fields
                .iter()
                .filter(|(name, _)| names.iter().any(|n| n == *name))
                .map(|(name, meta)| (name.clone(), meta.clone()))
                .collect(),
        }
    }
}

/// Described schemas per table, reused until their ttl runs out
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: DashMap<String, (Instant, Schema)>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, table: &str, ttl: Duration) -> Option<Schema> {
        if ttl.is_zero() {
            return None;
        }
        let entry = self.entries.get(table)?;
        let (stored_at, schema) = entry.value();
        if stored_at.elapsed() < ttl {
            Some(schema.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, schema: Schema) {
        self.entries
            .insert(schema.table().to_string(), (Instant::now(), schema));
    }

    pub fn invalidate(&self, table: &str) {
        self.entries.remove(table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Schema {
        Schema::new("user")
            .field(FieldMeta::new("id", "INTEGER").primary_key().auto_increment())
            .field(FieldMeta::new("email", "TEXT"))
            .field(FieldMeta::new("password", "TEXT"))
    }

    #[test]
    fn test_primary_key_discovery() {
        assert_eq!(users().primary_key().unwrap(), Some("id"));

        let view = Schema::new("viewuser").field(FieldMeta::new("email", "TEXT"));
        assert_eq!(view.primary_key().unwrap(), None);
    }

    #[test]
    fn test_multiple_primary_keys_are_rejected() {
        let membership = Schema::new("membership")
            .field(FieldMeta::new("user_id", "INTEGER").primary_key())
            .field(FieldMeta::new("group_id", "INTEGER").primary_key());

        assert_eq!(membership.primary_keys(), vec!["user_id", "group_id"]);
        assert!(matches!(
            membership.primary_key(),
            Err(Error::AmbiguousPrimaryKey { .. })
        ));
    }

    #[test]
    fn test_restrict_keeps_order() {
        let restricted = users().restrict(&["password".to_string(), "id".to_string()]);
        assert_eq!(restricted.names().collect::<Vec<_>>(), vec!["id", "password"]);
    }

    #[test]
    fn test_cache_honors_ttl() {
        let cache = SchemaCache::new();
        cache.insert(users());

        assert!(cache.get("user", Duration::from_secs(60)).is_some());
        assert!(cache.get("user", Duration::ZERO).is_none());

        cache.invalidate("user");
        assert!(cache.get("user", Duration::from_secs(60)).is_none());
    }
}
