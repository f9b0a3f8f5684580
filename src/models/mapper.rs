//! Generic table mapper
//!
//! Holds one row of a bound table in memory, tracks which columns changed
//! and writes them back with a single INSERT or UPDATE.

use crate::database::{DatabaseAdapter, Filter, Row, Schema, SqlValue};
use crate::error::Result;
use crate::models::binding::Binding;
use crate::models::candidate::Candidate;
use crate::models::policy::{BeforeWrite, PendingWrite, WriteKind};
use crate::security::Security;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Change tracking for models
///
/// Only the columns marked here are sent to the database, so columns the
/// caller never touched keep their database defaults on insert and their
/// stored values on update.
pub trait ChangeTracking {
    /// Mark a field as changed
    fn mark_changed(&mut self, field: &str);

    /// Check if a specific field has been changed
    fn is_changed(&self, field: &str) -> bool;

    /// Check if any fields have been changed
    fn has_changes(&self) -> bool;

    /// Clear all change tracking (after a successful write)
    fn clear_changes(&mut self);

    /// Changed field names, in schema order
    fn changed_fields(&self) -> Vec<String>;
}

/// Outcome of a successful write
#[derive(Debug, Clone, PartialEq)]
pub struct Persisted {
    pub kind: WriteKind,
    /// Primary key of the written row, when the table has one
    pub id: Option<SqlValue>,
    pub rows_affected: u64,
}

/// One row of one table
pub struct Mapper {
    adapter: Arc<dyn DatabaseAdapter>,
    schema: Schema,
    primary_key: Option<String>,
    values: Row,
    /// Row as last read from or written to the database
    original: Option<Row>,
    changed: HashSet<String>,
    policies: Vec<Arc<dyn BeforeWrite>>,
}

impl Mapper {
    /// Describe the bound table and start with an empty row
    pub async fn bind(adapter: Arc<dyn DatabaseAdapter>, binding: &Binding) -> Result<Self> {
        let described = adapter.schema(binding.table(), binding.cache_ttl()).await?;
        let schema = match binding.field_list() {
            Some(fields) => {
                for field in fields.iter().filter(|f| !described.contains(f)) {
                    log::warn!("Table '{}' has no column '{}'", binding.table(), field);
                }
                described.restrict(fields)
            }
            None => described,
        };
        let primary_key = schema.primary_key()?.map(str::to_string);

        log::debug!(
            "Bound table '{}' on '{}' ({} columns, primary key {:?})",
            schema.table(),
            adapter.name(),
            schema.len(),
            primary_key
        );

        let mut mapper = Self {
            adapter,
            schema,
            primary_key,
            values: Row::new(),
            original: None,
            changed: HashSet::new(),
            policies: Vec::new(),
        };
        mapper.reset();
        Ok(mapper)
    }

    /// Register a before-write policy. Policies run in registration order.
    pub fn before_write<P>(&mut self, policy: P)
    where
        P: BeforeWrite + 'static,
    {
        self.policies.push(Arc::new(policy));
    }

    pub fn policy_count(&self) -> usize {
        self.policies.len()
    }

    pub fn table(&self) -> &str {
        self.schema.table()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn adapter(&self) -> &Arc<dyn DatabaseAdapter> {
        &self.adapter
    }

    /// Name of the primary key column
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// Key of the row this mapper was loaded from
    pub fn loaded_key(&self) -> Option<&SqlValue> {
        let pk = self.primary_key.as_deref()?;
        self.original.as_ref()?.get(pk)
    }

    /// True once a row was loaded or inserted
    pub fn is_loaded(&self) -> bool {
        self.original.is_some()
    }

    /// Every column with its current value
    pub fn fields(&self) -> &Row {
        &self.values
    }

    pub fn get(&self, field: &str) -> Option<&SqlValue> {
        self.values.get(field)
    }

    /// Set a column. Returns false and changes nothing for unknown names.
    pub fn set(&mut self, field: &str, value: impl Into<SqlValue>) -> bool {
        let value = value.into();
        let Some(current) = self.values.get_mut(field) else {
            return false;
        };
        if *current == value {
            return true;
        }
        *current = value;
        self.mark_changed(field);
        true
    }

    /// Forget the loaded row and every change
    pub fn reset(&mut self) {
        self.values = self
            .schema
            .names()
            .map(|name| (name.to_string(), SqlValue::Null))
            .collect();
        self.original = None;
        self.clear_changes();
    }

    /// Copy the candidate fields that are columns of this table
    pub fn copy_from(&mut self, candidate: &Candidate) {
        for (field, value) in candidate.iter() {
            if !self.set(field, value.clone()) {
                log::debug!("'{}' is not a column of '{}', not copied", field, self.table());
            }
        }
    }

    /// Load the first row matching the filter
    ///
    /// Returns `Ok(false)` and leaves the mapper empty when nothing matches.
    pub async fn load(&mut self, filter: &Filter) -> Result<bool> {
        self.reset();
        match self.adapter.select_one(self.schema.table(), filter).await? {
            Some(row) => {
                self.absorb(&row);
                self.original = Some(self.values.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run the before-write policies, then insert or update
    pub async fn persist(
        &mut self,
        candidate: Option<&Candidate>,
        security: &Security,
    ) -> Result<Persisted> {
        let kind = if self.is_loaded() {
            WriteKind::Update
        } else {
            WriteKind::Insert
        };

        let policies = self.policies.clone();
        for policy in &policies {
            let mut write = PendingWrite::new(self, candidate, kind, security);
            policy.before_write(&mut write)?;
        }

        match kind {
            WriteKind::Insert => self.insert().await,
            WriteKind::Update => self.update().await,
        }
    }

    async fn insert(&mut self) -> Result<Persisted> {
        let values = self.changed_values();
        let result = self.adapter.insert(self.schema.table(), &values).await?;

        let mut id = None;
        if let Some(pk) = self.primary_key.clone() {
            let current = self.values.get(&pk).cloned().unwrap_or(SqlValue::Null);
            let generated = self.schema.get(&pk).is_some_and(|meta| meta.auto_increment);
            let key = match (current.is_null(), generated) {
                (true, true) => result.last_insert_id.clone().unwrap_or(SqlValue::Null),
                _ => current,
            };

            if !key.is_null() {
                // Re-read so columns filled by the database are visible
                let filter = Filter::new().where_eq(&pk, key.clone());
                match self.adapter.select_one(self.schema.table(), &filter).await? {
                    Some(row) => self.absorb(&row),
                    None => {
                        self.values.insert(pk, key.clone());
                    }
                }
                self.original = Some(self.values.clone());
                id = Some(key);
            }
        }
        self.clear_changes();

        log::trace!("Inserted into '{}' with key {:?}", self.table(), id);
        Ok(Persisted {
            kind: WriteKind::Insert,
            id,
            rows_affected: result.rows_affected,
        })
    }

    async fn update(&mut self) -> Result<Persisted> {
        if !self.has_changes() {
            log::debug!("Nothing changed in '{}', no update issued", self.table());
            return Ok(Persisted {
                kind: WriteKind::Update,
                id: self.loaded_key().cloned(),
                rows_affected: 0,
            });
        }

        let filter = self.original_filter();
        let values = self.changed_values();
        let result = self
            .adapter
            .update(self.schema.table(), &values, &filter)
            .await?;

        self.original = Some(self.values.clone());
        self.clear_changes();

        Ok(Persisted {
            kind: WriteKind::Update,
            id: self.loaded_key().cloned(),
            rows_affected: result.rows_affected,
        })
    }

    /// Filter selecting the stored row: by key, or by every column without one
    fn original_filter(&self) -> Filter {
        let Some(original) = &self.original else {
            return Filter::new();
        };
        match self.primary_key.as_deref() {
            Some(pk) => Filter::new().where_eq(pk, original.get(pk).cloned().unwrap_or(SqlValue::Null)),
            None => original
                .iter()
                .fold(Filter::new(), |filter, (column, value)| filter.where_eq(column, value.clone())),
        }
    }

    fn changed_values(&self) -> Row {
        self.values
            .iter()
            .filter(|(name, _)| self.changed.contains(*name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    fn absorb(&mut self, row: &Row) {
        for (name, value) in self.values.iter_mut() {
            *value = row.get(name).cloned().unwrap_or(SqlValue::Null);
        }
    }
}

impl ChangeTracking for Mapper {
    fn mark_changed(&mut self, field: &str) {
        self.changed.insert(field.to_string());
    }

    fn is_changed(&self, field: &str) -> bool {
        self.changed.contains(field)
    }

    fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    fn clear_changes(&mut self) {
        self.changed.clear();
    }

    fn changed_fields(&self) -> Vec<String> {
        self.values
            .keys()
            .filter(|name| self.changed.contains(*name))
            .cloned()
            .collect()
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("table", &self.schema.table())
            .field("connection", &self.adapter.name())
            .field("values", &self.values)
            .field("loaded", &self.is_loaded())
            .field("changed", &self.changed_fields())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{FieldMeta, MemoryAdapter};

    async fn mapper() -> (MemoryAdapter, Mapper) {
        let db = MemoryAdapter::new("memory");
        db.create_table(
            Schema::new("item")
                .field(FieldMeta::new("id", "INTEGER").primary_key().auto_increment())
                .field(FieldMeta::new("name", "TEXT"))
                .field(FieldMeta::new("stock", "INTEGER").default_value("0")),
        );
        let mapper = Mapper::bind(Arc::new(db.clone()), &Binding::new("item"))
            .await
            .unwrap();
        (db, mapper)
    }

    #[tokio::test]
    async fn test_set_tracks_changes() {
        let (_, mut mapper) = mapper().await;
        assert!(!mapper.has_changes());

        assert!(mapper.set("name", "bolt"));
        assert!(!mapper.set("colour", "red"));
        assert!(mapper.set("stock", SqlValue::Null));

        assert!(mapper.is_changed("name"));
        assert!(!mapper.is_changed("stock"));
        assert_eq!(mapper.changed_fields(), vec!["name"]);
        assert!(mapper.get("colour").is_none());
    }

    #[tokio::test]
    async fn test_insert_writes_back_key_and_defaults() {
        let (db, mut mapper) = mapper().await;
        mapper.set("name", "bolt");

        let persisted = mapper.persist(None, &Security::default()).await.unwrap();
        assert_eq!(persisted.kind, WriteKind::Insert);
        assert_eq!(persisted.id, Some(SqlValue::BigInt(1)));
        assert!(mapper.is_loaded());
        assert!(!mapper.has_changes());
        assert_eq!(mapper.get("stock"), Some(&SqlValue::from("0")));
        assert_eq!(db.count("item"), 1);
    }

    #[tokio::test]
    async fn test_update_without_changes_issues_nothing() {
        let (db, mut mapper) = mapper().await;
        mapper.set("name", "bolt");
        mapper.persist(None, &Security::default()).await.unwrap();

        let persisted = mapper.persist(None, &Security::default()).await.unwrap();
        assert_eq!(persisted.kind, WriteKind::Update);
        assert_eq!(persisted.rows_affected, 0);

        mapper.set("name", "nut");
        let persisted = mapper.persist(None, &Security::default()).await.unwrap();
        assert_eq!(persisted.rows_affected, 1);
        assert_eq!(db.rows("item")[0].get("name"), Some(&SqlValue::from("nut")));
    }

    #[tokio::test]
    async fn test_null_is_written_like_any_change() {
        let (db, mut mapper) = mapper().await;
        mapper.set("name", "bolt");
        mapper.set("stock", 5);
        mapper.persist(None, &Security::default()).await.unwrap();

        assert!(mapper.set("stock", SqlValue::Null));
        assert_eq!(mapper.changed_fields(), vec!["stock"]);
        mapper.persist(None, &Security::default()).await.unwrap();
        assert_eq!(db.rows("item")[0].get("stock"), Some(&SqlValue::Null));
    }

    #[tokio::test]
    async fn test_load_and_reset() {
        let (_, mut mapper) = mapper().await;
        mapper.set("name", "bolt");
        mapper.persist(None, &Security::default()).await.unwrap();

        assert!(!mapper.load(&Filter::new().where_eq("id", 99)).await.unwrap());
        assert!(!mapper.is_loaded());
        assert_eq!(mapper.get("name"), Some(&SqlValue::Null));

        assert!(mapper.load(&Filter::new().where_eq("name", "bolt")).await.unwrap());
        assert_eq!(mapper.loaded_key(), Some(&SqlValue::BigInt(1)));

        mapper.reset();
        assert!(!mapper.is_loaded());
        assert!(mapper.loaded_key().is_none());
    }

    #[tokio::test]
    async fn test_policy_failure_aborts_write() {
        let (db, mut mapper) = mapper().await;
        mapper.before_write(|write: &mut PendingWrite<'_>| -> Result<()> {
            if write.get("name").is_some_and(SqlValue::is_empty) {
                return Err(crate::error::Error::field_empty("name"));
            }
            Ok(())
        });

        let err = mapper.persist(None, &Security::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "The name cannot be empty.");
        assert_eq!(db.count("item"), 0);
    }

    #[tokio::test]
    async fn test_restricted_fields() {
        let db = MemoryAdapter::new("memory");
        db.create_table(
            Schema::new("item")
                .field(FieldMeta::new("id", "INTEGER").primary_key().auto_increment())
                .field(FieldMeta::new("name", "TEXT").nullable())
                .field(FieldMeta::new("secret", "TEXT").nullable()),
        );
        let mut mapper = Mapper::bind(
            Arc::new(db.clone()),
            &Binding::new("item").fields(["id", "name"]),
        )
        .await
        .unwrap();

        assert!(!mapper.set("secret", "x"));
        assert_eq!(mapper.fields().len(), 2);
    }
}
