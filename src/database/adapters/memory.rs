//! In-memory database adapter
//!
//! Tables live in process memory and are declared up front with
//! [`MemoryAdapter::create_table`]. Useful for tests and for embedding models
//! without a database server.

use crate::database::adapter::{DatabaseAdapter, DatabaseBackend, QueryResult};
use crate::database::{Filter, Row, Schema, SchemaCache, SqlValue};
use crate::error::{Error, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct MemoryTable {
    schema: Schema,
    rows: Vec<Row>,
    next_id: i64,
}

/// In-memory database adapter
#[derive(Clone)]
pub struct MemoryAdapter {
    name: String,
    tables: Arc<DashMap<String, MemoryTable>>,
    schema_cache: Arc<SchemaCache>,
}

impl MemoryAdapter {
    /// Create a new, empty in-memory database
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Arc::new(DashMap::new()),
            schema_cache: Arc::new(SchemaCache::new()),
        }
    }

    /// Declare a table. Replaces any table of the same name.
    pub fn create_table(&self, schema: Schema) {
        let table = schema.table().to_string();
        self.schema_cache.invalidate(&table);
        self.tables.insert(
            table,
            MemoryTable {
                schema,
                rows: Vec::new(),
                next_id: 1,
            },
        );
    }

    /// Snapshot of the rows of a table
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Number of rows in a table
    pub fn count(&self, table: &str) -> usize {
        self.tables.get(table).map(|t| t.rows.len()).unwrap_or(0)
    }

    fn missing(table: &str) -> Error {
        Error::TableNotFound(table.to_string())
    }
}

#[async_trait]
impl DatabaseAdapter for MemoryAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Memory
    }

    async fn describe(&self, table: &str) -> Result<Schema> {
        self.tables
            .get(table)
            .map(|t| t.schema.clone())
            .ok_or_else(|| Self::missing(table))
    }

    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Row>> {
        let data = self.tables.get(table).ok_or_else(|| Self::missing(table))?;
        Ok(data.rows.iter().find(|row| filter.matches(row)).cloned())
    }

    async fn insert(&self, table: &str, values: &Row) -> Result<QueryResult> {
        let mut data = self
            .tables
            .get_mut(table)
            .ok_or_else(|| Self::missing(table))?;

        for column in values.keys() {
            if !data.schema.contains(column) {
                return Err(Error::database_query(format!(
                    "table {} has no column named {}",
                    table, column
                )));
            }
        }

        let mut row = Row::new();
        let mut last_insert_id = None;
        // Committed only once every constraint passed
        let mut next_id = data.next_id;
        let schema = data.schema.clone();
        for meta in schema.fields() {
            let value = match values.get(&meta.name) {
                Some(value) if !(meta.auto_increment && value.is_null()) => value.clone(),
                _ if meta.auto_increment => {
                    let id = next_id;
                    next_id += 1;
                    SqlValue::BigInt(id)
                }
                _ => meta
                    .default
                    .as_ref()
                    .map(|d| SqlValue::String(d.clone()))
                    .unwrap_or(SqlValue::Null),
            };

            if meta.primary_key {
                if !value.is_null() && data.rows.iter().any(|r| {
                    r.get(&meta.name)
                        .is_some_and(|existing| existing.loosely_eq(&value))
                }) {
                    return Err(Error::database_query(format!(
                        "UNIQUE constraint failed: {}.{}",
                        table, meta.name
                    )));
                }
                last_insert_id = Some(value.clone());
            }
            if let (true, Some(id)) = (meta.auto_increment, value.as_i64()) {
                next_id = next_id.max(id + 1);
            }
            if value.is_null() && !meta.nullable && !meta.primary_key {
                return Err(Error::database_query(format!(
                    "NOT NULL constraint failed: {}.{}",
                    table, meta.name
                )));
            }
            row.insert(meta.name.clone(), value);
        }

        data.next_id = next_id;
        data.rows.push(row);
        Ok(QueryResult {
            rows_affected: 1,
            last_insert_id,
        })
    }

    async fn update(&self, table: &str, values: &Row, filter: &Filter) -> Result<QueryResult> {
        let mut data = self
            .tables
            .get_mut(table)
            .ok_or_else(|| Self::missing(table))?;

        let mut rows_affected = 0;
        for row in data.rows.iter_mut().filter(|row| filter.matches(row)) {
            for (column, value) in values {
                row.insert(column.clone(), value.clone());
            }
            rows_affected += 1;
        }

        Ok(QueryResult {
            rows_affected,
            last_insert_id: None,
        })
    }

    async fn ping(&self) -> Result<bool> {
        Ok(true)
    }

    fn schema_cache(&self) -> &SchemaCache {
        &self.schema_cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::FieldMeta;

    fn adapter() -> MemoryAdapter {
        let db = MemoryAdapter::new("memory");
        db.create_table(
            Schema::new("user")
                .field(FieldMeta::new("id", "INTEGER").primary_key().auto_increment())
                .field(FieldMeta::new("email", "TEXT"))
                .field(FieldMeta::new("nickname", "TEXT").nullable()),
        );
        db
    }

    fn values(pairs: &[(&str, SqlValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_insert_assigns_ids() {
        let db = adapter();
        let first = db
            .insert("user", &values(&[("email", "a@example.com".into())]))
            .await
            .unwrap();
        let second = db
            .insert("user", &values(&[("email", "b@example.com".into())]))
            .await
            .unwrap();

        assert_eq!(first.last_insert_id, Some(SqlValue::BigInt(1)));
        assert_eq!(second.last_insert_id, Some(SqlValue::BigInt(2)));
        assert_eq!(db.rows("user")[1].get("nickname"), Some(&SqlValue::Null));
    }

    #[tokio::test]
    async fn test_not_null_and_unknown_columns() {
        let db = adapter();
        assert!(db.insert("user", &Row::new()).await.is_err());
        assert!(db
            .insert("user", &values(&[("missing", "x".into())]))
            .await
            .is_err());
        assert_eq!(db.count("user"), 0);
    }

    #[tokio::test]
    async fn test_rejected_insert_keeps_next_id() {
        let db = adapter();
        assert!(db
            .insert("user", &values(&[("nickname", "ann".into())]))
            .await
            .is_err());

        let result = db
            .insert("user", &values(&[("email", "a@example.com".into())]))
            .await
            .unwrap();
        assert_eq!(result.last_insert_id, Some(SqlValue::BigInt(1)));

        let duplicate = values(&[("id", SqlValue::BigInt(1)), ("email", "b@example.com".into())]);
        assert!(db.insert("user", &duplicate).await.is_err());
        let result = db
            .insert("user", &values(&[("email", "c@example.com".into())]))
            .await
            .unwrap();
        assert_eq!(result.last_insert_id, Some(SqlValue::BigInt(2)));
    }

    #[tokio::test]
    async fn test_select_and_update() {
        let db = adapter();
        db.insert("user", &values(&[("email", "a@example.com".into())]))
            .await
            .unwrap();

        let filter = Filter::new().where_eq("id", "1");
        let result = db
            .update("user", &values(&[("nickname", "ann".into())]), &filter)
            .await
            .unwrap();
        assert_eq!(result.rows_affected, 1);

        let row = db.select_one("user", &filter).await.unwrap().unwrap();
        assert_eq!(row.get("nickname"), Some(&SqlValue::from("ann")));
        assert!(db
            .select_one("user", &Filter::new().where_eq("id", 2))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let db = adapter();
        assert!(matches!(
            db.describe("group").await,
            Err(Error::TableNotFound(_))
        ));
    }
}
