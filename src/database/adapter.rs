//! Database adapter trait
//!
//! This is the storage seam under the mapper: every backend only has to
//! describe a table and read, insert or update one row at a time.

use crate::database::{Filter, Row, Schema, SchemaCache, SqlValue};
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Database backend types supported by RustF models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    MySQL,
    SQLite,
    Memory,
}

/// Result type for database write operations
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Number of rows affected by the query
    pub rows_affected: u64,
    /// Last inserted ID (if applicable)
    pub last_insert_id: Option<SqlValue>,
}

/// Unified database adapter trait
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Get the name of this database connection
    fn name(&self) -> &str;

    /// Get the database backend type
    fn backend(&self) -> DatabaseBackend;

    /// Read the column metadata of a table from the database
    async fn describe(&self, table: &str) -> Result<Schema>;

    /// Fetch the first row matching the filter
    ///
    /// # Returns
    /// * `Ok(Some(Row))` - The first matching row
    /// * `Ok(None)` - If no rows match
    /// * `Err(Error)` - If the query fails
    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Row>>;

    /// Insert one row made of the given columns
    async fn insert(&self, table: &str, values: &Row) -> Result<QueryResult>;

    /// Update the rows matching the filter with the given columns
    async fn update(&self, table: &str, values: &Row, filter: &Filter) -> Result<QueryResult>;

    /// Test database connectivity
    async fn ping(&self) -> Result<bool>;

    /// Schemas described by this adapter
    fn schema_cache(&self) -> &SchemaCache;

    /// Describe a table, reusing a description younger than `ttl`
    async fn schema(&self, table: &str, ttl: Duration) -> Result<Schema> {
        if let Some(schema) = self.schema_cache().get(table, ttl) {
            log::trace!("Schema of '{}' served from cache", table);
            return Ok(schema);
        }
        let schema = self.describe(table).await?;
        if !ttl.is_zero() {
            self.schema_cache().insert(schema.clone());
        }
        Ok(schema)
    }
}
