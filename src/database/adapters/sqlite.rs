//! SQLite database adapter implementation

use crate::database::adapter::{DatabaseAdapter, DatabaseBackend, QueryResult};
use crate::database::config::DatabaseConnectionConfig;
use crate::database::{statement, FieldMeta, Filter, Row, Schema, SchemaCache, SqlValue};
use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, SqlitePool, TypeInfo, ValueRef};
use std::sync::Arc;
use std::time::Duration;

type SqliteQuery<'q> = sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>;

/// SQLite database adapter
#[derive(Clone)]
pub struct SqliteAdapter {
    name: String,
    pool: Arc<SqlitePool>,
    schema_cache: Arc<SchemaCache>,
}

impl SqliteAdapter {
    /// Create a new SQLite adapter
    pub async fn new(name: impl Into<String>, connection_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(connection_url)
            .await
            .map_err(|e| Error::database_connection(format!("Failed to connect to SQLite: {}", e)))?;

        Ok(Self::from_pool(name, pool))
    }

    /// Create a new SQLite adapter with pool settings
    pub async fn with_config(
        name: impl Into<String>,
        config: &DatabaseConnectionConfig,
    ) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .connect(&config.url)
            .await
            .map_err(|e| Error::database_connection(format!("Failed to connect to SQLite: {}", e)))?;

        Ok(Self::from_pool(name, pool))
    }

    /// Create adapter from existing pool
    pub fn from_pool(name: impl Into<String>, pool: SqlitePool) -> Self {
        Self {
            name: name.into(),
            pool: Arc::new(pool),
            schema_cache: Arc::new(SchemaCache::new()),
        }
    }

    /// Get reference to the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Bind a SqlValue to a SQLite query
    fn bind_param(query: SqliteQuery<'_>, value: SqlValue) -> SqliteQuery<'_> {
        match value {
            SqlValue::Null => query.bind(None::<i32>), // SQLite accepts NULL for any type
            SqlValue::Bool(b) => query.bind(if b { 1i32 } else { 0i32 }), // SQLite stores bools as integers
            SqlValue::Int(i) => query.bind(i),
            SqlValue::BigInt(i) => query.bind(i),
            SqlValue::Double(f) => query.bind(f),
            SqlValue::String(s) | SqlValue::Date(s) | SqlValue::DateTime(s) => query.bind(s),
            SqlValue::Bytes(b) => query.bind(b),
            SqlValue::Json(j) => query.bind(j.to_string()),
        }
    }

    /// Extract a column value using the declared column type, falling back
    /// on the storage class actually found in the row
    fn extract(row: &SqliteRow, index: usize) -> Result<SqlValue> {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(SqlValue::Null);
        }

        let declared = row.columns()[index].type_info().name().to_uppercase();
        if declared.contains("BOOL") {
            if let Ok(val) = row.try_get::<bool, _>(index) {
                return Ok(SqlValue::Bool(val));
            }
        }
        if declared.contains("INT") {
            if let Ok(val) = row.try_get::<i64, _>(index) {
                return Ok(SqlValue::BigInt(val));
            }
        }
        if declared.contains("REAL") || declared.contains("FLOA") || declared.contains("DOUB") {
            if let Ok(val) = row.try_get::<f64, _>(index) {
                return Ok(SqlValue::Double(val));
            }
        }
        if declared == "DATE" {
            if let Ok(val) = row.try_get::<String, _>(index) {
                return Ok(SqlValue::Date(val));
            }
        }
        if declared.contains("DATETIME") || declared.contains("TIMESTAMP") {
            if let Ok(val) = row.try_get::<String, _>(index) {
                return Ok(SqlValue::DateTime(val));
            }
        }

        if let Ok(val) = row.try_get::<String, _>(index) {
            Ok(SqlValue::String(val))
        } else if let Ok(val) = row.try_get::<i64, _>(index) {
            Ok(SqlValue::BigInt(val))
        } else if let Ok(val) = row.try_get::<f64, _>(index) {
            Ok(SqlValue::Double(val))
        } else {
            Ok(SqlValue::Bytes(row.try_get::<Vec<u8>, _>(index)?))
        }
    }

    fn to_row(row: &SqliteRow) -> Result<Row> {
        let mut values = Row::new();
        for (index, column) in row.columns().iter().enumerate() {
            values.insert(column.name().to_string(), Self::extract(row, index)?);
        }
        Ok(values)
    }

    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<QueryResult> {
        // Log SQL in development mode
        #[cfg(debug_assertions)]
        {
            log::trace!("SQLite EXECUTE: {}", sql);
            log::trace!("  Parameters: {:?}", params);
        }

        let mut query = sqlx::query(sql);
        for param in params {
            query = Self::bind_param(query, param);
        }

        let result = query
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("SQLite execute failed: {}", e)))?;

        Ok(QueryResult {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(SqlValue::BigInt(result.last_insert_rowid())),
        })
    }
}

#[async_trait]
impl DatabaseAdapter for SqliteAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::SQLite
    }

    async fn describe(&self, table: &str) -> Result<Schema> {
        let sql = format!(
            "PRAGMA table_info({})",
            self.backend().quote_identifier(table)
        );
        let columns = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("SQLite describe failed: {}", e)))?;

        if columns.is_empty() {
            return Err(Error::TableNotFound(table.to_string()));
        }

        let mut schema = Schema::new(table);
        for column in &columns {
            let name: String = column.try_get("name")?;
            let sql_type: String = column.try_get("type")?;
            let not_null: i64 = column.try_get("notnull")?;
            let default: Option<String> = column.try_get("dflt_value")?;
            let pk: i64 = column.try_get("pk")?;

            let mut meta = FieldMeta::new(name, sql_type.clone());
            meta.nullable = not_null == 0;
            meta.default = default;
            meta.primary_key = pk > 0;
            // INTEGER PRIMARY KEY aliases the rowid
            meta.auto_increment = meta.primary_key && sql_type.eq_ignore_ascii_case("INTEGER");
            schema.push(meta);
        }

        Ok(schema)
    }

    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Row>> {
        let (sql, params) = statement::select_one(self.backend(), table, filter);

        #[cfg(debug_assertions)]
        {
            log::trace!("SQLite FETCH_ONE: {}", sql);
            log::trace!("  Parameters: {:?}", params);
        }

        let mut query = sqlx::query(&sql);
        for param in params {
            query = Self::bind_param(query, param);
        }

        let row = query
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("SQLite fetch_one failed: {}", e)))?;

        row.as_ref().map(Self::to_row).transpose()
    }

    async fn insert(&self, table: &str, values: &Row) -> Result<QueryResult> {
        let (sql, params) = statement::insert(self.backend(), table, values);
        self.execute(&sql, params).await
    }

    async fn update(&self, table: &str, values: &Row, filter: &Filter) -> Result<QueryResult> {
        let (sql, params) = statement::update(self.backend(), table, values, filter);
        let mut result = self.execute(&sql, params).await?;
        result.last_insert_id = None;
        Ok(result)
    }

    async fn ping(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .fetch_one(&*self.pool)
            .await
            .map(|_| true)
            .map_err(|e| Error::database_connection(format!("SQLite ping failed: {}", e)))
    }

    fn schema_cache(&self) -> &SchemaCache {
        &self.schema_cache
    }
}
