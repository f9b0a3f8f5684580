//! MySQL database adapter implementation

use crate::database::adapter::{DatabaseAdapter, DatabaseBackend, QueryResult};
use crate::database::config::DatabaseConnectionConfig;
use crate::database::{statement, FieldMeta, Filter, Row, Schema, SchemaCache, SqlValue};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::mysql::{MySqlPoolOptions, MySqlRow};
use sqlx::{Column, MySqlPool, Row as _, TypeInfo, ValueRef};
use std::sync::Arc;
use std::time::Duration;

type MySqlQuery<'q> = sqlx::query::Query<'q, sqlx::MySql, sqlx::mysql::MySqlArguments>;

const DESCRIBE_SQL: &str = "SELECT CAST(COLUMN_NAME AS CHAR) AS name, \
     CAST(COLUMN_TYPE AS CHAR) AS sql_type, \
     CAST(IS_NULLABLE AS CHAR) AS nullable, \
     CAST(COLUMN_DEFAULT AS CHAR) AS default_value, \
     CAST(COLUMN_KEY AS CHAR) AS column_key, \
     CAST(EXTRA AS CHAR) AS extra \
     FROM information_schema.columns \
     WHERE table_schema = DATABASE() AND table_name = ? \
     ORDER BY ORDINAL_POSITION";

/// MySQL database adapter
#[derive(Clone)]
pub struct MySqlAdapter {
    name: String,
    pool: Arc<MySqlPool>,
    schema_cache: Arc<SchemaCache>,
}

impl MySqlAdapter {
    /// Create a new MySQL adapter
    pub async fn new(name: impl Into<String>, connection_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(connection_url)
            .await
            .map_err(|e| Error::database_connection(format!("Failed to connect to MySQL: {}", e)))?;

        Ok(Self::from_pool(name, pool))
    }

    /// Create a new MySQL adapter with pool settings
    pub async fn with_config(
        name: impl Into<String>,
        config: &DatabaseConnectionConfig,
    ) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .idle_timeout(Duration::from_secs(config.idle_timeout))
            .max_lifetime(Duration::from_secs(config.max_lifetime))
            .connect(&config.url)
            .await
            .map_err(|e| Error::database_connection(format!("Failed to connect to MySQL: {}", e)))?;

        Ok(Self::from_pool(name, pool))
    }

    /// Create adapter from existing pool
    pub fn from_pool(name: impl Into<String>, pool: MySqlPool) -> Self {
        Self {
            name: name.into(),
            pool: Arc::new(pool),
            schema_cache: Arc::new(SchemaCache::new()),
        }
    }

    /// Get reference to the underlying pool
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Bind a SqlValue to a MySQL query
    fn bind_param(query: MySqlQuery<'_>, value: SqlValue) -> MySqlQuery<'_> {
        match value {
            SqlValue::Null => query.bind(None::<Vec<u8>>), // MySQL accepts NULL for any type
            SqlValue::Bool(b) => query.bind(b),
            SqlValue::Int(i) => query.bind(i),
            SqlValue::BigInt(i) => query.bind(i),
            SqlValue::Double(f) => query.bind(f),
            SqlValue::String(s) => query.bind(s),
            SqlValue::Bytes(b) => query.bind(b),
            SqlValue::Json(j) => query.bind(j),
            SqlValue::Date(s) => {
                if let Ok(date) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
                    query.bind(date)
                } else {
                    query.bind(s)
                }
            }
            SqlValue::DateTime(s) => {
                if let Ok(dt) = NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S") {
                    query.bind(dt)
                } else {
                    query.bind(s)
                }
            }
        }
    }

    /// Extract a column value based on the MySQL column type
    fn extract(row: &MySqlRow, index: usize) -> Result<SqlValue> {
        if row.try_get_raw(index)?.is_null() {
            return Ok(SqlValue::Null);
        }

        let column = &row.columns()[index];
        let type_name = column.type_info().name().to_uppercase();

        let value = match type_name.as_str() {
            "BOOLEAN" => SqlValue::Bool(row.try_get::<bool, _>(index)?),
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
                SqlValue::BigInt(row.try_get::<i64, _>(index)?)
            }
            t if t.ends_with("UNSIGNED") => {
                let val = row.try_get::<u64, _>(index)?;
                i64::try_from(val)
                    .map(SqlValue::BigInt)
                    .unwrap_or_else(|_| SqlValue::String(val.to_string()))
            }
            "FLOAT" | "DOUBLE" => SqlValue::Double(row.try_get::<f64, _>(index)?),
            "DATE" => SqlValue::from(row.try_get::<NaiveDate, _>(index)?),
            "DATETIME" | "TIMESTAMP" => SqlValue::from(row.try_get::<NaiveDateTime, _>(index)?),
            "JSON" => SqlValue::Json(row.try_get::<serde_json::Value, _>(index)?),
            t if t.contains("BLOB") || t.contains("BINARY") => {
                SqlValue::Bytes(row.try_get::<Vec<u8>, _>(index)?)
            }
            // DECIMAL and friends arrive as text
            _ => match row
                .try_get::<String, _>(index)
                .or_else(|_| row.try_get_unchecked::<String, _>(index))
            {
                Ok(s) => SqlValue::String(s),
                Err(_) => {
                    log::warn!(
                        "Column '{}' of type {} read as raw bytes",
                        column.name(),
                        type_name
                    );
                    SqlValue::Bytes(row.try_get::<Vec<u8>, _>(index)?)
                }
            },
        };
        Ok(value)
    }

    fn to_row(row: &MySqlRow) -> Result<Row> {
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
            log::trace!("MySQL EXECUTE: {}", sql);
            log::trace!("  Parameters: {:?}", params);
        }

        let mut query = sqlx::query(sql);
        for param in params {
            query = Self::bind_param(query, param);
        }

        let result = query
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("MySQL execute failed: {}", e)))?;

        Ok(QueryResult {
            rows_affected: result.rows_affected(),
            last_insert_id: match result.last_insert_id() {
                0 => None,
                id => Some(SqlValue::BigInt(id as i64)),
            },
        })
    }
}

#[async_trait]
impl DatabaseAdapter for MySqlAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::MySQL
    }

    async fn describe(&self, table: &str) -> Result<Schema> {
        let columns = sqlx::query(DESCRIBE_SQL)
            .bind(table)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("MySQL describe failed: {}", e)))?;

        if columns.is_empty() {
            return Err(Error::TableNotFound(table.to_string()));
        }

        let mut schema = Schema::new(table);
        for column in &columns {
            let name: String = column.try_get("name")?;
            let sql_type: String = column.try_get("sql_type")?;
            let nullable: String = column.try_get("nullable")?;
            let default: Option<String> = column.try_get("default_value")?;
            let key: String = column.try_get("column_key")?;
            let extra: String = column.try_get("extra")?;

            let mut meta = FieldMeta::new(name, sql_type);
            meta.nullable = nullable.eq_ignore_ascii_case("YES");
            meta.default = default;
            meta.primary_key = key == "PRI";
            meta.auto_increment = extra.to_lowercase().contains("auto_increment");
            schema.push(meta);
        }

        Ok(schema)
    }

    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Row>> {
        let (sql, params) = statement::select_one(self.backend(), table, filter);

        #[cfg(debug_assertions)]
        {
            log::trace!("MySQL FETCH_ONE: {}", sql);
            log::trace!("  Parameters: {:?}", params);
        }

        let mut query = sqlx::query(&sql);
        for param in params {
            query = Self::bind_param(query, param);
        }

        let row = query
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("MySQL fetch_one failed: {}", e)))?;

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
            .map_err(|e| Error::database_connection(format!("MySQL ping failed: {}", e)))
    }

    fn schema_cache(&self) -> &SchemaCache {
        &self.schema_cache
    }
}
