//! Database layer for RustF models
//!
//! Adapters for the supported backends, the value and schema types they
//! exchange with the mapper, and a registry of named connections.

pub mod adapter;
pub mod adapters;
pub mod config;
pub mod filter;
pub mod registry;
pub mod schema;
pub mod statement;
pub mod value;

use indexmap::IndexMap;

/// One row: column name to value, in column order
pub type Row = IndexMap<String, SqlValue>;

// Re-export main types for convenience
pub use adapter::{DatabaseAdapter, DatabaseBackend, QueryResult};
pub use adapters::{MemoryAdapter, MySqlAdapter, SqliteAdapter};
pub use config::{DatabaseConnectionConfig, DatabasesConfig};
pub use filter::{Condition, Filter};
pub use registry::DatabaseRegistry;
pub use schema::{FieldMeta, Schema, SchemaCache};
pub use value::SqlValue;
