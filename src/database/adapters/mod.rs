//! Database adapter implementations for different database backends

pub mod memory;
pub mod mysql;
pub mod sqlite;

pub use memory::MemoryAdapter;
pub use mysql::MySqlAdapter;
pub use sqlite::SqliteAdapter;
