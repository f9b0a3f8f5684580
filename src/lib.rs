//! RustF Model - staged-write record models for RustF applications
//!
//! RustF Model binds a table to an in-memory record and provides:
//! - A staged write path: hand a candidate mapping to `save` and the record
//!   finds out whether it creates a row or updates an existing one
//! - Before-write policies for validation and field rewriting
//! - Password hashing (bcrypt) and email validation helpers
//! - SQLite, MySQL and in-memory adapters with a named connection registry
//!
//! ```rust,ignore
//! use rustf_model::prelude::*;
//!
//! let adapter = Arc::new(SqliteAdapter::new("main", "sqlite://app.db").await?);
//! let mut user = User::bind(adapter).await?;
//! user.save(Some(
//!     Candidate::new()
//!         .with("email", "ann@example.com")
//!         .with("password", "secret")
//!         .with("verify_password", "secret"),
//! ))
//! .await?;
//! ```

// Error handling lints
#![cfg_attr(
    not(test),
    warn(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
    )
)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used,))]

pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod security;

// Re-export main types for public API
pub use config::ModelConfig;
pub use database::{
    DatabaseAdapter, DatabaseBackend, DatabaseRegistry, FieldMeta, Filter, MemoryAdapter,
    MySqlAdapter, Row, Schema, SqlValue, SqliteAdapter,
};
pub use error::{Error, Result};
pub use models::{
    BeforeWrite, Binding, Candidate, ChangeTracking, Mapper, PendingWrite, Persisted, ReadOnly,
    Record, User, UserPolicy, ViewUser, WriteKind,
};
pub use security::{BcryptHasher, EmailValidator, PasswordHasher, RegexEmailValidator, Security};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::*;
    pub use std::sync::Arc;
}
