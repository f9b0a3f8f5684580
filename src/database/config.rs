//! Database connection configuration
//!
//! Named connections are declared under `[databases.NAME]` in the model
//! configuration file and turned into adapters by
//! [`DatabaseRegistry::from_config`](crate::database::DatabaseRegistry::from_config).

use crate::database::DatabaseBackend;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for a single database connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConnectionConfig {
    /// Connection URL: `sqlite:`, `mysql:` or `memory:`
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,

    /// Maximum lifetime of a connection in seconds
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime: u64,

    /// Whether this database should be set as the default
    #[serde(default)]
    pub is_default: bool,
}

impl DatabaseConnectionConfig {
    /// Connection with default pool settings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout: default_connect_timeout(),
            idle_timeout: default_idle_timeout(),
            max_lifetime: default_max_lifetime(),
            is_default: false,
        }
    }

    /// Mark as default database
    pub fn is_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    /// Backend selected by the URL scheme
    pub fn backend(&self) -> Result<DatabaseBackend> {
        let scheme = self.url.split(':').next().unwrap_or_default();
        match scheme.to_lowercase().as_str() {
            "sqlite" => Ok(DatabaseBackend::SQLite),
            "mysql" | "mariadb" => Ok(DatabaseBackend::MySQL),
            "memory" => Ok(DatabaseBackend::Memory),
            _ => Err(Error::configuration(format!(
                "Unsupported database URL scheme in '{}'",
                self.url
            ))),
        }
    }
}

/// Configuration for multiple databases
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabasesConfig {
    /// Map of database name to configuration
    #[serde(flatten)]
    pub databases: HashMap<String, DatabaseConnectionConfig>,
}

impl DatabasesConfig {
    /// Create a new empty databases configuration
    pub fn new() -> Self {
        Self {
            databases: HashMap::new(),
        }
    }

    /// Add a database configuration
    pub fn add_database(&mut self, name: impl Into<String>, config: DatabaseConnectionConfig) {
        self.databases.insert(name.into(), config);
    }

    /// Get a database configuration by name
    pub fn get(&self, name: &str) -> Option<&DatabaseConnectionConfig> {
        self.databases.get(name)
    }

    /// Get the default database configuration
    ///
    /// Returns the database marked as default, or the first by name if none is marked
    pub fn get_default(&self) -> Option<(&String, &DatabaseConnectionConfig)> {
        if let Some(found) = self.databases.iter().find(|(_, config)| config.is_default) {
            return Some(found);
        }
        self.databases.iter().min_by(|a, b| a.0.cmp(b.0))
    }

    /// Check if any databases are configured
    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    /// Get the number of configured databases
    pub fn len(&self) -> usize {
        self.databases.len()
    }

    /// List all database names, sorted
    pub fn list_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.databases.keys().cloned().collect();
        names.sort();
        names
    }

    /// Reject more than one database marked as default
    pub fn validate(&self) -> Result<()> {
        let defaults: Vec<&String> = self
            .databases
            .iter()
            .filter(|(_, config)| config.is_default)
            .map(|(name, _)| name)
            .collect();

        if defaults.len() > 1 {
            return Err(Error::configuration(format!(
                "Only one database can be the default, found {}",
                defaults.len()
            )));
        }
        for (name, config) in &self.databases {
            if config.url.is_empty() {
                return Err(Error::configuration(format!(
                    "Database '{}' has an empty url",
                    name
                )));
            }
            if config.min_connections > config.max_connections {
                return Err(Error::configuration(format!(
                    "Database '{}' has min_connections above max_connections",
                    name
                )));
            }
        }
        Ok(())
    }
}

// Default values for configuration
fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    30
}
fn default_idle_timeout() -> u64 {
    600
} // 10 minutes
fn default_max_lifetime() -> u64 {
    1800
} // 30 minutes
