//! Database registry for managing multiple database connections
//!
//! Models bind to a connection either directly through an adapter handle or
//! by name through this registry.

use crate::database::adapter::{DatabaseAdapter, DatabaseBackend};
use crate::database::adapters::{MemoryAdapter, MySqlAdapter, SqliteAdapter};
use crate::database::config::{DatabaseConnectionConfig, DatabasesConfig};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Registry for managing multiple database connections
#[derive(Clone, Default)]
pub struct DatabaseRegistry {
    /// Map of database name to adapter
    adapters: Arc<RwLock<HashMap<String, Arc<dyn DatabaseAdapter>>>>,
    /// Name of the default database (if any)
    default: Arc<RwLock<Option<String>>>,
}

impl DatabaseRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect every configured database and register it under its name
    pub async fn from_config(config: &DatabasesConfig) -> Result<Self> {
        config.validate()?;
        let registry = Self::new();
        let default = config.get_default().map(|(name, _)| name.clone());

        for name in config.list_names() {
            let Some(db_config) = config.get(&name) else {
                continue;
            };
            let adapter = connect(&name, db_config).await?;
            let is_default = default.as_deref() == Some(name.as_str());
            registry.register(name, adapter, is_default).await?;
        }

        Ok(registry)
    }

    /// Register a database adapter
    ///
    /// # Arguments
    /// * `name` - Unique name for this database connection
    /// * `adapter` - The database adapter to register
    /// * `set_as_default` - Whether to set this as the default database
    pub async fn register(
        &self,
        name: impl Into<String>,
        adapter: Arc<dyn DatabaseAdapter>,
        set_as_default: bool,
    ) -> Result<()> {
        let name = name.into();

        let mut adapters = self.adapters.write().await;
        if adapters.insert(name.clone(), adapter).is_some() {
            log::warn!("Database '{}' was already registered and has been replaced", name);
        }

        // Set as default if requested or if it's the first database
        if set_as_default || adapters.len() == 1 {
            let mut default = self.default.write().await;
            *default = Some(name.clone());
        }

        log::info!("Registered database '{}'", name);
        Ok(())
    }

    /// Get a database adapter by name
    pub async fn get(&self, name: &str) -> Option<Arc<dyn DatabaseAdapter>> {
        let adapters = self.adapters.read().await;
        adapters.get(name).cloned()
    }

    /// Get a database adapter by name, failing when it is not registered
    pub async fn require(&self, name: &str) -> Result<Arc<dyn DatabaseAdapter>> {
        self.get(name)
            .await
            .ok_or_else(|| Error::configuration(format!("Database '{}' not found in registry", name)))
    }

    /// Get the default database adapter
    pub async fn get_default(&self) -> Result<Arc<dyn DatabaseAdapter>> {
        let default = self.default.read().await.clone();

        match default {
            Some(name) => self.require(&name).await,
            None => Err(Error::configuration("No default database configured")),
        }
    }

    /// Set the default database
    pub async fn set_default(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();

        if !self.has_database(&name).await {
            return Err(Error::configuration(format!(
                "Database '{}' not found in registry",
                name
            )));
        }

        let mut default = self.default.write().await;
        *default = Some(name);
        Ok(())
    }

    /// Name of the default database
    pub async fn default_name(&self) -> Option<String> {
        self.default.read().await.clone()
    }

    /// List all registered database names, sorted
    pub async fn list_databases(&self) -> Vec<String> {
        let adapters = self.adapters.read().await;
        let mut names: Vec<String> = adapters.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a database is registered
    pub async fn has_database(&self, name: &str) -> bool {
        let adapters = self.adapters.read().await;
        adapters.contains_key(name)
    }

    /// Ping every registered database
    pub async fn health_check(&self) -> HashMap<String, bool> {
        let adapters: Vec<(String, Arc<dyn DatabaseAdapter>)> = {
            let adapters = self.adapters.read().await;
            adapters
                .iter()
                .map(|(name, adapter)| (name.clone(), adapter.clone()))
                .collect()
        };

        let mut results = HashMap::new();
        for (name, adapter) in adapters {
            let healthy = match adapter.ping().await {
                Ok(healthy) => healthy,
                Err(e) => {
                    log::warn!("Database '{}' failed health check: {}", name, e);
                    false
                }
            };
            results.insert(name, healthy);
        }
        results
    }
}

/// Open an adapter for one configured connection
async fn connect(name: &str, config: &DatabaseConnectionConfig) -> Result<Arc<dyn DatabaseAdapter>> {
    let adapter: Arc<dyn DatabaseAdapter> = match config.backend()? {
        DatabaseBackend::SQLite => Arc::new(SqliteAdapter::with_config(name, config).await?),
        DatabaseBackend::MySQL => Arc::new(MySqlAdapter::with_config(name, config).await?),
        DatabaseBackend::Memory => Arc::new(MemoryAdapter::new(name)),
    };
    log::debug!("Connected database '{}' ({:?})", name, adapter.backend());
    Ok(adapter)
}
