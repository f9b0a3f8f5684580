//! Model layer configuration
//!
//! ```toml
//! [security]
//! bcrypt_cost = 10
//!
//! [schema]
//! ttl = 60
//!
//! [databases.main]
//! url = "sqlite://app.db"
//! max_connections = 5
//! is_default = true
//! ```
//!
//! `config.toml` is merged with `config.{env}.toml` where `env` comes from
//! `RUSTF_ENV` (default `development`). `DATABASE_URL` and
//! `RUSTF_BCRYPT_COST` override the files.

use crate::database::{DatabaseConnectionConfig, DatabaseRegistry, DatabasesConfig};
use crate::error::{Error, Result};
use crate::security::password::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::security::{Security, DEFAULT_BCRYPT_COST};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[cfg(feature = "config")]
use std::{fs, path::Path};

/// Hashing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// bcrypt work factor
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

/// Schema description settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Seconds a described table schema is reused
    #[serde(default = "default_schema_ttl")]
    pub ttl: u64,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            ttl: default_schema_ttl(),
        }
    }
}

/// Configuration of the model layer
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelConfig {
    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub schema: SchemaConfig,

    #[serde(default)]
    pub databases: DatabasesConfig,
}

impl ModelConfig {
    /// Environment name from `RUSTF_ENV`
    pub fn detect_environment() -> String {
        env::var("RUSTF_ENV")
            .map(|env| env.trim().to_lowercase())
            .ok()
            .filter(|env| !env.is_empty())
            .unwrap_or_else(|| "development".to_string())
    }

    /// Parse a TOML document. Environment variables are not consulted.
    #[cfg(feature = "config")]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ModelConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load one configuration file and apply environment overrides
    #[cfg(feature = "config")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut config: ModelConfig = toml::from_str(&content).map_err(|e| {
            Error::configuration(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load `config.toml` and `config.{env}.toml` from a directory
    #[cfg(feature = "config")]
    pub fn load_with_base_dir<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let env = Self::detect_environment();
        Self::load_for_environment(base_dir, &env)
    }

    /// Same as [`load_with_base_dir`](Self::load_with_base_dir) for a given environment name
    #[cfg(feature = "config")]
    pub fn load_for_environment<P: AsRef<Path>>(base_dir: P, env: &str) -> Result<Self> {
        let base_dir = base_dir.as_ref();

        let base_path = base_dir.join("config.toml");
        let mut merged = if base_path.exists() {
            Self::load_toml_value(&base_path)?
        } else {
            toml::Value::Table(toml::Table::new())
        };

        let env_path = base_dir.join(format!("config.{}.toml", env));
        if env_path.exists() {
            log::debug!(
                "Loading environment-specific config from: {}",
                env_path.display()
            );
            let env_value = Self::load_toml_value(&env_path)?;
            merged = serde_toml_merge::merge(merged, env_value).map_err(|e| {
                Error::configuration(format!("Failed to merge configuration files: {}", e))
            })?;
        }

        let mut config: ModelConfig = merged.try_into()?;
        config.apply_env_overrides()?;
        config.validate()?;

        log::info!("Model configuration loaded (environment: {})", env);
        Ok(config)
    }

    #[cfg(feature = "config")]
    fn load_toml_value(path: &Path) -> Result<toml::Value> {
        let content = fs::read_to_string(path)?;
        let table: toml::Table = toml::from_str(&content).map_err(|e| {
            Error::configuration(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(toml::Value::Table(table))
    }

    /// Apply `DATABASE_URL` and `RUSTF_BCRYPT_COST`
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| env::var(name).ok())
    }

    /// Apply overrides read through `lookup` instead of the process environment
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            let default = self.databases.get_default().map(|(name, _)| name.clone());
            match default {
                Some(name) => {
                    if let Some(db) = self.databases.databases.get_mut(&name) {
                        db.url = url;
                    }
                }
                None => self.databases.add_database(
                    "primary",
                    DatabaseConnectionConfig::new(url).is_default(true),
                ),
            }
        }

        if let Some(cost) = lookup("RUSTF_BCRYPT_COST") {
            self.security.bcrypt_cost = cost
                .trim()
                .parse()
                .map_err(|_| Error::configuration("Invalid RUSTF_BCRYPT_COST value"))?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.security.bcrypt_cost) {
            return Err(Error::configuration(format!(
                "bcrypt_cost must be between {} and {}, got {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST, self.security.bcrypt_cost
            )));
        }
        self.databases.validate()
    }

    /// Hashing and validation helpers using the configured cost
    pub fn security(&self) -> Security {
        Security::default().with_cost(self.security.bcrypt_cost)
    }

    pub fn schema_ttl(&self) -> Duration {
        Duration::from_secs(self.schema.ttl)
    }

    /// Connect every configured database
    pub async fn registry(&self) -> Result<DatabaseRegistry> {
        DatabaseRegistry::from_config(&self.databases).await
    }
}

fn default_bcrypt_cost() -> u32 {
    DEFAULT_BCRYPT_COST
}

fn default_schema_ttl() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ModelConfig::default();
        assert_eq!(config.security.bcrypt_cost, 10);
        assert_eq!(config.schema_ttl(), Duration::from_secs(60));
        assert!(config.databases.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cost_out_of_range() {
        let mut config = ModelConfig::default();
        config.security.bcrypt_cost = 3;
        assert!(config.validate().is_err());
        config.security.bcrypt_cost = 32;
        assert!(config.validate().is_err());
        config.security.bcrypt_cost = 4;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DATABASE_URL", "sqlite::memory:"),
            ("RUSTF_BCRYPT_COST", "12"),
        ]
        .into_iter()
        .collect();

        let mut config = ModelConfig::default();
        config
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.security.bcrypt_cost, 12);
        let (name, db) = config.databases.get_default().unwrap();
        assert_eq!(name, "primary");
        assert_eq!(db.url, "sqlite::memory:");
        assert_eq!(config.security().cost(), 12);
    }

    #[test]
    fn test_database_url_replaces_default_url() {
        let mut config = ModelConfig::default();
        config.databases.add_database(
            "main",
            DatabaseConnectionConfig::new("mysql://localhost/app").is_default(true),
        );

        config
            .apply_overrides(|name| (name == "DATABASE_URL").then(|| "memory:".to_string()))
            .unwrap();

        assert_eq!(config.databases.len(), 1);
        assert_eq!(config.databases.get("main").unwrap().url, "memory:");
    }

    #[test]
    fn test_invalid_cost_override() {
        let mut config = ModelConfig::default();
        let result = config.apply_overrides(|name| {
            (name == "RUSTF_BCRYPT_COST").then(|| "high".to_string())
        });
        assert!(result.is_err());
    }
}
