//! User accounts
//!
//! Before every write the [`UserPolicy`] checks the password confirmation
//! carried by the candidate and replaces the password with its hash. A null
//! confirmation counts as absent. New accounts get their creation date.

use crate::config::ModelConfig;
use crate::database::{DatabaseAdapter, DatabaseRegistry, SqlValue};
use crate::error::{Error, Result};
use crate::models::binding::Binding;
use crate::models::policy::{BeforeWrite, PendingWrite};
use crate::models::record::Record;
use chrono::Local;
use std::sync::Arc;

/// Password confirmation, hashing and creation date
#[derive(Debug, Clone)]
pub struct UserPolicy {
    password_field: String,
    confirmation_field: String,
    date_field: String,
}

impl UserPolicy {
    pub fn new() -> Self {
        Self {
            password_field: "password".to_string(),
            confirmation_field: "verify_password".to_string(),
            date_field: "date".to_string(),
        }
    }

    pub fn password_field(mut self, field: impl Into<String>) -> Self {
        self.password_field = field.into();
        self
    }

    /// Candidate field holding the repeated password
    pub fn confirmation_field(mut self, field: impl Into<String>) -> Self {
        self.confirmation_field = field.into();
        self
    }

    /// Column receiving the creation date
    pub fn date_field(mut self, field: impl Into<String>) -> Self {
        self.date_field = field.into();
        self
    }
}

impl Default for UserPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl BeforeWrite for UserPolicy {
    fn before_write(&self, write: &mut PendingWrite<'_>) -> Result<()> {
        let confirmation = write
            .candidate()
            .and_then(|candidate| candidate.get(&self.confirmation_field))
            .filter(|value| !value.is_null())
            .map(SqlValue::as_string);

        if let Some(confirmation) = confirmation {
            let password = write
                .get(&self.password_field)
                .and_then(SqlValue::as_string);

            if confirmation != password {
                return Err(Error::field_mismatch(&self.password_field));
            }
            let password = match password {
                Some(password) if !password.is_empty() => password,
                _ => return Err(Error::field_empty(&self.password_field)),
            };

            let hash = write.security().hash(&password)?;
            write.set(&self.password_field, hash);
        }

        if write.is_new() {
            write.set(&self.date_field, Local::now().date_naive());
        }

        Ok(())
    }
}

/// The `user` table
#[derive(Debug, Clone, Copy, Default)]
pub struct User;

impl User {
    pub fn binding() -> Binding {
        Binding::of::<User>()
    }

    /// Bind the `user` table with the user policy
    pub async fn bind(adapter: Arc<dyn DatabaseAdapter>) -> Result<Record> {
        Ok(Record::bind(adapter, &Self::binding())
            .await?
            .with_policy(UserPolicy::default()))
    }

    /// Bind through a registry, on the default connection
    pub async fn bind_with(registry: &DatabaseRegistry) -> Result<Record> {
        Ok(Record::bind_with(registry, &Self::binding())
            .await?
            .with_policy(UserPolicy::default()))
    }

    /// Bind through a registry with the configured schema lifetime and bcrypt cost
    pub async fn bind_configured(
        registry: &DatabaseRegistry,
        config: &ModelConfig,
    ) -> Result<Record> {
        Ok(Record::bind_configured(registry, config, &Self::binding())
            .await?
            .with_policy(UserPolicy::default()))
    }
}
