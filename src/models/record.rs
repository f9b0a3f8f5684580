//! Record model
//!
//! A [`Record`] is a [`Mapper`] plus the security helpers, with the staged
//! write path: callers hand a [`Candidate`] to [`Record::save`] and the record
//! decides whether it is a creation or an update of an existing row.

use crate::config::ModelConfig;
use crate::database::{DatabaseAdapter, DatabaseRegistry, Filter, Row, Schema, SqlValue};
use crate::error::Result;
use crate::models::binding::Binding;
use crate::models::candidate::Candidate;
use crate::models::mapper::{Mapper, Persisted};
use crate::models::policy::BeforeWrite;
use crate::security::Security;
use log::debug;
use std::sync::Arc;

/// One row of a bound table with a staged write path
///
/// ```rust,ignore
/// let mut user = User::bind(adapter).await?;
/// let saved = user
///     .save(Some(
///         Candidate::new()
///             .with("email", "ann@example.com")
///             .with("password", "secret")
///             .with("verify_password", "secret"),
///     ))
///     .await?;
/// ```
#[derive(Debug)]
pub struct Record {
    mapper: Mapper,
    security: Security,
}

impl Record {
    /// Bind a table on the given connection
    ///
    /// Fails with `AmbiguousPrimaryKey` when the mapped columns flag more
    /// than one primary key.
    pub async fn bind(adapter: Arc<dyn DatabaseAdapter>, binding: &Binding) -> Result<Self> {
        let mapper = Mapper::bind(adapter, binding).await?;
        Ok(Self {
            mapper,
            security: Security::default(),
        })
    }

    /// Bind a table on the registry connection named by the binding, or on
    /// the default connection
    pub async fn bind_with(registry: &DatabaseRegistry, binding: &Binding) -> Result<Self> {
        let adapter = match binding.connection_name() {
            Some(name) => registry.require(name).await?,
            None => registry.get_default().await?,
        };
        Self::bind(adapter, binding).await
    }

    /// Bind through a registry with the schema lifetime and bcrypt cost of
    /// the configuration. The configured lifetime replaces the binding's.
    pub async fn bind_configured(
        registry: &DatabaseRegistry,
        config: &ModelConfig,
        binding: &Binding,
    ) -> Result<Self> {
        let binding = binding.clone().ttl(config.schema_ttl());
        Ok(Self::bind_with(registry, &binding)
            .await?
            .with_security(config.security()))
    }

    /// Replace the hashing and validation helpers
    pub fn with_security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    /// Register a before-write policy
    pub fn with_policy<P>(mut self, policy: P) -> Self
    where
        P: BeforeWrite + 'static,
    {
        self.mapper.before_write(policy);
        self
    }

    /// Register a before-write policy on an existing record
    pub fn before_write<P>(&mut self, policy: P) -> &mut Self
    where
        P: BeforeWrite + 'static,
    {
        self.mapper.before_write(policy);
        self
    }

    /// Write the record
    ///
    /// With `None` the in-memory state is persisted as it is. With a
    /// candidate the record is reset first; a primary key value found in the
    /// candidate selects the row to update (a key that matches nothing makes
    /// this a creation), then the remaining candidate fields are merged in
    /// and the result is written. Policies see the candidate for the
    /// duration of this call only.
    ///
    /// A failed save resets the record, so a following `save(None)` never
    /// writes state that a policy or the database rejected.
    pub async fn save(&mut self, candidate: Option<Candidate>) -> Result<Persisted> {
        let result = self.stage_and_persist(candidate).await;
        if let Err(e) = &result {
            debug!("Save of '{}' failed, record reset: {}", self.table(), e);
            self.mapper.reset();
        }
        result
    }

    async fn stage_and_persist(&mut self, candidate: Option<Candidate>) -> Result<Persisted> {
        let Some(mut candidate) = candidate else {
            debug!("Saving '{}' from its current state", self.table());
            return self.mapper.persist(None, &self.security).await;
        };

        self.mapper.reset();

        if let Some(pk) = self.mapper.primary_key().map(str::to_string) {
            if let Some(id) = candidate.remove(&pk) {
                if id.is_null() {
                    debug!("Candidate for '{}' carries a null {}, creating", self.table(), pk);
                } else {
                    let found = self.mapper.load(&Filter::new().where_eq(&pk, id.clone())).await?;
                    debug!(
                        "Lookup of '{}' by {} = {}: {}",
                        self.table(),
                        pk,
                        id,
                        if found { "found" } else { "not found, creating" }
                    );
                }
            }
        }

        self.mapper.copy_from(&candidate);

        let persisted = self.mapper.persist(Some(&candidate), &self.security).await?;
        debug!(
            "Saved '{}' ({:?}, key {:?})",
            self.table(),
            persisted.kind,
            persisted.id
        );
        Ok(persisted)
    }

    /// Load the first row matching the filter
    pub async fn load(&mut self, filter: &Filter) -> Result<bool> {
        self.mapper.load(filter).await
    }

    /// Name of the primary key column; the first flagged in schema order
    pub fn primary_key_field(&self) -> Option<&str> {
        self.mapper.primary_key()
    }

    pub fn get(&self, field: &str) -> Option<&SqlValue> {
        self.mapper.get(field)
    }

    /// Set a column for a following `save(None)`
    pub fn set(&mut self, field: &str, value: impl Into<SqlValue>) -> bool {
        self.mapper.set(field, value)
    }

    pub fn fields(&self) -> &Row {
        self.mapper.fields()
    }

    pub fn table(&self) -> &str {
        self.mapper.table()
    }

    pub fn schema(&self) -> &Schema {
        self.mapper.schema()
    }

    pub fn is_loaded(&self) -> bool {
        self.mapper.is_loaded()
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    pub fn security(&self) -> &Security {
        &self.security
    }

    // Security helpers

    /// Hash with a random salt and the configured cost
    pub fn hash(&self, secret: &str) -> Result<String> {
        self.security.hash(secret)
    }

    pub fn hash_with(&self, secret: &str, salt: Option<[u8; 16]>, cost: u32) -> Result<String> {
        self.security.hash_with(secret, salt, cost)
    }

    pub fn verify(&self, secret: &str, hash: &str) -> bool {
        self.security.verify(secret, hash)
    }

    pub fn needs_rehash(&self, hash: &str) -> bool {
        self.security.needs_rehash(hash)
    }

    pub fn needs_rehash_with_cost(&self, hash: &str, cost: u32) -> bool {
        self.security.needs_rehash_with_cost(hash, cost)
    }

    pub fn is_email(&self, value: &str) -> bool {
        self.security.is_email(value)
    }
}
