//! Read-only user view

use crate::config::ModelConfig;
use crate::database::{DatabaseAdapter, DatabaseRegistry};
use crate::error::Result;
use crate::models::binding::Binding;
use crate::models::policy::ReadOnly;
use crate::models::record::Record;
use std::sync::Arc;

/// The `viewuser` view. Every write fails; lookups and the password
/// helpers keep working.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewUser;

impl ViewUser {
    pub fn binding() -> Binding {
        Binding::of::<ViewUser>()
    }

    pub async fn bind(adapter: Arc<dyn DatabaseAdapter>) -> Result<Record> {
        Ok(Record::bind(adapter, &Self::binding())
            .await?
            .with_policy(ReadOnly))
    }

    pub async fn bind_with(registry: &DatabaseRegistry) -> Result<Record> {
        Ok(Record::bind_with(registry, &Self::binding())
            .await?
            .with_policy(ReadOnly))
    }

    pub async fn bind_configured(
        registry: &DatabaseRegistry,
        config: &ModelConfig,
    ) -> Result<Record> {
        Ok(Record::bind_configured(registry, config, &Self::binding())
            .await?
            .with_policy(ReadOnly))
    }
}
