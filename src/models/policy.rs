//! Before-write policies
//!
//! A policy sees the merged record right before it is written and may adjust
//! fields or abort the write by returning an error.

use crate::database::SqlValue;
use crate::error::{Error, Result};
use crate::models::candidate::Candidate;
use crate::models::mapper::Mapper;
use crate::security::Security;

/// Whether a write creates a row or changes a loaded one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Insert,
    Update,
}

/// Hook run before every insert and update of a record
pub trait BeforeWrite: Send + Sync {
    fn before_write(&self, write: &mut PendingWrite<'_>) -> Result<()>;
}

impl<F> BeforeWrite for F
where
    F: Fn(&mut PendingWrite<'_>) -> Result<()> + Send + Sync,
{
    fn before_write(&self, write: &mut PendingWrite<'_>) -> Result<()> {
        self(write)
    }
}

/// Policy that refuses every write
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnly;

impl BeforeWrite for ReadOnly {
    fn before_write(&self, write: &mut PendingWrite<'_>) -> Result<()> {
        log::debug!("Refusing {:?} on read-only table '{}'", write.kind(), write.table());
        Err(Error::WritesDisabled)
    }
}

/// What a policy gets to see and change
pub struct PendingWrite<'a> {
    mapper: &'a mut Mapper,
    candidate: Option<&'a Candidate>,
    kind: WriteKind,
    security: &'a Security,
}

impl<'a> PendingWrite<'a> {
    pub(crate) fn new(
        mapper: &'a mut Mapper,
        candidate: Option<&'a Candidate>,
        kind: WriteKind,
        security: &'a Security,
    ) -> Self {
        Self {
            mapper,
            candidate,
            kind,
            security,
        }
    }

    /// Current value of a column
    pub fn get(&self, field: &str) -> Option<&SqlValue> {
        self.mapper.get(field)
    }

    /// Change a column. Names that are not columns are ignored.
    pub fn set(&mut self, field: &str, value: impl Into<SqlValue>) -> bool {
        let stored = self.mapper.set(field, value);
        if !stored {
            log::warn!(
                "Policy set '{}' which is not a column of '{}'",
                field,
                self.mapper.table()
            );
        }
        stored
    }

    /// The data handed to this save, if any
    pub fn candidate(&self) -> Option<&Candidate> {
        self.candidate
    }

    pub fn kind(&self) -> WriteKind {
        self.kind
    }

    /// True when the write creates a row
    pub fn is_new(&self) -> bool {
        self.kind == WriteKind::Insert
    }

    /// Key of the row being updated
    pub fn primary_key(&self) -> Option<&SqlValue> {
        self.mapper.loaded_key()
    }

    pub fn table(&self) -> &str {
        self.mapper.table()
    }

    pub fn security(&self) -> &Security {
        self.security
    }

    /// Fail with `FieldInvalid` unless the column holds a valid email address
    pub fn ensure_email(&self, field: &str) -> Result<()> {
        let valid = self
            .get(field)
            .and_then(SqlValue::as_str)
            .is_some_and(|value| self.security.is_email(value));
        if valid {
            Ok(())
        } else {
            Err(Error::field_invalid(field))
        }
    }
}
