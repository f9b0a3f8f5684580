use crate::database::{Row, SqlValue};

/// Single equality condition of a [`Filter`]
#[derive(Clone, Debug)]
pub struct Condition {
    pub column: String,
    pub value: SqlValue,
}

/// Row filter used to load one record
///
/// Conditions are joined with AND. A NULL value matches with `IS NULL`.
///
/// ```rust,ignore
/// let filter = Filter::new().where_eq("id", 42);
/// let found = mapper.load(&filter).await?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Create a new empty filter
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// Add a WHERE = condition
    pub fn where_eq<V: Into<SqlValue>>(mut self, field: &str, value: V) -> Self {
        self.conditions.push(Condition {
            column: field.to_string(),
            value: value.into(),
        });
        self
    }

    /// Add a WHERE IS NULL condition
    pub fn where_null(self, field: &str) -> Self {
        self.where_eq(field, SqlValue::Null)
    }

    /// Combine with another filter using AND logic
    pub fn and(mut self, other: Filter) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Evaluate the filter against an in-memory row
    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|condition| {
            let value = row.get(&condition.column).unwrap_or(&SqlValue::Null);
            condition.value.loosely_eq(value)
        })
    }

    /// Check if the filter has any conditions
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Get the number of conditions
    pub fn len(&self) -> usize {
        self.conditions.len()
    }
}
