//! Table binding of a model

use std::time::Duration;

/// Which table a record maps, which of its columns, and where it lives
///
/// ```rust,ignore
/// let binding = Binding::new("user")
///     .fields(["id", "email", "password"])
///     .ttl(Duration::from_secs(300))
///     .connection("main");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    table: String,
    fields: Option<Vec<String>>,
    ttl: Duration,
    connection: Option<String>,
}

impl Binding {
    /// How long a described schema is reused unless told otherwise
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: None,
            ttl: Self::DEFAULT_TTL,
            connection: None,
        }
    }

    /// Bind the table named after a type: `ViewUser` maps `viewuser`
    pub fn of<T: ?Sized>() -> Self {
        Self::new(table_name_of::<T>())
    }

    /// Map only the listed columns
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Lifetime of the described schema; zero describes the table on every bind
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Registry name of the connection to use instead of the default one
    pub fn connection(mut self, name: impl Into<String>) -> Self {
        self.connection = Some(name.into());
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn field_list(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    pub fn cache_ttl(&self) -> Duration {
        self.ttl
    }

    pub fn connection_name(&self) -> Option<&str> {
        self.connection.as_deref()
    }
}

/// Last path segment of a type name, generics cut off, lower-cased
fn table_name_of<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_lowercase()
}
