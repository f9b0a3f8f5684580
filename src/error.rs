use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for RustF models
#[derive(Error, Debug)]
pub enum Error {
    // Raised by before-write policies
    #[error("The {0} does not match.")]
    FieldMismatch(String),

    #[error("The {0} cannot be empty.")]
    FieldEmpty(String),

    #[error("{0} is not valid.")]
    FieldInvalid(String),

    #[error("{0} failed.")]
    OperationFailed(String),

    #[error("This model cannot save records.")]
    WritesDisabled,

    // Binding and schema errors
    #[error("Table '{table}' flags more than one primary key: {}", .fields.join(", "))]
    AmbiguousPrimaryKey { table: String, fields: Vec<String> },

    #[error("Table not found: {0}")]
    TableNotFound(String),

    // Database-specific errors
    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    #[error("Database query error: {0}")]
    DatabaseQuery(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Error with context chain
    #[error("{message}")]
    WithContext {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseQuery(err.to_string())
    }
}

#[cfg(feature = "config")]
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl Error {
    pub fn field_mismatch(field: impl Into<String>) -> Self {
        Self::FieldMismatch(field.into())
    }

    pub fn field_empty(field: impl Into<String>) -> Self {
        Self::FieldEmpty(field.into())
    }

    pub fn field_invalid(field: impl Into<String>) -> Self {
        Self::FieldInvalid(field.into())
    }

    pub fn operation_failed(operation: impl Into<String>) -> Self {
        Self::OperationFailed(operation.into())
    }

    // Database error constructors
    pub fn database_connection(msg: impl Into<String>) -> Self {
        Self::DatabaseConnection(msg.into())
    }

    pub fn database_query(msg: impl Into<String>) -> Self {
        Self::DatabaseQuery(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    // Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            message: context.into(),
            source: Box::new(self),
        }
    }

    /// True for the errors a before-write policy raises about user input
    pub fn is_validation(&self) -> bool {
        match self {
            Error::FieldMismatch(_) | Error::FieldEmpty(_) | Error::FieldInvalid(_) => true,
            Error::WithContext { source, .. } => source.is_validation(),
            _ => false,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::FieldMismatch(_) => "E_FIELD_MISMATCH",
            Error::FieldEmpty(_) => "E_FIELD_EMPTY",
            Error::FieldInvalid(_) => "E_FIELD_INVALID",
            Error::OperationFailed(_) => "E_FAILED",
            Error::WritesDisabled => "E_NO_SAVE",
            Error::AmbiguousPrimaryKey { .. } => "E_AMBIGUOUS_PKEY",
            Error::TableNotFound(_) => "E_TABLE_NOT_FOUND",
            Error::DatabaseConnection(_) => "E_DB_CONNECTION",
            Error::DatabaseQuery(_) => "E_DB_QUERY",
            Error::Configuration(_) => "E_CONFIG",
            Error::Json(_) => "E_JSON",
            Error::Io(_) => "E_IO",
            Error::WithContext { source, .. } => source.error_code(),
        }
    }
}
