use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoamError {
    /// Invalid entity or connection configuration: missing table, unknown
    /// driver, duplicate column, missing relationship descriptor.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Incoherent query builder state
    #[error("query builder error: {0}")]
    Builder(String),

    /// Error while consuming a result set
    #[error("bind error: {0}")]
    Bind(String),

    /// Type mismatch between a column's driver value and the target field
    #[error("scan error on column {column}: {message}")]
    Scan { column: String, message: String },

    /// Invalid operation against an otherwise valid schema, e.g. a missing
    /// primary key where one is required
    #[error("operation error: {0}")]
    Operation(String),

    /// No rows returned when at least one was expected
    #[error("no rows found")]
    NotFound,

    /// The operation's cancellation token fired
    #[error("operation canceled")]
    Canceled,

    /// Anything surfaced verbatim from the underlying database
    #[error("driver error: {0}")]
    Driver(String),

    /// Rusqlite specific errors
    #[cfg(feature = "rusqlite")]
    #[error("rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

impl LoamError {
    /// A scan error with no column attached yet. The binder rewrites the
    /// column once it knows which one was being filled.
    pub(crate) fn scan(message: impl Into<String>) -> Self {
        LoamError::Scan {
            column: String::new(),
            message: message.into(),
        }
    }
}

/// Result type for database operations
pub type Result<T> = std::result::Result<T, LoamError>;
