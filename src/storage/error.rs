use thiserror::Error;

/// Storage-specific errors that can occur while persisting or querying readings
#[derive(Error, Debug)]
pub enum StorageError {
    /// Lookup, insert or transaction failure in a SQL backend.
    /// The enclosing unit of work is rolled back.
    #[error("Persistence error during {operation}: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// External store unreachable or the request could not be completed
    #[error("Upstream error during {operation}: {details}")]
    Upstream { operation: String, details: String },

    /// External store answered with a non-success status code
    #[error("Upstream returned status {status} during {operation}")]
    UpstreamStatus { operation: String, status: u16 },

    /// External store answered with a body we cannot understand
    #[error("Invalid upstream response during {operation}: {details}")]
    InvalidResponse { operation: String, details: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    /// Adapter for `map_err` on sqlx calls.
    pub fn persistence(operation: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| StorageError::Persistence { operation, source }
    }

    pub fn upstream(operation: &str, details: impl ToString) -> Self {
        StorageError::Upstream {
            operation: operation.to_string(),
            details: details.to_string(),
        }
    }

    /// True for errors raised by an external store rather than a local database.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            StorageError::Upstream { .. }
                | StorageError::UpstreamStatus { .. }
                | StorageError::InvalidResponse { .. }
        )
    }
}
