//! Error types for query construction and execution.

use thiserror::Error;

/// Errors raised while building, rendering, or running a query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A value is not assignable to the declared type of a schema column.
    #[error("Table column '{column}' of type '{expected}' is not assignable as type of '{actual}'")]
    TypeMismatch {
        /// The qualified column path.
        column: String,
        /// The declared column type.
        expected: String,
        /// The runtime type of the rejected value.
        actual: String,
    },

    /// A column path could not be resolved against the schema.
    #[error("Table column '{0}' doesn't exist")]
    UnknownColumn(String),

    /// The rendered placeholders and the bound values disagree in count.
    #[error("Bind count mismatch: {placeholders} placeholders for {values} values")]
    BindCountMismatch {
        /// Number of `?` markers in the rendered SQL.
        placeholders: usize,
        /// Number of accumulated bound values.
        values: usize,
    },

    /// The query was run without an executor.
    #[error("No database connection")]
    NoExecutor,

    /// The executor failed to run the query.
    #[error("Executor error: {0}")]
    Executor(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A result row could not be decoded into the requested type.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl QueryError {
    /// Wraps an executor-side error.
    pub fn executor(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Executor(Box::new(err))
    }
}

/// Result type alias for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
