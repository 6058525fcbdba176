//! Executor contract between query builders and database drivers.
//!
//! The core never performs I/O itself. A compiled query is handed to an
//! [`Executor`], which runs it and reports a [`QueryResult`].

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::{QueryError, Result};
use crate::value::SqlValue;

/// A boxed future for async executor operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A result row, keyed by column name (or alias).
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A rendered statement and its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// SQL text with `?` placeholders.
    pub sql: String,
    /// Arguments, in placeholder order.
    pub args: Vec<SqlValue>,
    /// Base table of the builder that produced the query.
    pub table: String,
}

/// Outcome of an executed statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Whether the statement succeeded.
    pub success: bool,
    /// Rows changed by a write statement.
    pub changes: u64,
    /// Time spent executing, when the driver measures it.
    pub duration: Option<Duration>,
    /// Row id of the last inserted row.
    pub last_id: Option<i64>,
    /// Rows read.
    pub rows_read: u64,
    /// Rows written.
    pub rows_written: u64,
    /// Result rows.
    pub results: Vec<Row>,
}

impl QueryResult {
    /// Returns the first row, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Row> {
        self.results.first()
    }

    /// Consumes the result and returns its rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.results
    }

    /// Deserializes every row into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Decode`](crate::QueryError::Decode) when a row
    /// does not match the shape of `T`.
    pub fn rows_as<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        self.results
            .into_iter()
            .map(|row| serde_json::from_value(serde_json::Value::Object(row)).map_err(QueryError::from))
            .collect()
    }
}

/// Runs compiled queries against a database.
///
/// # Example
///
/// ```rust
/// use quarry_core::executor::{BoxFuture, CompiledQuery, Executor, QueryResult};
///
/// #[derive(Debug)]
/// struct DryRun;
///
/// impl Executor for DryRun {
///     fn execute<'a>(&'a self, query: CompiledQuery) -> BoxFuture<'a, quarry_core::Result<QueryResult>> {
///         Box::pin(async move {
///             println!("{}", query.sql);
///             Ok(QueryResult { success: true, ..QueryResult::default() })
///         })
///     }
/// }
/// ```
pub trait Executor: Send + Sync {
    /// Executes a query and returns its result.
    fn execute<'a>(&'a self, query: CompiledQuery) -> BoxFuture<'a, Result<QueryResult>>;
}
