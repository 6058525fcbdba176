//! `Executor` implementation over a sqlx SQLite pool.

use std::time::Instant;

use quarry_core::{BoxFuture, CompiledQuery, Executor, QueryError, QueryResult, Result, Row, SqlValue, DATE_FORMAT};
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, TypeInfo, ValueRef};
use tracing::debug;

use crate::config::SqliteConfig;

/// Runs compiled queries against a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    /// Opens a pool with the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Executor`] if the database cannot be opened.
    pub async fn connect(config: &SqliteConfig) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(QueryError::executor)?;
        debug!(url = %config.url, max_connections = config.max_connections, "opened sqlite pool");
        Ok(Self::from_pool(pool))
    }

    /// Wraps an existing pool.
    #[must_use]
    pub const fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn run(&self, query: CompiledQuery) -> Result<QueryResult> {
        let started = Instant::now();
        let CompiledQuery { sql, args, table } = query;

        let mut statement = sqlx::query(&sql);
        for arg in args {
            statement = bind_value(statement, arg);
        }

        let result = if returns_rows(&sql) {
            let rows = statement
                .fetch_all(&self.pool)
                .await
                .map_err(QueryError::executor)?;
            let results = rows
                .iter()
                .map(row_to_json)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(QueryError::executor)?;
            QueryResult {
                success: true,
                rows_read: count(results.len()),
                results,
                ..QueryResult::default()
            }
        } else {
            let done = statement
                .execute(&self.pool)
                .await
                .map_err(QueryError::executor)?;
            QueryResult {
                success: true,
                changes: done.rows_affected(),
                rows_written: done.rows_affected(),
                last_id: Some(done.last_insert_rowid()),
                ..QueryResult::default()
            }
        };

        let duration = started.elapsed();
        debug!(
            table = %table,
            rows = result.results.len(),
            changes = result.changes,
            ?duration,
            "query finished"
        );
        Ok(QueryResult {
            duration: Some(duration),
            ..result
        })
    }
}

impl Executor for SqliteExecutor {
    fn execute<'a>(&'a self, query: CompiledQuery) -> BoxFuture<'a, Result<QueryResult>> {
        Box::pin(self.run(query))
    }
}

fn returns_rows(sql: &str) -> bool {
    sql.split_whitespace().next().is_some_and(|keyword| {
        ["SELECT", "WITH", "PRAGMA", "VALUES"]
            .iter()
            .any(|k| keyword.eq_ignore_ascii_case(k))
    })
}

fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// Binds a `SqlValue` to a query.
fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Date(d) => query.bind(d.format(DATE_FORMAT).to_string()),
        SqlValue::Blob(b) => query.bind(b),
        array @ SqlValue::Array(_) => query.bind(array.to_plain_text()),
    }
}

fn row_to_json(row: &SqliteRow) -> std::result::Result<Row, sqlx::Error> {
    let mut out = Row::new();
    for column in row.columns() {
        let index = column.ordinal();
        out.insert(String::from(column.name()), column_value(row, index)?);
    }
    Ok(out)
}

/// Reads a column by the storage class of its value.
fn column_value(row: &SqliteRow, index: usize) -> std::result::Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let storage = raw.type_info().name().to_ascii_uppercase();
    let value = match storage.as_str() {
        "NULL" => Value::Null,
        "INTEGER" => Value::from(row.try_get::<i64, _>(index)?),
        "REAL" => Value::from(row.try_get::<f64, _>(index)?),
        "BOOLEAN" => Value::Bool(row.try_get::<bool, _>(index)?),
        "BLOB" => SqlValue::Blob(row.try_get::<Vec<u8>, _>(index)?).to_json(),
        _ => Value::String(row.try_get::<String, _>(index)?),
    };
    Ok(value)
}
