//! # quarry-sqlite
//!
//! SQLite executor for `quarry-core` query builders, backed by sqlx.
//!
//! # How rows come back
//!
//! - Statements starting with `SELECT`, `WITH`, `PRAGMA` or `VALUES` are
//!   fetched; every row becomes a JSON object keyed by column name or alias.
//! - Values are read by their [storage class]: `INTEGER` and `REAL` become
//!   numbers, `TEXT` becomes a string, `BLOB` becomes an array of bytes.
//! - Any other statement is executed and reports its changed row count and
//!   the last inserted row id.
//! - Dates are bound as `YYYY-MM-DD HH:MM:SS` text, so they compare
//!   correctly against columns storing the same layout.
//!
//! [storage class]: https://www.sqlite.org/datatype3.html
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use quarry_core::QueryBuilder;
//! use quarry_sqlite::{SqliteConfig, SqliteExecutor};
//!
//! # async fn demo() -> quarry_core::Result<()> {
//! let executor = SqliteExecutor::connect(&SqliteConfig::from_env()).await?;
//!
//! let mut users = QueryBuilder::new("users").with_executor(Arc::new(executor));
//! users.select(["id", "name"]).where_("active", true)?.asc("name");
//!
//! for row in users.all().await? {
//!     println!("{row:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod executor;

pub use config::{SqliteConfig, DATABASE_URL_VAR, MAX_CONNECTIONS_VAR};
pub use executor::SqliteExecutor;
