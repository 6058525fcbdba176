//! # quarry-core
//!
//! A chainable SELECT query builder for SQLite-family databases, with
//! optional schema-checked predicates.
//!
//! This crate provides:
//! - A predicate builder for WHERE and JOIN ... ON with unbounded nesting
//! - A query compositor rendering `?`-parameterized SQL and its arguments
//! - An inlined literal form for logging and debugging
//! - Strict mode: predicate operands checked against a declared schema
//! - An executor contract for running compiled queries
//!
//! ## Building Queries
//!
//! ```rust
//! use quarry_core::{Operator, QueryBuilder};
//!
//! # fn main() -> quarry_core::Result<()> {
//! let mut items = QueryBuilder::new("items");
//! items
//!     .where_group(|q| {
//!         q.where_op("name", Operator::Like, "%Smartphone%")?
//!             .or_where_op("name", Operator::Like, "Notebook%")?;
//!         Ok(())
//!     })?
//!     .where_("user_id", 42)?;
//!
//! assert_eq!(
//!     items.query(),
//!     "SELECT * FROM items WHERE (items.name LIKE ? OR items.name LIKE ?) AND items.user_id = ?"
//! );
//! assert_eq!(items.args().len(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! ## SQL Injection Prevention
//!
//! Values are bound as parameters. The inlined form escapes them:
//!
//! ```rust
//! use quarry_core::QueryBuilder;
//!
//! # fn main() -> quarry_core::Result<()> {
//! let mut users = QueryBuilder::new("users");
//! users.where_("name", "'; DROP TABLE users; --")?;
//!
//! assert_eq!(users.query(), "SELECT * FROM users WHERE users.name = ?");
//! assert_eq!(
//!     users.sql()?,
//!     "SELECT * FROM users WHERE users.name = '''; DROP TABLE users; --'"
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Strict Mode
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use quarry_core::{ColumnType, QueryBuilder, QueryError, Schema};
//!
//! let schema = Schema::new().table("users", [("id", ColumnType::Number)]);
//! let mut users = QueryBuilder::with_oracle("users", Some(Arc::new(schema)));
//!
//! assert!(matches!(users.where_("id", "abc"), Err(QueryError::TypeMismatch { .. })));
//! assert!(users.wheres().is_empty());
//! ```

pub mod clause;
pub mod column;
pub mod error;
pub mod executor;
pub mod model;
pub mod operator;
pub mod query;
pub mod schema;
pub mod value;

pub use clause::{ClauseBuilder, Condition};
pub use error::{QueryError, Result};
pub use executor::{BoxFuture, CompiledQuery, Executor, QueryResult, Row};
pub use model::Model;
pub use operator::{Logical, Operator, OrderDirection, UnknownKeyword};
pub use query::{bind_literals, IntoColumns, IntoCount, JoinOn, JoinType, QueryBuilder};
pub use schema::{ColumnType, Schema, TypeOracle};
pub use value::{SqlValue, ToSqlValue, DATE_FORMAT};
