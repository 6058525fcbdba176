//! SELECT query compositor.
//!
//! [`QueryBuilder`] accumulates projection, joins, predicates, grouping,
//! ordering and pagination, and renders them into a SQLite statement with
//! `?` placeholders. Rendering has no side effects, so a builder can be
//! rendered any number of times and extended in between.
//!
//! # Example
//!
//! ```rust
//! use quarry_core::{Operator, QueryBuilder};
//!
//! # fn main() -> quarry_core::Result<()> {
//! let mut users = QueryBuilder::new("users");
//! users
//!     .select(["name", "roles.name"])
//!     .join("roles", ("user_id", "users", "id"))?
//!     .where_op("age", Operator::Gte, 18)?
//!     .desc("created_at")
//!     .limit(10);
//!
//! assert_eq!(
//!     users.query(),
//!     "SELECT users.name AS user_name, roles.name AS role_name FROM users \
//!      JOIN roles ON roles.user_id = users.id WHERE users.age >= ? \
//!      ORDER BY users.created_at DESC LIMIT 10"
//! );
//! assert!(users.sql()?.ends_with("users.age >= 18 ORDER BY users.created_at DESC LIMIT 10"));
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::clause::{ClauseBuilder, Condition};
use crate::column;
use crate::error::{QueryError, Result};
use crate::executor::{CompiledQuery, Executor, QueryResult, Row};
use crate::operator::{Logical, Operator, OrderDirection};
use crate::schema::TypeOracle;
use crate::value::{SqlValue, ToSqlValue};

/// Join flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    /// Plain `JOIN`.
    #[default]
    Plain,
    /// `INNER JOIN`.
    Inner,
    /// `LEFT JOIN`.
    Left,
    /// `RIGHT JOIN`.
    Right,
    /// `CROSS JOIN`.
    Cross,
}

impl JoinType {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "JOIN",
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// A join condition given inline to [`QueryBuilder::join`].
///
/// Built from tuples:
///
/// | tuple | renders |
/// |-------|---------|
/// | `(column, value)` | `t.column = ?` |
/// | `(column, Operator, value)` | `t.column <op> ?` |
/// | `(column, "<op>", value)` | `t.column <op> ?` |
/// | `(column, other_table, other_column)` | `t.column = other_table.other_column` |
/// | `(column, Operator, other_table, other_column)` | `t.column <op> other_table.other_column` |
///
/// Text values that name another column are inlined instead of bound.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOn {
    /// Compares a column of the joined table with a value.
    Value {
        /// Column of the joined table.
        column: String,
        /// Comparison operator.
        op: Operator,
        /// Compared value.
        value: SqlValue,
    },
    /// Compares a column of the joined table with a column of another table.
    Columns {
        /// Column of the joined table.
        column: String,
        /// Comparison operator.
        op: Operator,
        /// Table owning the other column.
        table: String,
        /// The other column.
        other: String,
    },
}

impl<V: ToSqlValue> From<(&str, V)> for JoinOn {
    fn from((column, value): (&str, V)) -> Self {
        Self::Value {
            column: String::from(column),
            op: Operator::Eq,
            value: value.to_sql_value(),
        }
    }
}

impl<V: ToSqlValue> From<(&str, Operator, V)> for JoinOn {
    fn from((column, op, value): (&str, Operator, V)) -> Self {
        Self::Value {
            column: String::from(column),
            op,
            value: value.to_sql_value(),
        }
    }
}

impl From<(&str, &str, &str)> for JoinOn {
    fn from((column, middle, last): (&str, &str, &str)) -> Self {
        match Operator::parse(middle) {
            Some(op) => Self::Value {
                column: String::from(column),
                op,
                value: last.to_sql_value(),
            },
            None => Self::Columns {
                column: String::from(column),
                op: Operator::Eq,
                table: String::from(middle),
                other: String::from(last),
            },
        }
    }
}

impl From<(&str, Operator, &str, &str)> for JoinOn {
    fn from((column, op, table, other): (&str, Operator, &str, &str)) -> Self {
        Self::Columns {
            column: String::from(column),
            op,
            table: String::from(table),
            other: String::from(other),
        }
    }
}

/// Types that can be flattened into a list of column names.
pub trait IntoColumns {
    /// Appends the column names to `out`.
    fn push_columns(self, out: &mut Vec<String>);
}

impl IntoColumns for &str {
    fn push_columns(self, out: &mut Vec<String>) {
        out.push(String::from(self));
    }
}

impl IntoColumns for String {
    fn push_columns(self, out: &mut Vec<String>) {
        out.push(self);
    }
}

impl IntoColumns for &String {
    fn push_columns(self, out: &mut Vec<String>) {
        out.push(self.clone());
    }
}

impl<T: IntoColumns> IntoColumns for Vec<T> {
    fn push_columns(self, out: &mut Vec<String>) {
        for item in self {
            item.push_columns(out);
        }
    }
}

impl<T: IntoColumns, const N: usize> IntoColumns for [T; N] {
    fn push_columns(self, out: &mut Vec<String>) {
        for item in self {
            item.push_columns(out);
        }
    }
}

impl<T: IntoColumns + Clone> IntoColumns for &[T] {
    fn push_columns(self, out: &mut Vec<String>) {
        for item in self {
            item.clone().push_columns(out);
        }
    }
}

macro_rules! impl_into_columns_tuple {
    ($($name:ident),+) => {
        impl<$($name: IntoColumns),+> IntoColumns for ($($name,)+) {
            #[allow(non_snake_case)]
            fn push_columns(self, out: &mut Vec<String>) {
                let ($($name,)+) = self;
                $($name.push_columns(out);)+
            }
        }
    };
}

impl_into_columns_tuple!(A, B);
impl_into_columns_tuple!(A, B, C);
impl_into_columns_tuple!(A, B, C, D);

/// Values accepted by [`QueryBuilder::limit`] and [`QueryBuilder::offset`].
///
/// Floats are truncated. Strings are read by their leading integer,
/// ignoring leading whitespace and anything after the digits.
pub trait IntoCount {
    /// Returns the integer, or `None` if the value has no integer reading.
    fn into_count(self) -> Option<i64>;
}

macro_rules! impl_into_count_int {
    ($($ty:ty),+) => {
        $(
            impl IntoCount for $ty {
                fn into_count(self) -> Option<i64> {
                    i64::try_from(self).ok()
                }
            }
        )+
    };
}

impl_into_count_int!(i64, i32, i16, i8, u64, u32, u16, u8, usize);

impl IntoCount for f64 {
    #[allow(clippy::cast_possible_truncation)]
    fn into_count(self) -> Option<i64> {
        self.is_finite().then(|| self.trunc() as i64)
    }
}

impl IntoCount for f32 {
    fn into_count(self) -> Option<i64> {
        f64::from(self).into_count()
    }
}

impl IntoCount for &str {
    fn into_count(self) -> Option<i64> {
        let s = self.trim_start();
        let (negative, digits) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        let n: i64 = digits[..end].parse().ok()?;
        Some(if negative { -n } else { n })
    }
}

impl IntoCount for String {
    fn into_count(self) -> Option<i64> {
        self.as_str().into_count()
    }
}

impl IntoCount for &String {
    fn into_count(self) -> Option<i64> {
        self.as_str().into_count()
    }
}

#[derive(Debug, Clone)]
struct Join {
    sql: String,
    bindings: Vec<SqlValue>,
}

/// Chainable SELECT builder.
#[derive(Clone)]
pub struct QueryBuilder {
    table: String,
    oracle: Option<Arc<dyn TypeOracle>>,
    executor: Option<Arc<dyn Executor>>,
    distinct: bool,
    columns: Vec<String>,
    joins: Vec<Join>,
    wheres: ClauseBuilder,
    groups: Vec<String>,
    orders: Vec<(String, OrderDirection)>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("table", &self.table)
            .field("strict", &self.oracle.is_some())
            .field("query", &self.query())
            .field("args", &self.args())
            .finish_non_exhaustive()
    }
}

impl QueryBuilder {
    /// Creates a builder over `table` without schema validation.
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self::with_oracle(table, None)
    }

    /// Creates a builder over `table`, validating predicates against
    /// `oracle` when one is given.
    #[must_use]
    pub fn with_oracle(table: &str, oracle: Option<Arc<dyn TypeOracle>>) -> Self {
        Self {
            table: String::from(table),
            wheres: ClauseBuilder::with_oracle(table, oracle.clone()),
            oracle,
            executor: None,
            distinct: false,
            columns: Vec::new(),
            joins: Vec::new(),
            groups: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Attaches the executor used by [`run`](Self::run).
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Returns the base table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns whether any join has been added.
    #[must_use]
    pub fn has_join(&self) -> bool {
        !self.joins.is_empty()
    }

    /// Returns the WHERE clause builder.
    #[must_use]
    pub const fn wheres(&self) -> &ClauseBuilder {
        &self.wheres
    }

    /// Adds projected columns. Repeated calls accumulate; duplicates are
    /// dropped at render time.
    pub fn select<C: IntoColumns>(&mut self, columns: C) -> &mut Self {
        columns.push_columns(&mut self.columns);
        self
    }

    /// Makes the query `SELECT DISTINCT`.
    pub fn distinct(&mut self) -> &mut Self {
        self.distinct = true;
        self
    }

    /// Adds a plain `JOIN`.
    ///
    /// # Errors
    ///
    /// Fails when the condition violates the schema; nothing is stored then.
    pub fn join<O: Into<JoinOn>>(&mut self, table: &str, on: O) -> Result<&mut Self> {
        self.add_join(JoinType::Plain, table, on.into())
    }

    /// Adds an `INNER JOIN`.
    ///
    /// # Errors
    ///
    /// Fails when the condition violates the schema; nothing is stored then.
    pub fn inner_join<O: Into<JoinOn>>(&mut self, table: &str, on: O) -> Result<&mut Self> {
        self.add_join(JoinType::Inner, table, on.into())
    }

    /// Adds a `LEFT JOIN`.
    ///
    /// # Errors
    ///
    /// Fails when the condition violates the schema; nothing is stored then.
    pub fn left_join<O: Into<JoinOn>>(&mut self, table: &str, on: O) -> Result<&mut Self> {
        self.add_join(JoinType::Left, table, on.into())
    }

    /// Adds a `RIGHT JOIN`.
    ///
    /// # Errors
    ///
    /// Fails when the condition violates the schema; nothing is stored then.
    pub fn right_join<O: Into<JoinOn>>(&mut self, table: &str, on: O) -> Result<&mut Self> {
        self.add_join(JoinType::Right, table, on.into())
    }

    /// Adds a `CROSS JOIN`.
    ///
    /// # Errors
    ///
    /// Fails when the condition violates the schema; nothing is stored then.
    pub fn cross_join<O: Into<JoinOn>>(&mut self, table: &str, on: O) -> Result<&mut Self> {
        self.add_join(JoinType::Cross, table, on.into())
    }

    /// Adds a plain `JOIN` whose condition is built by `f`.
    ///
    /// `f` receives a clause builder scoped to the joined table. A condition
    /// left empty renders the join without `ON`.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by `f`.
    pub fn join_group<F>(&mut self, table: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut ClauseBuilder) -> Result<()>,
    {
        self.add_join_group(JoinType::Plain, table, f)
    }

    /// Adds an `INNER JOIN` whose condition is built by `f`.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by `f`.
    pub fn inner_join_group<F>(&mut self, table: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut ClauseBuilder) -> Result<()>,
    {
        self.add_join_group(JoinType::Inner, table, f)
    }

    /// Adds a `LEFT JOIN` whose condition is built by `f`.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by `f`.
    pub fn left_join_group<F>(&mut self, table: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut ClauseBuilder) -> Result<()>,
    {
        self.add_join_group(JoinType::Left, table, f)
    }

    /// Adds a `RIGHT JOIN` whose condition is built by `f`.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by `f`.
    pub fn right_join_group<F>(&mut self, table: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut ClauseBuilder) -> Result<()>,
    {
        self.add_join_group(JoinType::Right, table, f)
    }

    /// Adds a `CROSS JOIN` whose condition is built by `f`.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by `f`.
    pub fn cross_join_group<F>(&mut self, table: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut ClauseBuilder) -> Result<()>,
    {
        self.add_join_group(JoinType::Cross, table, f)
    }

    fn add_join(&mut self, kind: JoinType, table: &str, on: JoinOn) -> Result<&mut Self> {
        let mut scope = ClauseBuilder::with_oracle(table, self.oracle.clone());
        match on {
            JoinOn::Value { column, op, value } => {
                scope.apply(Logical::And, Condition::Explicit { column, op, value })?;
            }
            JoinOn::Columns {
                column,
                op,
                table: other_table,
                other,
            } => {
                let other = column::qualify(&other, &other_table);
                scope.compare_columns(&column, op, &other)?;
            }
        }
        self.push_join(kind, table, scope);
        Ok(self)
    }

    fn add_join_group<F>(&mut self, kind: JoinType, table: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut ClauseBuilder) -> Result<()>,
    {
        let mut scope = ClauseBuilder::with_oracle(table, self.oracle.clone());
        f(&mut scope)?;
        self.push_join(kind, table, scope);
        Ok(self)
    }

    fn push_join(&mut self, kind: JoinType, table: &str, scope: ClauseBuilder) {
        let (clauses, bindings) = scope.into_parts();
        let sql = if clauses.is_empty() {
            format!("{} {table}", kind.as_str())
        } else {
            format!("{} {table} ON {}", kind.as_str(), clauses.join(" "))
        };
        self.joins.push(Join { sql, bindings });
    }

    /// Adds a WHERE condition joined with `logical`.
    ///
    /// # Errors
    ///
    /// Fails when the condition violates the schema.
    pub fn apply(&mut self, logical: Logical, condition: Condition<'_>) -> Result<&mut Self> {
        self.wheres.apply(logical, condition)?;
        Ok(self)
    }

    /// Adds `column = value` joined with AND.
    ///
    /// # Errors
    ///
    /// Fails when `value` violates the schema.
    pub fn where_<V: ToSqlValue>(&mut self, column: &str, value: V) -> Result<&mut Self> {
        self.wheres.where_(column, value)?;
        Ok(self)
    }

    /// Adds `column = value` joined with OR.
    ///
    /// # Errors
    ///
    /// Fails when `value` violates the schema.
    pub fn or_where<V: ToSqlValue>(&mut self, column: &str, value: V) -> Result<&mut Self> {
        self.wheres.or_where(column, value)?;
        Ok(self)
    }

    /// Adds `column <op> value` joined with AND.
    ///
    /// # Errors
    ///
    /// Fails when `value` violates the schema.
    pub fn where_op<V: ToSqlValue>(&mut self, column: &str, op: Operator, value: V) -> Result<&mut Self> {
        self.wheres.where_op(column, op, value)?;
        Ok(self)
    }

    /// Adds `column <op> value` joined with OR.
    ///
    /// # Errors
    ///
    /// Fails when `value` violates the schema.
    pub fn or_where_op<V: ToSqlValue>(&mut self, column: &str, op: Operator, value: V) -> Result<&mut Self> {
        self.wheres.or_where_op(column, op, value)?;
        Ok(self)
    }

    /// Adds a parenthesized group joined with AND.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by `f`.
    pub fn where_group<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut ClauseBuilder) -> Result<()>,
    {
        self.wheres.where_group(f)?;
        Ok(self)
    }

    /// Adds a parenthesized group joined with OR.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by `f`.
    pub fn or_where_group<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut ClauseBuilder) -> Result<()>,
    {
        self.wheres.or_where_group(f)?;
        Ok(self)
    }

    /// Alias of [`where_`](Self::where_).
    ///
    /// # Errors
    ///
    /// Fails when `value` violates the schema.
    pub fn on<V: ToSqlValue>(&mut self, column: &str, value: V) -> Result<&mut Self> {
        self.where_(column, value)
    }

    /// Alias of [`or_where`](Self::or_where).
    ///
    /// # Errors
    ///
    /// Fails when `value` violates the schema.
    pub fn or_on<V: ToSqlValue>(&mut self, column: &str, value: V) -> Result<&mut Self> {
        self.or_where(column, value)
    }

    /// Adds `column IN (...)` joined with AND.
    ///
    /// # Errors
    ///
    /// Fails when a value violates the schema.
    pub fn where_in<I, V>(&mut self, column: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.wheres.where_in(column, values)?;
        Ok(self)
    }

    /// Adds `column NOT IN (...)` joined with AND.
    ///
    /// # Errors
    ///
    /// Fails when a value violates the schema.
    pub fn where_not_in<I, V>(&mut self, column: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.wheres.where_not_in(column, values)?;
        Ok(self)
    }

    /// Adds `column IN (...)` joined with OR.
    ///
    /// # Errors
    ///
    /// Fails when a value violates the schema.
    pub fn or_where_in<I, V>(&mut self, column: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.wheres.or_where_in(column, values)?;
        Ok(self)
    }

    /// Adds `column NOT IN (...)` joined with OR.
    ///
    /// # Errors
    ///
    /// Fails when a value violates the schema.
    pub fn or_where_not_in<I, V>(&mut self, column: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.wheres.or_where_not_in(column, values)?;
        Ok(self)
    }

    /// Adds `column BETWEEN ? AND ?` joined with AND.
    ///
    /// # Errors
    ///
    /// Fails when a bound violates the schema.
    pub fn where_between<V: ToSqlValue>(&mut self, column: &str, low: V, high: V) -> Result<&mut Self> {
        self.wheres.where_between(column, low, high)?;
        Ok(self)
    }

    /// Adds `column NOT BETWEEN ? AND ?` joined with AND.
    ///
    /// # Errors
    ///
    /// Fails when a bound violates the schema.
    pub fn where_not_between<V: ToSqlValue>(&mut self, column: &str, low: V, high: V) -> Result<&mut Self> {
        self.wheres.where_not_between(column, low, high)?;
        Ok(self)
    }

    /// Adds `column BETWEEN ? AND ?` joined with OR.
    ///
    /// # Errors
    ///
    /// Fails when a bound violates the schema.
    pub fn or_where_between<V: ToSqlValue>(&mut self, column: &str, low: V, high: V) -> Result<&mut Self> {
        self.wheres.or_where_between(column, low, high)?;
        Ok(self)
    }

    /// Adds `column NOT BETWEEN ? AND ?` joined with OR.
    ///
    /// # Errors
    ///
    /// Fails when a bound violates the schema.
    pub fn or_where_not_between<V: ToSqlValue>(&mut self, column: &str, low: V, high: V) -> Result<&mut Self> {
        self.wheres.or_where_not_between(column, low, high)?;
        Ok(self)
    }

    /// Adds `column IS NULL` joined with AND.
    ///
    /// # Errors
    ///
    /// Fails when the column is unknown to the schema.
    pub fn where_null(&mut self, column: &str) -> Result<&mut Self> {
        self.wheres.where_null(column)?;
        Ok(self)
    }

    /// Adds `column IS NOT NULL` joined with AND.
    ///
    /// # Errors
    ///
    /// Fails when the column is unknown to the schema.
    pub fn where_not_null(&mut self, column: &str) -> Result<&mut Self> {
        self.wheres.where_not_null(column)?;
        Ok(self)
    }

    /// Adds `column IS NULL` joined with OR.
    ///
    /// # Errors
    ///
    /// Fails when the column is unknown to the schema.
    pub fn or_where_null(&mut self, column: &str) -> Result<&mut Self> {
        self.wheres.or_where_null(column)?;
        Ok(self)
    }

    /// Adds `column IS NOT NULL` joined with OR.
    ///
    /// # Errors
    ///
    /// Fails when the column is unknown to the schema.
    pub fn or_where_not_null(&mut self, column: &str) -> Result<&mut Self> {
        self.wheres.or_where_not_null(column)?;
        Ok(self)
    }

    /// Adds GROUP BY columns, rendered as given.
    pub fn group_by<C: IntoColumns>(&mut self, columns: C) -> &mut Self {
        columns.push_columns(&mut self.groups);
        self
    }

    /// Adds an ORDER BY term.
    pub fn order(&mut self, column: &str, direction: OrderDirection) -> &mut Self {
        self.orders.push((String::from(column), direction));
        self
    }

    /// Alias of [`order`](Self::order).
    pub fn order_by(&mut self, column: &str, direction: OrderDirection) -> &mut Self {
        self.order(column, direction)
    }

    /// Adds an ascending ORDER BY term.
    pub fn asc(&mut self, column: &str) -> &mut Self {
        self.order(column, OrderDirection::Asc)
    }

    /// Adds a descending ORDER BY term.
    pub fn desc(&mut self, column: &str) -> &mut Self {
        self.order(column, OrderDirection::Desc)
    }

    /// Sets the LIMIT. Zero or a value with no integer reading leaves the
    /// current limit untouched.
    pub fn limit<N: IntoCount>(&mut self, value: N) -> &mut Self {
        if let Some(n) = value.into_count().filter(|n| *n != 0) {
            self.limit = Some(n);
        }
        self
    }

    /// Sets the OFFSET. A value with no integer reading leaves the current
    /// offset untouched.
    pub fn offset<N: IntoCount>(&mut self, value: N) -> &mut Self {
        if let Some(n) = value.into_count() {
            self.offset = Some(n);
        }
        self
    }

    /// Renders the statement with `?` placeholders.
    #[must_use]
    pub fn query(&self) -> String {
        let has_join = self.has_join();
        let projection = column::projection(&self.columns, &self.table, has_join);

        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        if projection.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&projection.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.sql);
        }

        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.wheres.render());
        }

        if !self.groups.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.groups.join(", "));
        }

        if !self.orders.is_empty() {
            let orders: Vec<String> = self
                .orders
                .iter()
                .map(|(col, dir)| {
                    format!("{} {}", column::order_column(col, &self.table, has_join), dir.as_str())
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&orders.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        sql
    }

    /// Returns the bound values in placeholder order: join bindings in the
    /// order the joins were added, then WHERE bindings.
    #[must_use]
    pub fn args(&self) -> Vec<SqlValue> {
        self.joins
            .iter()
            .flat_map(|join| join.bindings.iter())
            .chain(self.wheres.bindings())
            .cloned()
            .collect()
    }

    /// Alias of [`args`](Self::args).
    #[must_use]
    pub fn arguments(&self) -> Vec<SqlValue> {
        self.args()
    }

    /// Alias of [`args`](Self::args).
    #[must_use]
    pub fn bindings(&self) -> Vec<SqlValue> {
        self.args()
    }

    /// Renders the statement with every placeholder replaced by its
    /// escaped literal.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::BindCountMismatch`] if placeholders and bound
    /// values disagree in count.
    pub fn sql(&self) -> Result<String> {
        bind_literals(&self.query(), &self.args())
    }

    /// Alias of [`sql`](Self::sql).
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::BindCountMismatch`] if placeholders and bound
    /// values disagree in count.
    pub fn raw(&self) -> Result<String> {
        self.sql()
    }

    /// Returns the placeholder statement and its arguments.
    #[must_use]
    pub fn build(&self) -> (String, Vec<SqlValue>) {
        (self.query(), self.args())
    }

    /// Returns the statement packaged for an [`Executor`].
    #[must_use]
    pub fn compile(&self) -> CompiledQuery {
        let (sql, args) = self.build();
        CompiledQuery {
            sql,
            args,
            table: self.table.clone(),
        }
    }

    /// Runs the query through the attached executor.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NoExecutor`] when no executor is attached, or
    /// whatever the executor reports.
    pub async fn run(&self) -> Result<QueryResult> {
        let executor = self.executor.as_ref().ok_or(QueryError::NoExecutor)?;
        let query = self.compile();
        debug!(table = %query.table, sql = %query.sql, args = query.args.len(), "executing query");
        executor.execute(query).await
    }

    /// Runs the query and returns the first row, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub async fn first(&self) -> Result<Option<Row>> {
        Ok(self.run().await?.results.into_iter().next())
    }

    /// Runs the query and returns every row.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub async fn all(&self) -> Result<Vec<Row>> {
        Ok(self.run().await?.into_rows())
    }

    /// Adds `columns` to the projection, then behaves like [`first`](Self::first).
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub async fn first_columns<C: IntoColumns>(&mut self, columns: C) -> Result<Option<Row>> {
        self.select(columns);
        self.first().await
    }

    /// Adds `columns` to the projection, then behaves like [`all`](Self::all).
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub async fn all_columns<C: IntoColumns>(&mut self, columns: C) -> Result<Vec<Row>> {
        self.select(columns);
        self.all().await
    }

    /// Runs the query and decodes the first row into `T`.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run); also fails with [`QueryError::Decode`].
    pub async fn first_as<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.first()
            .await?
            .map(|row| serde_json::from_value(serde_json::Value::Object(row)).map_err(QueryError::from))
            .transpose()
    }

    /// Runs the query and decodes every row into `T`.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run); also fails with [`QueryError::Decode`].
    pub async fn all_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.run().await?.rows_as()
    }
}

/// Substitutes each `?` in `sql`, left to right, with the inline literal of
/// the next value.
///
/// # Errors
///
/// Returns [`QueryError::BindCountMismatch`] unless there is exactly one
/// value per placeholder.
pub fn bind_literals(sql: &str, values: &[SqlValue]) -> Result<String> {
    let placeholders = sql.matches(SqlValue::placeholder()).count();
    if placeholders != values.len() {
        return Err(QueryError::BindCountMismatch {
            placeholders,
            values: values.len(),
        });
    }

    let mut out = String::with_capacity(sql.len());
    let mut values = values.iter();
    let mut parts = sql.split(SqlValue::placeholder());
    if let Some(head) = parts.next() {
        out.push_str(head);
    }
    for part in parts {
        if let Some(value) = values.next() {
            out.push_str(&value.to_sql_inline());
        }
        out.push_str(part);
    }
    Ok(out)
}
