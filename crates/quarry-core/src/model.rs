//! Model trait: a table-bound entry point for query builders.

use std::sync::Arc;

use crate::clause::ClauseBuilder;
use crate::error::Result;
use crate::executor::Executor;
use crate::operator::{Operator, OrderDirection};
use crate::query::{IntoColumns, IntoCount, QueryBuilder};
use crate::schema::TypeOracle;
use crate::value::ToSqlValue;

/// A type standing for a database table.
///
/// Every associated function starts a new [`QueryBuilder`] over
/// [`table`](Model::table), wired with the model's schema and executor.
///
/// # Example
///
/// ```rust
/// use quarry_core::Model;
///
/// struct Category;
///
/// impl Model for Category {}
///
/// # fn main() -> quarry_core::Result<()> {
/// assert_eq!(Category::table(), "categories");
/// assert_eq!(
///     Category::where_("id", 3)?.query(),
///     "SELECT * FROM categories WHERE categories.id = ?"
/// );
/// # Ok(())
/// # }
/// ```
pub trait Model: Sized + Send + Sync + 'static {
    /// Returns the table name.
    ///
    /// Defaults to the plural of the lower-cased type name.
    fn table() -> String {
        default_table_name::<Self>()
    }

    /// Returns the schema predicates are validated against, if any.
    fn schema() -> Option<Arc<dyn TypeOracle>> {
        None
    }

    /// Returns the executor queries run through, if any.
    fn executor() -> Option<Arc<dyn Executor>> {
        None
    }

    /// Returns an empty builder over the model's table.
    fn builder() -> QueryBuilder {
        let builder = QueryBuilder::with_oracle(&Self::table(), Self::schema());
        match Self::executor() {
            Some(executor) => builder.with_executor(executor),
            None => builder,
        }
    }

    /// Starts a query selecting `columns`.
    fn select<C: IntoColumns>(columns: C) -> QueryBuilder {
        let mut builder = Self::builder();
        builder.select(columns);
        builder
    }

    /// Starts a `SELECT DISTINCT` query.
    fn distinct() -> QueryBuilder {
        let mut builder = Self::builder();
        builder.distinct();
        builder
    }

    /// Starts a query filtered by `column = value`.
    ///
    /// # Errors
    ///
    /// Fails when `value` violates the schema.
    fn where_<V: ToSqlValue>(column: &str, value: V) -> Result<QueryBuilder> {
        let mut builder = Self::builder();
        builder.where_(column, value)?;
        Ok(builder)
    }

    /// Starts a query filtered by `column <op> value`.
    ///
    /// # Errors
    ///
    /// Fails when `value` violates the schema.
    fn where_op<V: ToSqlValue>(column: &str, op: Operator, value: V) -> Result<QueryBuilder> {
        let mut builder = Self::builder();
        builder.where_op(column, op, value)?;
        Ok(builder)
    }

    /// Starts a query filtered by a parenthesized group.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by `f`.
    fn where_group<F>(f: F) -> Result<QueryBuilder>
    where
        F: FnOnce(&mut ClauseBuilder) -> Result<()>,
    {
        let mut builder = Self::builder();
        builder.where_group(f)?;
        Ok(builder)
    }

    /// Starts a query filtered by `column IN (...)`.
    ///
    /// # Errors
    ///
    /// Fails when a value violates the schema.
    fn where_in<I, V>(column: &str, values: I) -> Result<QueryBuilder>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let mut builder = Self::builder();
        builder.where_in(column, values)?;
        Ok(builder)
    }

    /// Starts a query filtered by `column NOT IN (...)`.
    ///
    /// # Errors
    ///
    /// Fails when a value violates the schema.
    fn where_not_in<I, V>(column: &str, values: I) -> Result<QueryBuilder>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let mut builder = Self::builder();
        builder.where_not_in(column, values)?;
        Ok(builder)
    }

    /// Starts a query filtered by `column BETWEEN low AND high`.
    ///
    /// # Errors
    ///
    /// Fails when a bound violates the schema.
    fn where_between<V: ToSqlValue>(column: &str, low: V, high: V) -> Result<QueryBuilder> {
        let mut builder = Self::builder();
        builder.where_between(column, low, high)?;
        Ok(builder)
    }

    /// Starts a query filtered by `column NOT BETWEEN low AND high`.
    ///
    /// # Errors
    ///
    /// Fails when a bound violates the schema.
    fn where_not_between<V: ToSqlValue>(column: &str, low: V, high: V) -> Result<QueryBuilder> {
        let mut builder = Self::builder();
        builder.where_not_between(column, low, high)?;
        Ok(builder)
    }

    /// Starts a query filtered by `column IS NULL`.
    ///
    /// # Errors
    ///
    /// Fails when the column is unknown to the schema.
    fn where_null(column: &str) -> Result<QueryBuilder> {
        let mut builder = Self::builder();
        builder.where_null(column)?;
        Ok(builder)
    }

    /// Starts a query filtered by `column IS NOT NULL`.
    ///
    /// # Errors
    ///
    /// Fails when the column is unknown to the schema.
    fn where_not_null(column: &str) -> Result<QueryBuilder> {
        let mut builder = Self::builder();
        builder.where_not_null(column)?;
        Ok(builder)
    }

    /// Alias of [`where_`](Model::where_).
    ///
    /// # Errors
    ///
    /// Fails when `value` violates the schema.
    fn on<V: ToSqlValue>(column: &str, value: V) -> Result<QueryBuilder> {
        Self::where_(column, value)
    }

    /// Alias of [`where_between`](Model::where_between).
    ///
    /// # Errors
    ///
    /// Fails when a bound violates the schema.
    fn between<V: ToSqlValue>(column: &str, low: V, high: V) -> Result<QueryBuilder> {
        Self::where_between(column, low, high)
    }

    /// Alias of [`where_not_between`](Model::where_not_between).
    ///
    /// # Errors
    ///
    /// Fails when a bound violates the schema.
    fn not_between<V: ToSqlValue>(column: &str, low: V, high: V) -> Result<QueryBuilder> {
        Self::where_not_between(column, low, high)
    }

    /// Alias of [`where_null`](Model::where_null).
    ///
    /// # Errors
    ///
    /// Fails when the column is unknown to the schema.
    fn on_null(column: &str) -> Result<QueryBuilder> {
        Self::where_null(column)
    }

    /// Alias of [`where_not_null`](Model::where_not_null).
    ///
    /// # Errors
    ///
    /// Fails when the column is unknown to the schema.
    fn on_not_null(column: &str) -> Result<QueryBuilder> {
        Self::where_not_null(column)
    }

    /// Starts an ordered query.
    fn order(column: &str, direction: OrderDirection) -> QueryBuilder {
        let mut builder = Self::builder();
        builder.order(column, direction);
        builder
    }

    /// Alias of [`order`](Model::order).
    fn order_by(column: &str, direction: OrderDirection) -> QueryBuilder {
        Self::order(column, direction)
    }

    /// Starts a query in ascending `column` order.
    fn asc(column: &str) -> QueryBuilder {
        Self::order(column, OrderDirection::Asc)
    }

    /// Starts a query in descending `column` order.
    fn desc(column: &str) -> QueryBuilder {
        Self::order(column, OrderDirection::Desc)
    }

    /// Starts a limited query.
    fn limit<N: IntoCount>(value: N) -> QueryBuilder {
        let mut builder = Self::builder();
        builder.limit(value);
        builder
    }

    /// Starts a query with an offset.
    fn offset<N: IntoCount>(value: N) -> QueryBuilder {
        let mut builder = Self::builder();
        builder.offset(value);
        builder
    }
}

/// Derives a table name from a type path: `app::models::BlogPost` becomes
/// `blogposts`.
#[must_use]
pub fn default_table_name<T: ?Sized>() -> String {
    let path = std::any::type_name::<T>();
    let path = path.split('<').next().unwrap_or(path);
    let name = path.rsplit("::").next().unwrap_or(path);
    pluralizer::pluralize(&name.to_lowercase(), 2, false)
}
