//! Predicate tree builder for WHERE and JOIN ... ON expressions.
//!
//! A [`ClauseBuilder`] keeps an ordered list of rendered clause fragments and
//! the values bound to their `?` placeholders. Every fragment after the first
//! is prefixed with the connective of the call that produced it. Nested
//! groups are built on an independent child builder and folded into the
//! parent as one parenthesized fragment.
//!
//! ```rust
//! use quarry_core::clause::ClauseBuilder;
//! use quarry_core::Operator;
//!
//! # fn main() -> quarry_core::Result<()> {
//! let mut clauses = ClauseBuilder::new("users");
//! clauses
//!     .where_group(|q| {
//!         q.where_op("name", Operator::Like, "%Smartphone%")?
//!             .or_where_op("name", Operator::Like, "Notebook%")?;
//!         Ok(())
//!     })?
//!     .where_("user_id", 42)?;
//!
//! assert_eq!(
//!     clauses.render(),
//!     "(users.name LIKE ? OR users.name LIKE ?) AND users.user_id = ?"
//! );
//! assert_eq!(clauses.bindings().len(), 3);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tracing::trace;

use crate::column;
use crate::error::{QueryError, Result};
use crate::operator::{Logical, Operator};
use crate::schema::{column_reference, TypeOracle};
use crate::value::{SqlValue, ToSqlValue};

/// Callback building a nested predicate group.
pub type GroupFn<'a> = Box<dyn FnOnce(&mut ClauseBuilder) -> Result<()> + 'a>;

/// A single predicate call, in one of its accepted shapes.
pub enum Condition<'a> {
    /// `column = value`
    Simple {
        /// Column name.
        column: String,
        /// Compared value.
        value: SqlValue,
    },
    /// `column <op> value`
    Explicit {
        /// Column name.
        column: String,
        /// Comparison operator.
        op: Operator,
        /// Compared value.
        value: SqlValue,
    },
    /// A parenthesized group built by a callback.
    Nested(GroupFn<'a>),
}

impl<'a> Condition<'a> {
    /// Creates an implicit equality condition.
    #[must_use]
    pub fn simple<V: ToSqlValue>(column: &str, value: V) -> Self {
        Self::Simple {
            column: String::from(column),
            value: value.to_sql_value(),
        }
    }

    /// Creates a condition with an explicit operator.
    #[must_use]
    pub fn explicit<V: ToSqlValue>(column: &str, op: Operator, value: V) -> Self {
        Self::Explicit {
            column: String::from(column),
            op,
            value: value.to_sql_value(),
        }
    }

    /// Creates a nested group condition.
    pub fn nested<F>(f: F) -> Self
    where
        F: FnOnce(&mut ClauseBuilder) -> Result<()> + 'a,
    {
        Self::Nested(Box::new(f))
    }
}

/// Accumulates clause fragments and their bound values.
#[derive(Debug, Clone)]
pub struct ClauseBuilder {
    table: String,
    oracle: Option<Arc<dyn TypeOracle>>,
    clauses: Vec<String>,
    bindings: Vec<SqlValue>,
}

impl ClauseBuilder {
    /// Creates an empty builder for `table` without schema validation.
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self::with_oracle(table, None)
    }

    /// Creates an empty builder for `table`, validating operands against
    /// `oracle` when one is given.
    #[must_use]
    pub fn with_oracle(table: &str, oracle: Option<Arc<dyn TypeOracle>>) -> Self {
        Self {
            table: String::from(table),
            oracle,
            clauses: Vec::new(),
            bindings: Vec::new(),
        }
    }

    /// Creates a fresh builder scoped to the same table and schema.
    #[must_use]
    pub fn nested(&self) -> Self {
        Self::with_oracle(&self.table, self.oracle.clone())
    }

    /// Returns the table bare columns are qualified with.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the rendered fragments.
    #[must_use]
    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }

    /// Returns the bound values, in placeholder order.
    #[must_use]
    pub fn bindings(&self) -> &[SqlValue] {
        &self.bindings
    }

    /// Returns the number of fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Returns whether no fragment has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Renders the fragments joined by spaces.
    #[must_use]
    pub fn render(&self) -> String {
        self.clauses.join(" ")
    }

    /// Consumes the builder and returns its fragments and bound values.
    #[must_use]
    pub fn into_parts(self) -> (Vec<String>, Vec<SqlValue>) {
        (self.clauses, self.bindings)
    }

    pub(crate) fn oracle(&self) -> Option<&dyn TypeOracle> {
        self.oracle.as_deref()
    }

    /// Adds a condition joined with `logical`.
    ///
    /// # Errors
    ///
    /// Fails with [`QueryError::TypeMismatch`] or
    /// [`QueryError::UnknownColumn`] when the condition violates the schema.
    /// Nothing is appended in that case.
    pub fn apply(&mut self, logical: Logical, condition: Condition<'_>) -> Result<&mut Self> {
        match condition {
            Condition::Simple { column, value } => self.compare(logical, &column, Operator::Eq, value),
            Condition::Explicit { column, op, value } => self.compare(logical, &column, op, value),
            Condition::Nested(f) => {
                let mut nested = self.nested();
                f(&mut nested)?;
                self.fold(logical, nested);
                Ok(self)
            }
        }
    }

    /// Adds `column = value` joined with AND.
    ///
    /// # Errors
    ///
    /// Fails when `value` violates the schema.
    pub fn where_<V: ToSqlValue>(&mut self, column: &str, value: V) -> Result<&mut Self> {
        self.apply(Logical::And, Condition::simple(column, value))
    }

    /// Adds `column = value` joined with OR.
    ///
    /// # Errors
    ///
    /// Fails when `value` violates the schema.
    pub fn or_where<V: ToSqlValue>(&mut self, column: &str, value: V) -> Result<&mut Self> {
        self.apply(Logical::Or, Condition::simple(column, value))
    }

    /// Adds `column <op> value` joined with AND.
    ///
    /// # Errors
    ///
    /// Fails when `value` violates the schema.
    pub fn where_op<V: ToSqlValue>(&mut self, column: &str, op: Operator, value: V) -> Result<&mut Self> {
        self.apply(Logical::And, Condition::explicit(column, op, value))
    }

    /// Adds `column <op> value` joined with OR.
    ///
    /// # Errors
    ///
    /// Fails when `value` violates the schema.
    pub fn or_where_op<V: ToSqlValue>(&mut self, column: &str, op: Operator, value: V) -> Result<&mut Self> {
        self.apply(Logical::Or, Condition::explicit(column, op, value))
    }

    /// Adds a parenthesized group joined with AND.
    ///
    /// The callback receives a fresh builder; a group left empty adds
    /// nothing.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by the callback.
    pub fn where_group<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.apply(Logical::And, Condition::nested(f))
    }

    /// Adds a parenthesized group joined with OR.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by the callback.
    pub fn or_where_group<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.apply(Logical::Or, Condition::nested(f))
    }

    /// Alias of [`where_`](Self::where_) for join conditions.
    ///
    /// # Errors
    ///
    /// Fails when `value` violates the schema.
    pub fn on<V: ToSqlValue>(&mut self, column: &str, value: V) -> Result<&mut Self> {
        self.where_(column, value)
    }

    /// Alias of [`or_where`](Self::or_where) for join conditions.
    ///
    /// # Errors
    ///
    /// Fails when `value` violates the schema.
    pub fn or_on<V: ToSqlValue>(&mut self, column: &str, value: V) -> Result<&mut Self> {
        self.or_where(column, value)
    }

    /// Alias of [`where_op`](Self::where_op) for join conditions.
    ///
    /// # Errors
    ///
    /// Fails when `value` violates the schema.
    pub fn on_op<V: ToSqlValue>(&mut self, column: &str, op: Operator, value: V) -> Result<&mut Self> {
        self.where_op(column, op, value)
    }

    /// Alias of [`or_where_op`](Self::or_where_op) for join conditions.
    ///
    /// # Errors
    ///
    /// Fails when `value` violates the schema.
    pub fn or_on_op<V: ToSqlValue>(&mut self, column: &str, op: Operator, value: V) -> Result<&mut Self> {
        self.or_where_op(column, op, value)
    }

    /// Alias of [`where_group`](Self::where_group) for join conditions.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by the callback.
    pub fn on_group<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.where_group(f)
    }

    /// Alias of [`or_where_group`](Self::or_where_group) for join conditions.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by the callback.
    pub fn or_on_group<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.or_where_group(f)
    }

    /// Adds `column IN (...)` joined with AND. An empty list adds nothing.
    ///
    /// # Errors
    ///
    /// Fails when a value violates the schema.
    pub fn where_in<I, V>(&mut self, column: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.membership(Logical::And, column, values, "IN")
    }

    /// Adds `column NOT IN (...)` joined with AND. An empty list adds nothing.
    ///
    /// # Errors
    ///
    /// Fails when a value violates the schema.
    pub fn where_not_in<I, V>(&mut self, column: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.membership(Logical::And, column, values, "NOT IN")
    }

    /// Adds `column IN (...)` joined with OR. An empty list adds nothing.
    ///
    /// # Errors
    ///
    /// Fails when a value violates the schema.
    pub fn or_where_in<I, V>(&mut self, column: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.membership(Logical::Or, column, values, "IN")
    }

    /// Adds `column NOT IN (...)` joined with OR. An empty list adds nothing.
    ///
    /// # Errors
    ///
    /// Fails when a value violates the schema.
    pub fn or_where_not_in<I, V>(&mut self, column: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.membership(Logical::Or, column, values, "NOT IN")
    }

    /// Adds `column BETWEEN ? AND ?` joined with AND.
    ///
    /// # Errors
    ///
    /// Fails when a bound violates the schema.
    pub fn where_between<V: ToSqlValue>(&mut self, column: &str, low: V, high: V) -> Result<&mut Self> {
        self.range(Logical::And, column, low, high, "BETWEEN")
    }

    /// Adds `column NOT BETWEEN ? AND ?` joined with AND.
    ///
    /// # Errors
    ///
    /// Fails when a bound violates the schema.
    pub fn where_not_between<V: ToSqlValue>(&mut self, column: &str, low: V, high: V) -> Result<&mut Self> {
        self.range(Logical::And, column, low, high, "NOT BETWEEN")
    }

    /// Adds `column BETWEEN ? AND ?` joined with OR.
    ///
    /// # Errors
    ///
    /// Fails when a bound violates the schema.
    pub fn or_where_between<V: ToSqlValue>(&mut self, column: &str, low: V, high: V) -> Result<&mut Self> {
        self.range(Logical::Or, column, low, high, "BETWEEN")
    }

    /// Adds `column NOT BETWEEN ? AND ?` joined with OR.
    ///
    /// # Errors
    ///
    /// Fails when a bound violates the schema.
    pub fn or_where_not_between<V: ToSqlValue>(&mut self, column: &str, low: V, high: V) -> Result<&mut Self> {
        self.range(Logical::Or, column, low, high, "NOT BETWEEN")
    }

    /// Adds `column IS NULL` joined with AND.
    ///
    /// # Errors
    ///
    /// Fails when the column is unknown to the schema.
    pub fn where_null(&mut self, column: &str) -> Result<&mut Self> {
        self.null(Logical::And, column, "IS")
    }

    /// Adds `column IS NOT NULL` joined with AND.
    ///
    /// # Errors
    ///
    /// Fails when the column is unknown to the schema.
    pub fn where_not_null(&mut self, column: &str) -> Result<&mut Self> {
        self.null(Logical::And, column, "IS NOT")
    }

    /// Adds `column IS NULL` joined with OR.
    ///
    /// # Errors
    ///
    /// Fails when the column is unknown to the schema.
    pub fn or_where_null(&mut self, column: &str) -> Result<&mut Self> {
        self.null(Logical::Or, column, "IS")
    }

    /// Adds `column IS NOT NULL` joined with OR.
    ///
    /// # Errors
    ///
    /// Fails when the column is unknown to the schema.
    pub fn or_where_not_null(&mut self, column: &str) -> Result<&mut Self> {
        self.null(Logical::Or, column, "IS NOT")
    }

    /// Qualifies `name` with the builder's table and, in strict mode,
    /// checks that the column exists.
    pub(crate) fn resolve_column(&self, name: &str) -> Result<String> {
        let column = column::qualify(name, &self.table);
        match self.oracle() {
            Some(oracle) if oracle.resolve(&column).is_none() => {
                trace!(column = %column, "rejected unknown column");
                Err(QueryError::UnknownColumn(column))
            }
            _ => Ok(column),
        }
    }

    /// Adds `column <op> other` joined with AND, where `other` is an
    /// already qualified column of another table.
    pub(crate) fn compare_columns(&mut self, column: &str, op: Operator, other: &str) -> Result<&mut Self> {
        let column = self.resolve_column(column)?;
        check_references(self.oracle(), &column, other)?;
        self.push(Logical::And, format!("{column} {op} {other}"), Vec::new());
        Ok(self)
    }

    fn compare(&mut self, logical: Logical, column: &str, op: Operator, value: SqlValue) -> Result<&mut Self> {
        let column = self.resolve_column(column)?;
        let (sql, binding) = comparison(self.oracle(), &column, op, value)?;
        self.push(logical, sql, binding.into_iter().collect());
        Ok(self)
    }

    fn membership<I, V>(&mut self, logical: Logical, column: &str, values: I, keyword: &str) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let values: Vec<SqlValue> = values.into_iter().map(ToSqlValue::to_sql_value).collect();
        if values.is_empty() {
            return Ok(self);
        }

        let column = self.resolve_column(column)?;
        for value in &values {
            check_operand(self.oracle(), &column, value)?;
        }

        let placeholders: Vec<&str> = values.iter().map(|_| SqlValue::placeholder()).collect();
        self.push(
            logical,
            format!("{column} {keyword} ({})", placeholders.join(", ")),
            values,
        );
        Ok(self)
    }

    fn range<V: ToSqlValue>(&mut self, logical: Logical, column: &str, low: V, high: V, keyword: &str) -> Result<&mut Self> {
        let column = self.resolve_column(column)?;
        let values = vec![low.to_sql_value(), high.to_sql_value()];
        for value in &values {
            check_operand(self.oracle(), &column, value)?;
        }

        self.push(logical, format!("{column} {keyword} ? AND ?"), values);
        Ok(self)
    }

    fn null(&mut self, logical: Logical, column: &str, keyword: &str) -> Result<&mut Self> {
        let column = self.resolve_column(column)?;
        self.push(logical, format!("{column} {keyword} NULL"), Vec::new());
        Ok(self)
    }

    fn push(&mut self, logical: Logical, sql: String, values: Vec<SqlValue>) {
        let sql = if self.clauses.is_empty() {
            sql
        } else {
            format!("{logical} {sql}")
        };
        self.clauses.push(sql);
        self.bindings.extend(values);
    }

    fn fold(&mut self, logical: Logical, nested: Self) {
        if nested.is_empty() {
            return;
        }
        let (clauses, bindings) = nested.into_parts();
        self.push(logical, format!("({})", clauses.join(" ")), bindings);
    }
}

/// Renders `column <op> value`, inlining column references and returning
/// the value to bind otherwise. `column` must already be resolved.
pub(crate) fn comparison(
    oracle: Option<&dyn TypeOracle>,
    column: &str,
    op: Operator,
    value: SqlValue,
) -> Result<(String, Option<SqlValue>)> {
    if let Some(reference) = column_reference(&value, oracle) {
        check_references(oracle, column, reference)?;
        return Ok((format!("{column} {op} {reference}"), None));
    }

    check_operand(oracle, column, &value)?;
    Ok((format!("{column} {op} ?"), Some(value)))
}

/// Checks that `value` is assignable to `column` in strict mode.
pub(crate) fn check_operand(oracle: Option<&dyn TypeOracle>, column: &str, value: &SqlValue) -> Result<()> {
    let Some(oracle) = oracle else {
        return Ok(());
    };
    let Some(declared) = oracle.declared(column) else {
        return Err(QueryError::UnknownColumn(String::from(column)));
    };

    if oracle.is_compatible(column, value) {
        Ok(())
    } else {
        trace!(column = %column, expected = %declared, actual = value.type_name(), "rejected operand");
        Err(QueryError::TypeMismatch {
            column: String::from(column),
            expected: declared.to_string(),
            actual: String::from(value.type_name()),
        })
    }
}

/// Checks that two columns exist and have comparable types in strict mode.
pub(crate) fn check_references(oracle: Option<&dyn TypeOracle>, column: &str, other: &str) -> Result<()> {
    let Some(oracle) = oracle else {
        return Ok(());
    };
    let declared = oracle
        .declared(column)
        .ok_or_else(|| QueryError::UnknownColumn(String::from(column)))?;
    let referenced = oracle
        .declared(other)
        .ok_or_else(|| QueryError::UnknownColumn(String::from(other)))?;

    if declared.overlaps(referenced) {
        Ok(())
    } else {
        Err(QueryError::TypeMismatch {
            column: String::from(column),
            expected: declared.to_string(),
            actual: referenced.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnType, Schema};

    fn strict(table: &str) -> ClauseBuilder {
        let schema = Schema::new()
            .table(
                "users",
                [
                    ("id", ColumnType::Number),
                    ("name", ColumnType::String),
                    ("deleted_at", ColumnType::optional(ColumnType::Date)),
                ],
            )
            .table("roles", [("user_id", ColumnType::Number), ("label", ColumnType::String)]);
        ClauseBuilder::with_oracle(table, Some(Arc::new(schema)))
    }

    #[test]
    fn test_first_fragment_has_no_connective() {
        let mut q = ClauseBuilder::new("users");
        q.or_where("id", 1).unwrap().where_("name", "Bob").unwrap();
        assert_eq!(q.clauses(), ["users.id = ?", "AND users.name = ?"]);
        assert_eq!(q.bindings(), [SqlValue::Int(1), SqlValue::Text(String::from("Bob"))]);
    }

    #[test]
    fn test_column_reference_is_inlined() {
        let mut q = ClauseBuilder::new("roles");
        q.where_("user_id", "users.id").unwrap();
        assert_eq!(q.render(), "roles.user_id = users.id");
        assert!(q.bindings().is_empty());
    }

    #[test]
    fn test_nested_group() {
        let mut q = ClauseBuilder::new("users");
        q.where_("id", 1)
            .unwrap()
            .or_where_group(|q| {
                q.where_op("name", Operator::Like, "A%")?.or_where_null("name")?;
                Ok(())
            })
            .unwrap();
        assert_eq!(q.render(), "users.id = ? OR (users.name LIKE ? OR users.name IS NULL)");
        assert_eq!(q.bindings().len(), 2);
    }

    #[test]
    fn test_nested_group_without_parent_fragments() {
        let mut q = ClauseBuilder::new("users");
        q.or_where_group(|q| {
            q.where_("id", 1)?;
            Ok(())
        })
        .unwrap();
        assert_eq!(q.render(), "(users.id = ?)");
    }

    #[test]
    fn test_empty_group_is_dropped() {
        let mut q = ClauseBuilder::new("users");
        q.where_group(|_| Ok(())).unwrap().where_("id", 1).unwrap();
        assert_eq!(q.render(), "users.id = ?");
    }

    #[test]
    fn test_deep_nesting() {
        let mut q = ClauseBuilder::new("users");
        q.where_group(|q| {
            q.where_("id", 1)?.or_where_group(|q| {
                q.where_("id", 2)?.where_group(|q| {
                    q.where_not_null("name")?;
                    Ok(())
                })?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
        assert_eq!(
            q.render(),
            "(users.id = ? OR (users.id = ? AND (users.name IS NOT NULL)))"
        );
        assert_eq!(q.bindings(), [SqlValue::Int(1), SqlValue::Int(2)]);
    }

    #[test]
    fn test_empty_in_list_is_noop() {
        let mut q = ClauseBuilder::new("users");
        q.where_in("id", Vec::<i64>::new())
            .unwrap()
            .or_where_not_in("id", Vec::<i64>::new())
            .unwrap()
            .or_where("id", 3)
            .unwrap();
        assert_eq!(q.render(), "users.id = ?");
    }

    #[test]
    fn test_in_between_null() {
        let mut q = ClauseBuilder::new("items");
        q.where_in("category_id", [4, 2])
            .unwrap()
            .or_where_not_in("tag", ["a"])
            .unwrap()
            .where_between("price", 500, 20000)
            .unwrap()
            .or_where_not_between("stock", 0, 1)
            .unwrap()
            .where_null("soldout")
            .unwrap()
            .where_not_null("deleted_at")
            .unwrap();
        assert_eq!(
            q.render(),
            "items.category_id IN (?, ?) OR items.tag NOT IN (?) \
             AND items.price BETWEEN ? AND ? OR items.stock NOT BETWEEN ? AND ? \
             AND items.soldout IS NULL AND items.deleted_at IS NOT NULL"
        );
        assert_eq!(q.bindings().len(), 7);
    }

    #[test]
    fn test_type_mismatch_appends_nothing() {
        let mut q = strict("users");
        let err = q.where_("id", "abc").unwrap_err();
        assert!(matches!(
            err,
            QueryError::TypeMismatch { ref column, ref expected, ref actual }
                if column == "users.id" && expected == "number" && actual == "string"
        ));
        assert_eq!(q.len(), 0);
        assert!(q.bindings().is_empty());
    }

    #[test]
    fn test_mismatch_names_declared_optional_type() {
        let mut q = strict("users");
        let err = q.where_("deleted_at", 5).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Table column 'users.deleted_at' of type 'optional<date>' is not assignable as type of 'number'"
        );
        assert!(q.is_empty());
    }

    #[test]
    fn test_strict_unknown_column() {
        let mut q = strict("users");
        assert!(matches!(
            q.where_null("missing"),
            Err(QueryError::UnknownColumn(ref c)) if c == "users.missing"
        ));
        assert!(q.is_empty());
    }

    #[test]
    fn test_strict_optional_accepts_null() {
        let mut q = strict("users");
        q.where_("deleted_at", SqlValue::Null).unwrap();
        assert_eq!(q.render(), "users.deleted_at = ?");
    }

    #[test]
    fn test_strict_reference_and_literal() {
        let mut q = strict("roles");
        q.where_("user_id", "users.id").unwrap();
        q.where_("label", "example.com").unwrap();
        assert_eq!(q.render(), "roles.user_id = users.id AND roles.label = ?");
        assert_eq!(q.bindings(), [SqlValue::Text(String::from("example.com"))]);

        let err = q.where_("user_id", "users.name").unwrap_err();
        assert!(matches!(err, QueryError::TypeMismatch { .. }));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_strict_in_list_checks_each_value() {
        let mut q = strict("users");
        assert!(q.where_in("id", vec![1_i32.to_sql_value(), "x".to_sql_value()]).is_err());
        assert!(q.is_empty());
        q.where_in("id", [1, 2]).unwrap();
        assert_eq!(q.render(), "users.id IN (?, ?)");
    }

    #[test]
    fn test_failed_group_leaves_parent_untouched() {
        let mut q = strict("users");
        q.where_("id", 1).unwrap();
        let result = q.or_where_group(|q| {
            q.where_("name", "Ann")?.where_("id", "bad")?;
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(q.render(), "users.id = ?");
        assert_eq!(q.bindings().len(), 1);
    }

    #[test]
    fn test_apply_tagged_conditions() {
        let mut q = ClauseBuilder::new("users");
        q.apply(Logical::And, Condition::simple("id", 1))
            .unwrap()
            .apply(Logical::Or, Condition::explicit("age", Operator::Gte, 18))
            .unwrap()
            .apply(
                Logical::And,
                Condition::nested(|q| {
                    q.where_("active", true)?;
                    Ok(())
                }),
            )
            .unwrap();
        assert_eq!(
            q.render(),
            "users.id = ? OR users.age >= ? AND (users.active = ?)"
        );
    }
}
