//! Column name resolution.
//!
//! Bare column names are qualified with their owning table, explicit
//! `table.column` names pass through, and projected columns get a
//! `table_column` alias so joined tables never collide in a result row.

/// Returns whether `name` is an explicit `table.column` reference.
#[must_use]
pub fn is_qualified(name: &str) -> bool {
    name.contains('.')
}

/// Qualifies a bare column name with `table`.
///
/// ```rust
/// use quarry_core::column::qualify;
///
/// assert_eq!(qualify("id", "users"), "users.id");
/// assert_eq!(qualify("roles.id", "users"), "roles.id");
/// ```
#[must_use]
pub fn qualify(name: &str, table: &str) -> String {
    if is_qualified(name) {
        String::from(name)
    } else {
        format!("{table}.{name}")
    }
}

/// Returns the singular alias root of a table name (`users` -> `user`).
#[must_use]
pub fn alias_root(table: &str) -> String {
    pluralizer::pluralize(table, 1, false)
}

/// Resolves a projected column.
///
/// Columns carrying an explicit ` AS ` clause are kept untouched. Dotted
/// columns are aliased as `<singular table>_<column>`. Bare columns are
/// kept as-is unless the query joins other tables, in which case they are
/// qualified with `base_table` and aliased the same way.
#[must_use]
pub fn select_column(column: &str, base_table: &str, has_join: bool) -> String {
    if column.to_lowercase().contains(" as ") {
        return String::from(column);
    }

    match column.split_once('.') {
        Some((table, name)) => aliased(table, name),
        None if has_join => aliased(base_table, column),
        None => String::from(column),
    }
}

fn aliased(table: &str, name: &str) -> String {
    format!("{table}.{name} AS {}_{name}", alias_root(table))
}

/// Resolves a list of projected columns, dropping duplicates while keeping
/// first-seen order.
#[must_use]
pub fn projection(columns: &[String], base_table: &str, has_join: bool) -> Vec<String> {
    let mut resolved: Vec<String> = Vec::with_capacity(columns.len());
    for column in columns {
        let column = select_column(column, base_table, has_join);
        if !resolved.contains(&column) {
            resolved.push(column);
        }
    }
    resolved
}

/// Resolves an ORDER BY column: qualified with `base_table` only when the
/// query joins other tables.
#[must_use]
pub fn order_column(column: &str, base_table: &str, has_join: bool) -> String {
    if has_join {
        qualify(column, base_table)
    } else {
        String::from(column)
    }
}
