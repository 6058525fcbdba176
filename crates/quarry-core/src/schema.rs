//! Schema descriptions used to validate predicate operands.
//!
//! A [`Schema`] maps table names to column names to a [`ColumnType`]. Query
//! builders only reach it through the read-only [`TypeOracle`] interface, so
//! any other schema representation can be plugged in by implementing that
//! trait.
//!
//! Schemas can be built in code or deserialized from JSON:
//!
//! ```rust
//! use quarry_core::schema::{ColumnType, Schema, TypeOracle};
//!
//! let schema = Schema::from_json(r#"{
//!     "users": {
//!         "id": "number",
//!         "name": "string",
//!         "deleted_at": { "optional": "date" }
//!     }
//! }"#).unwrap();
//!
//! assert_eq!(schema.resolve("users.deleted_at"), Some(&ColumnType::Date));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::SqlValue;

/// Declared type of a schema column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Text column.
    String,
    /// Integer or floating point column.
    Number,
    /// Boolean column.
    Boolean,
    /// Date/time column.
    Date,
    /// List column.
    Array,
    /// Nested object shape.
    Object(BTreeMap<String, ColumnType>),
    /// Nullable column.
    Optional(Box<ColumnType>),
    /// Column accepting any of several types.
    Union(Vec<ColumnType>),
}

impl ColumnType {
    /// Wraps a type as optional.
    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Strips one level of optional wrapping.
    #[must_use]
    pub fn unwrap_optional(&self) -> &Self {
        match self {
            Self::Optional(inner) => inner,
            other => other,
        }
    }

    /// Returns whether a runtime value is assignable to this type.
    #[must_use]
    pub fn accepts(&self, value: &SqlValue) -> bool {
        match (self, value) {
            (Self::Optional(_), SqlValue::Null) => true,
            (Self::Optional(inner), value) => inner.accepts(value),
            (Self::Union(branches), value) => branches.iter().any(|b| b.accepts(value)),
            (Self::String, SqlValue::Text(_))
            | (Self::Number, SqlValue::Int(_) | SqlValue::Float(_))
            | (Self::Boolean, SqlValue::Bool(_))
            | (Self::Date, SqlValue::Date(_))
            | (Self::Array, SqlValue::Array(_)) => true,
            _ => false,
        }
    }

    /// Returns whether values of two declared types can be compared.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        match (self.unwrap_optional(), other.unwrap_optional()) {
            (Self::Union(branches), other) | (other, Self::Union(branches)) => {
                branches.iter().any(|b| b.overlaps(other))
            }
            (Self::Object(_), Self::Object(_)) => true,
            (left, right) => left == right,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::Date => write!(f, "date"),
            Self::Array => write!(f, "array"),
            Self::Object(_) => write!(f, "object"),
            Self::Optional(inner) => write!(f, "optional<{inner}>"),
            Self::Union(branches) => {
                let names: Vec<String> = branches.iter().map(ToString::to_string).collect();
                write!(f, "{}", names.join(" | "))
            }
        }
    }
}

/// Read-only type lookup used by query builders in strict mode.
pub trait TypeOracle: fmt::Debug + Send + Sync {
    /// Resolves a dotted `table.column` path to its declared type, with one
    /// level of optional wrapping removed.
    fn resolve(&self, path: &str) -> Option<&ColumnType>;

    /// Returns the type declared at `path` exactly as written, optional
    /// wrapping included.
    fn declared(&self, path: &str) -> Option<&ColumnType> {
        self.resolve(path)
    }

    /// Returns whether `value` is assignable to the column at `path`.
    ///
    /// Unknown paths are never compatible.
    fn is_compatible(&self, path: &str, value: &SqlValue) -> bool;
}

/// A table-to-column type mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    tables: BTreeMap<String, BTreeMap<String, ColumnType>>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a table definition.
    #[must_use]
    pub fn table<I, K>(mut self, name: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = (K, ColumnType)>,
        K: Into<String>,
    {
        self.tables.insert(
            String::from(name),
            columns.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        );
        self
    }

    /// Parses a schema from its JSON description.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or names an unknown type.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Returns whether the schema declares `table`.
    #[must_use]
    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Returns the columns declared for `table`.
    #[must_use]
    pub fn columns(&self, table: &str) -> Option<&BTreeMap<String, ColumnType>> {
        self.tables.get(table)
    }

    /// Looks up the declared type at `path` without unwrapping it.
    fn lookup(&self, path: &str) -> Option<&ColumnType> {
        let mut segments = path.split('.');
        let columns = self.tables.get(segments.next()?)?;
        let mut current = columns.get(segments.next()?)?;

        for segment in segments {
            match current.unwrap_optional() {
                ColumnType::Object(fields) => current = fields.get(segment)?,
                _ => return None,
            }
        }

        Some(current)
    }
}

impl TypeOracle for Schema {
    fn resolve(&self, path: &str) -> Option<&ColumnType> {
        self.lookup(path).map(ColumnType::unwrap_optional)
    }

    fn declared(&self, path: &str) -> Option<&ColumnType> {
        self.lookup(path)
    }

    fn is_compatible(&self, path: &str, value: &SqlValue) -> bool {
        self.lookup(path).is_some_and(|ty| ty.accepts(value))
    }
}

/// Returns the referenced column if `value` denotes another column.
///
/// Only dotted identifier paths such as `roles.user_id` qualify. Without an
/// oracle any such path is a reference. With one, it must resolve to a
/// declared column.
#[must_use]
pub fn column_reference<'v>(value: &'v SqlValue, oracle: Option<&dyn TypeOracle>) -> Option<&'v str> {
    let text = value.as_text()?;
    if !text.contains('.') || !text.split('.').all(is_identifier) {
        return None;
    }

    match oracle {
        Some(oracle) if oracle.resolve(text).is_none() => None,
        _ => Some(text),
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ToSqlValue;

    fn schema() -> Schema {
        Schema::new()
            .table(
                "users",
                [
                    ("id", ColumnType::Number),
                    ("name", ColumnType::String),
                    ("deleted_at", ColumnType::optional(ColumnType::Date)),
                    (
                        "created_at",
                        ColumnType::Union(vec![ColumnType::Date, ColumnType::String]),
                    ),
                    ("tags", ColumnType::Array),
                    (
                        "profile",
                        ColumnType::Object(BTreeMap::from([(
                            String::from("city"),
                            ColumnType::String,
                        )])),
                    ),
                ],
            )
            .table("roles", [("user_id", ColumnType::Number)])
    }

    #[test]
    fn test_resolve_paths() {
        let schema = schema();
        assert_eq!(schema.resolve("users.id"), Some(&ColumnType::Number));
        assert_eq!(schema.resolve("users.deleted_at"), Some(&ColumnType::Date));
        assert_eq!(schema.resolve("users.profile.city"), Some(&ColumnType::String));
        assert_eq!(schema.resolve("users.missing"), None);
        assert_eq!(schema.resolve("users.name.city"), None);
        assert_eq!(schema.resolve("posts.id"), None);
        assert_eq!(schema.resolve("users"), None);
        assert_eq!(
            schema.declared("users.deleted_at"),
            Some(&ColumnType::optional(ColumnType::Date))
        );
        assert_eq!(schema.declared("users.id"), Some(&ColumnType::Number));
        assert_eq!(schema.declared("users.missing"), None);
    }

    #[test]
    fn test_is_compatible() {
        let schema = schema();
        assert!(schema.is_compatible("users.id", &42_i32.to_sql_value()));
        assert!(schema.is_compatible("users.id", &1.5_f64.to_sql_value()));
        assert!(!schema.is_compatible("users.id", &"abc".to_sql_value()));
        assert!(!schema.is_compatible("users.name", &SqlValue::Null));
        assert!(schema.is_compatible("users.deleted_at", &SqlValue::Null));
        assert!(schema.is_compatible("users.created_at", &"2024-01-01".to_sql_value()));
        assert!(!schema.is_compatible("users.created_at", &true.to_sql_value()));
        assert!(schema.is_compatible("users.tags", &vec!["a", "b"].to_sql_value()));
        assert!(!schema.is_compatible("users.missing", &1_i32.to_sql_value()));
    }

    #[test]
    fn test_overlaps() {
        assert!(ColumnType::Number.overlaps(&ColumnType::optional(ColumnType::Number)));
        assert!(ColumnType::Union(vec![ColumnType::Date, ColumnType::String])
            .overlaps(&ColumnType::String));
        assert!(!ColumnType::Number.overlaps(&ColumnType::String));
    }

    #[test]
    fn test_column_reference() {
        let schema = schema();
        let reference = "roles.user_id".to_sql_value();
        let literal = "example.com".to_sql_value();

        assert_eq!(column_reference(&reference, None), Some("roles.user_id"));
        assert_eq!(column_reference(&literal, None), Some("example.com"));
        assert_eq!(column_reference(&reference, Some(&schema)), Some("roles.user_id"));
        assert_eq!(column_reference(&literal, Some(&schema)), None);
        assert_eq!(column_reference(&42_i32.to_sql_value(), None), None);
        assert_eq!(column_reference(&"example.com/?q=1".to_sql_value(), None), None);
        assert_eq!(column_reference(&"3.14".to_sql_value(), None), None);
        assert_eq!(column_reference(&"users.".to_sql_value(), None), None);
        assert_eq!(column_reference(&"jane doe.x".to_sql_value(), None), None);
    }

    #[test]
    fn test_schema_from_json() {
        let schema = Schema::from_json(
            r#"{
                "users": {
                    "id": "number",
                    "created_at": { "union": ["date", "string"] },
                    "profile": { "object": { "city": "string" } }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(schema.resolve("users.id"), Some(&ColumnType::Number));
        assert_eq!(schema.resolve("users.profile.city"), Some(&ColumnType::String));
        assert_eq!(
            schema.resolve("users.created_at").map(ToString::to_string),
            Some(String::from("date | string"))
        );
    }
}
