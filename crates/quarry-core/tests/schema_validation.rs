//! Strict-mode tests: predicates checked against a declared schema.

mod common;

use chrono::{TimeZone, Utc};
use common::strict;
use quarry_core::{ColumnType, Operator, QueryError, SqlValue};

#[test]
fn test_rejected_comparison_leaves_builder_empty() {
    let mut qb = strict("users");
    let err = qb.where_("id", "abc").unwrap_err();

    assert_eq!(
        err.to_string(),
        "Table column 'users.id' of type 'number' is not assignable as type of 'string'"
    );
    assert_eq!(qb.wheres().len(), 0);
    assert_eq!(qb.query(), "SELECT * FROM users");
}

#[test]
fn test_unknown_column() {
    let mut qb = strict("users");
    let err = qb.where_("nickname", "Al").unwrap_err();
    assert_eq!(err.to_string(), "Table column 'users.nickname' doesn't exist");

    assert!(matches!(
        qb.where_not_null("profile.street"),
        Err(QueryError::UnknownColumn(_))
    ));
    assert!(matches!(
        qb.where_("users.profile.street", "x"),
        Err(QueryError::UnknownColumn(ref c)) if c == "users.profile.street"
    ));
}

#[test]
fn test_accepted_operands() {
    let date = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let mut qb = strict("users");
    qb.where_("id", 1)
        .unwrap()
        .where_op("id", Operator::Gt, 0.5)
        .unwrap()
        .where_("email", SqlValue::Null)
        .unwrap()
        .or_where("email", "a@b")
        .unwrap()
        .where_("created_at", date)
        .unwrap()
        .or_where("created_at", "yesterday")
        .unwrap()
        .where_("tags", vec!["x"])
        .unwrap()
        .where_("users.profile.zip", 12345)
        .unwrap()
        .where_null("deleted_at")
        .unwrap();
    assert_eq!(qb.wheres().len(), 9);
}

#[test]
fn test_null_requires_optional_column() {
    let mut qb = strict("users");
    assert!(matches!(
        qb.where_("name", SqlValue::Null),
        Err(QueryError::TypeMismatch { ref actual, .. }) if actual == "null"
    ));
    assert!(qb.where_("deleted_at", SqlValue::Null).is_ok());
}

#[test]
fn test_union_rejects_other_types() {
    let mut qb = strict("users");
    assert!(matches!(
        qb.where_("created_at", 5),
        Err(QueryError::TypeMismatch { ref expected, .. }) if expected == "date | string"
    ));
}

#[test]
fn test_membership_and_range_operands() {
    let mut qb = strict("users");
    assert!(qb.where_in("id", ["1", "2"]).is_err());
    assert!(qb.where_between("id", "a", "z").is_err());
    assert!(qb.wheres().is_empty());

    assert!(qb.where_in("name", Vec::<i64>::new()).is_ok());
    assert!(qb.where_in("missing", Vec::<i64>::new()).is_ok());
    assert!(qb.wheres().is_empty());

    qb.where_in("id", [1, 2]).unwrap().where_not_between("id", 5, 9).unwrap();
    assert_eq!(
        qb.query(),
        "SELECT * FROM users WHERE users.id IN (?, ?) AND users.id NOT BETWEEN ? AND ?"
    );
}

#[test]
fn test_dotted_literal_is_bound_in_strict_mode() {
    let mut qb = strict("users");
    qb.where_("name", "jane.doe").unwrap();
    assert_eq!(qb.query(), "SELECT * FROM users WHERE users.name = ?");
    assert_eq!(qb.args(), vec![SqlValue::Text(String::from("jane.doe"))]);
}

#[test]
fn test_column_reference_types_must_agree() {
    let mut qb = strict("roles");
    qb.where_("user_id", "users.id").unwrap();
    assert_eq!(qb.query(), "SELECT * FROM roles WHERE roles.user_id = users.id");
    assert!(qb.args().is_empty());

    assert!(matches!(
        qb.where_("user_id", "users.name"),
        Err(QueryError::TypeMismatch { ref expected, ref actual, .. })
            if expected == "number" && actual == "string"
    ));
}

#[test]
fn test_strict_joins() {
    let mut qb = strict("users");
    qb.join("roles", ("user_id", "users", "id")).unwrap();

    assert!(matches!(
        qb.left_join("categories", ("name", "users", "id")),
        Err(QueryError::TypeMismatch { .. })
    ));
    assert!(matches!(
        qb.left_join("categories", ("id", "users", "ghost")),
        Err(QueryError::UnknownColumn(ref c)) if c == "users.ghost"
    ));
    assert!(matches!(
        qb.left_join("categories", ("id", "abc")),
        Err(QueryError::TypeMismatch { .. })
    ));
    assert!(qb
        .left_join_group("categories", |j| {
            j.where_("title", "x")?;
            Ok(())
        })
        .is_err());

    assert_eq!(
        qb.query(),
        "SELECT * FROM users JOIN roles ON roles.user_id = users.id"
    );
}

#[test]
fn test_schema_types_display() {
    let schema = common::shop_schema();
    let columns = schema.columns("users").unwrap();
    assert_eq!(columns["email"], ColumnType::optional(ColumnType::String));
    assert_eq!(columns["email"].to_string(), "optional<string>");
    assert!(schema.has_table("roles"));
    assert!(!schema.has_table("goals"));
}
