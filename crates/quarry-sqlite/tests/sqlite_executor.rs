//! Integration tests running quarry builders against in-memory SQLite.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use quarry_core::{CompiledQuery, Executor, Operator, QueryBuilder, QueryError, SqlValue, ToSqlValue};
use quarry_sqlite::{SqliteConfig, SqliteExecutor};
use serde::Deserialize;
use serde_json::json;

async fn blog() -> Arc<SqliteExecutor> {
    let config = SqliteConfig::new("sqlite::memory:").max_connections(1);
    let executor = SqliteExecutor::connect(&config).await.unwrap();

    for statement in [
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT, \
         score REAL, avatar BLOB, created_at TEXT)",
        "CREATE TABLE roles (id INTEGER PRIMARY KEY, user_id INTEGER NOT NULL, label TEXT NOT NULL)",
        "INSERT INTO users (name, email, score, avatar, created_at) VALUES \
         ('Ann', 'ann@example.com', 4.5, X'0102', '2024-01-01 09:00:00'), \
         ('Bob', NULL, 3.0, NULL, '2024-02-01 09:00:00'), \
         ('Cid', 'cid@example.com', NULL, NULL, '2024-03-01 09:00:00')",
        "INSERT INTO roles (user_id, label) VALUES (1, 'admin'), (2, 'editor'), (1, 'editor')",
    ] {
        sqlx::query(statement).execute(executor.pool()).await.unwrap();
    }

    Arc::new(executor)
}

fn users(executor: &Arc<SqliteExecutor>) -> QueryBuilder {
    QueryBuilder::new("users").with_executor(executor.clone())
}

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: i64,
    name: String,
    email: Option<String>,
}

#[tokio::test]
async fn test_all_rows_as_json() {
    let executor = blog().await;
    let mut qb = users(&executor);
    qb.select(["id", "name", "score", "avatar", "email"]).asc("id");

    let rows = qb.all().await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["name"], json!("Ann"));
    assert_eq!(rows[0]["score"], json!(4.5));
    assert_eq!(rows[0]["avatar"], json!([1, 2]));
    assert_eq!(rows[1]["email"], json!(null));
    assert_eq!(rows[2]["score"], json!(null));
}

#[tokio::test]
async fn test_typed_rows() {
    let executor = blog().await;
    let mut qb = users(&executor);
    qb.select(["id", "name", "email"])
        .where_in("name", ["Ann", "Bob"])
        .unwrap()
        .desc("id");

    let found: Vec<User> = qb.all_as().await.unwrap();
    assert_eq!(
        found,
        vec![
            User { id: 2, name: String::from("Bob"), email: None },
            User { id: 1, name: String::from("Ann"), email: Some(String::from("ann@example.com")) },
        ]
    );
}

#[tokio::test]
async fn test_first_returns_none_when_empty() {
    let executor = blog().await;
    let mut qb = users(&executor);
    qb.where_("name", "Nobody").unwrap();
    assert!(qb.first().await.unwrap().is_none());
}

#[tokio::test]
async fn test_nested_groups_and_pagination() {
    let executor = blog().await;
    let mut qb = users(&executor);
    qb.select("name")
        .where_group(|q| {
            q.where_op("name", Operator::Like, "A%")?
                .or_where_op("name", Operator::Like, "C%")?;
            Ok(())
        })
        .unwrap()
        .where_not_null("email")
        .unwrap()
        .asc("name")
        .limit(1)
        .offset(1);

    let rows = qb.all().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], json!("Cid"));
}

#[tokio::test]
async fn test_join_with_aliases() {
    let executor = blog().await;
    let mut qb = users(&executor);
    qb.select(["name", "roles.label"])
        .join("roles", ("user_id", "users", "id"))
        .unwrap()
        .where_("roles.label", "editor")
        .unwrap()
        .asc("id");

    let rows = qb.all().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["user_name"], json!("Ann"));
    assert_eq!(rows[0]["role_label"], json!("editor"));
    assert_eq!(rows[1]["user_name"], json!("Bob"));
}

#[tokio::test]
async fn test_join_value_binding_order() {
    let executor = blog().await;
    let mut qb = users(&executor);
    qb.select("name")
        .where_op("id", Operator::Lte, 2)
        .unwrap()
        .join_group("roles", |j| {
            j.where_("user_id", "users.id")?.where_("label", "admin")?;
            Ok(())
        })
        .unwrap();

    let rows = qb.all().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["user_name"], json!("Ann"));
}

#[tokio::test]
async fn test_dates_bind_as_text() {
    let executor = blog().await;
    let since = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
    let mut qb = users(&executor);
    qb.select("name").where_op("created_at", Operator::Gt, since).unwrap().asc("created_at");

    let names: Vec<_> = qb
        .all()
        .await
        .unwrap()
        .into_iter()
        .map(|row| row["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("Bob"), json!("Cid")]);
}

#[tokio::test]
async fn test_write_statements_report_changes() {
    let executor = blog().await;

    let insert = CompiledQuery {
        sql: String::from("INSERT INTO users (name, email) VALUES (?, ?)"),
        args: vec!["Dee".to_sql_value(), SqlValue::Null],
        table: String::from("users"),
    };
    let result = executor.execute(insert).await.unwrap();
    assert!(result.success);
    assert_eq!(result.changes, 1);
    assert_eq!(result.last_id, Some(4));
    assert!(result.duration.is_some());

    let update = CompiledQuery {
        sql: String::from("UPDATE roles SET label = ? WHERE label = ?"),
        args: vec!["writer".to_sql_value(), "editor".to_sql_value()],
        table: String::from("roles"),
    };
    assert_eq!(executor.execute(update).await.unwrap().changes, 2);
}

#[tokio::test]
async fn test_sql_errors_are_wrapped() {
    let executor = blog().await;
    let qb = QueryBuilder::new("missing_table").with_executor(executor);
    assert!(matches!(qb.run().await, Err(QueryError::Executor(_))));
}

#[tokio::test]
async fn test_connect_failure() {
    let config = SqliteConfig::new("sqlite:///nonexistent-dir/quarry.db?mode=ro");
    assert!(matches!(
        SqliteExecutor::connect(&config).await,
        Err(QueryError::Executor(_))
    ));
}
