//! Builds a few blog queries, prints their SQL and runs them on SQLite.
//!
//! ```sh
//! cargo run -p quarry-sqlite --example blog_queries
//! DATABASE_URL=sqlite://blog.db?mode=rwc cargo run -p quarry-sqlite --example blog_queries
//! ```

use std::sync::Arc;

use quarry_core::{ColumnType, Executor, Model, Operator, QueryBuilder, Schema, TypeOracle};
use quarry_sqlite::{SqliteConfig, SqliteExecutor};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const SETUP: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS posts (id INTEGER PRIMARY KEY, author_id INTEGER NOT NULL, \
     title TEXT NOT NULL, views INTEGER NOT NULL DEFAULT 0, published_at TEXT)",
    "CREATE TABLE IF NOT EXISTS authors (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
    "INSERT INTO authors (id, name) VALUES (1, 'Ada'), (2, 'Linus') ON CONFLICT DO NOTHING",
    "INSERT INTO posts (id, author_id, title, views, published_at) VALUES \
     (1, 1, 'Notes on engines', 120, '2024-01-10 08:00:00'), \
     (2, 2, 'Why kernels', 950, '2024-02-03 10:30:00'), \
     (3, 1, 'Draft', 0, NULL) ON CONFLICT DO NOTHING",
];

fn schema() -> Schema {
    Schema::new()
        .table(
            "posts",
            [
                ("id", ColumnType::Number),
                ("author_id", ColumnType::Number),
                ("title", ColumnType::String),
                ("views", ColumnType::Number),
                ("published_at", ColumnType::optional(ColumnType::Date)),
            ],
        )
        .table("authors", [("id", ColumnType::Number), ("name", ColumnType::String)])
}

struct Post;

impl Model for Post {
    fn schema() -> Option<Arc<dyn TypeOracle>> {
        Some(Arc::new(schema()))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = SqliteConfig::from_env().max_connections(1);
    let executor: Arc<dyn Executor> = Arc::new({
        let executor = SqliteExecutor::connect(&config).await?;
        for statement in SETUP {
            sqlx::query(statement).execute(executor.pool()).await?;
        }
        executor
    });

    let mut popular = Post::where_op("views", Operator::Gte, 100)?.with_executor(executor.clone());
    popular
        .select(["title", "views", "authors.name"])
        .join("authors", ("id", "posts", "author_id"))?
        .where_not_null("published_at")?
        .desc("views");

    info!(sql = %popular.query(), "popular posts");
    info!(sql = %popular.sql()?, "inlined");
    for row in popular.all().await? {
        info!(?row, "row");
    }

    match Post::where_("views", "lots") {
        Ok(_) => info!("unexpected: the schema accepted text for a number column"),
        Err(err) => info!(%err, "rejected by the schema"),
    }

    let mut drafts = QueryBuilder::new("posts").with_executor(executor);
    drafts.select("title").where_null("published_at")?;
    let first = drafts.first().await?;
    info!(?first, "first draft");

    Ok(())
}
