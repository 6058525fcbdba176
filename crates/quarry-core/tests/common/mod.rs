#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use quarry_core::{
    BoxFuture, CompiledQuery, Executor, QueryBuilder, QueryResult, Result, Row, Schema,
};

pub fn shop_schema() -> Schema {
    Schema::from_json(
        r#"{
            "users": {
                "id": "number",
                "name": "string",
                "email": { "optional": "string" },
                "created_at": { "union": ["date", "string"] },
                "deleted_at": { "optional": "date" },
                "tags": "array",
                "profile": { "object": { "city": "string", "zip": "number" } }
            },
            "roles": {
                "id": "number",
                "user_id": "number",
                "label": "string"
            },
            "categories": {
                "id": "number",
                "name": "string"
            }
        }"#,
    )
    .unwrap_or_else(|e| panic!("invalid fixture schema: {e}"))
}

pub fn strict(table: &str) -> QueryBuilder {
    QueryBuilder::with_oracle(table, Some(Arc::new(shop_schema())))
}

pub fn row(value: serde_json::Value) -> Row {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected an object, got {other:?}"),
    }
}

/// Executor returning canned rows and recording every query it receives.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    rows: Vec<Row>,
    seen: Mutex<Vec<CompiledQuery>>,
}

impl RecordingExecutor {
    pub fn returning(rows: Vec<Row>) -> Arc<Self> {
        Arc::new(Self {
            rows,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn seen(&self) -> Vec<CompiledQuery> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

impl Executor for RecordingExecutor {
    fn execute<'a>(&'a self, query: CompiledQuery) -> BoxFuture<'a, Result<QueryResult>> {
        Box::pin(async move {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(query);
            }
            Ok(QueryResult {
                success: true,
                rows_read: self.rows.len() as u64,
                results: self.rows.clone(),
                ..QueryResult::default()
            })
        })
    }
}
