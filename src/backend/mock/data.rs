//! Volatile table store behind the mock query builder.

use crate::backend::query::{Query, QueryKind, QueryResponse};
use crate::entities::Row;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};
use uuid::Uuid;

/// Named, insertion-ordered tables created on first access.
#[derive(Default)]
pub struct MockDatabase {
    tables: Mutex<HashMap<String, Vec<Row>>>,
}

impl MockDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of `table` as it is now. Creates the table if needed.
    #[must_use]
    pub fn snapshot(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(table.to_string())
            .or_default()
            .clone()
    }

    /// Appends `row` with a fresh `id` and `created_at`, returning the stored
    /// row.
    pub fn insert(&self, table: &str, mut row: Row) -> Row {
        row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        row.insert(
            "created_at".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        debug!("Inserted row into mock table '{}'", table);
        row
    }

    /// Runs a select against the query's snapshot (or the live table when it
    /// carries none), or a delete against the live table.
    #[must_use]
    pub fn execute(&self, query: Query) -> QueryResponse {
        match query.kind {
            QueryKind::Select => {
                let rows = match &query.snapshot {
                    Some(rows) => rows.clone(),
                    None => self.snapshot(&query.table),
                };
                let data = query.apply(rows);
                debug!(
                    "Mock select on '{}' returned {} rows",
                    query.table,
                    data.len()
                );
                QueryResponse { data, count: None }
            }
            QueryKind::Delete => {
                let removed = self.delete_matching(&query);
                QueryResponse {
                    data: Vec::new(),
                    count: Some(removed),
                }
            }
        }
    }

    fn delete_matching(&self, query: &Query) -> usize {
        if query.filters.is_empty() {
            warn!(
                "Refusing unfiltered delete on mock table '{}'",
                query.table
            );
            return 0;
        }
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let rows = tables.entry(query.table.clone()).or_default();
        let before = rows.len();
        rows.retain(|row| !query.matches(row));
        let removed = before - rows.len();
        debug!("Mock delete on '{}' removed {} rows", query.table, removed);
        removed
    }
}
