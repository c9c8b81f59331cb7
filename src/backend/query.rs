//! Row query builder shared by all data backends.
//!
//! A chain is assembled with [`QueryBuilder`] and executed exactly once, when
//! it is awaited. `insert` is the exception: it runs as soon as it is called
//! and hands back an [`InsertBuilder`] to read the stored row.

use crate::entities::Row;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use tokio::task::JoinHandle;

/// Row-oriented data access.
#[async_trait]
pub trait DataApi: Send + Sync {
    /// Starts a chain against `table`.
    fn from(&self, table: &str) -> QueryBuilder<'_>;

    /// Inserts `row` immediately. The returned builder yields the stored
    /// row(s), including backend-generated columns.
    fn insert(&self, table: &str, row: Row) -> InsertBuilder;

    /// Runs an assembled select or delete.
    async fn execute(&self, query: Query) -> Result<QueryResponse>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueryKind {
    #[default]
    Select,
    Delete,
}

/// Equality predicate on one column.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.column) == Some(&self.value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

/// Options for [`QueryBuilder::order`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderOptions {
    pub ascending: bool,
}

impl Default for OrderOptions {
    fn default() -> Self {
        Self { ascending: true }
    }
}

impl OrderOptions {
    #[must_use]
    pub const fn descending() -> Self {
        Self { ascending: false }
    }
}

/// Fully assembled query handed to [`DataApi::execute`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub table: String,
    pub kind: QueryKind,
    /// ANDed, applied in order
    pub filters: Vec<Filter>,
    /// First entry is the primary sort key; ignored for deletes
    pub order: Vec<OrderBy>,
    /// Rows captured when the chain was started, for backends that read
    /// from a local copy.
    pub snapshot: Option<Vec<Row>>,
}

impl Query {
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|filter| filter.matches(row))
    }

    /// Filters and sorts `rows` according to this query.
    #[must_use]
    pub fn apply(&self, rows: Vec<Row>) -> Vec<Row> {
        let mut rows: Vec<Row> = rows.into_iter().filter(|row| self.matches(row)).collect();
        if self.order.is_empty() {
            return rows;
        }
        // sort_by is stable, so rows tied on every key keep insertion order
        rows.sort_by(|a, b| {
            self.order.iter().fold(Ordering::Equal, |ordering, order| {
                ordering.then_with(|| {
                    let by_column = compare_values(a.get(&order.column), b.get(&order.column));
                    if order.ascending {
                        by_column
                    } else {
                        by_column.reverse()
                    }
                })
            })
        });
        rows
    }
}

/// Total order over JSON column values.
///
/// Missing and null values sort after everything else in ascending order, as
/// Postgres does by default. Values of different kinds are ranked by kind.
#[must_use]
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            Some(Value::Bool(_)) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(Value::Array(_)) => 3,
            Some(Value::Object(_)) => 4,
            Some(Value::Null) | None => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x @ (Value::Array(_) | Value::Object(_))), Some(y)) if rank(Some(x)) == rank(Some(y)) => {
            x.to_string().cmp(&y.to_string())
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Result of an executed chain.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResponse {
    /// Matching rows for a select; empty for a delete
    pub data: Vec<Row>,
    /// Number of rows removed by a delete
    pub count: Option<usize>,
}

/// Deferred select/delete chain.
pub struct QueryBuilder<'a> {
    api: &'a dyn DataApi,
    query: Query,
}

impl<'a> QueryBuilder<'a> {
    /// Chain that reads live data at execution time.
    #[must_use]
    pub fn new(api: &'a dyn DataApi, table: &str) -> Self {
        Self {
            api,
            query: Query {
                table: table.to_string(),
                ..Query::default()
            },
        }
    }

    /// Chain whose reads see `rows` instead of the live table.
    #[must_use]
    pub fn with_snapshot(api: &'a dyn DataApi, table: &str, rows: Vec<Row>) -> Self {
        let mut builder = Self::new(api, table);
        builder.query.snapshot = Some(rows);
        builder
    }

    #[must_use]
    pub fn select(mut self) -> Self {
        self.query.kind = QueryKind::Select;
        self
    }

    #[must_use]
    pub fn delete(mut self) -> Self {
        self.query.kind = QueryKind::Delete;
        self
    }

    #[must_use]
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.query.filters.push(Filter {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    /// Adds a sort key. The first call is the primary key, later calls break
    /// ties.
    #[must_use]
    pub fn order(mut self, column: &str, options: OrderOptions) -> Self {
        self.query.order.push(OrderBy {
            column: column.to_string(),
            ascending: options.ascending,
        });
        self
    }

    /// Inserts immediately into the chain's table.
    pub fn insert(self, row: Row) -> InsertBuilder {
        self.api.insert(&self.query.table, row)
    }

}

impl<'a> IntoFuture for QueryBuilder<'a> {
    type Output = Result<QueryResponse>;
    type IntoFuture = Pin<Box<dyn Future<Output = Result<QueryResponse>> + Send + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        self.api.execute(self.query)
    }
}

enum InsertOutcome {
    Ready(Result<Vec<Row>>),
    Spawned(JoinHandle<Result<Vec<Row>>>),
}

/// Handle on an insert that has already been started.
pub struct InsertBuilder {
    outcome: InsertOutcome,
}

impl InsertBuilder {
    /// Insert that completed synchronously.
    #[must_use]
    pub const fn ready(result: Result<Vec<Row>>) -> Self {
        Self {
            outcome: InsertOutcome::Ready(result),
        }
    }

    /// Insert running on the runtime.
    #[must_use]
    pub const fn spawned(handle: JoinHandle<Result<Vec<Row>>>) -> Self {
        Self {
            outcome: InsertOutcome::Spawned(handle),
        }
    }

    /// Asks for the stored representation back.
    #[must_use]
    pub const fn select(self) -> Self {
        self
    }

    /// Waits for the insert and returns every stored row.
    pub async fn rows(self) -> Result<Vec<Row>> {
        match self.outcome {
            InsertOutcome::Ready(result) => result,
            InsertOutcome::Spawned(handle) => handle.await?,
        }
    }

    /// Waits for the insert and returns its only row.
    ///
    /// # Errors
    /// Fails if the insert failed or did not produce exactly one row.
    pub async fn single(self) -> Result<Row> {
        let mut rows = self.rows().await?;
        match rows.len() {
            1 => Ok(rows.remove(0)),
            0 => Err(Error::NotFound {
                what: "inserted row".to_string(),
            }),
            n => Err(Error::Validation {
                message: format!("expected a single row, got {n}"),
            }),
        }
    }
}
