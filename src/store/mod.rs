//! Data store: the CRUD surface the executors run against.
//!
//! Rows are untyped JSON objects keyed by column name. Every executor query
//! carries an explicit `user_id` filter; adapters never add one implicitly.
//!
//! Two adapters ship with the crate:
//! - `rest`: PostgREST over HTTP (the hosted database, row-level security
//!   enforced by the caller's bearer token)
//! - `sqlite`: embedded `rusqlite` database for local runs and tests

pub mod errors;
pub mod rest;
pub mod schema;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

pub use errors::StoreError;
pub use rest::{PostgrestProvider, PostgrestStore};
pub use sqlite::SqliteStore;

/// A single row, keyed by column name.
pub type Row = serde_json::Map<String, Value>;

// ─── Tables ─────────────────────────────────────────────────────────────────

/// Tables the dispatcher reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Shifts,
    Jobs,
    Goals,
    Contacts,
    UserSettings,
    ChatMessages,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Shifts,
        Table::Jobs,
        Table::Goals,
        Table::Contacts,
        Table::UserSettings,
        Table::ChatMessages,
    ];

    /// Physical table name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Shifts => "shifts",
            Table::Jobs => "jobs",
            Table::Goals => "goals",
            Table::Contacts => "event_contacts",
            Table::UserSettings => "user_settings",
            Table::ChatMessages => "chat_messages",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Queries ────────────────────────────────────────────────────────────────

/// A row predicate. All filters in a query are AND-ed.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Gte(String, Value),
    Lte(String, Value),
    /// Case-insensitive substring match.
    ILike(String, String),
    IsNull(String),
    NotNull(String),
    In(String, Vec<Value>),
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _)
            | Filter::Gte(c, _)
            | Filter::Lte(c, _)
            | Filter::ILike(c, _)
            | Filter::IsNull(c)
            | Filter::NotNull(c)
            | Filter::In(c, _) => c,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A filtered, ordered, optionally limited selection on one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn table(table: Table) -> Self {
        Self {
            table,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.into()));
        self
    }

    pub fn gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Gte(column.to_string(), value.into()));
        self
    }

    pub fn lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Lte(column.to_string(), value.into()));
        self
    }

    pub fn ilike(mut self, column: &str, needle: &str) -> Self {
        self.filters
            .push(Filter::ILike(column.to_string(), needle.to_string()));
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.filters.push(Filter::IsNull(column.to_string()));
        self
    }

    pub fn not_null(mut self, column: &str) -> Self {
        self.filters.push(Filter::NotNull(column.to_string()));
        self
    }

    pub fn is_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.filters.push(Filter::In(column.to_string(), values));
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}

// ─── Store traits ───────────────────────────────────────────────────────────

/// CRUD operations over per-user rows.
///
/// `update` and `delete` return the affected rows so callers can report
/// counts and totals without a second round trip.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, StoreError>;

    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError>;

    async fn update(&self, query: &Query, patch: &Row) -> Result<Vec<Row>, StoreError>;

    async fn delete(&self, query: &Query) -> Result<Vec<Row>, StoreError>;
}

/// Hands out a store handle bound to one caller's credential.
pub trait StoreProvider: Send + Sync {
    fn for_user_token(&self, token: &str) -> Arc<dyn DataStore>;
}

/// Provider for stores that need no per-caller credential (embedded SQLite).
pub struct SharedStore(pub Arc<dyn DataStore>);

impl StoreProvider for SharedStore {
    fn for_user_token(&self, _token: &str) -> Arc<dyn DataStore> {
        Arc::clone(&self.0)
    }
}

// ─── Row accessors ──────────────────────────────────────────────────────────

/// Numeric column value; null, missing, or non-numeric reads as zero.
pub fn num(row: &Row, column: &str) -> f64 {
    match row.get(column) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Numeric column value, `None` when null or missing.
pub fn opt_num(row: &Row, column: &str) -> Option<f64> {
    match row.get(column) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

pub fn text<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.get(column).and_then(Value::as_str)
}

pub fn flag(row: &Row, column: &str) -> bool {
    match row.get(column) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
        _ => false,
    }
}
