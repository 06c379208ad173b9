//! Embedded SQLite adapter.
//!
//! Uses `rusqlite` synchronously behind a mutex; every trait method does its
//! work in a sync helper and never holds the lock across an await. Columns are
//! validated against [`schema`](super::schema) so a typo in an executor fails
//! loudly instead of silently matching nothing.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use serde_json::{Number, Value};

use super::schema::{self, Column, ColumnKind};
use super::{DataStore, Filter, Query, Row, StoreError, Table};

// ─── SqliteStore ────────────────────────────────────────────────────────────

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at the given path.
    ///
    /// Pass `":memory:"` for an in-memory database (tests).
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        if path != ":memory:" {
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        }

        for table in Table::ALL {
            conn.execute_batch(&schema::create_table_sql(table))?;
        }
        conn.execute_batch(
            "
            CREATE INDEX IF NOT EXISTS idx_shifts_user_date ON shifts(user_id, date);
            CREATE INDEX IF NOT EXISTS idx_jobs_user ON jobs(user_id);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_settings_user ON user_settings(user_id);
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|e| StoreError::Database {
            reason: format!("lock poisoned: {e}"),
        })
    }

    fn select_sync(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
        let cols = schema::columns(query.table);
        let (where_sql, params) = where_clause(query)?;

        let mut sql = format!(
            "SELECT {} FROM {}{where_sql}",
            column_list(&cols),
            query.table
        );
        if !query.order.is_empty() {
            let mut parts = Vec::with_capacity(query.order.len());
            for o in &query.order {
                check_column(query.table, &o.column)?;
                parts.push(format!(
                    "{} {}",
                    o.column,
                    if o.ascending { "ASC" } else { "DESC" }
                ));
            }
            sql.push_str(&format!(" ORDER BY {}", parts.join(", ")));
        }
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let conn = self.lock()?;
        run_returning(&conn, &sql, &params, &cols)
    }

    fn insert_sync(&self, table: Table, mut row: Row) -> Result<Row, StoreError> {
        let cols = schema::columns(table);
        let now = chrono::Utc::now().to_rfc3339();

        if !row.contains_key("id") {
            row.insert("id".into(), Value::String(uuid::Uuid::new_v4().to_string()));
        }
        for stamp in ["created_at", "updated_at"] {
            if cols.iter().any(|c| c.name == stamp) && !row.contains_key(stamp) {
                row.insert(stamp.into(), Value::String(now.clone()));
            }
        }

        let mut names = Vec::with_capacity(row.len());
        let mut params = Vec::with_capacity(row.len());
        for (name, value) in &row {
            let kind = check_column(table, name)?;
            names.push(name.as_str());
            params.push(to_sql(name, kind, value)?);
        }

        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({}) RETURNING {}",
            names.join(", "),
            vec!["?"; names.len()].join(", "),
            column_list(&cols)
        );

        let conn = self.lock()?;
        run_returning(&conn, &sql, &params, &cols)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Database {
                reason: format!("insert into {table} returned no row"),
            })
    }

    fn update_sync(&self, query: &Query, patch: &Row) -> Result<Vec<Row>, StoreError> {
        if patch.is_empty() {
            return self.select_sync(query);
        }

        let table = query.table;
        let cols = schema::columns(table);

        let mut sets = Vec::with_capacity(patch.len() + 1);
        let mut params = Vec::with_capacity(patch.len() + 1);
        for (name, value) in patch {
            let kind = check_column(table, name)?;
            sets.push(format!("{name} = ?"));
            params.push(to_sql(name, kind, value)?);
        }
        if cols.iter().any(|c| c.name == "updated_at") && !patch.contains_key("updated_at") {
            sets.push("updated_at = ?".to_string());
            params.push(SqlValue::Text(chrono::Utc::now().to_rfc3339()));
        }

        let (where_sql, where_params) = where_clause(query)?;
        params.extend(where_params);

        let sql = format!(
            "UPDATE {table} SET {}{where_sql} RETURNING {}",
            sets.join(", "),
            column_list(&cols)
        );

        let conn = self.lock()?;
        run_returning(&conn, &sql, &params, &cols)
    }

    fn delete_sync(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
        let cols = schema::columns(query.table);
        let (where_sql, params) = where_clause(query)?;
        let sql = format!(
            "DELETE FROM {}{where_sql} RETURNING {}",
            query.table,
            column_list(&cols)
        );

        let conn = self.lock()?;
        run_returning(&conn, &sql, &params, &cols)
    }
}

#[async_trait]
impl DataStore for SqliteStore {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
        self.select_sync(query)
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError> {
        self.insert_sync(table, row)
    }

    async fn update(&self, query: &Query, patch: &Row) -> Result<Vec<Row>, StoreError> {
        self.update_sync(query, patch)
    }

    async fn delete(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
        self.delete_sync(query)
    }
}

// ─── SQL building ───────────────────────────────────────────────────────────

fn column_list(cols: &[Column]) -> String {
    cols.iter().map(|c| c.name).collect::<Vec<_>>().join(", ")
}

fn check_column(table: Table, name: &str) -> Result<ColumnKind, StoreError> {
    schema::column_kind(table, name).ok_or_else(|| StoreError::UnknownColumn {
        table: table.to_string(),
        column: name.to_string(),
    })
}

fn where_clause(query: &Query) -> Result<(String, Vec<SqlValue>), StoreError> {
    if query.filters.is_empty() {
        return Ok((String::new(), Vec::new()));
    }

    let mut clauses = Vec::with_capacity(query.filters.len());
    let mut params = Vec::new();

    for filter in &query.filters {
        let column = filter.column();
        let kind = check_column(query.table, column)?;
        match filter {
            Filter::Eq(_, Value::Null) | Filter::IsNull(_) => {
                clauses.push(format!("{column} IS NULL"));
            }
            Filter::NotNull(_) => clauses.push(format!("{column} IS NOT NULL")),
            Filter::Eq(_, v) => {
                clauses.push(format!("{column} = ?"));
                params.push(to_sql(column, kind, v)?);
            }
            Filter::Gte(_, v) => {
                clauses.push(format!("{column} >= ?"));
                params.push(to_sql(column, kind, v)?);
            }
            Filter::Lte(_, v) => {
                clauses.push(format!("{column} <= ?"));
                params.push(to_sql(column, kind, v)?);
            }
            Filter::ILike(_, needle) => {
                clauses.push(format!("LOWER({column}) LIKE ? ESCAPE '\\'"));
                params.push(SqlValue::Text(format!(
                    "%{}%",
                    escape_like(&needle.to_lowercase())
                )));
            }
            Filter::In(_, values) => {
                if values.is_empty() {
                    clauses.push("0".to_string());
                } else {
                    clauses.push(format!(
                        "{column} IN ({})",
                        vec!["?"; values.len()].join(", ")
                    ));
                    for v in values {
                        params.push(to_sql(column, kind, v)?);
                    }
                }
            }
        }
    }

    Ok((format!(" WHERE {}", clauses.join(" AND ")), params))
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn run_returning(
    conn: &Connection,
    sql: &str,
    params: &[SqlValue],
    cols: &[Column],
) -> Result<Vec<Row>, StoreError> {
    tracing::trace!(sql = %sql, params = params.len(), "sqlite statement");

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), |r| {
        let mut row = Row::new();
        for (i, c) in cols.iter().enumerate() {
            let raw: SqlValue = r.get(i)?;
            row.insert(c.name.to_string(), from_sql(c.kind, raw));
        }
        Ok(row)
    })?;

    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

// ─── Value conversion ───────────────────────────────────────────────────────

fn to_sql(column: &str, kind: ColumnKind, value: &Value) -> Result<SqlValue, StoreError> {
    let invalid = |reason: &str| StoreError::InvalidValue {
        column: column.to_string(),
        reason: reason.to_string(),
    };

    Ok(match (kind, value) {
        (_, Value::Null) => SqlValue::Null,
        (ColumnKind::Text, Value::String(s)) => SqlValue::Text(s.clone()),
        (ColumnKind::Text, Value::Number(n)) => SqlValue::Text(n.to_string()),
        (ColumnKind::Real, Value::Number(n)) => {
            SqlValue::Real(n.as_f64().ok_or_else(|| invalid("not a finite number"))?)
        }
        (ColumnKind::Real, Value::String(s)) => SqlValue::Real(
            s.trim()
                .parse()
                .map_err(|_| invalid("expected a number"))?,
        ),
        (ColumnKind::Integer, Value::Number(n)) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 => SqlValue::Integer(f as i64),
                _ => return Err(invalid("expected a whole number")),
            },
        },
        (ColumnKind::Bool, Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
        (ColumnKind::Bool, Value::Number(n)) => {
            SqlValue::Integer(i64::from(n.as_i64().unwrap_or(0) != 0))
        }
        _ => return Err(invalid("type does not match column")),
    })
}

fn from_sql(kind: ColumnKind, raw: SqlValue) -> Value {
    match (kind, raw) {
        (_, SqlValue::Null) => Value::Null,
        (ColumnKind::Bool, SqlValue::Integer(i)) => Value::Bool(i != 0),
        (_, SqlValue::Integer(i)) => Value::Number(i.into()),
        (_, SqlValue::Real(f)) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        (_, SqlValue::Text(s)) => Value::String(s),
        (_, SqlValue::Blob(_)) => Value::Null,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_store() -> SqliteStore {
        SqliteStore::open(":memory:").unwrap()
    }

    fn row(v: Value) -> Row {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamps() {
        let store = test_store();
        let inserted = store
            .insert(
                Table::Jobs,
                row(json!({"user_id": "u1", "name": "Bar", "hourly_rate": 12, "is_default": true})),
            )
            .await
            .unwrap();

        assert!(inserted["id"].as_str().is_some_and(|s| !s.is_empty()));
        assert!(inserted["created_at"].is_string());
        assert_eq!(inserted["is_default"], json!(true));
        assert_eq!(inserted["hourly_rate"], json!(12.0));
        assert_eq!(inserted["deleted_at"], Value::Null);
    }

    #[tokio::test]
    async fn test_select_filters_and_ordering() {
        let store = test_store();
        for (date, cash) in [("2026-01-03", 10), ("2026-01-01", 30), ("2026-02-01", 5)] {
            store
                .insert(
                    Table::Shifts,
                    row(json!({"user_id": "u1", "date": date, "cash_tips": cash})),
                )
                .await
                .unwrap();
        }
        store
            .insert(
                Table::Shifts,
                row(json!({"user_id": "u2", "date": "2026-01-02", "cash_tips": 99})),
            )
            .await
            .unwrap();

        let q = Query::table(Table::Shifts)
            .eq("user_id", "u1")
            .gte("date", "2026-01-01")
            .lte("date", "2026-01-31")
            .order_by("date", true);
        let rows = store.select(&q).await.unwrap();
        let dates: Vec<&str> = rows.iter().filter_map(|r| r["date"].as_str()).collect();
        assert_eq!(dates, vec!["2026-01-01", "2026-01-03"]);
    }

    #[tokio::test]
    async fn test_ilike_is_case_insensitive_substring() {
        let store = test_store();
        store
            .insert(
                Table::Shifts,
                row(json!({"user_id": "u1", "date": "2026-01-01", "event_name": "Smith Wedding"})),
            )
            .await
            .unwrap();

        let q = Query::table(Table::Shifts).ilike("event_name", "WEDD");
        assert_eq!(store.select(&q).await.unwrap().len(), 1);
        let q = Query::table(Table::Shifts).ilike("event_name", "gala");
        assert!(store.select(&q).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_returns_affected_rows() {
        let store = test_store();
        store
            .insert(Table::Shifts, row(json!({"user_id": "u1", "date": "2026-01-01"})))
            .await
            .unwrap();
        store
            .insert(Table::Shifts, row(json!({"user_id": "u1", "date": "2026-01-02"})))
            .await
            .unwrap();

        let q = Query::table(Table::Shifts).eq("date", "2026-01-02");
        let updated = store
            .update(&q, &row(json!({"hours_worked": 6})))
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["hours_worked"], json!(6.0));
    }

    #[tokio::test]
    async fn test_delete_with_in_filter() {
        let store = test_store();
        let a = store
            .insert(Table::Goals, row(json!({"user_id": "u1", "period": "daily", "amount": 100})))
            .await
            .unwrap();
        store
            .insert(Table::Goals, row(json!({"user_id": "u1", "period": "weekly", "amount": 500})))
            .await
            .unwrap();

        let q = Query::table(Table::Goals).is_in("id", vec![a["id"].clone()]);
        let deleted = store.delete(&q).await.unwrap();
        assert_eq!(deleted.len(), 1);

        let remaining = store.select(&Query::table(Table::Goals)).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0]["period"], json!("weekly"));
    }

    #[tokio::test]
    async fn test_unknown_column_rejected() {
        let store = test_store();
        let err = store
            .insert(Table::Jobs, row(json!({"user_id": "u1", "nmae": "typo"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownColumn { .. }));
    }

    #[tokio::test]
    async fn test_type_mismatch_rejected() {
        let store = test_store();
        let err = store
            .insert(Table::Shifts, row(json!({"user_id": "u1", "cash_tips": true})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidValue { .. }));
    }

    #[tokio::test]
    async fn test_null_filters() {
        let store = test_store();
        store
            .insert(Table::Jobs, row(json!({"user_id": "u1", "name": "A"})))
            .await
            .unwrap();
        store
            .insert(
                Table::Jobs,
                row(json!({"user_id": "u1", "name": "B", "deleted_at": "2026-01-01T00:00:00Z"})),
            )
            .await
            .unwrap();

        let live = store
            .select(&Query::table(Table::Jobs).is_null("deleted_at"))
            .await
            .unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0]["name"], json!("A"));

        let gone = store
            .select(&Query::table(Table::Jobs).not_null("deleted_at"))
            .await
            .unwrap();
        assert_eq!(gone[0]["name"], json!("B"));
    }
}
