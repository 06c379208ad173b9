//! Domain executors: one per entity family.
//!
//! Executors are stateless. Each call receives typed arguments and an
//! [`ExecContext`] carrying the store handle, the caller's user id, and the
//! request's reference date. Every query is scoped to that user id.

pub mod analytics;
pub mod contact;
pub mod goal;
pub mod job;
pub mod periods;
pub mod settings;
pub mod shift;

use std::sync::Arc;

use chrono::{NaiveDate, Weekday};
use serde_json::Value;

use crate::agent_core::actions::JobRef;
use crate::agent_core::errors::DispatchError;
use crate::store::{flag, num, text, DataStore, Query, Row, Table};

/// Everything an executor needs for one action.
#[derive(Clone)]
pub struct ExecContext {
    pub store: Arc<dyn DataStore>,
    pub user_id: String,
    pub today: NaiveDate,
}

impl ExecContext {
    pub fn new(store: Arc<dyn DataStore>, user_id: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            store,
            user_id: user_id.into(),
            today,
        }
    }

    /// A query on `table` already filtered to the caller's rows.
    pub fn query(&self, table: Table) -> Query {
        Query::table(table).eq("user_id", self.user_id.as_str())
    }

    /// Insert a row owned by the caller.
    pub async fn insert(&self, table: Table, mut row: Row) -> Result<Row, DispatchError> {
        row.insert("user_id".into(), Value::String(self.user_id.clone()));
        Ok(self.store.insert(table, row).await?)
    }

    pub async fn select(&self, query: &Query) -> Result<Vec<Row>, DispatchError> {
        Ok(self.store.select(query).await?)
    }

    pub async fn first(&self, query: Query) -> Result<Option<Row>, DispatchError> {
        Ok(self.store.select(&query.limit(1)).await?.into_iter().next())
    }

    /// Look a job up by id, else by case-insensitive name (exact match
    /// first, then the first partial match). Deleted jobs are included only
    /// when `include_deleted` is set.
    pub async fn find_job(
        &self,
        job: &JobRef,
        include_deleted: bool,
    ) -> Result<Option<Row>, DispatchError> {
        if let Some(id) = job.job_id.as_deref() {
            let found = self.first(self.query(Table::Jobs).eq("id", id)).await?;
            return Ok(found.filter(|j| include_deleted || j.get("deleted_at").map_or(true, Value::is_null)));
        }
        let Some(name) = job.job_name.as_deref() else {
            return Ok(None);
        };
        let mut q = self.query(Table::Jobs).ilike("name", name.trim());
        if !include_deleted {
            q = q.is_null("deleted_at");
        }
        let candidates = self.select(&q.order_by("created_at", true)).await?;
        Ok(best_name_match(candidates, "name", name))
    }

    /// Like [`ExecContext::find_job`], but a missing job is an error.
    pub async fn require_job(&self, job: &JobRef, include_deleted: bool) -> Result<Row, DispatchError> {
        if job.is_empty() {
            return Err(DispatchError::validation("jobId or jobName is required"));
        }
        self.find_job(job, include_deleted).await?.ok_or_else(|| {
            let what = job
                .job_name
                .clone()
                .or_else(|| job.job_id.clone())
                .unwrap_or_default();
            DispatchError::not_found(format!("No job found matching \"{what}\""))
        })
    }

    /// The user's settings row, if one was ever written.
    pub async fn settings_row(&self) -> Result<Option<Row>, DispatchError> {
        self.first(self.query(Table::UserSettings)).await
    }

    /// First day of the week per the user's settings (Sunday by default).
    pub async fn week_start(&self) -> Result<Weekday, DispatchError> {
        let row = self.settings_row().await?;
        Ok(match row {
            Some(row) if text(&row, "week_start_day") == Some("monday") => Weekday::Mon,
            _ => Weekday::Sun,
        })
    }
}

/// Exact case-insensitive match on `column` first, else the first row whose
/// value contains `needle`.
pub(crate) fn best_name_match(rows: Vec<Row>, column: &str, needle: &str) -> Option<Row> {
    let needle = needle.trim().to_lowercase();
    let exact = rows
        .iter()
        .position(|r| text(r, column).is_some_and(|v| v.to_lowercase() == needle));
    match exact {
        Some(i) => rows.into_iter().nth(i),
        None => rows
            .into_iter()
            .find(|r| text(r, column).is_some_and(|v| v.to_lowercase().contains(&needle))),
    }
}

// ─── Shift math ─────────────────────────────────────────────────────────────

/// Derived shift amounts. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftTotals {
    pub total_tips: f64,
    pub wages: f64,
    pub total_income: f64,
}

pub fn shift_totals(row: &Row) -> ShiftTotals {
    let total_tips = num(row, "cash_tips") + num(row, "credit_tips");
    let wages = num(row, "hourly_rate") * num(row, "hours_worked");
    ShiftTotals {
        total_tips,
        wages,
        total_income: total_tips + wages,
    }
}

/// The row with `total_tips` and `total_income` attached for display.
pub fn with_totals(mut row: Row) -> Row {
    let totals = shift_totals(&row);
    row.insert("total_tips".into(), round2(totals.total_tips).into());
    row.insert("total_income".into(), round2(totals.total_income).into());
    row
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// `$1234.50` style amount.
pub fn money(v: f64) -> String {
    format!("${v:.2}")
}

/// Aggregate income over a set of shifts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IncomeStats {
    pub shifts: usize,
    pub total_income: f64,
    pub total_tips: f64,
    pub wages: f64,
    pub hours: f64,
}

impl IncomeStats {
    pub fn from_shifts<'a>(rows: impl IntoIterator<Item = &'a Row>) -> Self {
        rows.into_iter().fold(IncomeStats::default(), |mut acc, row| {
            let t = shift_totals(row);
            acc.shifts += 1;
            acc.total_income += t.total_income;
            acc.total_tips += t.total_tips;
            acc.wages += t.wages;
            acc.hours += num(row, "hours_worked");
            acc
        })
    }

    pub fn per_hour(&self) -> Option<f64> {
        (self.hours > 0.0).then(|| self.total_income / self.hours)
    }

    pub fn per_shift(&self) -> Option<f64> {
        (self.shifts > 0).then(|| self.total_income / self.shifts as f64)
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "shiftCount": self.shifts,
            "totalIncome": round2(self.total_income),
            "totalTips": round2(self.total_tips),
            "hourlyWages": round2(self.wages),
            "hoursWorked": round2(self.hours),
            "averagePerShift": self.per_shift().map(round2),
            "averagePerHour": self.per_hour().map(round2),
        })
    }
}

/// The caller's shifts inside `window` (all dates when `None`), optionally
/// for one job, oldest first.
pub async fn shifts_in(
    ctx: &ExecContext,
    window: Option<periods::Window>,
    job_id: Option<&str>,
) -> Result<Vec<Row>, DispatchError> {
    let mut q = ctx.query(Table::Shifts);
    if let Some(w) = window {
        q = q.gte("date", w.start_str()).lte("date", w.end_str());
    }
    if let Some(job) = job_id {
        q = q.eq("job_id", job);
    }
    ctx.select(&q.order_by("date", true)).await
}

pub(crate) fn is_active_job(job: &Row) -> bool {
    flag(job, "is_active") && job.get("deleted_at").map_or(true, Value::is_null)
}

// ─── Test support ───────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::store::{Filter, SqliteStore, StoreError};
    use async_trait::async_trait;
    use serde_json::json;

    pub const USER: &str = "user-1";

    /// Reference date used across executor tests (a Saturday).
    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()
    }

    pub fn ctx() -> ExecContext {
        let store = SqliteStore::open(":memory:").unwrap();
        ExecContext::new(Arc::new(store), USER, today())
    }

    pub fn row(v: Value) -> Row {
        v.as_object().cloned().unwrap()
    }

    pub async fn seed_job(ctx: &ExecContext, name: &str, rate: f64, is_default: bool) -> Row {
        ctx.insert(
            Table::Jobs,
            row(json!({
                "name": name,
                "hourly_rate": rate,
                "is_default": is_default,
                "is_active": true,
            })),
        )
        .await
        .unwrap()
    }

    pub async fn seed_shift(ctx: &ExecContext, fields: Value) -> Row {
        ctx.insert(Table::Shifts, row(fields)).await.unwrap()
    }

    pub fn id(row: &Row) -> String {
        text(row, "id").unwrap().to_string()
    }

    /// Passes through to a working store, except for reads on
    /// `fail_select_on` and updates that target `fail_update_id`.
    pub struct FaultyStore {
        pub inner: Arc<dyn DataStore>,
        pub fail_select_on: Option<Table>,
        pub fail_update_id: Option<String>,
    }

    impl FaultyStore {
        /// A context over the same data as `healthy`, with faults injected.
        pub fn wrap(healthy: &ExecContext, fail_select_on: Option<Table>, fail_update_id: Option<String>) -> ExecContext {
            let store = FaultyStore {
                inner: Arc::clone(&healthy.store),
                fail_select_on,
                fail_update_id,
            };
            ExecContext::new(Arc::new(store), healthy.user_id.clone(), healthy.today)
        }

        fn injected() -> StoreError {
            StoreError::Database {
                reason: "injected failure".into(),
            }
        }
    }

    #[async_trait]
    impl DataStore for FaultyStore {
        async fn select(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
            if self.fail_select_on == Some(query.table) {
                return Err(Self::injected());
            }
            self.inner.select(query).await
        }

        async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError> {
            self.inner.insert(table, row).await
        }

        async fn update(&self, query: &Query, patch: &Row) -> Result<Vec<Row>, StoreError> {
            let targeted = query.filters.iter().any(|f| {
                matches!(f, Filter::Eq(c, Value::String(v)) if c == "id" && Some(v) == self.fail_update_id.as_ref())
            });
            if targeted {
                return Err(Self::injected());
            }
            self.inner.update(query, patch).await
        }

        async fn delete(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
            self.inner.delete(query).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shift_totals() {
        let r = row(json!({ "cash_tips": 40, "credit_tips": 60, "hourly_rate": 12, "hours_worked": 6 }));
        let t = shift_totals(&r);
        assert_eq!(t.total_tips, 100.0);
        assert_eq!(t.total_income, 172.0);
        assert_eq!(money(t.total_income), "$172.00");
    }

    #[test]
    fn test_best_name_match_prefers_exact() {
        let rows = vec![
            row(json!({ "name": "Bar Luna Downtown" })),
            row(json!({ "name": "bar luna" })),
        ];
        let hit = best_name_match(rows.clone(), "name", "Bar Luna").unwrap();
        assert_eq!(text(&hit, "name"), Some("bar luna"));
        let partial = best_name_match(rows, "name", "downtown").unwrap();
        assert_eq!(text(&partial, "name"), Some("Bar Luna Downtown"));
    }

    #[tokio::test]
    async fn test_find_job_by_name_skips_deleted() {
        let ctx = ctx();
        let job = seed_job(&ctx, "Steakhouse", 15.0, false).await;
        ctx.store
            .update(
                &ctx.query(Table::Jobs).eq("id", id(&job)),
                &row(json!({ "deleted_at": "2026-01-01T00:00:00Z" })),
            )
            .await
            .unwrap();
        let by_name = JobRef {
            job_id: None,
            job_name: Some("steak".into()),
        };
        assert!(ctx.find_job(&by_name, false).await.unwrap().is_none());
        assert!(ctx.find_job(&by_name, true).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_week_start_propagates_store_failure() {
        let healthy = ctx();
        let faulty = FaultyStore::wrap(&healthy, Some(Table::UserSettings), None);
        let err = faulty.week_start().await.unwrap_err();
        assert_eq!(err.kind(), "store_failure");
        assert_eq!(healthy.week_start().await.unwrap(), Weekday::Sun);
    }

    #[tokio::test]
    async fn test_queries_are_user_scoped() {
        let ctx = ctx();
        seed_job(&ctx, "Mine", 10.0, false).await;
        let other = ExecContext::new(Arc::clone(&ctx.store), "user-2", today());
        let jobs = other.select(&other.query(Table::Jobs)).await.unwrap();
        assert!(jobs.is_empty());
    }
}
