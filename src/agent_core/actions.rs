//! Typed action arguments.
//!
//! The model's JSON arguments are parsed exactly once, here, into one struct
//! per action. Executors only ever see these types. Optional fields that the
//! model omitted stay `None` and are never written.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::catalog::{ActionName, CONTACT_ROLES, SOCIAL_HANDLES};
use super::errors::DispatchError;
use crate::store::schema::{ColumnKind, SHIFT_EXTRA_FIELDS};
use crate::store::Row;

// ─── Lenient scalars ────────────────────────────────────────────────────────

/// Accepts `40`, `40.5`, `"40"`, and `"$1,200.50"`.
fn parse_amount<E: serde::de::Error>(value: Value) -> Result<Option<f64>, E> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_start_matches('$')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            cleaned
                .parse()
                .map(Some)
                .map_err(|_| E::custom(format!("expected a number, got \"{s}\"")))
        }
        other => Err(E::custom(format!("expected a number, got {other}"))),
    }
}

fn opt_amount<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?.unwrap_or(Value::Null);
    parse_amount(raw)
}

fn amount<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let raw = Value::deserialize(d)?;
    parse_amount(raw)?.ok_or_else(|| D::Error::custom("expected a number, got null"))
}

fn opt_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    match opt_amount(d)? {
        None => Ok(None),
        Some(f) if f.fract() == 0.0 && f >= 0.0 => Ok(Some(f as i64)),
        Some(f) => Err(D::Error::custom(format!("expected a whole number, got {f}"))),
    }
}

// ─── Shared pieces ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// A job named by id or, failing that, by name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRef {
    pub job_id: Option<String>,
    pub job_name: Option<String>,
}

impl JobRef {
    pub fn is_empty(&self) -> bool {
        self.job_id.is_none() && self.job_name.is_none()
    }
}

// ─── Shift arguments ────────────────────────────────────────────────────────

/// Writable shift fields. Industry fields arrive in `extra` and are checked
/// against the column table by [`ShiftFields::to_columns`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftFields {
    #[serde(default, deserialize_with = "opt_amount")]
    pub cash_tips: Option<f64>,
    #[serde(default, deserialize_with = "opt_amount")]
    pub credit_tips: Option<f64>,
    #[serde(default, deserialize_with = "opt_amount")]
    pub hourly_rate: Option<f64>,
    #[serde(default, deserialize_with = "opt_amount")]
    pub hours_worked: Option<f64>,
    #[serde(default, deserialize_with = "opt_amount")]
    pub overtime_hours: Option<f64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub event_name: Option<String>,
    #[serde(default, deserialize_with = "opt_count")]
    pub guest_count: Option<i64>,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ShiftFields {
    /// Supplied fields as a column patch. Unknown extra keys are ignored;
    /// known ones must carry the column's type.
    pub fn to_columns(&self) -> Result<Row, DispatchError> {
        let mut row = Row::new();
        put(&mut row, "cash_tips", self.cash_tips);
        put(&mut row, "credit_tips", self.credit_tips);
        put(&mut row, "hourly_rate", self.hourly_rate);
        put(&mut row, "hours_worked", self.hours_worked);
        put(&mut row, "overtime_hours", self.overtime_hours);
        put(&mut row, "start_time", self.start_time.clone());
        put(&mut row, "end_time", self.end_time.clone());
        put(&mut row, "event_name", self.event_name.clone());
        put(&mut row, "guest_count", self.guest_count);
        put(&mut row, "notes", self.notes.clone());

        for field in SHIFT_EXTRA_FIELDS {
            let Some(value) = self.extra.get(field.key) else {
                continue;
            };
            let ok = match (field.kind, value) {
                (_, Value::Null) => true,
                (ColumnKind::Text, Value::String(_)) => true,
                (ColumnKind::Real, Value::Number(_)) => true,
                (ColumnKind::Integer, Value::Number(n)) => {
                    n.is_i64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
                }
                _ => false,
            };
            if !ok {
                let expected = match field.kind {
                    ColumnKind::Text => "text",
                    ColumnKind::Integer => "a whole number",
                    _ => "a number",
                };
                return Err(DispatchError::validation(format!(
                    "{} must be {expected}",
                    field.key
                )));
            }
            row.insert(field.column.to_string(), value.clone());
        }
        Ok(row)
    }

    /// True when a tip amount or the hours change, which is what the rate
    /// backfill keys on.
    pub fn touches_earnings(&self) -> bool {
        self.cash_tips.is_some() || self.credit_tips.is_some() || self.hours_worked.is_some()
    }

    /// Human-readable list of changes, e.g. `cash tips to $40.00`.
    pub fn describe_changes(&self) -> Vec<String> {
        let mut out = Vec::new();
        let money = |label: &str, v: Option<f64>, out: &mut Vec<String>| {
            if let Some(v) = v {
                out.push(format!("{label} to ${v:.2}"));
            }
        };
        money("cash tips", self.cash_tips, &mut out);
        money("credit tips", self.credit_tips, &mut out);
        money("hourly rate", self.hourly_rate, &mut out);
        if let Some(h) = self.hours_worked {
            out.push(format!("hours to {h}"));
        }
        if let Some(h) = self.overtime_hours {
            out.push(format!("overtime hours to {h}"));
        }
        if let Some(t) = &self.start_time {
            out.push(format!("start time to {t}"));
        }
        if let Some(t) = &self.end_time {
            out.push(format!("end time to {t}"));
        }
        if let Some(e) = &self.event_name {
            out.push(format!("event name to \"{e}\""));
        }
        if let Some(g) = self.guest_count {
            out.push(format!("guest count to {g}"));
        }
        if let Some(n) = &self.notes {
            out.push(format!("notes to \"{n}\""));
        }
        for field in SHIFT_EXTRA_FIELDS {
            match self.extra.get(field.key) {
                Some(Value::String(s)) => out.push(format!("{} to \"{s}\"", field.label)),
                Some(Value::Null) => out.push(format!("clear {}", field.label)),
                Some(v) => out.push(format!("{} to {v}", field.label)),
                None => {}
            }
        }
        out
    }
}

fn put<T: Into<Value>>(row: &mut Row, column: &str, value: Option<T>) {
    if let Some(v) = value {
        row.insert(column.to_string(), v.into());
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddShiftArgs {
    pub date: String,
    #[serde(flatten)]
    pub job: JobRef,
    #[serde(flatten)]
    pub fields: ShiftFields,
}

/// Patch applied by `edit_shift` and `bulk_edit_shifts`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftUpdates {
    pub date: Option<String>,
    pub job_id: Option<String>,
    #[serde(flatten)]
    pub fields: ShiftFields,
}

impl ShiftUpdates {
    pub fn to_columns(&self) -> Result<Row, DispatchError> {
        let mut row = self.fields.to_columns()?;
        put(&mut row, "date", self.date.clone());
        put(&mut row, "job_id", self.job_id.clone());
        Ok(row)
    }

    pub fn describe_changes(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(d) = &self.date {
            out.push(format!("date to {d}"));
        }
        if self.job_id.is_some() {
            out.push("job".to_string());
        }
        out.extend(self.fields.describe_changes());
        out
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditShiftArgs {
    pub date: String,
    pub job_id: Option<String>,
    pub updates: ShiftUpdates,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteShiftArgs {
    pub date: String,
    pub job_id: Option<String>,
    #[serde(default)]
    pub confirmed: bool,
}

/// Legacy nested selection, `{ query: { dateRange, jobId } }`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedSelection {
    pub date_range: Option<DateRange>,
    pub job_id: Option<String>,
}

/// Which shifts a bulk operation touches.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSelection {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub date_range: Option<DateRange>,
    #[serde(flatten)]
    pub job: JobRef,
    pub query: Option<NestedSelection>,
}

impl ShiftSelection {
    /// Fold the nested and range forms into flat start/end/job fields.
    pub fn normalized(&self) -> ShiftSelection {
        let nested = self.query.clone().unwrap_or_default();
        let range = self.date_range.clone().or(nested.date_range);
        ShiftSelection {
            start_date: self
                .start_date
                .clone()
                .or_else(|| range.as_ref().map(|r| r.start.clone())),
            end_date: self
                .end_date
                .clone()
                .or_else(|| range.as_ref().map(|r| r.end.clone())),
            date_range: None,
            job: JobRef {
                job_id: self.job.job_id.clone().or(nested.job_id),
                job_name: self.job.job_name.clone(),
            },
            query: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkEditArgs {
    #[serde(flatten)]
    pub selection: ShiftSelection,
    pub updates: ShiftUpdates,
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteArgs {
    #[serde(flatten)]
    pub selection: ShiftSelection,
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftQuery {
    pub date_range: Option<DateRange>,
    pub job_id: Option<String>,
    pub event_name: Option<String>,
    #[serde(default, deserialize_with = "opt_amount")]
    pub min_amount: Option<f64>,
    #[serde(default, deserialize_with = "opt_amount")]
    pub max_amount: Option<f64>,
    pub has_notes: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchShiftsArgs {
    #[serde(default)]
    pub query: ShiftQuery,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftDetailsArgs {
    pub date: String,
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateTotalArgs {
    pub shift_date: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateShiftArgs {
    pub source_date: String,
    pub target_date: String,
}

// ─── Contact arguments ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFields {
    pub name: Option<String>,
    pub role: Option<String>,
    pub custom_role: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
    pub instagram: Option<String>,
    pub tiktok: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
    pub youtube: Option<String>,
    pub snapchat: Option<String>,
    pub pinterest: Option<String>,
}

impl ContactFields {
    /// Supplied fields as a column patch. A role outside the known list is
    /// stored as `custom` with the given text as the custom role.
    pub fn to_columns(&self) -> Row {
        let mut row = Row::new();
        put(&mut row, "name", self.name.clone());
        match self.role.as_deref().map(normalize_role) {
            Some(role) if CONTACT_ROLES.contains(&role.as_str()) => {
                row.insert("role".into(), Value::String(role));
                put(&mut row, "custom_role", self.custom_role.clone());
            }
            Some(_) => {
                row.insert("role".into(), Value::String("custom".into()));
                let custom = self.custom_role.clone().or_else(|| self.role.clone());
                put(&mut row, "custom_role", custom);
            }
            None => put(&mut row, "custom_role", self.custom_role.clone()),
        }
        put(&mut row, "company", self.company.clone());
        put(&mut row, "phone", self.phone.clone());
        put(&mut row, "email", self.email.clone());
        put(&mut row, "website", self.website.clone());
        put(&mut row, "notes", self.notes.clone());
        let socials = [
            &self.instagram,
            &self.tiktok,
            &self.facebook,
            &self.twitter,
            &self.linkedin,
            &self.youtube,
            &self.snapchat,
            &self.pinterest,
        ];
        for (handle, value) in SOCIAL_HANDLES.iter().zip(socials) {
            put(&mut row, handle, value.clone());
        }
        row
    }
}

fn normalize_role(role: &str) -> String {
    role.trim().to_lowercase().replace([' ', '-', '/'], "_")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddContactArgs {
    #[serde(flatten)]
    pub fields: ContactFields,
    pub shift_id: Option<String>,
    pub shift_date: Option<String>,
}

/// A contact named by id or, failing that, by name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRef {
    pub contact_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditContactArgs {
    #[serde(flatten)]
    pub contact: ContactRef,
    pub updates: ContactFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteContactArgs {
    #[serde(flatten)]
    pub contact: ContactRef,
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchContactsArgs {
    pub query: Option<String>,
    pub role: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactsForShiftArgs {
    pub shift_id: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetFavoriteArgs {
    #[serde(flatten)]
    pub contact: ContactRef,
    pub is_favorite: bool,
}

// ─── Job arguments ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatsPeriod {
    Week,
    #[default]
    Month,
    Year,
    AllTime,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddJobArgs {
    pub name: String,
    pub industry: Option<String>,
    #[serde(default, deserialize_with = "opt_amount")]
    pub hourly_rate: Option<f64>,
    pub color: Option<String>,
    pub is_default: Option<bool>,
    pub template: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdates {
    pub name: Option<String>,
    pub industry: Option<String>,
    #[serde(default, deserialize_with = "opt_amount")]
    pub hourly_rate: Option<f64>,
    pub color: Option<String>,
    pub template: Option<String>,
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditJobArgs {
    #[serde(flatten)]
    pub job: JobRef,
    pub updates: JobUpdates,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteJobArgs {
    #[serde(flatten)]
    pub job: JobRef,
    #[serde(default)]
    pub delete_shifts: bool,
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndJobArgs {
    #[serde(flatten)]
    pub job: JobRef,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetJobsArgs {
    #[serde(default)]
    pub include_ended: bool,
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobStatsArgs {
    #[serde(flatten)]
    pub job: JobRef,
    #[serde(default)]
    pub period: StatsPeriod,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareJobsArgs {
    pub job_ids: Option<Vec<String>>,
    #[serde(default)]
    pub period: StatsPeriod,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetJobRateArgs {
    #[serde(flatten)]
    pub job: JobRef,
    #[serde(deserialize_with = "amount")]
    pub new_rate: f64,
    pub effective_date: Option<String>,
    #[serde(default)]
    pub update_past_shifts: bool,
    #[serde(default)]
    pub confirmed: bool,
}

// ─── Goal arguments ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalPeriod {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl GoalPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalPeriod::Daily => "daily",
            GoalPeriod::Weekly => "weekly",
            GoalPeriod::Monthly => "monthly",
            GoalPeriod::Yearly => "yearly",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetGoalArgs {
    #[serde(deserialize_with = "amount")]
    pub amount: f64,
    #[serde(flatten)]
    pub job: JobRef,
    #[serde(default, deserialize_with = "opt_amount")]
    pub target_hours: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalUpdates {
    #[serde(default, deserialize_with = "opt_amount")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "opt_amount")]
    pub target_hours: Option<f64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditGoalArgs {
    pub goal_id: Option<String>,
    pub period: Option<GoalPeriod>,
    #[serde(flatten)]
    pub job: JobRef,
    pub updates: GoalUpdates,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteGoalArgs {
    pub goal_id: Option<String>,
    pub period: Option<GoalPeriod>,
    #[serde(flatten)]
    pub job: JobRef,
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetGoalsArgs {
    #[serde(default)]
    pub include_completed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgressArgs {
    pub goal_id: Option<String>,
}

// ─── Settings arguments ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeThemeArgs {
    pub theme: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToggleArgs {
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReminderTime {
    Morning,
    Evening,
    Both,
}

impl ReminderTime {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderTime::Morning => "morning",
            ReminderTime::Evening => "evening",
            ReminderTime::Both => "both",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftRemindersArgs {
    pub enabled: bool,
    pub reminder_time: Option<ReminderTime>,
    #[serde(default, deserialize_with = "opt_count")]
    pub days_before_shift: Option<i64>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReminderFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl ReminderFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderFrequency::Daily => "daily",
            ReminderFrequency::Weekly => "weekly",
            ReminderFrequency::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoalRemindersArgs {
    pub enabled: bool,
    pub frequency: Option<ReminderFrequency>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuietHoursArgs {
    pub enabled: bool,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyArgs {
    pub currency_code: String,
    pub show_cents: Option<bool>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub enum DateFormat {
    #[serde(rename = "MM/DD/YYYY")]
    MonthFirst,
    #[serde(rename = "DD/MM/YYYY")]
    DayFirst,
    #[serde(rename = "YYYY-MM-DD")]
    Iso,
}

impl DateFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateFormat::MonthFirst => "MM/DD/YYYY",
            DateFormat::DayFirst => "DD/MM/YYYY",
            DateFormat::Iso => "YYYY-MM-DD",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateFormatArgs {
    pub format: DateFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    Sunday,
    Monday,
}

impl WeekStart {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeekStart::Sunday => "sunday",
            WeekStart::Monday => "monday",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeekStartArgs {
    pub day: WeekStart,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmArgs {
    #[serde(default)]
    pub confirmed: bool,
}

// ─── Analytics arguments ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SummaryPeriod {
    Today,
    Week,
    Month,
    Year,
    Custom,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSummaryArgs {
    pub period: SummaryPeriod,
    pub date_range: Option<DateRange>,
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Month,
    Year,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedPeriod {
    pub period: Granularity,
    pub year: i32,
    pub month: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComparePeriodsArgs {
    pub period1: NamedPeriod,
    pub period2: NamedPeriod,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankDaysArgs {
    pub limit: Option<usize>,
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectionArgs {
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEarningsArgs {
    pub event_name: String,
}

// ─── Action ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum ShiftAction {
    Add(AddShiftArgs),
    Edit(EditShiftArgs),
    Delete(DeleteShiftArgs),
    BulkEdit(BulkEditArgs),
    BulkDelete(BulkDeleteArgs),
    Search(SearchShiftsArgs),
    Details(ShiftDetailsArgs),
    CalculateTotal(CalculateTotalArgs),
    Duplicate(DuplicateShiftArgs),
}

#[derive(Debug, Clone)]
pub enum ContactAction {
    Add(AddContactArgs),
    Edit(EditContactArgs),
    Delete(DeleteContactArgs),
    Search(SearchContactsArgs),
    ForShift(ContactsForShiftArgs),
    SetFavorite(SetFavoriteArgs),
}

#[derive(Debug, Clone)]
pub enum JobAction {
    Add(AddJobArgs),
    Edit(EditJobArgs),
    Delete(DeleteJobArgs),
    SetDefault(JobRef),
    End(EndJobArgs),
    Restore(JobRef),
    List(GetJobsArgs),
    Stats(JobStatsArgs),
    Compare(CompareJobsArgs),
    SetHourlyRate(SetJobRateArgs),
}

#[derive(Debug, Clone)]
pub enum GoalAction {
    Set(GoalPeriod, SetGoalArgs),
    Edit(EditGoalArgs),
    Delete(DeleteGoalArgs),
    List(GetGoalsArgs),
    Progress(GoalProgressArgs),
}

#[derive(Debug, Clone)]
pub enum SettingsAction {
    ChangeTheme(ChangeThemeArgs),
    AvailableThemes,
    RevertTheme,
    ToggleNotifications(ToggleArgs),
    ShiftReminders(ShiftRemindersArgs),
    GoalReminders(GoalRemindersArgs),
    QuietHours(QuietHoursArgs),
    NotificationSettings,
    CurrencyFormat(CurrencyArgs),
    DateFormat(DateFormatArgs),
    WeekStartDay(WeekStartArgs),
    ClearChatHistory(ConfirmArgs),
    UserSettings,
}

#[derive(Debug, Clone)]
pub enum AnalyticsAction {
    IncomeSummary(IncomeSummaryArgs),
    ComparePeriods(ComparePeriodsArgs),
    BestDays(RankDaysArgs),
    WorstDays(RankDaysArgs),
    ProjectedYearEnd(ProjectionArgs),
    YearOverYear,
    EventEarnings(EventEarningsArgs),
}

/// A validated, typed action ready for its executor.
#[derive(Debug, Clone)]
pub enum Action {
    Shift(ShiftAction),
    Contact(ContactAction),
    Job(JobAction),
    Goal(GoalAction),
    Settings(SettingsAction),
    Analytics(AnalyticsAction),
}

fn args<T: DeserializeOwned>(raw: Value) -> Result<T, DispatchError> {
    Ok(serde_json::from_value(raw)?)
}

impl Action {
    /// Parse raw model arguments for `name`.
    ///
    /// `null` is read as an empty object. Anything else that is not an
    /// object (including argument text that was not valid JSON) fails
    /// validation.
    pub fn parse(name: ActionName, raw: Value) -> Result<Action, DispatchError> {
        let raw = match raw {
            Value::Null => Value::Object(Map::new()),
            Value::Object(_) => raw,
            Value::String(_) => {
                return Err(DispatchError::validation(
                    "arguments were not valid JSON",
                ))
            }
            _ => return Err(DispatchError::validation("arguments must be a JSON object")),
        };

        use ActionName as N;
        Ok(match name {
            N::AddShift => Action::Shift(ShiftAction::Add(args(raw)?)),
            N::EditShift => Action::Shift(ShiftAction::Edit(args(raw)?)),
            N::DeleteShift => Action::Shift(ShiftAction::Delete(args(raw)?)),
            N::BulkEditShifts => Action::Shift(ShiftAction::BulkEdit(args(raw)?)),
            N::BulkDeleteShifts => Action::Shift(ShiftAction::BulkDelete(args(raw)?)),
            N::SearchShifts => Action::Shift(ShiftAction::Search(args(raw)?)),
            N::GetShiftDetails => Action::Shift(ShiftAction::Details(args(raw)?)),
            N::CalculateShiftTotal => Action::Shift(ShiftAction::CalculateTotal(args(raw)?)),
            N::DuplicateShift => Action::Shift(ShiftAction::Duplicate(args(raw)?)),

            N::AddEventContact => Action::Contact(ContactAction::Add(args(raw)?)),
            N::EditEventContact => Action::Contact(ContactAction::Edit(args(raw)?)),
            N::DeleteEventContact => Action::Contact(ContactAction::Delete(args(raw)?)),
            N::SearchContacts => Action::Contact(ContactAction::Search(args(raw)?)),
            N::GetContactsForShift => Action::Contact(ContactAction::ForShift(args(raw)?)),
            N::SetContactFavorite => Action::Contact(ContactAction::SetFavorite(args(raw)?)),

            N::AddJob => Action::Job(JobAction::Add(args(raw)?)),
            N::EditJob => Action::Job(JobAction::Edit(args(raw)?)),
            N::DeleteJob => Action::Job(JobAction::Delete(args(raw)?)),
            N::SetDefaultJob => Action::Job(JobAction::SetDefault(args(raw)?)),
            N::EndJob => Action::Job(JobAction::End(args(raw)?)),
            N::RestoreJob => Action::Job(JobAction::Restore(args(raw)?)),
            N::GetJobs => Action::Job(JobAction::List(args(raw)?)),
            N::GetJobStats => Action::Job(JobAction::Stats(args(raw)?)),
            N::CompareJobs => Action::Job(JobAction::Compare(args(raw)?)),
            N::SetJobHourlyRate => Action::Job(JobAction::SetHourlyRate(args(raw)?)),

            N::SetDailyGoal => Action::Goal(GoalAction::Set(GoalPeriod::Daily, args(raw)?)),
            N::SetWeeklyGoal => Action::Goal(GoalAction::Set(GoalPeriod::Weekly, args(raw)?)),
            N::SetMonthlyGoal => Action::Goal(GoalAction::Set(GoalPeriod::Monthly, args(raw)?)),
            N::SetYearlyGoal => Action::Goal(GoalAction::Set(GoalPeriod::Yearly, args(raw)?)),
            N::EditGoal => Action::Goal(GoalAction::Edit(args(raw)?)),
            N::DeleteGoal => Action::Goal(GoalAction::Delete(args(raw)?)),
            N::GetGoals => Action::Goal(GoalAction::List(args(raw)?)),
            N::GetGoalProgress => Action::Goal(GoalAction::Progress(args(raw)?)),

            N::ChangeTheme => Action::Settings(SettingsAction::ChangeTheme(args(raw)?)),
            N::GetAvailableThemes => Action::Settings(SettingsAction::AvailableThemes),
            N::RevertTheme => Action::Settings(SettingsAction::RevertTheme),
            N::ToggleNotifications => {
                Action::Settings(SettingsAction::ToggleNotifications(args(raw)?))
            }
            N::SetShiftReminders => Action::Settings(SettingsAction::ShiftReminders(args(raw)?)),
            N::SetGoalReminders => Action::Settings(SettingsAction::GoalReminders(args(raw)?)),
            N::SetQuietHours => Action::Settings(SettingsAction::QuietHours(args(raw)?)),
            N::GetNotificationSettings => Action::Settings(SettingsAction::NotificationSettings),
            N::SetCurrencyFormat => Action::Settings(SettingsAction::CurrencyFormat(args(raw)?)),
            N::SetDateFormat => Action::Settings(SettingsAction::DateFormat(args(raw)?)),
            N::SetWeekStartDay => Action::Settings(SettingsAction::WeekStartDay(args(raw)?)),
            N::ClearChatHistory => Action::Settings(SettingsAction::ClearChatHistory(args(raw)?)),
            N::GetUserSettings => Action::Settings(SettingsAction::UserSettings),

            N::GetIncomeSummary => Action::Analytics(AnalyticsAction::IncomeSummary(args(raw)?)),
            N::ComparePeriods => Action::Analytics(AnalyticsAction::ComparePeriods(args(raw)?)),
            N::GetBestDays => Action::Analytics(AnalyticsAction::BestDays(args(raw)?)),
            N::GetWorstDays => Action::Analytics(AnalyticsAction::WorstDays(args(raw)?)),
            N::GetProjectedYearEnd => {
                Action::Analytics(AnalyticsAction::ProjectedYearEnd(args(raw)?))
            }
            N::GetYearOverYear => Action::Analytics(AnalyticsAction::YearOverYear),
            N::GetEventEarnings => Action::Analytics(AnalyticsAction::EventEarnings(args(raw)?)),
        })
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
