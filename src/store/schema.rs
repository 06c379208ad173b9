//! Column layout of every table, plus the industry-specific shift fields.
//!
//! The embedded adapter builds its tables from these definitions and uses the
//! kinds to convert JSON values. The action catalog reuses
//! [`SHIFT_EXTRA_FIELDS`] for its parameter schemas.

use super::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Real,
    Integer,
    Bool,
}

impl ColumnKind {
    fn sql_type(self) -> &'static str {
        match self {
            ColumnKind::Text => "TEXT",
            ColumnKind::Real => "REAL",
            ColumnKind::Integer | ColumnKind::Bool => "INTEGER",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

use ColumnKind::{Bool, Integer, Real, Text};

// ─── Base columns ───────────────────────────────────────────────────────────

const SHIFT_COLUMNS: &[Column] = &[
    col("id", Text),
    col("user_id", Text),
    col("job_id", Text),
    col("date", Text),
    col("cash_tips", Real),
    col("credit_tips", Real),
    col("hourly_rate", Real),
    col("hours_worked", Real),
    col("overtime_hours", Real),
    col("start_time", Text),
    col("end_time", Text),
    col("event_name", Text),
    col("guest_count", Integer),
    col("notes", Text),
    col("created_at", Text),
    col("updated_at", Text),
];

const JOB_COLUMNS: &[Column] = &[
    col("id", Text),
    col("user_id", Text),
    col("name", Text),
    col("industry", Text),
    col("hourly_rate", Real),
    col("color", Text),
    col("template", Text),
    col("is_default", Bool),
    col("is_active", Bool),
    col("end_date", Text),
    col("deleted_at", Text),
    col("created_at", Text),
    col("updated_at", Text),
];

const GOAL_COLUMNS: &[Column] = &[
    col("id", Text),
    col("user_id", Text),
    col("period", Text),
    col("amount", Real),
    col("job_id", Text),
    col("target_hours", Real),
    col("is_active", Bool),
    col("created_at", Text),
    col("updated_at", Text),
];

const CONTACT_COLUMNS: &[Column] = &[
    col("id", Text),
    col("user_id", Text),
    col("shift_id", Text),
    col("name", Text),
    col("role", Text),
    col("custom_role", Text),
    col("company", Text),
    col("phone", Text),
    col("email", Text),
    col("website", Text),
    col("notes", Text),
    col("instagram", Text),
    col("tiktok", Text),
    col("facebook", Text),
    col("twitter", Text),
    col("linkedin", Text),
    col("youtube", Text),
    col("snapchat", Text),
    col("pinterest", Text),
    col("is_favorite", Bool),
    col("created_at", Text),
    col("updated_at", Text),
];

const SETTINGS_COLUMNS: &[Column] = &[
    col("id", Text),
    col("user_id", Text),
    col("theme", Text),
    col("previous_theme", Text),
    col("notifications_enabled", Bool),
    col("shift_reminders_enabled", Bool),
    col("reminder_time", Text),
    col("reminder_days_before", Integer),
    col("goal_reminders_enabled", Bool),
    col("goal_reminder_frequency", Text),
    col("quiet_hours_enabled", Bool),
    col("quiet_hours_start", Text),
    col("quiet_hours_end", Text),
    col("currency_code", Text),
    col("show_cents", Bool),
    col("date_format", Text),
    col("week_start_day", Text),
    col("created_at", Text),
    col("updated_at", Text),
];

const CHAT_COLUMNS: &[Column] = &[
    col("id", Text),
    col("user_id", Text),
    col("message", Text),
    col("is_user", Bool),
    col("created_at", Text),
];

// ─── Industry fields ────────────────────────────────────────────────────────

/// An optional, industry-specific shift field.
#[derive(Debug, Clone, Copy)]
pub struct ExtraField {
    /// Argument key the model uses (camelCase).
    pub key: &'static str,
    /// Column name.
    pub column: &'static str,
    pub kind: ColumnKind,
    /// Short human label, used in change descriptions and tool schemas.
    pub label: &'static str,
}

const fn extra(
    key: &'static str,
    column: &'static str,
    kind: ColumnKind,
    label: &'static str,
) -> ExtraField {
    ExtraField {
        key,
        column,
        kind,
        label,
    }
}

pub const SHIFT_EXTRA_FIELDS: &[ExtraField] = &[
    // general
    extra("jobType", "job_type", Text, "job type"),
    extra("location", "location", Text, "location"),
    extra("clientName", "client_name", Text, "client name"),
    extra("projectName", "project_name", Text, "project name"),
    extra("hostess", "hostess", Text, "hostess"),
    extra("salesAmount", "sales_amount", Real, "sales amount"),
    extra("tipoutPercent", "tipout_percent", Real, "tip-out percent"),
    extra("additionalTipout", "additional_tipout", Real, "additional tip-out"),
    extra("additionalTipoutNote", "additional_tipout_note", Text, "additional tip-out note"),
    extra("commission", "commission", Real, "commission"),
    extra("mileage", "mileage", Real, "mileage"),
    extra("flatRate", "flat_rate", Real, "flat rate"),
    extra("eventCost", "event_cost", Real, "event cost"),
    // rideshare & delivery
    extra("tripCount", "trip_count", Integer, "trip count"),
    extra("totalMiles", "total_miles", Real, "total miles"),
    extra("tipsInApp", "tips_in_app", Real, "in-app tips"),
    extra("surgePeakEarnings", "surge_peak_earnings", Real, "surge earnings"),
    extra("waitTimeMinutes", "wait_time_minutes", Integer, "wait time (minutes)"),
    extra("deadheadMiles", "deadhead_miles", Real, "deadhead miles"),
    extra("platformName", "platform_name", Text, "platform"),
    extra("bonusesIncentives", "bonuses_incentives", Real, "bonuses"),
    // salon
    extra("servicesCount", "services_count", Integer, "services count"),
    extra("retailSales", "retail_sales", Real, "retail sales"),
    extra("productCommissionPercent", "product_commission_percent", Real, "product commission percent"),
    extra("productCommission", "product_commission", Real, "product commission"),
    extra("rebookingCount", "rebooking_count", Integer, "rebookings"),
    // hospitality
    extra("roomServiceTips", "room_service_tips", Real, "room service tips"),
    extra("valetParkingTips", "valet_parking_tips", Real, "valet tips"),
    extra("minibarSales", "minibar_sales", Real, "minibar sales"),
    extra("conciergeTips", "concierge_tips", Real, "concierge tips"),
    extra("bellhopTips", "bellhop_tips", Real, "bellhop tips"),
    extra("housekeepingTips", "housekeeping_tips", Real, "housekeeping tips"),
    extra("banquetTips", "banquet_tips", Real, "banquet tips"),
    extra("spaTips", "spa_tips", Real, "spa tips"),
    extra("poolTips", "pool_tips", Real, "pool tips"),
    extra("frontDeskTips", "front_desk_tips", Real, "front desk tips"),
    extra("hotelRoomNumber", "hotel_room_number", Text, "room number"),
    // fitness
    extra("classCount", "class_count", Integer, "classes taught"),
    extra("personalTrainingSessions", "personal_training_sessions", Integer, "training sessions"),
    extra("membershipSalesCommission", "membership_sales_commission", Real, "membership commission"),
    extra("supplementSales", "supplement_sales", Real, "supplement sales"),
    // healthcare
    extra("proceduresAssisted", "procedures_assisted", Integer, "procedures assisted"),
    extra("overtimeHoursWorked", "overtime_hours_worked", Real, "overtime hours worked"),
    extra("onCallHours", "on_call_hours", Real, "on-call hours"),
    extra("patientCount", "patient_count", Integer, "patient count"),
    // construction
    extra("perDiemAmount", "per_diem_amount", Real, "per diem"),
    extra("toolAllowance", "tool_allowance", Real, "tool allowance"),
    extra("hazardPay", "hazard_pay", Real, "hazard pay"),
    extra("piecesCompleted", "pieces_completed", Integer, "pieces completed"),
    extra("pieceRate", "piece_rate", Real, "piece rate"),
    // freelancer
    extra("invoiceNumber", "invoice_number", Text, "invoice number"),
    extra("retainerAmount", "retainer_amount", Real, "retainer"),
    extra("milestonePayment", "milestone_payment", Real, "milestone payment"),
];

// ─── Lookup ─────────────────────────────────────────────────────────────────

/// Every column of `table`, in declaration order.
pub fn columns(table: Table) -> Vec<Column> {
    let base = match table {
        Table::Shifts => SHIFT_COLUMNS,
        Table::Jobs => JOB_COLUMNS,
        Table::Goals => GOAL_COLUMNS,
        Table::Contacts => CONTACT_COLUMNS,
        Table::UserSettings => SETTINGS_COLUMNS,
        Table::ChatMessages => CHAT_COLUMNS,
    };
    let mut cols = base.to_vec();
    if table == Table::Shifts {
        cols.extend(SHIFT_EXTRA_FIELDS.iter().map(|f| col(f.column, f.kind)));
    }
    cols
}

pub fn column_kind(table: Table, name: &str) -> Option<ColumnKind> {
    columns(table)
        .into_iter()
        .find(|c| c.name == name)
        .map(|c| c.kind)
}

/// `CREATE TABLE IF NOT EXISTS` statement for the embedded adapter.
pub fn create_table_sql(table: Table) -> String {
    let cols: Vec<String> = columns(table)
        .iter()
        .map(|c| {
            if c.name == "id" {
                "id TEXT PRIMARY KEY".to_string()
            } else if c.name == "user_id" {
                "user_id TEXT NOT NULL".to_string()
            } else {
                format!("{} {}", c.name, c.kind.sql_type())
            }
        })
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
        table.as_str(),
        cols.join(",\n    ")
    )
}
