//! The action catalog: every operation the model may request.
//!
//! Action names form a closed enumeration. Each name maps statically to one
//! executor family and to one JSON-schema parameter shape, which is also the
//! tool definition sent on the first model call. The catalog is append-only;
//! bump [`CATALOG_VERSION`] when an action is added.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Map, Value};

use super::errors::DispatchError;
use crate::inference::ToolDefinition;
use crate::store::schema::{ColumnKind, SHIFT_EXTRA_FIELDS};

pub const CATALOG_VERSION: &str = "1";

// ─── Value lists ────────────────────────────────────────────────────────────

pub const THEMES: &[&str] = &[
    "light_mode",
    "finance_green",
    "midnight_blue",
    "purple_reign",
    "ocean_breeze",
    "sunset_glow",
    "forest_night",
    "paypal_blue",
    "finance_pro",
    "light_blue",
    "soft_purple",
];

pub const CONTACT_ROLES: &[&str] = &[
    "dj",
    "band_musician",
    "photo_booth",
    "photographer",
    "videographer",
    "wedding_planner",
    "event_coordinator",
    "hostess",
    "support_staff",
    "security",
    "valet",
    "florist",
    "linen_rental",
    "cake_bakery",
    "catering",
    "rentals",
    "lighting_av",
    "rabbi",
    "priest",
    "pastor",
    "officiant",
    "venue_manager",
    "venue_coordinator",
    "custom",
];

pub const INDUSTRIES: &[&str] = &[
    "Food Service",
    "Beauty & Personal Care",
    "Events",
    "Hospitality",
    "Rideshare",
    "Delivery",
    "Other Services",
];

pub const JOB_TEMPLATES: &[&str] = &["restaurant", "barbershop", "events", "custom"];

pub const SOCIAL_HANDLES: &[&str] = &[
    "instagram",
    "tiktok",
    "facebook",
    "twitter",
    "linkedin",
    "youtube",
    "snapchat",
    "pinterest",
];

// ─── Action names ───────────────────────────────────────────────────────────

/// Which executor owns an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutorFamily {
    Shift,
    Job,
    Goal,
    Contact,
    Settings,
    Analytics,
}

impl ExecutorFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutorFamily::Shift => "shift",
            ExecutorFamily::Job => "job",
            ExecutorFamily::Goal => "goal",
            ExecutorFamily::Contact => "contact",
            ExecutorFamily::Settings => "settings",
            ExecutorFamily::Analytics => "analytics",
        }
    }
}

macro_rules! action_names {
    ($($variant:ident => $name:literal, $family:ident;)+) => {
        /// Every action in the catalog.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ActionName {
            $($variant,)+
        }

        impl ActionName {
            pub const ALL: &'static [ActionName] = &[$(ActionName::$variant,)+];

            /// Wire name, as the model sends it.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ActionName::$variant => $name,)+
                }
            }

            pub fn family(&self) -> ExecutorFamily {
                match self {
                    $(ActionName::$variant => ExecutorFamily::$family,)+
                }
            }
        }
    };
}

action_names! {
    AddShift => "add_shift", Shift;
    EditShift => "edit_shift", Shift;
    DeleteShift => "delete_shift", Shift;
    BulkEditShifts => "bulk_edit_shifts", Shift;
    BulkDeleteShifts => "bulk_delete_shifts", Shift;
    SearchShifts => "search_shifts", Shift;
    GetShiftDetails => "get_shift_details", Shift;
    CalculateShiftTotal => "calculate_shift_total", Shift;
    DuplicateShift => "duplicate_shift", Shift;

    AddEventContact => "add_event_contact", Contact;
    EditEventContact => "edit_event_contact", Contact;
    DeleteEventContact => "delete_event_contact", Contact;
    SearchContacts => "search_contacts", Contact;
    GetContactsForShift => "get_contacts_for_shift", Contact;
    SetContactFavorite => "set_contact_favorite", Contact;

    AddJob => "add_job", Job;
    EditJob => "edit_job", Job;
    DeleteJob => "delete_job", Job;
    SetDefaultJob => "set_default_job", Job;
    EndJob => "end_job", Job;
    RestoreJob => "restore_job", Job;
    GetJobs => "get_jobs", Job;
    GetJobStats => "get_job_stats", Job;
    CompareJobs => "compare_jobs", Job;
    SetJobHourlyRate => "set_job_hourly_rate", Job;

    SetDailyGoal => "set_daily_goal", Goal;
    SetWeeklyGoal => "set_weekly_goal", Goal;
    SetMonthlyGoal => "set_monthly_goal", Goal;
    SetYearlyGoal => "set_yearly_goal", Goal;
    EditGoal => "edit_goal", Goal;
    DeleteGoal => "delete_goal", Goal;
    GetGoals => "get_goals", Goal;
    GetGoalProgress => "get_goal_progress", Goal;

    ChangeTheme => "change_theme", Settings;
    GetAvailableThemes => "get_available_themes", Settings;
    RevertTheme => "revert_theme", Settings;
    ToggleNotifications => "toggle_notifications", Settings;
    SetShiftReminders => "set_shift_reminders", Settings;
    SetGoalReminders => "set_goal_reminders", Settings;
    SetQuietHours => "set_quiet_hours", Settings;
    GetNotificationSettings => "get_notification_settings", Settings;
    SetCurrencyFormat => "set_currency_format", Settings;
    SetDateFormat => "set_date_format", Settings;
    SetWeekStartDay => "set_week_start_day", Settings;
    ClearChatHistory => "clear_chat_history", Settings;
    GetUserSettings => "get_user_settings", Settings;

    GetIncomeSummary => "get_income_summary", Analytics;
    ComparePeriods => "compare_periods", Analytics;
    GetBestDays => "get_best_days", Analytics;
    GetWorstDays => "get_worst_days", Analytics;
    GetProjectedYearEnd => "get_projected_year_end", Analytics;
    GetYearOverYear => "get_year_over_year", Analytics;
    GetEventEarnings => "get_event_earnings", Analytics;
}

impl FromStr for ActionName {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionName::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| DispatchError::UnknownAction {
                name: s.to_string(),
            })
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Tool definitions ───────────────────────────────────────────────────────

/// Tool definitions for the whole catalog, in catalog order.
pub fn definitions() -> Vec<ToolDefinition> {
    ActionName::ALL
        .iter()
        .map(|action| {
            let (description, parameters) = describe(*action);
            ToolDefinition::function(action.as_str(), description, parameters)
        })
        .collect()
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn string(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn number(description: &str) -> Value {
    json!({ "type": "number", "description": description })
}

fn boolean(description: &str) -> Value {
    json!({ "type": "boolean", "description": description })
}

fn one_of(values: &[&str], description: &str) -> Value {
    json!({ "type": "string", "enum": values, "description": description })
}

fn date_range() -> Value {
    json!({
        "type": "object",
        "description": "Inclusive date range",
        "properties": {
            "start": { "type": "string", "description": "Start date (YYYY-MM-DD or natural language)" },
            "end": { "type": "string", "description": "End date (YYYY-MM-DD or natural language)" }
        },
        "required": ["start", "end"]
    })
}

fn confirmed() -> Value {
    boolean("Set true ONLY after the user explicitly approved the change shown in the preview")
}

/// Shift fields shared by `add_shift`, `edit_shift` updates, and bulk edits.
fn shift_field_properties() -> Map<String, Value> {
    let mut props = Map::new();
    props.insert("cashTips".into(), number("Cash tips in dollars"));
    props.insert("creditTips".into(), number("Credit card tips in dollars"));
    props.insert("hourlyRate".into(), number("Hourly wage; defaults to the job's rate"));
    props.insert("hoursWorked".into(), number("Hours worked"));
    props.insert("overtimeHours".into(), number("Overtime hours"));
    props.insert("startTime".into(), string("Start time, HH:MM (24h)"));
    props.insert("endTime".into(), string("End time, HH:MM (24h)"));
    props.insert("eventName".into(), string("Event name, e.g. 'Smith Wedding'"));
    props.insert("guestCount".into(), json!({ "type": "integer", "description": "Number of guests" }));
    props.insert("notes".into(), string("Free-form notes"));
    for field in SHIFT_EXTRA_FIELDS {
        let schema = match field.kind {
            ColumnKind::Text => string(field.label),
            ColumnKind::Integer => json!({ "type": "integer", "description": field.label }),
            _ => number(field.label),
        };
        props.insert(field.key.into(), schema);
    }
    props
}

fn shift_updates() -> Value {
    let mut props = shift_field_properties();
    props.insert("date".into(), string("Move the shift to this date"));
    props.insert("jobId".into(), string("Move the shift to this job"));
    json!({ "type": "object", "description": "Only the fields to change", "properties": props })
}

fn goal_args(period: &str) -> Value {
    object(
        json!({
            "amount": number(&format!("{period} income goal in dollars")),
            "jobId": string("Limit the goal to one job (optional)"),
            "jobName": string("Job name, when the id is unknown"),
            "targetHours": number("Target hours for the period (optional)"),
        }),
        &["amount"],
    )
}

fn job_ref() -> Value {
    json!({
        "jobId": string("Job id from the context"),
        "jobName": string("Job name, when the id is unknown"),
    })
}

fn with_job_ref(mut props: Value) -> Value {
    if let (Some(target), Value::Object(refs)) = (props.as_object_mut(), job_ref()) {
        target.extend(refs);
    }
    props
}

fn period_choice() -> Value {
    one_of(&["week", "month", "year", "all_time"], "Reporting period")
}

fn describe(action: ActionName) -> (&'static str, Value) {
    use ActionName::*;

    match action {
        // Shifts
        AddShift => {
            let mut props = shift_field_properties();
            props.insert("date".into(), string("Shift date (YYYY-MM-DD or natural language like 'yesterday')"));
            props.insert("jobId".into(), string("Job id; auto-selected when the user has one job or a default"));
            props.insert("jobName".into(), string("Job name, when the id is unknown"));
            (
                "Record a new shift with tips, wages, and hours",
                object(Value::Object(props), &["date"]),
            )
        }
        EditShift => (
            "Change fields on the shift worked on a date",
            object(
                json!({
                    "date": string("Date of the shift to edit"),
                    "jobId": string("Narrow to one job when several shifts share the date"),
                    "updates": shift_updates(),
                }),
                &["date", "updates"],
            ),
        ),
        DeleteShift => (
            "Delete the shift worked on a date. Call without confirmed first to preview",
            object(
                json!({
                    "date": string("Date of the shift to delete"),
                    "jobId": string("Narrow to one job when several shifts share the date"),
                    "confirmed": confirmed(),
                }),
                &["date"],
            ),
        ),
        BulkEditShifts => (
            "Apply the same change to every shift matching a date range and/or job. Call without confirmed first to preview",
            object(
                with_job_ref(json!({
                    "startDate": string("First date of the range"),
                    "endDate": string("Last date of the range"),
                    "updates": shift_updates(),
                    "confirmed": confirmed(),
                })),
                &["updates"],
            ),
        ),
        BulkDeleteShifts => (
            "Delete every shift matching a date range and/or job. Call without confirmed first to preview",
            object(
                with_job_ref(json!({
                    "startDate": string("First date of the range"),
                    "endDate": string("Last date of the range"),
                    "confirmed": confirmed(),
                })),
                &[],
            ),
        ),
        SearchShifts => (
            "Find shifts by date range, job, event name, income, or notes",
            object(
                json!({
                    "query": {
                        "type": "object",
                        "properties": {
                            "dateRange": date_range(),
                            "jobId": string("Only this job"),
                            "eventName": string("Event name contains"),
                            "minAmount": number("Minimum total income"),
                            "maxAmount": number("Maximum total income"),
                            "hasNotes": boolean("Only shifts with (true) or without (false) notes"),
                        }
                    }
                }),
                &[],
            ),
        ),
        GetShiftDetails => (
            "Get every recorded detail of the shift on a date",
            object(
                json!({
                    "date": string("Shift date"),
                    "jobId": string("Narrow to one job"),
                }),
                &["date"],
            ),
        ),
        CalculateShiftTotal => (
            "Recalculate the income breakdown of the shift on a date",
            object(json!({ "shiftDate": string("Shift date") }), &["shiftDate"]),
        ),
        DuplicateShift => (
            "Copy a shift to another date",
            object(
                json!({
                    "sourceDate": string("Date of the shift to copy"),
                    "targetDate": string("Date for the copy"),
                }),
                &["sourceDate", "targetDate"],
            ),
        ),

        // Contacts
        AddEventContact => {
            let mut props = contact_properties();
            props.insert("shiftId".into(), string("Link the contact to this shift"));
            props.insert("shiftDate".into(), string("Link the contact to the shift on this date"));
            (
                "Save a vendor or staff contact met at an event",
                object(Value::Object(props), &["name"]),
            )
        }
        EditEventContact => (
            "Update a saved contact, found by id or name",
            object(
                json!({
                    "contactId": string("Contact id"),
                    "name": string("Contact name, when the id is unknown"),
                    "updates": { "type": "object", "properties": contact_properties() },
                }),
                &["updates"],
            ),
        ),
        DeleteEventContact => (
            "Delete a saved contact. Call without confirmed first to preview",
            object(
                json!({
                    "contactId": string("Contact id"),
                    "name": string("Contact name, when the id is unknown"),
                    "confirmed": confirmed(),
                }),
                &[],
            ),
        ),
        SearchContacts => (
            "Search saved contacts by name, role, or company",
            object(
                json!({
                    "query": string("Text to match against name, company, email, or notes"),
                    "role": one_of(CONTACT_ROLES, "Contact role"),
                    "company": string("Company name contains"),
                }),
                &[],
            ),
        ),
        GetContactsForShift => (
            "List the contacts linked to a shift",
            object(
                json!({
                    "shiftId": string("Shift id"),
                    "date": string("Shift date, when the id is unknown"),
                }),
                &[],
            ),
        ),
        SetContactFavorite => (
            "Mark or unmark a contact as a favorite",
            object(
                json!({
                    "contactId": string("Contact id"),
                    "name": string("Contact name, when the id is unknown"),
                    "isFavorite": boolean("Favorite flag"),
                }),
                &["isFavorite"],
            ),
        ),

        // Jobs
        AddJob => (
            "Create a job. Industry is inferred from the title when omitted",
            object(
                json!({
                    "name": string("Job title or workplace"),
                    "industry": one_of(INDUSTRIES, "Industry"),
                    "hourlyRate": number("Base hourly wage"),
                    "color": string("Display color, hex"),
                    "isDefault": boolean("Make this the default job"),
                    "template": one_of(JOB_TEMPLATES, "Shift form template"),
                }),
                &["name"],
            ),
        ),
        EditJob => (
            "Change a job's name, industry, rate, color, or template",
            object(
                with_job_ref(json!({
                    "updates": {
                        "type": "object",
                        "properties": {
                            "name": string("New name"),
                            "industry": one_of(INDUSTRIES, "Industry"),
                            "hourlyRate": number("Hourly wage"),
                            "color": string("Display color, hex"),
                            "template": one_of(JOB_TEMPLATES, "Shift form template"),
                            "isDefault": boolean("Make this the default job"),
                        }
                    }
                })),
                &["updates"],
            ),
        ),
        DeleteJob => (
            "Delete a job (its shifts are kept unless deleteShifts is set). Call without confirmed first to preview",
            object(
                with_job_ref(json!({
                    "deleteShifts": boolean("Also permanently delete the job's shifts"),
                    "confirmed": confirmed(),
                })),
                &[],
            ),
        ),
        SetDefaultJob => (
            "Make a job the default for new shifts",
            object(job_ref(), &[]),
        ),
        EndJob => (
            "Mark a job as ended (no longer working there)",
            object(
                with_job_ref(json!({ "endDate": string("Last day at the job; defaults to today") })),
                &[],
            ),
        ),
        RestoreJob => (
            "Reactivate an ended or deleted job",
            object(job_ref(), &[]),
        ),
        GetJobs => (
            "List the user's jobs",
            object(
                json!({
                    "includeEnded": boolean("Include ended jobs"),
                    "includeDeleted": boolean("Include deleted jobs"),
                }),
                &[],
            ),
        ),
        GetJobStats => (
            "Income, hours, and averages for one job",
            object(with_job_ref(json!({ "period": period_choice() })), &[]),
        ),
        CompareJobs => (
            "Compare income and hourly earnings across jobs",
            object(
                json!({
                    "jobIds": { "type": "array", "items": { "type": "string" }, "description": "Jobs to compare; all active jobs when omitted" },
                    "period": period_choice(),
                }),
                &[],
            ),
        ),
        SetJobHourlyRate => (
            "Change a job's hourly wage, optionally re-rating past shifts. Re-rating past shifts needs a preview first",
            object(
                with_job_ref(json!({
                    "newRate": number("New hourly wage"),
                    "effectiveDate": string("Re-rate shifts on or after this date"),
                    "updatePastShifts": boolean("Also apply the rate to existing shifts"),
                    "confirmed": confirmed(),
                })),
                &["newRate"],
            ),
        ),

        // Goals
        SetDailyGoal => ("Set the daily income goal", goal_args("Daily")),
        SetWeeklyGoal => ("Set the weekly income goal", goal_args("Weekly")),
        SetMonthlyGoal => ("Set the monthly income goal", goal_args("Monthly")),
        SetYearlyGoal => ("Set the yearly income goal", goal_args("Yearly")),
        EditGoal => (
            "Change a goal's amount, target hours, or active flag",
            object(
                with_job_ref(json!({
                    "goalId": string("Goal id"),
                    "period": one_of(&["daily", "weekly", "monthly", "yearly"], "Goal period, when the id is unknown"),
                    "updates": {
                        "type": "object",
                        "properties": {
                            "amount": number("Goal amount"),
                            "targetHours": number("Target hours"),
                            "isActive": boolean("Active flag"),
                        }
                    }
                })),
                &["updates"],
            ),
        ),
        DeleteGoal => (
            "Delete a goal. Call without confirmed first to preview",
            object(
                with_job_ref(json!({
                    "goalId": string("Goal id"),
                    "period": one_of(&["daily", "weekly", "monthly", "yearly"], "Goal period, when the id is unknown"),
                    "confirmed": confirmed(),
                })),
                &[],
            ),
        ),
        GetGoals => (
            "List income goals",
            object(json!({ "includeCompleted": boolean("Include inactive goals") }), &[]),
        ),
        GetGoalProgress => (
            "Progress toward one goal, or every active goal when no id is given",
            object(json!({ "goalId": string("Goal id") }), &[]),
        ),

        // Settings
        ChangeTheme => (
            "Switch the app color theme",
            object(json!({ "theme": one_of(THEMES, "Theme") }), &["theme"]),
        ),
        GetAvailableThemes => ("List the available themes", object(json!({}), &[])),
        RevertTheme => ("Switch back to the previous theme", object(json!({}), &[])),
        ToggleNotifications => (
            "Turn all notifications on or off",
            object(json!({ "enabled": boolean("Notifications on") }), &["enabled"]),
        ),
        SetShiftReminders => (
            "Configure reminders to log shifts",
            object(
                json!({
                    "enabled": boolean("Reminders on"),
                    "reminderTime": one_of(&["morning", "evening", "both"], "When to remind"),
                    "daysBeforeShift": json!({ "type": "integer", "description": "Days ahead to remind" }),
                }),
                &["enabled"],
            ),
        ),
        SetGoalReminders => (
            "Configure goal progress reminders",
            object(
                json!({
                    "enabled": boolean("Reminders on"),
                    "frequency": one_of(&["daily", "weekly", "monthly"], "How often"),
                }),
                &["enabled"],
            ),
        ),
        SetQuietHours => (
            "Silence notifications between two times",
            object(
                json!({
                    "enabled": boolean("Quiet hours on"),
                    "startTime": string("Start, HH:MM (24h)"),
                    "endTime": string("End, HH:MM (24h)"),
                }),
                &["enabled"],
            ),
        ),
        GetNotificationSettings => ("Show notification preferences", object(json!({}), &[])),
        SetCurrencyFormat => (
            "Set the display currency",
            object(
                json!({
                    "currencyCode": string("ISO 4217 code, e.g. USD"),
                    "showCents": boolean("Show cents"),
                }),
                &["currencyCode"],
            ),
        ),
        SetDateFormat => (
            "Set the display date format",
            object(
                json!({ "format": one_of(&["MM/DD/YYYY", "DD/MM/YYYY", "YYYY-MM-DD"], "Date format") }),
                &["format"],
            ),
        ),
        SetWeekStartDay => (
            "Set the first day of the week",
            object(json!({ "day": one_of(&["sunday", "monday"], "Week start") }), &["day"]),
        ),
        ClearChatHistory => (
            "Erase the saved chat history. Call without confirmed first to preview",
            object(json!({ "confirmed": confirmed() }), &[]),
        ),
        GetUserSettings => ("Show every user setting", object(json!({}), &[])),

        // Analytics
        GetIncomeSummary => (
            "Total income, tips, wages, and hours for a period",
            object(
                json!({
                    "period": one_of(&["today", "week", "month", "year", "custom"], "Period"),
                    "dateRange": date_range(),
                    "jobId": string("Only this job"),
                }),
                &["period"],
            ),
        ),
        ComparePeriods => (
            "Compare income between two months or years",
            object(
                json!({
                    "period1": period_schema(),
                    "period2": period_schema(),
                }),
                &["period1", "period2"],
            ),
        ),
        GetBestDays => (
            "Rank weekdays by average income, best first",
            object(
                json!({
                    "limit": json!({ "type": "integer", "description": "How many days (default 5)" }),
                    "jobId": string("Only this job"),
                }),
                &[],
            ),
        ),
        GetWorstDays => (
            "Rank weekdays by average income, worst first",
            object(
                json!({
                    "limit": json!({ "type": "integer", "description": "How many days (default 5)" }),
                    "jobId": string("Only this job"),
                }),
                &[],
            ),
        ),
        GetProjectedYearEnd => (
            "Project year-end income from the pace so far",
            object(json!({ "year": json!({ "type": "integer", "description": "Year; defaults to the current year" }) }), &[]),
        ),
        GetYearOverYear => (
            "Compare this year to date against the same span last year",
            object(json!({}), &[]),
        ),
        GetEventEarnings => (
            "Total earnings from shifts at a named event",
            object(json!({ "eventName": string("Event name contains") }), &["eventName"]),
        ),
    }
}

fn period_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "period": one_of(&["month", "year"], "Granularity"),
            "year": json!({ "type": "integer" }),
            "month": json!({ "type": "integer", "description": "1-12, for month periods" }),
        },
        "required": ["period", "year"]
    })
}

fn contact_properties() -> Map<String, Value> {
    let mut props = Map::new();
    props.insert("name".into(), string("Contact name"));
    props.insert("role".into(), one_of(CONTACT_ROLES, "Role at the event"));
    props.insert("customRole".into(), string("Role description when role is custom"));
    props.insert("company".into(), string("Company"));
    props.insert("phone".into(), string("Phone number"));
    props.insert("email".into(), string("Email address"));
    props.insert("website".into(), string("Website"));
    props.insert("notes".into(), string("Notes"));
    for handle in SOCIAL_HANDLES {
        props.insert((*handle).into(), string(&format!("{handle} handle")));
    }
    props
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_round_trip_and_are_unique() {
        let mut seen = HashSet::new();
        for action in ActionName::ALL {
            assert!(seen.insert(action.as_str()), "duplicate {}", action);
            assert_eq!(action.as_str().parse::<ActionName>().unwrap(), *action);
        }
        assert_eq!(ActionName::ALL.len(), 53);
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = "export_to_csv".parse::<ActionName>().unwrap_err();
        assert_eq!(err.kind(), "unknown_action");
    }

    #[test]
    fn test_families() {
        assert_eq!(ActionName::AddShift.family(), ExecutorFamily::Shift);
        // Name-based routing would have sent these to the wrong executor.
        assert_eq!(ActionName::GetContactsForShift.family(), ExecutorFamily::Contact);
        assert_eq!(ActionName::SetJobHourlyRate.family(), ExecutorFamily::Job);
        assert_eq!(ActionName::GetYearOverYear.family(), ExecutorFamily::Analytics);
        assert_eq!(ActionName::ClearChatHistory.family(), ExecutorFamily::Settings);
    }

    #[test]
    fn test_definitions_cover_catalog() {
        let defs = definitions();
        assert_eq!(defs.len(), ActionName::ALL.len());
        for def in &defs {
            assert_eq!(def.function.parameters["type"], "object");
            assert!(!def.function.description.is_empty());
        }
    }

    #[test]
    fn test_add_shift_schema_includes_industry_fields() {
        let defs = definitions();
        let add = defs
            .iter()
            .find(|d| d.function.name == "add_shift")
            .unwrap();
        let props = &add.function.parameters["properties"];
        assert_eq!(props["tripCount"]["type"], "integer");
        assert_eq!(props["platformName"]["type"], "string");
        assert_eq!(props["cashTips"]["type"], "number");
        assert_eq!(add.function.parameters["required"], json!(["date"]));
    }
}
