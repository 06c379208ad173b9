//! User preferences. The settings row is created lazily with defaults on
//! the first write.

use chrono::NaiveTime;
use serde_json::{json, Value};

use super::ExecContext;
use crate::agent_core::actions::{
    ChangeThemeArgs, ConfirmArgs, CurrencyArgs, DateFormatArgs, GoalRemindersArgs,
    QuietHoursArgs, SettingsAction, ShiftRemindersArgs, ToggleArgs, WeekStartArgs,
};
use crate::agent_core::catalog::THEMES;
use crate::agent_core::errors::DispatchError;
use crate::agent_core::types::ActionOutcome;
use crate::store::{flag, text, Row, Table};

pub const DEFAULT_THEME: &str = "finance_green";

fn defaults() -> Row {
    let mut row = Row::new();
    row.insert("theme".into(), json!(DEFAULT_THEME));
    row.insert("notifications_enabled".into(), json!(true));
    row.insert("shift_reminders_enabled".into(), json!(false));
    row.insert("goal_reminders_enabled".into(), json!(false));
    row.insert("quiet_hours_enabled".into(), json!(false));
    row.insert("currency_code".into(), json!("USD"));
    row.insert("show_cents".into(), json!(true));
    row.insert("date_format".into(), json!("MM/DD/YYYY"));
    row.insert("week_start_day".into(), json!("sunday"));
    row
}

pub async fn execute(ctx: &ExecContext, action: SettingsAction) -> Result<ActionOutcome, DispatchError> {
    match action {
        SettingsAction::ChangeTheme(args) => change_theme(ctx, args).await,
        SettingsAction::AvailableThemes => available_themes(ctx).await,
        SettingsAction::RevertTheme => revert_theme(ctx).await,
        SettingsAction::ToggleNotifications(args) => toggle_notifications(ctx, args).await,
        SettingsAction::ShiftReminders(args) => shift_reminders(ctx, args).await,
        SettingsAction::GoalReminders(args) => goal_reminders(ctx, args).await,
        SettingsAction::QuietHours(args) => quiet_hours(ctx, args).await,
        SettingsAction::NotificationSettings => notification_settings(ctx).await,
        SettingsAction::CurrencyFormat(args) => currency_format(ctx, args).await,
        SettingsAction::DateFormat(args) => date_format(ctx, args).await,
        SettingsAction::WeekStartDay(args) => week_start_day(ctx, args).await,
        SettingsAction::ClearChatHistory(args) => clear_chat_history(ctx, args).await,
        SettingsAction::UserSettings => user_settings(ctx).await,
    }
}

/// The stored row, or the defaults when none exists yet.
async fn current(ctx: &ExecContext) -> Result<Row, DispatchError> {
    Ok(ctx.settings_row().await?.unwrap_or_else(defaults))
}

/// Apply `patch` to the settings row, creating it with defaults first if
/// needed. Returns the saved row.
async fn write(ctx: &ExecContext, patch: Row) -> Result<Row, DispatchError> {
    match ctx.settings_row().await? {
        Some(existing) => {
            let q = ctx
                .query(Table::UserSettings)
                .eq("id", existing.get("id").cloned().unwrap_or(Value::Null));
            Ok(ctx
                .store
                .update(&q, &patch)
                .await?
                .into_iter()
                .next()
                .unwrap_or(existing))
        }
        None => {
            let mut row = defaults();
            row.extend(patch);
            ctx.insert(Table::UserSettings, row).await
        }
    }
}

fn patch(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

fn theme_label(theme: &str) -> String {
    theme.replace('_', " ")
}

/// `HH:MM`, 24-hour.
fn check_clock(field: &str, value: &str) -> Result<String, DispatchError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| DispatchError::validation(format!("{field} must be a 24-hour time like 22:00")))
}

// ─── Theme ──────────────────────────────────────────────────────────────────

async fn change_theme(ctx: &ExecContext, args: ChangeThemeArgs) -> Result<ActionOutcome, DispatchError> {
    let wanted = args.theme.trim().to_lowercase().replace([' ', '-'], "_");
    if !THEMES.contains(&wanted.as_str()) {
        return Err(DispatchError::validation(format!(
            "Unknown theme \"{}\". Available themes: {}",
            args.theme,
            THEMES.join(", ")
        )));
    }
    let previous = text(&current(ctx).await?, "theme")
        .unwrap_or(DEFAULT_THEME)
        .to_string();
    if previous == wanted {
        return Ok(ActionOutcome::done(
            format!("You're already using the {} theme.", theme_label(&wanted)),
            json!({ "theme": wanted }),
        ));
    }
    write(
        ctx,
        patch(&[("theme", json!(wanted)), ("previous_theme", json!(previous))]),
    )
    .await?;
    Ok(ActionOutcome::done(
        format!("🎨 Switched to the {} theme.", theme_label(&wanted)),
        json!({ "theme": wanted, "previousTheme": previous }),
    ))
}

async fn available_themes(ctx: &ExecContext) -> Result<ActionOutcome, DispatchError> {
    let current = text(&current(ctx).await?, "theme")
        .unwrap_or(DEFAULT_THEME)
        .to_string();
    let labels: Vec<String> = THEMES.iter().map(|t| theme_label(t)).collect();
    Ok(ActionOutcome::done(
        format!("Available themes: {}.", labels.join(", ")),
        json!({ "themes": THEMES, "currentTheme": current }),
    ))
}

async fn revert_theme(ctx: &ExecContext) -> Result<ActionOutcome, DispatchError> {
    let row = current(ctx).await?;
    let Some(previous) = text(&row, "previous_theme").map(str::to_string) else {
        return Err(DispatchError::not_found("There's no previous theme to go back to"));
    };
    let now = text(&row, "theme").unwrap_or(DEFAULT_THEME).to_string();
    write(
        ctx,
        patch(&[("theme", json!(previous)), ("previous_theme", json!(now))]),
    )
    .await?;
    Ok(ActionOutcome::done(
        format!("🎨 Switched back to the {} theme.", theme_label(&previous)),
        json!({ "theme": previous }),
    ))
}

// ─── Notifications ──────────────────────────────────────────────────────────

async fn toggle_notifications(ctx: &ExecContext, args: ToggleArgs) -> Result<ActionOutcome, DispatchError> {
    write(ctx, patch(&[("notifications_enabled", json!(args.enabled))])).await?;
    Ok(ActionOutcome::done(
        format!("🔔 Notifications turned {}.", on_off(args.enabled)),
        json!({ "notificationsEnabled": args.enabled }),
    ))
}

async fn shift_reminders(ctx: &ExecContext, args: ShiftRemindersArgs) -> Result<ActionOutcome, DispatchError> {
    if let Some(days) = args.days_before_shift {
        if !(0..=7).contains(&days) {
            return Err(DispatchError::validation("daysBeforeShift must be between 0 and 7"));
        }
    }
    let time = args.reminder_time.map(|t| t.as_str());
    write(
        ctx,
        patch(&[
            ("shift_reminders_enabled", json!(args.enabled)),
            ("reminder_time", json!(time)),
            ("reminder_days_before", json!(args.days_before_shift)),
        ]),
    )
    .await?;
    let detail = match (args.enabled, time) {
        (true, Some(t)) => format!(" ({t})"),
        _ => String::new(),
    };
    Ok(ActionOutcome::done(
        format!("🔔 Shift reminders turned {}{detail}.", on_off(args.enabled)),
        json!({
            "shiftRemindersEnabled": args.enabled,
            "reminderTime": time,
            "daysBeforeShift": args.days_before_shift,
        }),
    ))
}

async fn goal_reminders(ctx: &ExecContext, args: GoalRemindersArgs) -> Result<ActionOutcome, DispatchError> {
    let frequency = args.frequency.map(|f| f.as_str());
    write(
        ctx,
        patch(&[
            ("goal_reminders_enabled", json!(args.enabled)),
            ("goal_reminder_frequency", json!(frequency)),
        ]),
    )
    .await?;
    Ok(ActionOutcome::done(
        format!("🎯 Goal reminders turned {}.", on_off(args.enabled)),
        json!({ "goalRemindersEnabled": args.enabled, "frequency": frequency }),
    ))
}

async fn quiet_hours(ctx: &ExecContext, args: QuietHoursArgs) -> Result<ActionOutcome, DispatchError> {
    let start = args
        .start_time
        .as_deref()
        .map(|t| check_clock("startTime", t))
        .transpose()?;
    let end = args
        .end_time
        .as_deref()
        .map(|t| check_clock("endTime", t))
        .transpose()?;
    if args.enabled && (start.is_none() || end.is_none()) {
        let row = current(ctx).await?;
        if (start.is_none() && text(&row, "quiet_hours_start").is_none())
            || (end.is_none() && text(&row, "quiet_hours_end").is_none())
        {
            return Err(DispatchError::validation(
                "Quiet hours need a startTime and endTime the first time they're turned on",
            ));
        }
    }
    let saved = write(
        ctx,
        patch(&[
            ("quiet_hours_enabled", json!(args.enabled)),
            ("quiet_hours_start", json!(start)),
            ("quiet_hours_end", json!(end)),
        ]),
    )
    .await?;
    let message = if args.enabled {
        format!(
            "🌙 Quiet hours on from {} to {}.",
            text(&saved, "quiet_hours_start").unwrap_or("?"),
            text(&saved, "quiet_hours_end").unwrap_or("?")
        )
    } else {
        "Quiet hours turned off.".to_string()
    };
    Ok(ActionOutcome::done(
        message,
        json!({
            "quietHoursEnabled": args.enabled,
            "startTime": text(&saved, "quiet_hours_start"),
            "endTime": text(&saved, "quiet_hours_end"),
        }),
    ))
}

async fn notification_settings(ctx: &ExecContext) -> Result<ActionOutcome, DispatchError> {
    let row = current(ctx).await?;
    Ok(ActionOutcome::data(json!({
        "notificationsEnabled": flag(&row, "notifications_enabled"),
        "shiftRemindersEnabled": flag(&row, "shift_reminders_enabled"),
        "reminderTime": text(&row, "reminder_time"),
        "daysBeforeShift": row.get("reminder_days_before").cloned().unwrap_or(Value::Null),
        "goalRemindersEnabled": flag(&row, "goal_reminders_enabled"),
        "goalReminderFrequency": text(&row, "goal_reminder_frequency"),
        "quietHoursEnabled": flag(&row, "quiet_hours_enabled"),
        "quietHoursStart": text(&row, "quiet_hours_start"),
        "quietHoursEnd": text(&row, "quiet_hours_end"),
    })))
}

// ─── Display ────────────────────────────────────────────────────────────────

async fn currency_format(ctx: &ExecContext, args: CurrencyArgs) -> Result<ActionOutcome, DispatchError> {
    let code = args.currency_code.trim().to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(DispatchError::validation(format!(
            "\"{}\" is not a 3-letter currency code",
            args.currency_code
        )));
    }
    write(
        ctx,
        patch(&[("currency_code", json!(code)), ("show_cents", json!(args.show_cents))]),
    )
    .await?;
    Ok(ActionOutcome::done(
        format!("💱 Currency set to {code}."),
        json!({ "currencyCode": code, "showCents": args.show_cents }),
    ))
}

async fn date_format(ctx: &ExecContext, args: DateFormatArgs) -> Result<ActionOutcome, DispatchError> {
    let format = args.format.as_str();
    write(ctx, patch(&[("date_format", json!(format))])).await?;
    Ok(ActionOutcome::done(
        format!("📅 Dates will show as {format}."),
        json!({ "dateFormat": format }),
    ))
}

async fn week_start_day(ctx: &ExecContext, args: WeekStartArgs) -> Result<ActionOutcome, DispatchError> {
    let day = args.day.as_str();
    write(ctx, patch(&[("week_start_day", json!(day))])).await?;
    Ok(ActionOutcome::done(
        format!("📅 Weeks now start on {day}."),
        json!({ "weekStartDay": day }),
    ))
}

// ─── Account ────────────────────────────────────────────────────────────────

async fn clear_chat_history(ctx: &ExecContext, args: ConfirmArgs) -> Result<ActionOutcome, DispatchError> {
    let messages = ctx.select(&ctx.query(Table::ChatMessages)).await?;
    if messages.is_empty() {
        return Ok(ActionOutcome::done(
            "Your chat history is already empty.",
            json!({ "deleted": 0 }),
        ));
    }
    if !args.confirmed {
        return Ok(ActionOutcome::confirm(
            format!(
                "Are you sure you want to clear your chat history? This deletes {} messages.",
                messages.len()
            ),
            json!({ "count": messages.len() }),
        ));
    }
    let deleted = ctx.store.delete(&ctx.query(Table::ChatMessages)).await?;
    Ok(ActionOutcome::done(
        format!("🧹 Cleared {} messages from your chat history.", deleted.len()),
        json!({ "deleted": deleted.len() }),
    ))
}

async fn user_settings(ctx: &ExecContext) -> Result<ActionOutcome, DispatchError> {
    let row = current(ctx).await?;
    Ok(ActionOutcome::data(json!({
        "theme": text(&row, "theme").unwrap_or(DEFAULT_THEME),
        "currencyCode": text(&row, "currency_code").unwrap_or("USD"),
        "showCents": row.get("show_cents").and_then(Value::as_bool).unwrap_or(true),
        "dateFormat": text(&row, "date_format").unwrap_or("MM/DD/YYYY"),
        "weekStartDay": text(&row, "week_start_day").unwrap_or("sunday"),
        "notificationsEnabled": flag(&row, "notifications_enabled"),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_core::actions::Action;
    use crate::agent_core::catalog::ActionName;
    use crate::executors::test_support::*;
    use chrono::Weekday;

    async fn run(ctx: &ExecContext, name: ActionName, args: Value) -> Result<ActionOutcome, DispatchError> {
        match Action::parse(name, args)? {
            Action::Settings(a) => execute(ctx, a).await,
            other => panic!("not a settings action: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_theme_change_and_revert() {
        let ctx = ctx();
        let out = run(&ctx, ActionName::ChangeTheme, json!({ "theme": "Ocean Breeze" }))
            .await
            .unwrap();
        assert_eq!(out.message(), Some("🎨 Switched to the ocean breeze theme."));

        let row = ctx.settings_row().await.unwrap().unwrap();
        assert_eq!(text(&row, "theme"), Some("ocean_breeze"));
        assert_eq!(text(&row, "previous_theme"), Some(DEFAULT_THEME));

        run(&ctx, ActionName::RevertTheme, json!({})).await.unwrap();
        let row = ctx.settings_row().await.unwrap().unwrap();
        assert_eq!(text(&row, "theme"), Some(DEFAULT_THEME));
    }

    #[tokio::test]
    async fn test_unknown_theme_rejected() {
        let ctx = ctx();
        let err = run(&ctx, ActionName::ChangeTheme, json!({ "theme": "neon" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_failed");
        assert!(ctx.settings_row().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_settings_row_created_once() {
        let ctx = ctx();
        run(&ctx, ActionName::SetCurrencyFormat, json!({ "currencyCode": "eur" }))
            .await
            .unwrap();
        run(&ctx, ActionName::SetWeekStartDay, json!({ "day": "monday" }))
            .await
            .unwrap();
        let rows = ctx.select(&ctx.query(Table::UserSettings)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(text(&rows[0], "currency_code"), Some("EUR"));
        assert_eq!(ctx.week_start().await.unwrap(), Weekday::Mon);
    }

    #[tokio::test]
    async fn test_quiet_hours_validate_clock() {
        let ctx = ctx();
        let err = run(
            &ctx,
            ActionName::SetQuietHours,
            json!({ "enabled": true, "startTime": "10pm", "endTime": "07:00" }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "validation_failed");

        let out = run(
            &ctx,
            ActionName::SetQuietHours,
            json!({ "enabled": true, "startTime": "22:00", "endTime": "7:00" }),
        )
        .await
        .unwrap();
        assert_eq!(out.message(), Some("🌙 Quiet hours on from 22:00 to 07:00."));
    }

    #[tokio::test]
    async fn test_clear_chat_history_is_gated() {
        let ctx = ctx();
        for text in ["hi", "add a shift"] {
            ctx.insert(Table::ChatMessages, row(json!({ "message": text, "is_user": true })))
                .await
                .unwrap();
        }
        let out = run(&ctx, ActionName::ClearChatHistory, json!({})).await.unwrap();
        assert!(matches!(out, ActionOutcome::ConfirmationRequired { .. }));

        let out = run(&ctx, ActionName::ClearChatHistory, json!({ "confirmed": true }))
            .await
            .unwrap();
        assert_eq!(out.message(), Some("🧹 Cleared 2 messages from your chat history."));
        assert!(ctx.select(&ctx.query(Table::ChatMessages)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_user_settings_defaults() {
        let ctx = ctx();
        let out = run(&ctx, ActionName::GetUserSettings, json!({})).await.unwrap();
        let ActionOutcome::Completed { data, .. } = out else {
            panic!("expected completion");
        };
        assert_eq!(data["theme"], DEFAULT_THEME);
        assert_eq!(data["weekStartDay"], "sunday");
    }
}
