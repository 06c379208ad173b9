//! Shift executor: create, edit, delete, bulk changes, and reads.
//!
//! Deletes and bulk changes are two-phase. An unconfirmed call selects the
//! affected rows and describes the change without writing anything; a
//! confirmed call selects again from the current arguments and applies it.

use std::collections::HashMap;

use serde_json::{json, Value};

use super::{money, round2, shift_totals, with_totals, ExecContext};
use crate::agent_core::actions::{
    AddShiftArgs, BulkDeleteArgs, BulkEditArgs, CalculateTotalArgs, DeleteShiftArgs,
    DuplicateShiftArgs, EditShiftArgs, SearchShiftsArgs, ShiftAction, ShiftDetailsArgs,
    ShiftSelection,
};
use crate::agent_core::errors::DispatchError;
use crate::agent_core::types::ActionOutcome;
use crate::store::{flag, num, opt_num, text, Row, Table};

/// Rows fetched per search before amount filters apply.
pub const SEARCH_PAGE_SIZE: usize = 200;

/// Dates listed in a bulk preview.
const PREVIEW_DATES: usize = 5;

pub async fn execute(ctx: &ExecContext, action: ShiftAction) -> Result<ActionOutcome, DispatchError> {
    match action {
        ShiftAction::Add(args) => add_shift(ctx, args).await,
        ShiftAction::Edit(args) => edit_shift(ctx, args).await,
        ShiftAction::Delete(args) => delete_shift(ctx, args).await,
        ShiftAction::BulkEdit(args) => bulk_edit_shifts(ctx, args).await,
        ShiftAction::BulkDelete(args) => bulk_delete_shifts(ctx, args).await,
        ShiftAction::Search(args) => search_shifts(ctx, args).await,
        ShiftAction::Details(args) => shift_details(ctx, args).await,
        ShiftAction::CalculateTotal(args) => calculate_total(ctx, args).await,
        ShiftAction::Duplicate(args) => duplicate_shift(ctx, args).await,
    }
}

// ─── Rate resolution ────────────────────────────────────────────────────────

/// Hourly rate for a shift: the explicit argument, else the row's own
/// positive rate, else the job's positive rate.
pub fn effective_rate(explicit: Option<f64>, row_rate: Option<f64>, job_rate: Option<f64>) -> Option<f64> {
    explicit
        .or_else(|| row_rate.filter(|r| *r > 0.0))
        .or_else(|| job_rate.filter(|r| *r > 0.0))
}

/// The job new shifts attach to when none is named: the only active job,
/// else the default among several.
pub async fn auto_select_job(ctx: &ExecContext) -> Result<Option<Row>, DispatchError> {
    let jobs = ctx
        .select(
            &ctx.query(Table::Jobs)
                .eq("is_active", true)
                .is_null("deleted_at")
                .order_by("is_default", false),
        )
        .await?;
    if jobs.len() == 1 {
        return Ok(jobs.into_iter().next());
    }
    Ok(jobs.into_iter().find(|j| flag(j, "is_default")))
}

async fn job_rate(ctx: &ExecContext, job_id: Option<&str>) -> Result<Option<f64>, DispatchError> {
    let Some(id) = job_id else {
        return Ok(None);
    };
    let job = ctx.first(ctx.query(Table::Jobs).eq("id", id)).await?;
    Ok(job.and_then(|j| opt_num(&j, "hourly_rate")))
}

// ─── Lookup ─────────────────────────────────────────────────────────────────

/// The single shift on `date`, optionally narrowed to one job.
async fn find_shift_on(ctx: &ExecContext, date: &str, job_id: Option<&str>) -> Result<Row, DispatchError> {
    let mut q = ctx.query(Table::Shifts).eq("date", date);
    if let Some(job) = job_id {
        q = q.eq("job_id", job);
    }
    let mut shifts = ctx.select(&q).await?;
    match shifts.len() {
        0 => Err(DispatchError::not_found(format!("No shift found on {date}"))),
        1 => Ok(shifts.remove(0)),
        n => Err(DispatchError::validation(format!(
            "Found {n} shifts on {date}. Say which job the shift was for so I can pick the right one."
        ))),
    }
}

async fn select_shifts(ctx: &ExecContext, selection: &ShiftSelection) -> Result<Vec<Row>, DispatchError> {
    let sel = selection.normalized();
    let mut q = ctx.query(Table::Shifts);
    if let Some(start) = sel.start_date.as_deref() {
        q = q.gte("date", start);
    }
    if let Some(end) = sel.end_date.as_deref() {
        q = q.lte("date", end);
    }
    if !sel.job.is_empty() {
        let job = ctx.require_job(&sel.job, true).await?;
        q = q.eq("job_id", text(&job, "id").unwrap_or_default());
    }
    ctx.select(&q.order_by("date", true)).await
}

fn row_id(row: &Row) -> Value {
    row.get("id").cloned().unwrap_or(Value::Null)
}

fn date_of(row: &Row) -> &str {
    text(row, "date").unwrap_or_default()
}

fn date_span(shifts: &[Row]) -> String {
    let first = shifts.first().map(date_of).unwrap_or_default();
    let last = shifts.last().map(date_of).unwrap_or_default();
    format!("{first} to {last}")
}

fn preview_dates(shifts: &[Row]) -> Vec<String> {
    shifts
        .iter()
        .take(PREVIEW_DATES)
        .map(|s| date_of(s).to_string())
        .collect()
}

// ─── Create ─────────────────────────────────────────────────────────────────

async fn add_shift(ctx: &ExecContext, args: AddShiftArgs) -> Result<ActionOutcome, DispatchError> {
    let (job, auto_selected) = if args.job.is_empty() {
        let job = auto_select_job(ctx).await?;
        let auto = job.is_some();
        (job, auto)
    } else {
        (Some(ctx.require_job(&args.job, false).await?), false)
    };

    let mut row = args.fields.to_columns()?;
    row.insert("date".into(), Value::String(args.date.clone()));
    for column in ["cash_tips", "credit_tips", "hours_worked"] {
        row.entry(column).or_insert(json!(0.0));
    }
    let rate = effective_rate(
        args.fields.hourly_rate,
        None,
        job.as_ref().and_then(|j| opt_num(j, "hourly_rate")),
    )
    .unwrap_or(0.0);
    row.insert("hourly_rate".into(), json!(rate));
    if let Some(job) = &job {
        row.insert("job_id".into(), row_id(job));
    }

    let saved = ctx.insert(Table::Shifts, row).await?;
    let totals = shift_totals(&saved);
    let job_name = job.as_ref().and_then(|j| text(j, "name")).map(str::to_string);

    let mut missing = Vec::new();
    if args.fields.hours_worked.map_or(true, |h| h <= 0.0) {
        missing.push("hours worked");
    }
    if args.fields.start_time.is_none() || args.fields.end_time.is_none() {
        missing.push("start/end time");
    }

    let at_job = job_name
        .as_deref()
        .map(|n| format!(" at {n}"))
        .unwrap_or_default();
    let message = format!(
        "✅ Added shift for {}{at_job}. Total: {}.",
        args.date,
        money(totals.total_income)
    );

    tracing::info!(
        date = %args.date,
        job_auto_selected = auto_selected,
        hourly_rate = rate,
        "shift added"
    );

    Ok(ActionOutcome::done(
        message,
        json!({
            "shift": with_totals(saved.clone()),
            "jobName": job_name,
            "jobAutoSelected": auto_selected,
            "summary": {
                "date": args.date,
                "totalIncome": round2(totals.total_income),
                "cashTips": num(&saved, "cash_tips"),
                "creditTips": num(&saved, "credit_tips"),
                "hours": num(&saved, "hours_worked"),
                "eventName": saved.get("event_name").cloned().unwrap_or(Value::Null),
                "jobName": job_name,
            },
            "missingFields": if missing.is_empty() { Value::Null } else { json!(missing) },
        }),
    ))
}

// ─── Update ─────────────────────────────────────────────────────────────────

async fn edit_shift(ctx: &ExecContext, args: EditShiftArgs) -> Result<ActionOutcome, DispatchError> {
    let before = find_shift_on(ctx, &args.date, args.job_id.as_deref()).await?;
    let mut patch = args.updates.to_columns()?;
    if patch.is_empty() {
        return Err(DispatchError::validation("No changes were given for the shift"));
    }

    let mut rate_applied = None;
    if args.updates.fields.touches_earnings() && args.updates.fields.hourly_rate.is_none() {
        let row_rate = opt_num(&before, "hourly_rate");
        if row_rate.map_or(true, |r| r <= 0.0) {
            let job_id = args
                .updates
                .job_id
                .as_deref()
                .or_else(|| text(&before, "job_id"));
            let job_rate = job_rate(ctx, job_id).await?;
            if let Some(rate) = effective_rate(None, row_rate, job_rate) {
                patch.insert("hourly_rate".into(), json!(rate));
                rate_applied = Some(rate);
            }
        }
    }

    let after = ctx
        .store
        .update(&ctx.query(Table::Shifts).eq("id", row_id(&before)), &patch)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DispatchError::not_found(format!("No shift found on {}", args.date)))?;

    let changes = args.updates.describe_changes().join(", ");
    let mut message = format!(
        "✅ Updated shift on {}: {changes}. New total: {}.",
        args.date,
        money(shift_totals(&after).total_income)
    );
    if let Some(rate) = rate_applied {
        message.push_str(&format!(" Applied your job's hourly rate of {}/hr.", money(rate)));
    }

    Ok(ActionOutcome::done(
        message,
        json!({
            "before": with_totals(before),
            "after": with_totals(after),
            "hourlyRateApplied": rate_applied.is_some(),
        }),
    ))
}

// ─── Delete ─────────────────────────────────────────────────────────────────

async fn delete_shift(ctx: &ExecContext, args: DeleteShiftArgs) -> Result<ActionOutcome, DispatchError> {
    let shift = find_shift_on(ctx, &args.date, args.job_id.as_deref()).await?;
    let total = shift_totals(&shift).total_income;

    if !args.confirmed {
        return Ok(ActionOutcome::confirm(
            format!(
                "Are you sure you want to delete the shift from {}? You earned {} that day.",
                args.date,
                money(total)
            ),
            json!({ "shift": with_totals(shift) }),
        ));
    }

    ctx.store
        .delete(&ctx.query(Table::Shifts).eq("id", row_id(&shift)))
        .await?;
    Ok(ActionOutcome::done(
        format!("Shift from {} deleted successfully.", args.date),
        json!({ "deletedShift": with_totals(shift) }),
    ))
}

// ─── Bulk ───────────────────────────────────────────────────────────────────

async fn bulk_edit_shifts(ctx: &ExecContext, args: BulkEditArgs) -> Result<ActionOutcome, DispatchError> {
    let patch = args.updates.to_columns()?;
    if patch.is_empty() {
        return Err(DispatchError::validation("No changes were given for the shifts"));
    }

    let shifts = select_shifts(ctx, &args.selection).await?;
    if shifts.is_empty() {
        return Err(DispatchError::not_found("No shifts found matching those criteria."));
    }
    let span = date_span(&shifts);
    let changes = args.updates.describe_changes().join(", ");

    if !args.confirmed {
        return Ok(ActionOutcome::confirm(
            format!(
                "I found {} shifts from {span}. I'll update {changes}. Should I proceed?",
                shifts.len()
            ),
            json!({
                "count": shifts.len(),
                "dateRange": span,
                "changes": changes,
                "shiftDates": preview_dates(&shifts),
            }),
        ));
    }

    let needs_rate_check =
        args.updates.fields.touches_earnings() && args.updates.fields.hourly_rate.is_none();
    if !needs_rate_check {
        let ids = shifts.iter().map(row_id).collect();
        let updated = ctx
            .store
            .update(&ctx.query(Table::Shifts).is_in("id", ids), &patch)
            .await?;
        return Ok(ActionOutcome::done(
            format!("✅ Updated {} shifts successfully!", updated.len()),
            json!({ "count": updated.len(), "dateRange": span }),
        ));
    }

    // Row by row, so shifts without a rate pick up their job's rate.
    let jobs = ctx.select(&ctx.query(Table::Jobs)).await?;
    let job_rates: HashMap<String, f64> = jobs
        .iter()
        .filter_map(|j| Some((text(j, "id")?.to_string(), opt_num(j, "hourly_rate")?)))
        .filter(|(_, rate)| *rate > 0.0)
        .collect();

    let mut updated = 0usize;
    let mut failed = 0usize;
    let mut rate_applied = 0usize;
    let mut applied_rates: Vec<f64> = Vec::new();
    for shift in &shifts {
        let mut row_patch = patch.clone();
        let job_rate = text(shift, "job_id").and_then(|id| job_rates.get(id).copied());
        let row_rate = opt_num(shift, "hourly_rate");
        let backfill = if row_rate.map_or(true, |r| r <= 0.0) {
            effective_rate(None, row_rate, job_rate)
        } else {
            None
        };
        if let Some(rate) = backfill {
            row_patch.insert("hourly_rate".into(), json!(rate));
        }
        match ctx
            .store
            .update(&ctx.query(Table::Shifts).eq("id", row_id(shift)), &row_patch)
            .await
        {
            Ok(rows) if !rows.is_empty() => {
                updated += 1;
                if let Some(rate) = backfill {
                    rate_applied += 1;
                    if !applied_rates.contains(&rate) {
                        applied_rates.push(rate);
                    }
                }
            }
            Ok(_) => failed += 1,
            Err(e) => {
                tracing::warn!(date = date_of(shift), error = %e, "bulk shift update failed");
                failed += 1;
            }
        }
    }

    // A single figure only when every backfilled shift got the same rate.
    let single_rate = match applied_rates.as_slice() {
        [rate] => Some(*rate),
        _ => None,
    };
    let mut message = format!("✅ Updated {updated} shifts successfully!");
    if rate_applied > 0 {
        let rate = single_rate
            .map(|r| format!("hourly rate of {}/hr from your job", money(r)))
            .unwrap_or_else(|| "each job's hourly rate".to_string());
        message.push_str(&format!(
            " Also applied {rate} to {rate_applied} shifts that were missing it."
        ));
    }
    if failed > 0 {
        message.push_str(&format!(" ⚠️ {failed} shifts could not be updated."));
    }

    Ok(ActionOutcome::done(
        message,
        json!({
            "count": updated,
            "failed": failed,
            "dateRange": span,
            "hourlyRateApplied": rate_applied > 0,
            "hourlyRate": single_rate,
            "hourlyRates": applied_rates,
        }),
    ))
}

async fn bulk_delete_shifts(ctx: &ExecContext, args: BulkDeleteArgs) -> Result<ActionOutcome, DispatchError> {
    let shifts = select_shifts(ctx, &args.selection).await?;
    if shifts.is_empty() {
        return Err(DispatchError::not_found("No shifts found matching those criteria."));
    }
    let span = date_span(&shifts);
    let total: f64 = shifts.iter().map(|s| shift_totals(s).total_income).sum();

    if !args.confirmed {
        return Ok(ActionOutcome::confirm(
            format!(
                "I found {} shifts from {span} with {} in total income. Deleting them can't be undone. Should I proceed?",
                shifts.len(),
                money(total)
            ),
            json!({
                "count": shifts.len(),
                "dateRange": span,
                "totalIncome": round2(total),
                "shiftDates": preview_dates(&shifts),
            }),
        ));
    }

    let ids = shifts.iter().map(row_id).collect();
    let deleted = ctx
        .store
        .delete(&ctx.query(Table::Shifts).is_in("id", ids))
        .await?;
    let lost: f64 = deleted.iter().map(|s| shift_totals(s).total_income).sum();
    Ok(ActionOutcome::done(
        format!("Deleted {} shifts (total income: {}).", deleted.len(), money(lost)),
        json!({ "count": deleted.len(), "totalIncomeLost": round2(lost) }),
    ))
}

// ─── Reads ──────────────────────────────────────────────────────────────────

async fn search_shifts(ctx: &ExecContext, args: SearchShiftsArgs) -> Result<ActionOutcome, DispatchError> {
    let query = args.query;
    let mut q = ctx.query(Table::Shifts);
    if let Some(range) = &query.date_range {
        q = q.gte("date", range.start.as_str()).lte("date", range.end.as_str());
    }
    if let Some(job) = query.job_id.as_deref() {
        q = q.eq("job_id", job);
    }
    if let Some(event) = query.event_name.as_deref() {
        q = q.ilike("event_name", event);
    }
    match query.has_notes {
        Some(true) => q = q.not_null("notes"),
        Some(false) => q = q.is_null("notes"),
        None => {}
    }

    let page = ctx
        .select(&q.order_by("date", false).limit(SEARCH_PAGE_SIZE))
        .await?;
    let truncated = page.len() == SEARCH_PAGE_SIZE;
    let shifts: Vec<Row> = page
        .into_iter()
        .filter(|s| {
            let total = shift_totals(s).total_income;
            query.min_amount.map_or(true, |min| total >= min)
                && query.max_amount.map_or(true, |max| total <= max)
        })
        .map(with_totals)
        .collect();
    let total: f64 = shifts.iter().map(|s| num(s, "total_income")).sum();

    Ok(ActionOutcome::done(
        format!("Found {} shifts totaling {}.", shifts.len(), money(total)),
        json!({
            "count": shifts.len(),
            "totalIncome": round2(total),
            "shifts": shifts,
            "truncated": truncated,
        }),
    ))
}

async fn shift_details(ctx: &ExecContext, args: ShiftDetailsArgs) -> Result<ActionOutcome, DispatchError> {
    let shift = find_shift_on(ctx, &args.date, args.job_id.as_deref()).await?;
    Ok(ActionOutcome::data(json!({ "shift": with_totals(shift) })))
}

async fn calculate_total(ctx: &ExecContext, args: CalculateTotalArgs) -> Result<ActionOutcome, DispatchError> {
    let shift = find_shift_on(ctx, &args.shift_date, None).await?;
    let totals = shift_totals(&shift);
    Ok(ActionOutcome::done(
        format!(
            "Shift on {}: {} total ({} wages + {} tips).",
            args.shift_date,
            money(totals.total_income),
            money(totals.wages),
            money(totals.total_tips)
        ),
        json!({
            "totalIncome": round2(totals.total_income),
            "breakdown": {
                "cashTips": num(&shift, "cash_tips"),
                "creditTips": num(&shift, "credit_tips"),
                "totalTips": round2(totals.total_tips),
                "hourlyRate": num(&shift, "hourly_rate"),
                "hoursWorked": num(&shift, "hours_worked"),
                "hourlyWages": round2(totals.wages),
                "totalIncome": round2(totals.total_income),
            },
        }),
    ))
}

async fn duplicate_shift(ctx: &ExecContext, args: DuplicateShiftArgs) -> Result<ActionOutcome, DispatchError> {
    let source = find_shift_on(ctx, &args.source_date, None).await?;
    let mut copy = source;
    for column in ["id", "user_id", "created_at", "updated_at"] {
        copy.remove(column);
    }
    copy.insert("date".into(), Value::String(args.target_date.clone()));
    let saved = ctx.insert(Table::Shifts, copy).await?;
    Ok(ActionOutcome::done(
        format!(
            "Duplicated shift from {} to {}.",
            args.source_date, args.target_date
        ),
        json!({ "newShift": with_totals(saved) }),
    ))
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_core::actions::{Action, ShiftAction};
    use crate::agent_core::catalog::ActionName;
    use crate::executors::test_support::*;
    use serde_json::json;

    fn shift_action(name: ActionName, args: Value) -> ShiftAction {
        match Action::parse(name, args).unwrap() {
            Action::Shift(a) => a,
            other => panic!("not a shift action: {other:?}"),
        }
    }

    async fn run(ctx: &ExecContext, name: ActionName, args: Value) -> Result<ActionOutcome, DispatchError> {
        execute(ctx, shift_action(name, args)).await
    }

    async fn all_shifts(ctx: &ExecContext) -> Vec<Row> {
        ctx.select(&ctx.query(Table::Shifts).order_by("date", true))
            .await
            .unwrap()
    }

    #[test]
    fn test_effective_rate_precedence() {
        assert_eq!(effective_rate(Some(20.0), Some(18.0), Some(15.0)), Some(20.0));
        assert_eq!(effective_rate(None, Some(18.0), Some(15.0)), Some(18.0));
        assert_eq!(effective_rate(None, Some(0.0), Some(15.0)), Some(15.0));
        assert_eq!(effective_rate(None, None, Some(15.0)), Some(15.0));
        assert_eq!(effective_rate(None, None, Some(0.0)), None);
        // An explicit zero is still explicit.
        assert_eq!(effective_rate(Some(0.0), None, Some(15.0)), Some(0.0));
    }

    #[tokio::test]
    async fn test_add_shift_uses_sole_job_rate() {
        let ctx = ctx();
        let job = seed_job(&ctx, "Steakhouse", 15.0, false).await;

        let out = run(
            &ctx,
            ActionName::AddShift,
            json!({ "date": "2026-01-10", "hoursWorked": 5, "cashTips": 20 }),
        )
        .await
        .unwrap();

        let ActionOutcome::Completed { message, data } = out else {
            panic!("expected completion");
        };
        assert!(message.unwrap().contains("$95.00"));
        assert_eq!(data["jobAutoSelected"], true);
        assert_eq!(data["jobName"], "Steakhouse");
        assert_eq!(data["missingFields"], json!(["start/end time"]));

        let rows = all_shifts(&ctx).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(num(&rows[0], "hourly_rate"), 15.0);
        assert_eq!(text(&rows[0], "job_id"), Some(id(&job).as_str()));
        assert_eq!(num(&rows[0], "credit_tips"), 0.0);
        assert!(rows[0]["notes"].is_null());
    }

    #[tokio::test]
    async fn test_add_shift_without_default_among_several_jobs() {
        let ctx = ctx();
        seed_job(&ctx, "Bar", 12.0, false).await;
        seed_job(&ctx, "Cafe", 10.0, false).await;

        let out = run(&ctx, ActionName::AddShift, json!({ "date": "2026-01-10", "cashTips": 50 }))
            .await
            .unwrap();
        let ActionOutcome::Completed { data, .. } = out else {
            panic!("expected completion");
        };
        assert_eq!(data["jobAutoSelected"], false);
        let rows = all_shifts(&ctx).await;
        assert!(rows[0]["job_id"].is_null());
        assert_eq!(num(&rows[0], "hourly_rate"), 0.0);
    }

    #[tokio::test]
    async fn test_add_shift_picks_default_among_several_jobs() {
        let ctx = ctx();
        seed_job(&ctx, "Bar", 12.0, false).await;
        let cafe = seed_job(&ctx, "Cafe", 10.0, true).await;

        run(&ctx, ActionName::AddShift, json!({ "date": "2026-01-10", "hoursWorked": 4 }))
            .await
            .unwrap();
        let rows = all_shifts(&ctx).await;
        assert_eq!(text(&rows[0], "job_id"), Some(id(&cafe).as_str()));
        assert_eq!(num(&rows[0], "hourly_rate"), 10.0);
    }

    #[tokio::test]
    async fn test_add_shift_with_unknown_job_name_fails() {
        let ctx = ctx();
        seed_job(&ctx, "Bar", 12.0, false).await;
        let err = run(
            &ctx,
            ActionName::AddShift,
            json!({ "date": "2026-01-10", "jobName": "Hotel" }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert!(all_shifts(&ctx).await.is_empty());
    }

    #[tokio::test]
    async fn test_edit_backfills_rate_from_job() {
        let ctx = ctx();
        let job = seed_job(&ctx, "Steakhouse", 15.0, false).await;
        seed_shift(
            &ctx,
            json!({ "date": "2026-01-09", "job_id": id(&job), "hourly_rate": 0, "hours_worked": 5, "cash_tips": 20 }),
        )
        .await;

        let out = run(
            &ctx,
            ActionName::EditShift,
            json!({ "date": "2026-01-09", "updates": { "hoursWorked": 6 } }),
        )
        .await
        .unwrap();
        let ActionOutcome::Completed { data, .. } = out else {
            panic!("expected completion");
        };
        assert_eq!(data["hourlyRateApplied"], true);
        assert_eq!(data["after"]["total_income"], json!(110.0));
        let rows = all_shifts(&ctx).await;
        assert_eq!(num(&rows[0], "hourly_rate"), 15.0);
        assert_eq!(num(&rows[0], "hours_worked"), 6.0);
    }

    #[tokio::test]
    async fn test_edit_keeps_existing_row_rate() {
        let ctx = ctx();
        let job = seed_job(&ctx, "Steakhouse", 15.0, false).await;
        seed_shift(
            &ctx,
            json!({ "date": "2026-01-09", "job_id": id(&job), "hourly_rate": 18, "hours_worked": 5 }),
        )
        .await;

        run(
            &ctx,
            ActionName::EditShift,
            json!({ "date": "2026-01-09", "updates": { "cashTips": 30 } }),
        )
        .await
        .unwrap();
        assert_eq!(num(&all_shifts(&ctx).await[0], "hourly_rate"), 18.0);
    }

    #[tokio::test]
    async fn test_edit_ambiguous_date_fails() {
        let ctx = ctx();
        seed_shift(&ctx, json!({ "date": "2026-01-09", "job_id": "a" })).await;
        seed_shift(&ctx, json!({ "date": "2026-01-09", "job_id": "b" })).await;
        let err = run(
            &ctx,
            ActionName::EditShift,
            json!({ "date": "2026-01-09", "updates": { "notes": "x" } }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "validation_failed");

        let ok = run(
            &ctx,
            ActionName::EditShift,
            json!({ "date": "2026-01-09", "jobId": "b", "updates": { "notes": "x" } }),
        )
        .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let ctx = ctx();
        seed_shift(
            &ctx,
            json!({ "date": "2026-01-09", "cash_tips": 100, "hourly_rate": 10, "hours_worked": 2 }),
        )
        .await;

        let out = run(&ctx, ActionName::DeleteShift, json!({ "date": "2026-01-09" }))
            .await
            .unwrap();
        assert_eq!(
            out.message(),
            Some("Are you sure you want to delete the shift from 2026-01-09? You earned $120.00 that day.")
        );
        assert_eq!(all_shifts(&ctx).await.len(), 1);

        let out = run(
            &ctx,
            ActionName::DeleteShift,
            json!({ "date": "2026-01-09", "confirmed": true }),
        )
        .await
        .unwrap();
        assert_eq!(out.message(), Some("Shift from 2026-01-09 deleted successfully."));
        assert!(all_shifts(&ctx).await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_shift_is_not_found() {
        let ctx = ctx();
        let err = run(&ctx, ActionName::DeleteShift, json!({ "date": "2026-01-09" }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No shift found on 2026-01-09");
    }

    #[tokio::test]
    async fn test_bulk_edit_preview_then_apply() {
        let ctx = ctx();
        let job = seed_job(&ctx, "Bar", 12.0, false).await;
        for day in 1..=7 {
            seed_shift(
                &ctx,
                json!({ "date": format!("2026-01-0{day}"), "job_id": id(&job), "hours_worked": 4, "cash_tips": 10 }),
            )
            .await;
        }
        seed_shift(&ctx, json!({ "date": "2026-02-01", "job_id": id(&job), "cash_tips": 10 })).await;

        let args = json!({
            "startDate": "2026-01-01",
            "endDate": "2026-01-31",
            "updates": { "cashTips": 50 }
        });
        let out = run(&ctx, ActionName::BulkEditShifts, args.clone()).await.unwrap();
        let ActionOutcome::ConfirmationRequired { message, preview } = out else {
            panic!("expected confirmation");
        };
        assert_eq!(
            message,
            "I found 7 shifts from 2026-01-01 to 2026-01-07. I'll update cash tips to $50.00. Should I proceed?"
        );
        assert_eq!(preview["shiftDates"].as_array().unwrap().len(), 5);
        assert!(all_shifts(&ctx).await.iter().all(|s| num(s, "cash_tips") == 10.0));

        let mut confirmed = args;
        confirmed["confirmed"] = json!(true);
        let out = run(&ctx, ActionName::BulkEditShifts, confirmed).await.unwrap();
        let ActionOutcome::Completed { data, .. } = out else {
            panic!("expected completion");
        };
        assert_eq!(data["count"], 7);
        assert_eq!(data["hourlyRateApplied"], true);

        let rows = all_shifts(&ctx).await;
        let january: Vec<_> = rows.iter().filter(|s| date_of(s).starts_with("2026-01")).collect();
        assert!(january.iter().all(|s| num(s, "cash_tips") == 50.0));
        assert!(january.iter().all(|s| num(s, "hourly_rate") == 12.0));
        assert_eq!(num(rows.last().unwrap(), "cash_tips"), 10.0);
    }

    #[tokio::test]
    async fn test_bulk_edit_reports_partial_failure() {
        let healthy = ctx();
        let job = seed_job(&healthy, "Bar", 12.0, false).await;
        let mut ids = Vec::new();
        for day in 2..=4 {
            let shift = seed_shift(
                &healthy,
                json!({ "date": format!("2026-01-0{day}"), "job_id": id(&job), "hours_worked": 5, "cash_tips": 10 }),
            )
            .await;
            ids.push(id(&shift));
        }
        let faulty = FaultyStore::wrap(&healthy, None, Some(ids[1].clone()));

        let out = run(
            &faulty,
            ActionName::BulkEditShifts,
            json!({ "startDate": "2026-01-01", "endDate": "2026-01-05", "updates": { "cashTips": 50 }, "confirmed": true }),
        )
        .await
        .unwrap();
        let ActionOutcome::Completed { message, data } = out else {
            panic!("expected completion");
        };
        assert_eq!(data["count"], 2);
        assert_eq!(data["failed"], 1);
        assert_eq!(data["hourlyRate"], json!(12.0));
        assert_eq!(
            message.as_deref(),
            Some(
                "✅ Updated 2 shifts successfully! Also applied hourly rate of $12.00/hr from your job \
                 to 2 shifts that were missing it. ⚠️ 1 shifts could not be updated."
            )
        );

        let rows = all_shifts(&healthy).await;
        assert_eq!(num(&rows[0], "cash_tips"), 50.0);
        assert_eq!(num(&rows[1], "cash_tips"), 10.0);
        assert!(opt_num(&rows[1], "hourly_rate").is_none());
        assert_eq!(num(&rows[2], "cash_tips"), 50.0);
        assert_eq!(num(&rows[2], "hourly_rate"), 12.0);
    }

    #[tokio::test]
    async fn test_bulk_edit_with_mixed_job_rates_omits_single_rate() {
        let ctx = ctx();
        let bar = seed_job(&ctx, "Bar", 12.0, false).await;
        let cafe = seed_job(&ctx, "Cafe", 15.0, false).await;
        seed_shift(&ctx, json!({ "date": "2026-01-02", "job_id": id(&bar), "hours_worked": 4 })).await;
        seed_shift(&ctx, json!({ "date": "2026-01-03", "job_id": id(&cafe), "hours_worked": 4 })).await;

        let out = run(
            &ctx,
            ActionName::BulkEditShifts,
            json!({ "startDate": "2026-01-01", "endDate": "2026-01-05", "updates": { "creditTips": 20 }, "confirmed": true }),
        )
        .await
        .unwrap();
        let ActionOutcome::Completed { message, data } = out else {
            panic!("expected completion");
        };
        assert_eq!(
            message.as_deref(),
            Some("✅ Updated 2 shifts successfully! Also applied each job's hourly rate to 2 shifts that were missing it.")
        );
        assert!(data["hourlyRate"].is_null());
        assert_eq!(data["hourlyRates"], json!([12.0, 15.0]));
        let rates: Vec<f64> = all_shifts(&ctx).await.iter().map(|s| num(s, "hourly_rate")).collect();
        assert_eq!(rates, vec![12.0, 15.0]);
    }

    #[tokio::test]
    async fn test_bulk_edit_notes_updates_in_one_pass() {
        let ctx = ctx();
        seed_shift(&ctx, json!({ "date": "2026-01-02" })).await;
        seed_shift(&ctx, json!({ "date": "2026-01-03" })).await;
        let out = run(
            &ctx,
            ActionName::BulkEditShifts,
            json!({ "startDate": "2026-01-01", "endDate": "2026-01-05", "updates": { "notes": "holiday" }, "confirmed": true }),
        )
        .await
        .unwrap();
        assert_eq!(out.message(), Some("✅ Updated 2 shifts successfully!"));
        assert!(all_shifts(&ctx).await.iter().all(|s| text(s, "notes") == Some("holiday")));
    }

    #[tokio::test]
    async fn test_bulk_delete_preview_does_not_mutate() {
        let ctx = ctx();
        let err = run(
            &ctx,
            ActionName::BulkDeleteShifts,
            json!({ "startDate": "2026-01-01", "endDate": "2026-01-31" }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "not_found");

        seed_shift(&ctx, json!({ "date": "2026-01-02", "cash_tips": 40 })).await;
        seed_shift(&ctx, json!({ "date": "2026-01-03", "cash_tips": 60 })).await;
        let out = run(
            &ctx,
            ActionName::BulkDeleteShifts,
            json!({ "query": { "dateRange": { "start": "2026-01-01", "end": "2026-01-31" } } }),
        )
        .await
        .unwrap();
        assert!(matches!(out, ActionOutcome::ConfirmationRequired { .. }));
        assert_eq!(all_shifts(&ctx).await.len(), 2);

        let out = run(
            &ctx,
            ActionName::BulkDeleteShifts,
            json!({ "startDate": "2026-01-01", "endDate": "2026-01-31", "confirmed": true }),
        )
        .await
        .unwrap();
        assert_eq!(out.message(), Some("Deleted 2 shifts (total income: $100.00)."));
        assert!(all_shifts(&ctx).await.is_empty());
    }

    #[tokio::test]
    async fn test_search_filters_on_derived_total() {
        let ctx = ctx();
        seed_shift(&ctx, json!({ "date": "2026-01-02", "cash_tips": 40, "event_name": "Smith Wedding" })).await;
        seed_shift(&ctx, json!({ "date": "2026-01-03", "cash_tips": 200, "event_name": "Jones Gala" })).await;
        seed_shift(&ctx, json!({ "date": "2026-01-04", "cash_tips": 10, "hourly_rate": 20, "hours_worked": 8 })).await;

        let out = run(&ctx, ActionName::SearchShifts, json!({ "query": { "minAmount": 100 } }))
            .await
            .unwrap();
        let ActionOutcome::Completed { data, .. } = out else {
            panic!("expected completion");
        };
        assert_eq!(data["count"], 2);
        // Newest first.
        assert_eq!(data["shifts"][0]["date"], "2026-01-04");

        let out = run(&ctx, ActionName::SearchShifts, json!({ "query": { "eventName": "wedding" } }))
            .await
            .unwrap();
        let ActionOutcome::Completed { data, .. } = out else {
            panic!("expected completion");
        };
        assert_eq!(data["count"], 1);
    }

    #[tokio::test]
    async fn test_calculate_and_duplicate() {
        let ctx = ctx();
        seed_shift(
            &ctx,
            json!({ "date": "2026-01-02", "cash_tips": 40, "credit_tips": 60, "hourly_rate": 12, "hours_worked": 6, "event_name": "Gala" }),
        )
        .await;

        let out = run(&ctx, ActionName::CalculateShiftTotal, json!({ "shiftDate": "2026-01-02" }))
            .await
            .unwrap();
        assert_eq!(
            out.message(),
            Some("Shift on 2026-01-02: $172.00 total ($72.00 wages + $100.00 tips).")
        );

        run(
            &ctx,
            ActionName::DuplicateShift,
            json!({ "sourceDate": "2026-01-02", "targetDate": "2026-01-09" }),
        )
        .await
        .unwrap();
        let rows = all_shifts(&ctx).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(text(&rows[1], "event_name"), Some("Gala"));
        assert_ne!(rows[0]["id"], rows[1]["id"]);
    }
}
