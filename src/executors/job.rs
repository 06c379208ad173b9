//! Job executor.
//!
//! At most one job per user carries `is_default`. Every path that sets the
//! flag clears it on all of the user's jobs first. Deleting a job is a soft
//! delete; its shifts are kept unless the caller asks otherwise.

use serde_json::{json, Value};

use super::periods::{self, Window};
use super::{is_active_job, money, round2, shifts_in, ExecContext, IncomeStats};
use crate::agent_core::actions::{
    AddJobArgs, CompareJobsArgs, DeleteJobArgs, EditJobArgs, EndJobArgs, GetJobsArgs, JobAction,
    JobRef, JobStatsArgs, SetJobRateArgs, StatsPeriod,
};
use crate::agent_core::catalog::{INDUSTRIES, JOB_TEMPLATES};
use crate::agent_core::errors::DispatchError;
use crate::agent_core::types::ActionOutcome;
use crate::store::{flag, num, opt_num, text, Row, Table};

pub async fn execute(ctx: &ExecContext, action: JobAction) -> Result<ActionOutcome, DispatchError> {
    match action {
        JobAction::Add(args) => add_job(ctx, args).await,
        JobAction::Edit(args) => edit_job(ctx, args).await,
        JobAction::Delete(args) => delete_job(ctx, args).await,
        JobAction::SetDefault(job) => set_default_job(ctx, job).await,
        JobAction::End(args) => end_job(ctx, args).await,
        JobAction::Restore(job) => restore_job(ctx, job).await,
        JobAction::List(args) => get_jobs(ctx, args).await,
        JobAction::Stats(args) => job_stats(ctx, args).await,
        JobAction::Compare(args) => compare_jobs(ctx, args).await,
        JobAction::SetHourlyRate(args) => set_hourly_rate(ctx, args).await,
    }
}

// ─── Industry & template ────────────────────────────────────────────────────

/// Guess an industry from a job title. Order matters: "barber" must not
/// read as "bar", "uber eats" must not read as rideshare.
pub fn infer_industry(title: &str) -> &'static str {
    const RULES: &[(&str, &[&str])] = &[
        (
            "Delivery",
            &["doordash", "door dash", "instacart", "grubhub", "postmates", "uber eats", "ubereats", "delivery", "courier"],
        ),
        ("Rideshare", &["uber", "lyft", "rideshare", "ride share", "taxi", "chauffeur"]),
        (
            "Beauty & Personal Care",
            &["salon", "barber", "stylist", "hair", "nail", "makeup", "esthetician", "lash", "massage", "tattoo"],
        ),
        (
            "Hospitality",
            &["hotel", "resort", "valet", "concierge", "bellhop", "housekeep", "front desk", "casino"],
        ),
        (
            "Events",
            &["event", "wedding", "banquet", "catering", "caterer", "dj", "venue", "party"],
        ),
        (
            "Food Service",
            &["server", "waiter", "waitress", "bartender", "restaurant", "bar", "cafe", "diner", "grill", "kitchen", "host", "busser", "barista", "pizza", "steak", "sushi"],
        ),
    ];
    let lower = title.to_lowercase();
    RULES
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map_or("Other Services", |(industry, _)| *industry)
}

fn template_for(industry: &str) -> &'static str {
    match industry {
        "Food Service" => "restaurant",
        "Beauty & Personal Care" => "barbershop",
        "Events" => "events",
        _ => "custom",
    }
}

fn check_industry(input: &str) -> Result<&'static str, DispatchError> {
    INDUSTRIES
        .iter()
        .find(|i| i.eq_ignore_ascii_case(input.trim()))
        .copied()
        .ok_or_else(|| {
            DispatchError::validation(format!(
                "Unknown industry \"{input}\". Choose one of: {}",
                INDUSTRIES.join(", ")
            ))
        })
}

fn check_template(input: &str) -> Result<&'static str, DispatchError> {
    JOB_TEMPLATES
        .iter()
        .find(|t| t.eq_ignore_ascii_case(input.trim()))
        .copied()
        .ok_or_else(|| {
            DispatchError::validation(format!(
                "Unknown template \"{input}\". Choose one of: {}",
                JOB_TEMPLATES.join(", ")
            ))
        })
}

fn check_rate(rate: f64) -> Result<f64, DispatchError> {
    if rate.is_finite() && rate >= 0.0 {
        Ok(rate)
    } else {
        Err(DispatchError::validation("Hourly rate must be zero or more"))
    }
}

fn job_id(job: &Row) -> Value {
    job.get("id").cloned().unwrap_or(Value::Null)
}

fn job_name(job: &Row) -> &str {
    text(job, "name").unwrap_or("your job")
}

fn now_stamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn summarize(job: &Row) -> Value {
    json!({
        "id": job.get("id"),
        "name": job.get("name"),
        "industry": job.get("industry"),
        "hourlyRate": opt_num(job, "hourly_rate"),
        "isDefault": flag(job, "is_default"),
        "isActive": is_active_job(job),
        "endDate": job.get("end_date"),
        "deleted": !job.get("deleted_at").map_or(true, Value::is_null),
    })
}

/// Clear the default flag on every job, then set it on `id`.
async fn make_default(ctx: &ExecContext, id: &Value) -> Result<Row, DispatchError> {
    ctx.store
        .update(
            &ctx.query(Table::Jobs).eq("is_default", true),
            &row(json!({ "is_default": false })),
        )
        .await?;
    ctx.store
        .update(
            &ctx.query(Table::Jobs).eq("id", id.clone()),
            &row(json!({ "is_default": true })),
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DispatchError::not_found("Job disappeared while updating"))
}

fn row(v: Value) -> Row {
    match v {
        Value::Object(m) => m,
        _ => Row::new(),
    }
}

// ─── Create / update ────────────────────────────────────────────────────────

async fn add_job(ctx: &ExecContext, args: AddJobArgs) -> Result<ActionOutcome, DispatchError> {
    let name = args.name.trim();
    if name.is_empty() {
        return Err(DispatchError::validation("Job name cannot be empty"));
    }
    let industry = match args.industry.as_deref() {
        Some(i) => check_industry(i)?,
        None => infer_industry(name),
    };
    let template = match args.template.as_deref() {
        Some(t) => check_template(t)?,
        None => template_for(industry),
    };
    let rate = args.hourly_rate.map(check_rate).transpose()?.unwrap_or(0.0);

    let existing = ctx
        .select(&ctx.query(Table::Jobs).is_null("deleted_at"))
        .await?;
    let wants_default = args.is_default.unwrap_or(existing.is_empty());

    let mut new_job = row(json!({
        "name": name,
        "industry": industry,
        "template": template,
        "hourly_rate": rate,
        "is_active": true,
        "is_default": false,
    }));
    if let Some(color) = args.color {
        new_job.insert("color".into(), Value::String(color));
    }
    let mut saved = ctx.insert(Table::Jobs, new_job).await?;
    if wants_default {
        saved = make_default(ctx, &job_id(&saved)).await?;
    }

    let mut message = format!("✅ Added {name} ({industry}) at {}/hr.", money(rate));
    if wants_default {
        message.push_str(" It's your default job.");
    }
    Ok(ActionOutcome::done(message, json!({ "job": summarize(&saved) })))
}

async fn edit_job(ctx: &ExecContext, args: EditJobArgs) -> Result<ActionOutcome, DispatchError> {
    let job = ctx.require_job(&args.job, false).await?;
    let u = args.updates;

    let mut patch = Row::new();
    let mut changes = Vec::new();
    if let Some(name) = u.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        patch.insert("name".into(), json!(name));
        changes.push(format!("name to {name}"));
    }
    if let Some(i) = u.industry.as_deref() {
        let industry = check_industry(i)?;
        patch.insert("industry".into(), json!(industry));
        changes.push(format!("industry to {industry}"));
    }
    if let Some(rate) = u.hourly_rate {
        let rate = check_rate(rate)?;
        patch.insert("hourly_rate".into(), json!(rate));
        changes.push(format!("hourly rate to {}/hr", money(rate)));
    }
    if let Some(color) = u.color {
        changes.push("color".to_string());
        patch.insert("color".into(), Value::String(color));
    }
    if let Some(t) = u.template.as_deref() {
        let template = check_template(t)?;
        patch.insert("template".into(), json!(template));
        changes.push(format!("template to {template}"));
    }
    if u.is_default == Some(false) {
        patch.insert("is_default".into(), json!(false));
        changes.push("no longer default".to_string());
    }
    if patch.is_empty() && u.is_default != Some(true) {
        return Err(DispatchError::validation("No changes were given for the job"));
    }

    let mut saved = job.clone();
    if !patch.is_empty() {
        if let Some(updated) = ctx
            .store
            .update(&ctx.query(Table::Jobs).eq("id", job_id(&job)), &patch)
            .await?
            .into_iter()
            .next()
        {
            saved = updated;
        }
    }
    if u.is_default == Some(true) {
        saved = make_default(ctx, &job_id(&job)).await?;
        changes.push("made default".to_string());
    }

    Ok(ActionOutcome::done(
        format!("✅ Updated {}: {}.", job_name(&job), changes.join(", ")),
        json!({ "job": summarize(&saved) }),
    ))
}

// ─── Lifecycle ──────────────────────────────────────────────────────────────

async fn delete_job(ctx: &ExecContext, args: DeleteJobArgs) -> Result<ActionOutcome, DispatchError> {
    let job = ctx.require_job(&args.job, false).await?;
    let name = job_name(&job).to_string();
    let id = job_id(&job);
    let shifts = ctx
        .select(&ctx.query(Table::Shifts).eq("job_id", id.clone()))
        .await?;
    let stats = IncomeStats::from_shifts(&shifts);

    if !args.confirmed {
        let fate = if args.delete_shifts {
            "They will be permanently deleted too."
        } else {
            "The shifts will be kept."
        };
        return Ok(ActionOutcome::confirm(
            format!(
                "Are you sure you want to delete {name}? It has {} shifts worth {}. {fate}",
                stats.shifts,
                money(stats.total_income)
            ),
            json!({
                "job": summarize(&job),
                "shiftCount": stats.shifts,
                "totalIncome": round2(stats.total_income),
                "deleteShifts": args.delete_shifts,
            }),
        ));
    }

    let mut deleted_shifts = 0;
    if args.delete_shifts {
        deleted_shifts = ctx
            .store
            .delete(&ctx.query(Table::Shifts).eq("job_id", id.clone()))
            .await?
            .len();
    }
    ctx.store
        .update(
            &ctx.query(Table::Jobs).eq("id", id),
            &row(json!({
                "deleted_at": now_stamp(),
                "is_active": false,
                "is_default": false,
            })),
        )
        .await?;

    let message = if args.delete_shifts {
        format!("Deleted {name} and its {deleted_shifts} shifts.")
    } else {
        format!("Deleted {name}. Its shifts were kept.")
    };
    Ok(ActionOutcome::done(
        message,
        json!({ "deletedShifts": deleted_shifts }),
    ))
}

async fn set_default_job(ctx: &ExecContext, job: JobRef) -> Result<ActionOutcome, DispatchError> {
    let job = ctx.require_job(&job, false).await?;
    if !is_active_job(&job) {
        return Err(DispatchError::validation(format!(
            "{} has ended. Restore it before making it the default.",
            job_name(&job)
        )));
    }
    let saved = make_default(ctx, &job_id(&job)).await?;
    Ok(ActionOutcome::done(
        format!("✅ {} is now your default job.", job_name(&saved)),
        json!({ "job": summarize(&saved) }),
    ))
}

async fn end_job(ctx: &ExecContext, args: EndJobArgs) -> Result<ActionOutcome, DispatchError> {
    let job = ctx.require_job(&args.job, false).await?;
    let end_date = args
        .end_date
        .unwrap_or_else(|| ctx.today.format("%Y-%m-%d").to_string());
    ctx.store
        .update(
            &ctx.query(Table::Jobs).eq("id", job_id(&job)),
            &row(json!({ "is_active": false, "is_default": false, "end_date": end_date })),
        )
        .await?;
    Ok(ActionOutcome::done(
        format!("Marked {} as ended on {end_date}. Its shifts are still in your history.", job_name(&job)),
        json!({ "endDate": end_date }),
    ))
}

async fn restore_job(ctx: &ExecContext, job: JobRef) -> Result<ActionOutcome, DispatchError> {
    let job = ctx.require_job(&job, true).await?;
    let saved = ctx
        .store
        .update(
            &ctx.query(Table::Jobs).eq("id", job_id(&job)),
            &row(json!({ "is_active": true, "deleted_at": null, "end_date": null })),
        )
        .await?
        .into_iter()
        .next()
        .unwrap_or(job);
    Ok(ActionOutcome::done(
        format!("✅ Restored {}.", job_name(&saved)),
        json!({ "job": summarize(&saved) }),
    ))
}

// ─── Reads ──────────────────────────────────────────────────────────────────

async fn get_jobs(ctx: &ExecContext, args: GetJobsArgs) -> Result<ActionOutcome, DispatchError> {
    let jobs: Vec<Row> = ctx
        .select(&ctx.query(Table::Jobs).order_by("is_default", false).order_by("name", true))
        .await?
        .into_iter()
        .filter(|j| {
            let deleted = !j.get("deleted_at").map_or(true, Value::is_null);
            if deleted {
                return args.include_deleted;
            }
            flag(j, "is_active") || args.include_ended
        })
        .collect();

    let names: Vec<&str> = jobs.iter().map(job_name).collect();
    let message = if jobs.is_empty() {
        "You don't have any jobs set up yet.".to_string()
    } else {
        format!("You have {} jobs: {}.", jobs.len(), names.join(", "))
    };
    Ok(ActionOutcome::done(
        message,
        json!({
            "count": jobs.len(),
            "jobs": jobs.iter().map(summarize).collect::<Vec<_>>(),
        }),
    ))
}

fn period_label(period: StatsPeriod) -> &'static str {
    match period {
        StatsPeriod::Week => "this week",
        StatsPeriod::Month => "this month",
        StatsPeriod::Year => "this year",
        StatsPeriod::AllTime => "all time",
    }
}

async fn window_for(ctx: &ExecContext, period: StatsPeriod) -> Result<Option<Window>, DispatchError> {
    Ok(periods::stats_window(period, ctx.today, ctx.week_start().await?))
}

async fn job_stats(ctx: &ExecContext, args: JobStatsArgs) -> Result<ActionOutcome, DispatchError> {
    let job = if args.job.is_empty() {
        super::shift::auto_select_job(ctx)
            .await?
            .ok_or_else(|| DispatchError::validation("Which job? jobId or jobName is required"))?
    } else {
        ctx.require_job(&args.job, true).await?
    };
    let window = window_for(ctx, args.period).await?;
    let shifts = shifts_in(ctx, window, text(&job, "id")).await?;
    let stats = IncomeStats::from_shifts(&shifts);

    let per_hour = stats
        .per_hour()
        .map(|r| format!(", {}/hr", money(r)))
        .unwrap_or_default();
    Ok(ActionOutcome::done(
        format!(
            "{} ({}): {} over {} shifts{per_hour}.",
            job_name(&job),
            period_label(args.period),
            money(stats.total_income),
            stats.shifts
        ),
        json!({
            "job": summarize(&job),
            "period": period_label(args.period),
            "stats": stats.to_json(),
        }),
    ))
}

async fn compare_jobs(ctx: &ExecContext, args: CompareJobsArgs) -> Result<ActionOutcome, DispatchError> {
    let all = ctx.select(&ctx.query(Table::Jobs)).await?;
    let jobs: Vec<Row> = match &args.job_ids {
        Some(ids) if !ids.is_empty() => all
            .into_iter()
            .filter(|j| text(j, "id").is_some_and(|id| ids.iter().any(|x| x == id)))
            .collect(),
        _ => all.into_iter().filter(is_active_job).collect(),
    };
    if jobs.is_empty() {
        return Err(DispatchError::not_found("No jobs to compare"));
    }

    let window = window_for(ctx, args.period).await?;
    let shifts = shifts_in(ctx, window, None).await?;

    let mut rows: Vec<(Row, IncomeStats)> = jobs
        .into_iter()
        .map(|job| {
            let id = text(&job, "id").map(str::to_string);
            let stats = IncomeStats::from_shifts(
                shifts
                    .iter()
                    .filter(|s| text(s, "job_id").map(str::to_string) == id),
            );
            (job, stats)
        })
        .collect();
    rows.sort_by(|a, b| b.1.total_income.total_cmp(&a.1.total_income));

    let message = match rows.first() {
        Some((top, stats)) if stats.total_income > 0.0 => format!(
            "{} earned the most {}: {}.",
            job_name(top),
            period_label(args.period),
            money(stats.total_income)
        ),
        _ => format!("No income recorded {} for these jobs.", period_label(args.period)),
    };
    Ok(ActionOutcome::done(
        message,
        json!({
            "period": period_label(args.period),
            "jobs": rows
                .iter()
                .map(|(job, stats)| json!({ "job": summarize(job), "stats": stats.to_json() }))
                .collect::<Vec<_>>(),
        }),
    ))
}

// ─── Rate changes ───────────────────────────────────────────────────────────

async fn set_hourly_rate(ctx: &ExecContext, args: SetJobRateArgs) -> Result<ActionOutcome, DispatchError> {
    let job = ctx.require_job(&args.job, false).await?;
    let rate = check_rate(args.new_rate)?;
    let name = job_name(&job).to_string();
    let id = job_id(&job);

    if !args.update_past_shifts {
        ctx.store
            .update(
                &ctx.query(Table::Jobs).eq("id", id),
                &row(json!({ "hourly_rate": rate })),
            )
            .await?;
        return Ok(ActionOutcome::done(
            format!(
                "✅ Updated {name}'s hourly rate to {}/hr. Existing shifts keep their rate.",
                money(rate)
            ),
            json!({ "hourlyRate": rate, "shiftsUpdated": 0 }),
        ));
    }

    let mut q = ctx.query(Table::Shifts).eq("job_id", id.clone());
    if let Some(from) = args.effective_date.as_deref() {
        q = q.gte("date", from);
    }
    let shifts = ctx.select(&q.order_by("date", true)).await?;
    let from = args
        .effective_date
        .as_deref()
        .map(|d| format!("from {d} on"))
        .unwrap_or_else(|| "from every date".to_string());

    if !args.confirmed {
        return Ok(ActionOutcome::confirm(
            format!(
                "I'll change {name}'s rate to {}/hr and re-rate {} past shifts {from}. Should I proceed?",
                money(rate),
                shifts.len()
            ),
            json!({
                "count": shifts.len(),
                "shiftDates": shifts
                    .iter()
                    .take(5)
                    .filter_map(|s| text(s, "date"))
                    .collect::<Vec<_>>(),
                "previousRate": num(&job, "hourly_rate"),
                "newRate": rate,
            }),
        ));
    }

    ctx.store
        .update(
            &ctx.query(Table::Jobs).eq("id", id),
            &row(json!({ "hourly_rate": rate })),
        )
        .await?;
    let ids: Vec<Value> = shifts.iter().filter_map(|s| s.get("id").cloned()).collect();
    let updated = if ids.is_empty() {
        0
    } else {
        ctx.store
            .update(
                &ctx.query(Table::Shifts).is_in("id", ids),
                &row(json!({ "hourly_rate": rate })),
            )
            .await?
            .len()
    };
    Ok(ActionOutcome::done(
        format!(
            "✅ Updated {name}'s hourly rate to {}/hr and re-rated {updated} shifts.",
            money(rate)
        ),
        json!({ "hourlyRate": rate, "shiftsUpdated": updated }),
    ))
}

// ─── Tests ──────────────────────────────────────────────────────────────────
