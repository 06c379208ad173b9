//! Goal executor. Goals store only a target; progress is always computed
//! from the shifts inside the goal's current period window.

use serde_json::{json, Value};

use super::periods::{self, Window};
use super::{money, round2, shifts_in, ExecContext, IncomeStats};
use crate::agent_core::actions::{
    DeleteGoalArgs, EditGoalArgs, GetGoalsArgs, GoalAction, GoalPeriod, GoalProgressArgs, JobRef,
    SetGoalArgs,
};
use crate::agent_core::errors::DispatchError;
use crate::agent_core::types::ActionOutcome;
use crate::store::{flag, num, opt_num, text, Row, Table};

pub async fn execute(ctx: &ExecContext, action: GoalAction) -> Result<ActionOutcome, DispatchError> {
    match action {
        GoalAction::Set(period, args) => set_goal(ctx, period, args).await,
        GoalAction::Edit(args) => edit_goal(ctx, args).await,
        GoalAction::Delete(args) => delete_goal(ctx, args).await,
        GoalAction::List(args) => get_goals(ctx, args).await,
        GoalAction::Progress(args) => goal_progress(ctx, args).await,
    }
}

fn period_of(goal: &Row) -> Option<GoalPeriod> {
    match text(goal, "period")? {
        "daily" => Some(GoalPeriod::Daily),
        "weekly" => Some(GoalPeriod::Weekly),
        "monthly" => Some(GoalPeriod::Monthly),
        "yearly" => Some(GoalPeriod::Yearly),
        _ => None,
    }
}

fn check_amount(amount: f64) -> Result<f64, DispatchError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(DispatchError::validation("Goal amount must be more than zero"))
    }
}

fn goal_id(goal: &Row) -> Value {
    goal.get("id").cloned().unwrap_or(Value::Null)
}

/// Locate a goal by id, else the active goal for `period` (narrowed to one
/// job when a job is named), else the only active goal.
async fn find_goal(
    ctx: &ExecContext,
    id: Option<&str>,
    period: Option<GoalPeriod>,
    job: &JobRef,
) -> Result<Row, DispatchError> {
    if let Some(id) = id {
        return ctx
            .first(ctx.query(Table::Goals).eq("id", id))
            .await?
            .ok_or_else(|| DispatchError::not_found(format!("No goal found with id {id}")));
    }
    let mut q = ctx.query(Table::Goals).eq("is_active", true);
    if let Some(p) = period {
        q = q.eq("period", p.as_str());
    }
    if !job.is_empty() {
        let job_row = ctx.require_job(job, true).await?;
        q = q.eq("job_id", text(&job_row, "id").unwrap_or_default());
    }
    let mut goals = ctx.select(&q.order_by("created_at", false)).await?;
    match (goals.len(), period) {
        (0, Some(p)) => Err(DispatchError::not_found(format!("You don't have a {} goal", p.as_str()))),
        (0, None) => Err(DispatchError::not_found("You don't have any active goals")),
        (1, _) => Ok(goals.remove(0)),
        (n, Some(p)) => {
            let mut scopes = Vec::with_capacity(n);
            for goal in &goals {
                scopes.push(scope_label(ctx, goal).await?);
            }
            Err(DispatchError::validation(format!(
                "You have {n} active {} goals ({}). Say which job the goal is for.",
                p.as_str(),
                scopes.join(", ")
            )))
        }
        (n, None) => Err(DispatchError::validation(format!(
            "You have {n} active goals. Say which one (daily, weekly, monthly, or yearly)."
        ))),
    }
}

/// `for Bar Luna`, or `all jobs` for an unscoped goal.
async fn scope_label(ctx: &ExecContext, goal: &Row) -> Result<String, DispatchError> {
    let Some(job_id) = text(goal, "job_id") else {
        return Ok("all jobs".to_string());
    };
    let job = JobRef {
        job_id: Some(job_id.to_string()),
        job_name: None,
    };
    let name = ctx
        .find_job(&job, true)
        .await?
        .and_then(|j| text(&j, "name").map(str::to_string))
        .unwrap_or_else(|| job_id.to_string());
    Ok(format!("for {name}"))
}

// ─── Progress ───────────────────────────────────────────────────────────────

/// Progress toward one goal over its current window.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalProgress {
    pub period: GoalPeriod,
    pub target: f64,
    pub earned: f64,
    pub hours: f64,
    pub target_hours: Option<f64>,
    pub window: Window,
    /// Share of the target the calendar says should be done by now.
    pub expected_fraction: f64,
}

impl GoalProgress {
    pub fn percent(&self) -> f64 {
        if self.target > 0.0 {
            self.earned / self.target * 100.0
        } else {
            0.0
        }
    }

    pub fn remaining(&self) -> f64 {
        (self.target - self.earned).max(0.0)
    }

    pub fn on_track(&self) -> bool {
        self.earned >= self.target * self.expected_fraction
    }

    fn to_json(&self) -> Value {
        json!({
            "period": self.period.as_str(),
            "target": round2(self.target),
            "earned": round2(self.earned),
            "remaining": round2(self.remaining()),
            "percentComplete": round2(self.percent()),
            "hoursWorked": round2(self.hours),
            "targetHours": self.target_hours,
            "onTrack": self.on_track(),
            "startDate": self.window.start_str(),
            "endDate": self.window.end_str(),
        })
    }

    fn sentence(&self) -> String {
        let label = capitalize(self.period.as_str());
        if self.remaining() <= 0.0 {
            format!(
                "🎯 {label} goal reached: {} of {}!",
                money(self.earned),
                money(self.target)
            )
        } else {
            format!(
                "{label} goal: {} of {} ({:.0}%), {} to go{}.",
                money(self.earned),
                money(self.target),
                self.percent(),
                money(self.remaining()),
                if self.on_track() { ", on track" } else { ", behind pace" }
            )
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub async fn progress_for(ctx: &ExecContext, goal: &Row) -> Result<Option<GoalProgress>, DispatchError> {
    let Some(period) = period_of(goal) else {
        return Ok(None);
    };
    let window = periods::goal_window(period, ctx.today, ctx.week_start().await?);
    let shifts = shifts_in(ctx, Some(window), text(goal, "job_id")).await?;
    let stats = IncomeStats::from_shifts(&shifts);
    let expected_fraction =
        window.days() as f64 / periods::goal_period_days(period, ctx.today) as f64;
    Ok(Some(GoalProgress {
        period,
        target: num(goal, "amount"),
        earned: stats.total_income,
        hours: stats.hours,
        target_hours: opt_num(goal, "target_hours"),
        window,
        expected_fraction: expected_fraction.min(1.0),
    }))
}

// ─── Operations ─────────────────────────────────────────────────────────────

/// Create the goal for this period and job scope, or update the one that
/// already exists.
async fn set_goal(ctx: &ExecContext, period: GoalPeriod, args: SetGoalArgs) -> Result<ActionOutcome, DispatchError> {
    let amount = check_amount(args.amount)?;
    let job = if args.job.is_empty() {
        None
    } else {
        Some(ctx.require_job(&args.job, false).await?)
    };
    let job_id = job.as_ref().and_then(|j| text(j, "id")).map(str::to_string);

    let mut q = ctx
        .query(Table::Goals)
        .eq("period", period.as_str())
        .eq("is_active", true);
    q = match &job_id {
        Some(id) => q.eq("job_id", id.as_str()),
        None => q.is_null("job_id"),
    };
    let existing = ctx.first(q).await?;

    let mut fields = Row::new();
    fields.insert("amount".into(), json!(amount));
    if let Some(h) = args.target_hours {
        fields.insert("target_hours".into(), json!(h));
    }

    let (saved, verb) = match existing {
        Some(goal) => {
            let updated = ctx
                .store
                .update(&ctx.query(Table::Goals).eq("id", goal_id(&goal)), &fields)
                .await?
                .into_iter()
                .next()
                .unwrap_or(goal);
            (updated, "Updated")
        }
        None => {
            fields.insert("period".into(), json!(period.as_str()));
            fields.insert("is_active".into(), json!(true));
            if let Some(id) = &job_id {
                fields.insert("job_id".into(), json!(id));
            }
            (ctx.insert(Table::Goals, fields).await?, "Set")
        }
    };

    let scope = job
        .as_ref()
        .and_then(|j| text(j, "name"))
        .map(|n| format!(" for {n}"))
        .unwrap_or_default();
    let mut message = format!(
        "✅ {verb} your {} goal{scope} to {}.",
        period.as_str(),
        money(amount)
    );
    let progress = progress_for(ctx, &saved).await?;
    if let Some(p) = &progress {
        message.push(' ');
        message.push_str(&p.sentence());
    }

    Ok(ActionOutcome::done(
        message,
        json!({
            "goal": saved,
            "progress": progress.as_ref().map(GoalProgress::to_json),
        }),
    ))
}

async fn edit_goal(ctx: &ExecContext, args: EditGoalArgs) -> Result<ActionOutcome, DispatchError> {
    let goal = find_goal(ctx, args.goal_id.as_deref(), args.period, &args.job).await?;
    let mut patch = Row::new();
    if let Some(a) = args.updates.amount {
        patch.insert("amount".into(), json!(check_amount(a)?));
    }
    if let Some(h) = args.updates.target_hours {
        patch.insert("target_hours".into(), json!(h));
    }
    if let Some(active) = args.updates.is_active {
        patch.insert("is_active".into(), json!(active));
    }
    if patch.is_empty() {
        return Err(DispatchError::validation("No changes were given for the goal"));
    }
    let saved = ctx
        .store
        .update(&ctx.query(Table::Goals).eq("id", goal_id(&goal)), &patch)
        .await?
        .into_iter()
        .next()
        .unwrap_or(goal);
    Ok(ActionOutcome::done(
        format!(
            "✅ Updated your {} goal: {} target.",
            text(&saved, "period").unwrap_or("income"),
            money(num(&saved, "amount"))
        ),
        json!({ "goal": saved }),
    ))
}

async fn delete_goal(ctx: &ExecContext, args: DeleteGoalArgs) -> Result<ActionOutcome, DispatchError> {
    let goal = find_goal(ctx, args.goal_id.as_deref(), args.period, &args.job).await?;
    let period = text(&goal, "period").unwrap_or("income").to_string();
    let amount = money(num(&goal, "amount"));

    if !args.confirmed {
        return Ok(ActionOutcome::confirm(
            format!("Are you sure you want to delete your {period} goal of {amount}?"),
            json!({ "goal": goal }),
        ));
    }
    ctx.store
        .delete(&ctx.query(Table::Goals).eq("id", goal_id(&goal)))
        .await?;
    Ok(ActionOutcome::done(
        format!("Deleted your {period} goal of {amount}."),
        Value::Null,
    ))
}

async fn get_goals(ctx: &ExecContext, args: GetGoalsArgs) -> Result<ActionOutcome, DispatchError> {
    let mut q = ctx.query(Table::Goals);
    if !args.include_completed {
        q = q.eq("is_active", true);
    }
    let goals = ctx.select(&q.order_by("created_at", true)).await?;

    let mut listed = Vec::with_capacity(goals.len());
    for goal in &goals {
        let progress = if flag(goal, "is_active") {
            progress_for(ctx, goal).await?
        } else {
            None
        };
        listed.push(json!({
            "goal": goal,
            "progress": progress.as_ref().map(GoalProgress::to_json),
        }));
    }

    let message = if goals.is_empty() {
        "You don't have any goals set yet.".to_string()
    } else {
        format!("You have {} goals.", goals.len())
    };
    Ok(ActionOutcome::done(
        message,
        json!({ "count": goals.len(), "goals": listed }),
    ))
}

async fn goal_progress(ctx: &ExecContext, args: GoalProgressArgs) -> Result<ActionOutcome, DispatchError> {
    let goals = match args.goal_id.as_deref() {
        Some(id) => vec![find_goal(ctx, Some(id), None, &JobRef::default()).await?],
        None => {
            ctx.select(&ctx.query(Table::Goals).eq("is_active", true).order_by("created_at", true))
                .await?
        }
    };
    if goals.is_empty() {
        return Err(DispatchError::not_found("You don't have any active goals"));
    }

    let mut sentences = Vec::new();
    let mut progress = Vec::new();
    for goal in &goals {
        if let Some(p) = progress_for(ctx, goal).await? {
            sentences.push(p.sentence());
            progress.push(p.to_json());
        }
    }
    Ok(ActionOutcome::done(
        sentences.join(" "),
        json!({ "progress": progress }),
    ))
}
