//! Read-only income analytics over the caller's shifts.

use chrono::{Datelike, NaiveDate, Weekday};
use serde_json::{json, Value};

use super::periods::{self, Window};
use super::{money, round2, shift_totals, shifts_in, ExecContext, IncomeStats};
use crate::agent_core::actions::{
    AnalyticsAction, ComparePeriodsArgs, EventEarningsArgs, Granularity, IncomeSummaryArgs,
    NamedPeriod, ProjectionArgs, RankDaysArgs, SummaryPeriod,
};
use crate::agent_core::errors::DispatchError;
use crate::agent_core::types::ActionOutcome;
use crate::store::{text, Table};

const DEFAULT_RANK_LIMIT: usize = 5;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub async fn execute(ctx: &ExecContext, action: AnalyticsAction) -> Result<ActionOutcome, DispatchError> {
    match action {
        AnalyticsAction::IncomeSummary(args) => income_summary(ctx, args).await,
        AnalyticsAction::ComparePeriods(args) => compare_periods(ctx, args).await,
        AnalyticsAction::BestDays(args) => rank_days(ctx, args, true).await,
        AnalyticsAction::WorstDays(args) => rank_days(ctx, args, false).await,
        AnalyticsAction::ProjectedYearEnd(args) => projected_year_end(ctx, args).await,
        AnalyticsAction::YearOverYear => year_over_year(ctx).await,
        AnalyticsAction::EventEarnings(args) => event_earnings(ctx, args).await,
    }
}

fn parse_day(field: &str, value: &str) -> Result<NaiveDate, DispatchError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| DispatchError::UnparseableDate {
        field: field.to_string(),
        input: value.to_string(),
    })
}

/// Percent change from `before` to `after`; `None` when there is no base.
fn percent_change(before: f64, after: f64) -> Option<f64> {
    (before.abs() > f64::EPSILON).then(|| (after - before) / before * 100.0)
}

fn change_phrase(before: f64, after: f64) -> String {
    let diff = after - before;
    let direction = if diff >= 0.0 { "up" } else { "down" };
    match percent_change(before, after) {
        Some(pct) => format!("{direction} {} ({:+.1}%)", money(diff.abs()), pct),
        None => format!("{direction} {}", money(diff.abs())),
    }
}

// ─── Income summary ─────────────────────────────────────────────────────────

async fn income_summary(ctx: &ExecContext, args: IncomeSummaryArgs) -> Result<ActionOutcome, DispatchError> {
    let week_start = ctx.week_start().await?;
    let (window, label) = match args.period {
        SummaryPeriod::Today => (periods::today(ctx.today), "today".to_string()),
        SummaryPeriod::Week => (periods::week_to_date(ctx.today, week_start), "this week".to_string()),
        SummaryPeriod::Month => (periods::month_to_date(ctx.today), "this month".to_string()),
        SummaryPeriod::Year => (periods::year_to_date(ctx.today), "this year".to_string()),
        SummaryPeriod::Custom => {
            let range = args
                .date_range
                .as_ref()
                .ok_or_else(|| DispatchError::validation("dateRange is required for a custom period"))?;
            let start = parse_day("dateRange.start", &range.start)?;
            let end = parse_day("dateRange.end", &range.end)?;
            if end < start {
                return Err(DispatchError::validation("dateRange ends before it starts"));
            }
            let w = Window::new(start, end);
            (w, format!("from {} to {}", w.start_str(), w.end_str()))
        }
    };

    let shifts = shifts_in(ctx, Some(window), args.job_id.as_deref()).await?;
    let stats = IncomeStats::from_shifts(&shifts);
    let message = if stats.shifts == 0 {
        format!("No shifts logged {label}.")
    } else {
        format!(
            "You made {} {label} across {} shifts ({} tips, {} wages).",
            money(stats.total_income),
            stats.shifts,
            money(stats.total_tips),
            money(stats.wages)
        )
    };

    let mut data = stats.to_json();
    if let Value::Object(fields) = &mut data {
        fields.insert("startDate".into(), json!(window.start_str()));
        fields.insert("endDate".into(), json!(window.end_str()));
    }
    Ok(ActionOutcome::done(message, data))
}

// ─── Period comparison ──────────────────────────────────────────────────────

fn labeled_window(p: &NamedPeriod, field: &str) -> Result<(Window, String), DispatchError> {
    match p.period {
        Granularity::Year => periods::year(p.year)
            .map(|w| (w, p.year.to_string()))
            .ok_or_else(|| DispatchError::validation(format!("{field}.year is out of range"))),
        Granularity::Month => {
            let month = p
                .month
                .ok_or_else(|| DispatchError::validation(format!("{field}.month is required for a month period")))?;
            let w = periods::month(p.year, month)
                .ok_or_else(|| DispatchError::validation(format!("{field}.month must be 1-12")))?;
            Ok((w, w.start.format("%B %Y").to_string()))
        }
    }
}

async fn compare_periods(ctx: &ExecContext, args: ComparePeriodsArgs) -> Result<ActionOutcome, DispatchError> {
    let (w1, label1) = labeled_window(&args.period1, "period1")?;
    let (w2, label2) = labeled_window(&args.period2, "period2")?;
    let s1 = IncomeStats::from_shifts(&shifts_in(ctx, Some(w1), None).await?);
    let s2 = IncomeStats::from_shifts(&shifts_in(ctx, Some(w2), None).await?);

    let message = format!(
        "{label1}: {} ({} shifts). {label2}: {} ({} shifts). That's {}.",
        money(s1.total_income),
        s1.shifts,
        money(s2.total_income),
        s2.shifts,
        change_phrase(s1.total_income, s2.total_income)
    );
    Ok(ActionOutcome::done(
        message,
        json!({
            "period1": { "label": label1, "stats": s1.to_json() },
            "period2": { "label": label2, "stats": s2.to_json() },
            "difference": round2(s2.total_income - s1.total_income),
            "percentChange": percent_change(s1.total_income, s2.total_income).map(round2),
        }),
    ))
}

// ─── Weekday ranking ────────────────────────────────────────────────────────

/// Average income per shift for one weekday.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeekdayAverage {
    pub weekday: Weekday,
    pub shifts: usize,
    pub total: f64,
}

impl WeekdayAverage {
    pub fn average(&self) -> f64 {
        self.total / self.shifts as f64
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Per-weekday averages for weekdays that have at least one shift, highest
/// average first.
pub fn weekday_averages<'a>(shifts: impl IntoIterator<Item = &'a crate::store::Row>) -> Vec<WeekdayAverage> {
    let mut buckets = [(0usize, 0.0f64); 7];
    for shift in shifts {
        let Some(date) = text(shift, "date").and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()) else {
            continue;
        };
        let slot = &mut buckets[date.weekday().num_days_from_monday() as usize];
        slot.0 += 1;
        slot.1 += shift_totals(shift).total_income;
    }
    let mut out: Vec<WeekdayAverage> = buckets
        .iter()
        .enumerate()
        .filter(|(_, (n, _))| *n > 0)
        .map(|(i, (n, total))| WeekdayAverage {
            weekday: WEEK[i],
            shifts: *n,
            total: *total,
        })
        .collect();
    out.sort_by(|a, b| b.average().total_cmp(&a.average()));
    out
}

async fn rank_days(ctx: &ExecContext, args: RankDaysArgs, best: bool) -> Result<ActionOutcome, DispatchError> {
    let limit = args.limit.unwrap_or(DEFAULT_RANK_LIMIT).clamp(1, 7);
    let shifts = shifts_in(ctx, None, args.job_id.as_deref()).await?;
    let mut ranked = weekday_averages(&shifts);
    if !best {
        ranked.reverse();
    }
    ranked.truncate(limit);

    if ranked.is_empty() {
        return Ok(ActionOutcome::done(
            "There are no shifts to rank yet.",
            json!({ "days": [] }),
        ));
    }
    let listed: Vec<String> = ranked
        .iter()
        .map(|d| format!("{} ({} avg)", weekday_name(d.weekday), money(d.average())))
        .collect();
    let message = format!(
        "Your {} days: {}.",
        if best { "best" } else { "slowest" },
        listed.join(", ")
    );
    let days: Vec<Value> = ranked
        .iter()
        .map(|d| {
            json!({
                "day": weekday_name(d.weekday),
                "shiftCount": d.shifts,
                "totalIncome": round2(d.total),
                "averageIncome": round2(d.average()),
            })
        })
        .collect();
    Ok(ActionOutcome::done(message, json!({ "days": days })))
}

// ─── Projections ────────────────────────────────────────────────────────────

async fn projected_year_end(ctx: &ExecContext, args: ProjectionArgs) -> Result<ActionOutcome, DispatchError> {
    let current_year = ctx.today.year();
    let year = args.year.unwrap_or(current_year);
    if year > current_year {
        return Err(DispatchError::validation(format!("{year} hasn't started yet")));
    }
    let full = periods::year(year).ok_or_else(|| DispatchError::validation("year is out of range"))?;

    if year < current_year {
        let stats = IncomeStats::from_shifts(&shifts_in(ctx, Some(full), None).await?);
        return Ok(ActionOutcome::done(
            format!("{year} is over. You made {} that year.", money(stats.total_income)),
            json!({ "year": year, "actual": round2(stats.total_income), "projected": round2(stats.total_income) }),
        ));
    }

    let ytd = periods::year_to_date(ctx.today);
    let stats = IncomeStats::from_shifts(&shifts_in(ctx, Some(ytd), None).await?);
    let elapsed = ytd.days();
    let projected = stats.total_income / elapsed as f64 * full.days() as f64;
    Ok(ActionOutcome::done(
        format!(
            "At your current pace you're on track for about {} in {year} ({} so far over {elapsed} days).",
            money(projected),
            money(stats.total_income)
        ),
        json!({
            "year": year,
            "yearToDate": round2(stats.total_income),
            "daysElapsed": elapsed,
            "daysInYear": full.days(),
            "projected": round2(projected),
        }),
    ))
}

/// Same month and day one year earlier; Feb 29 maps to Feb 28.
fn same_day_last_year(d: NaiveDate) -> NaiveDate {
    d.with_year(d.year() - 1)
        .or_else(|| NaiveDate::from_ymd_opt(d.year() - 1, d.month(), 28))
        .unwrap_or(d)
}

async fn year_over_year(ctx: &ExecContext) -> Result<ActionOutcome, DispatchError> {
    let this_year = periods::year_to_date(ctx.today);
    let last_end = same_day_last_year(ctx.today);
    let last_year = periods::year_to_date(last_end);

    let now = IncomeStats::from_shifts(&shifts_in(ctx, Some(this_year), None).await?);
    let then = IncomeStats::from_shifts(&shifts_in(ctx, Some(last_year), None).await?);

    let message = format!(
        "So far in {}: {}. Same point in {}: {}. You're {}.",
        this_year.start.year(),
        money(now.total_income),
        last_year.start.year(),
        money(then.total_income),
        change_phrase(then.total_income, now.total_income)
    );
    Ok(ActionOutcome::done(
        message,
        json!({
            "thisYear": now.to_json(),
            "lastYear": then.to_json(),
            "difference": round2(now.total_income - then.total_income),
            "percentChange": percent_change(then.total_income, now.total_income).map(round2),
        }),
    ))
}

// ─── Events ─────────────────────────────────────────────────────────────────

async fn event_earnings(ctx: &ExecContext, args: EventEarningsArgs) -> Result<ActionOutcome, DispatchError> {
    let name = args.event_name.trim();
    if name.is_empty() {
        return Err(DispatchError::validation("eventName is required"));
    }
    let shifts = ctx
        .select(&ctx.query(Table::Shifts).ilike("event_name", name).order_by("date", true))
        .await?;
    if shifts.is_empty() {
        return Err(DispatchError::not_found(format!("No shifts found for an event matching \"{name}\"")));
    }
    let stats = IncomeStats::from_shifts(&shifts);
    let dates: Vec<&str> = shifts.iter().filter_map(|s| text(s, "date")).collect();
    Ok(ActionOutcome::done(
        format!(
            "You made {} from \"{name}\" across {} shifts.",
            money(stats.total_income),
            stats.shifts
        ),
        json!({ "eventName": name, "dates": dates, "stats": stats.to_json() }),
    ))
}
