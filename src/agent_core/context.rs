//! Context builder: a compact, bounded snapshot of the caller's data for the
//! system prompt.

use std::fmt::Write as _;

use crate::executors::{is_active_job, money, ExecContext};
use crate::store::{flag, num, opt_num, text, Row, Table};

use super::errors::DispatchError;
use super::tokens::truncate_utf8;

/// Hard cap on the snapshot, in bytes.
pub const MAX_CONTEXT_BYTES: usize = 2000;

/// Build the snapshot. Store failures are logged and yield a minimal block;
/// building context never fails a request.
pub async fn build_context(ctx: &ExecContext) -> String {
    match gather(ctx).await {
        Ok(text) => truncate_utf8(&text, MAX_CONTEXT_BYTES).to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "context snapshot failed, continuing without it");
            String::from("**USER CONTEXT:** unavailable right now.")
        }
    }
}

async fn gather(ctx: &ExecContext) -> Result<String, DispatchError> {
    let jobs: Vec<Row> = ctx
        .select(
            &ctx.query(Table::Jobs)
                .is_null("deleted_at")
                .order_by("created_at", true),
        )
        .await?
        .into_iter()
        .filter(is_active_job)
        .collect();
    let goals = ctx
        .select(&ctx.query(Table::Goals).eq("is_active", true).order_by("created_at", true))
        .await?;
    let settings = ctx.settings_row().await?;

    Ok(render(&jobs, &goals, settings.as_ref()))
}

fn render(jobs: &[Row], goals: &[Row], settings: Option<&Row>) -> String {
    let mut out = String::from("**USER CONTEXT:**\n");

    if jobs.is_empty() {
        out.push_str("Jobs: none yet. Offer to add one when the user logs a shift.\n");
    } else {
        let _ = writeln!(out, "Jobs ({}):", jobs.len());
        for job in jobs {
            let _ = writeln!(
                out,
                "- {} (id: {}){}{}",
                text(job, "name").unwrap_or("Unnamed job"),
                text(job, "id").unwrap_or("?"),
                opt_num(job, "hourly_rate")
                    .filter(|r| *r > 0.0)
                    .map(|r| format!(", {}/hr", money(r)))
                    .unwrap_or_default(),
                if flag(job, "is_default") { ", default" } else { "" }
            );
        }
    }

    if !goals.is_empty() {
        out.push_str("Active goals:\n");
        for goal in goals {
            let scope = text(goal, "job_id")
                .and_then(|id| jobs.iter().find(|j| text(j, "id") == Some(id)))
                .and_then(|j| text(j, "name"))
                .map(|n| format!(" for {n}"))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "- {} {}{scope}",
                text(goal, "period").unwrap_or("?"),
                money(num(goal, "amount"))
            );
        }
    }

    if let Some(s) = settings {
        let _ = writeln!(
            out,
            "Settings: theme {}, currency {}, weeks start {}",
            text(s, "theme").unwrap_or("default"),
            text(s, "currency_code").unwrap_or("USD"),
            text(s, "week_start_day").unwrap_or("sunday")
        );
    }
    out
}
