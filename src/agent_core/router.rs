//! FunctionRouter: turns model tool calls into executor invocations.
//!
//! Each call goes through the same lifecycle:
//! name lookup → date resolution → typed parse → executor → result.
//! Every step's failure is folded into that call's [`ActionResult`]; one bad
//! call never stops the calls after it.

use std::time::Instant;

use crate::executors::{analytics, contact, goal, job, settings, shift, ExecContext};
use crate::inference::types::ToolCall;

use super::actions::Action;
use super::catalog::ActionName;
use super::dates::DateResolver;
use super::errors::DispatchError;
use super::types::{ActionOutcome, ActionResult};

// ─── Static dispatch ────────────────────────────────────────────────────────

/// Run a parsed action on its executor.
pub async fn execute(ctx: &ExecContext, action: Action) -> Result<ActionOutcome, DispatchError> {
    match action {
        Action::Shift(a) => shift::execute(ctx, a).await,
        Action::Contact(a) => contact::execute(ctx, a).await,
        Action::Job(a) => job::execute(ctx, a).await,
        Action::Goal(a) => goal::execute(ctx, a).await,
        Action::Settings(a) => settings::execute(ctx, a).await,
        Action::Analytics(a) => analytics::execute(ctx, a).await,
    }
}

// ─── FunctionRouter ─────────────────────────────────────────────────────────

/// Dispatches one request's tool calls against one user's data.
pub struct FunctionRouter<'a> {
    ctx: &'a ExecContext,
    dates: DateResolver,
}

impl<'a> FunctionRouter<'a> {
    pub fn new(ctx: &'a ExecContext) -> Self {
        Self {
            ctx,
            dates: DateResolver::new(ctx.today),
        }
    }

    /// Dispatch a batch of tool calls in order.
    ///
    /// Calls that have not started when `deadline` passes are reported as
    /// [`DispatchError::DeadlineExceeded`] without running.
    pub async fn dispatch_all(
        &self,
        calls: &[ToolCall],
        deadline: Option<tokio::time::Instant>,
    ) -> Vec<ActionResult> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            let expired = deadline.is_some_and(|d| tokio::time::Instant::now() >= d);
            let result = if expired {
                tracing::warn!(action = %call.name, "deadline passed, action skipped");
                ActionResult {
                    name: call.name.clone(),
                    call_id: call.id.clone(),
                    outcome: Err(DispatchError::DeadlineExceeded),
                }
            } else {
                self.dispatch_single(call).await
            };
            results.push(result);
        }
        results
    }

    /// Dispatch one tool call: resolve → parse → execute.
    pub async fn dispatch_single(&self, call: &ToolCall) -> ActionResult {
        let start = Instant::now();
        let parsed = call.name.parse::<ActionName>();
        let category = parsed.as_ref().map_or("unknown", |n| n.family().as_str());

        let outcome = match parsed {
            Ok(name) => self.run(name, call.arguments.clone()).await,
            Err(e) => Err(e),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &outcome {
            Ok(ActionOutcome::Completed { .. }) => tracing::info!(
                action = %call.name,
                category,
                outcome = "success",
                elapsed_ms,
                "action executed"
            ),
            Ok(ActionOutcome::ConfirmationRequired { .. }) => tracing::info!(
                action = %call.name,
                category,
                outcome = "needs_confirmation",
                elapsed_ms,
                "action previewed"
            ),
            Err(e) => tracing::warn!(
                action = %call.name,
                category,
                outcome = e.kind(),
                elapsed_ms,
                error = %e,
                "action failed"
            ),
        }

        ActionResult {
            name: call.name.clone(),
            call_id: call.id.clone(),
            outcome,
        }
    }

    async fn run(&self, name: ActionName, mut args: serde_json::Value) -> Result<ActionOutcome, DispatchError> {
        self.dates.resolve_date_fields(&mut args)?;
        let action = Action::parse(name, args)?;
        execute(self.ctx, action).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::test_support::*;
    use crate::store::{num, Table};
    use serde_json::json;

    fn call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    #[tokio::test]
    async fn test_unknown_action_does_not_stop_siblings() {
        let ctx = ctx();
        let router = FunctionRouter::new(&ctx);
        let results = router
            .dispatch_all(
                &[
                    call("c1", "fly_to_moon", json!({})),
                    call("c2", "add_shift", json!({ "date": "today", "cashTips": 20 })),
                ],
                None,
            )
            .await;
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0].outcome,
            Err(DispatchError::UnknownAction { ref name }) if name == "fly_to_moon"
        ));
        assert!(results[1].is_success());
        assert_eq!(results[1].call_id, "c2");
    }

    #[tokio::test]
    async fn test_dates_are_resolved_before_dispatch() {
        let ctx = ctx();
        let router = FunctionRouter::new(&ctx);
        let result = router
            .dispatch_single(&call("c1", "add_shift", json!({ "date": "the 22nd", "cashTips": 5 })))
            .await;
        assert!(result.is_success());
        let shifts = ctx.select(&ctx.query(Table::Shifts)).await.unwrap();
        assert_eq!(shifts[0]["date"], "2026-01-22");
        assert_eq!(num(&shifts[0], "cash_tips"), 5.0);
    }

    #[tokio::test]
    async fn test_unparseable_date_is_folded_into_result() {
        let ctx = ctx();
        let router = FunctionRouter::new(&ctx);
        let result = router
            .dispatch_single(&call("c1", "delete_shift", json!({ "date": "whenever" })))
            .await;
        assert_eq!(result.to_payload()["errorKind"], "unparseable_date");
    }

    #[tokio::test]
    async fn test_names_that_share_words_route_correctly() {
        // Mentions "shift" but belongs to the contact executor.
        let ctx = ctx();
        let router = FunctionRouter::new(&ctx);
        let result = router
            .dispatch_single(&call("c1", "get_contacts_for_shift", json!({})))
            .await;
        assert_eq!(
            result.to_payload()["error"],
            "shiftId or date is required"
        );
    }

    #[tokio::test]
    async fn test_expired_deadline_skips_actions() {
        let ctx = ctx();
        let router = FunctionRouter::new(&ctx);
        let past = tokio::time::Instant::now() - std::time::Duration::from_millis(1);
        let results = router
            .dispatch_all(&[call("c1", "get_goals", json!({}))], Some(past))
            .await;
        assert!(matches!(results[0].outcome, Err(DispatchError::DeadlineExceeded)));
    }
}
