//! Conversation orchestrator: the two-pass model exchange.
//!
//! 1. **Select**: the model sees the system prompt (date, rules, user
//!    context), the history, the new message and the full action catalog,
//!    and answers with text or with tool calls.
//! 2. **Execute**: every tool call is dispatched in order through the
//!    [`FunctionRouter`]; each yields its own result.
//! 3. **Synthesize**: the model sees the results (no catalog attached) and
//!    writes the reply, which is validated and repaired before it is sent.
//!
//! The whole exchange runs under one request deadline.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::config::AppConfig;
use crate::executors::ExecContext;
use crate::inference::types::{ChatMessage, ModelReply, SamplingOverrides, ToolDefinition};
use crate::inference::ModelService;
use crate::store::DataStore;

use super::catalog;
use super::context::build_context;
use super::errors::AgentError;
use super::prompt::{synthesis_prompt, system_prompt, GREETING};
use super::reply::finalize_reply;
use super::router::FunctionRouter;
use super::tokens::RequestSize;
use super::types::{ActionResult, ChatResponse, DebugInfo, HistoryTurn};

// ─── Constants ──────────────────────────────────────────────────────────────

/// Most recent history turns forwarded to the model.
const MAX_HISTORY_TURNS: usize = 20;

// ─── Phases ─────────────────────────────────────────────────────────────────

/// Request lifecycle. Every transition is logged with the request id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Receiving,
    BuildingContext,
    FirstModelCall,
    NoActions,
    ExecutingActions,
    SecondModelCall,
    ValidatingReply,
    Responding,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Receiving => "receiving",
            Phase::BuildingContext => "building_context",
            Phase::FirstModelCall => "first_model_call",
            Phase::NoActions => "no_actions",
            Phase::ExecutingActions => "executing_actions",
            Phase::SecondModelCall => "second_model_call",
            Phase::ValidatingReply => "validating_reply",
            Phase::Responding => "responding",
        }
    }
}

struct Transitions {
    request_id: String,
    phase: Phase,
}

impl Transitions {
    fn new(request_id: String) -> Self {
        tracing::info!(request_id = %request_id, phase = Phase::Receiving.as_str(), "orchestrator: request received");
        Self {
            request_id,
            phase: Phase::Receiving,
        }
    }

    fn enter(&mut self, next: Phase) {
        tracing::info!(
            request_id = %self.request_id,
            from = self.phase.as_str(),
            to = next.as_str(),
            "orchestrator: phase transition"
        );
        self.phase = next;
    }
}

// ─── Configuration ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrchestratorConfig {
    pub first_pass: SamplingOverrides,
    pub second_pass: SamplingOverrides,
    /// Budget for the whole request: both model calls and every action.
    pub request_timeout: Duration,
}

impl OrchestratorConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            first_pass: config.model.first_pass.into(),
            second_pass: config.model.second_pass.into(),
            request_timeout: config.server.request_timeout(),
        }
    }
}

// ─── One chat turn ──────────────────────────────────────────────────────────

/// Everything the orchestrator needs about one inbound message.
pub struct ChatTurn<'a> {
    pub store: Arc<dyn DataStore>,
    pub user_id: &'a str,
    /// Reference date for date resolution and period windows.
    pub today: NaiveDate,
    pub message: &'a str,
    pub history: &'a [HistoryTurn],
}

// ─── Orchestrator ───────────────────────────────────────────────────────────

pub struct Orchestrator {
    model: Arc<dyn ModelService>,
    config: OrchestratorConfig,
    catalog: Vec<ToolDefinition>,
}

impl Orchestrator {
    pub fn new(model: Arc<dyn ModelService>, config: OrchestratorConfig) -> Self {
        Self {
            model,
            config,
            catalog: catalog::definitions(),
        }
    }

    /// Run one chat turn to a response envelope.
    ///
    /// Only a failed first model call is an error; every later failure is
    /// folded into the reply.
    pub async fn handle(&self, turn: ChatTurn<'_>) -> Result<ChatResponse, AgentError> {
        let deadline = tokio::time::Instant::now() + self.config.request_timeout;
        let mut log = Transitions::new(uuid::Uuid::new_v4().to_string());

        log.enter(Phase::BuildingContext);
        let ctx = ExecContext::new(Arc::clone(&turn.store), turn.user_id, turn.today);
        let context = build_context(&ctx).await;
        let prompt = system_prompt(turn.today, &context);
        let history = history_messages(turn.history);

        log.enter(Phase::FirstModelCall);
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(prompt.clone()));
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::user(turn.message));
        let size = RequestSize::measure(&messages, Some(&self.catalog));
        tracing::info!(
            request_id = %log.request_id,
            system_tokens = size.system,
            conversation_tokens = size.conversation,
            catalog_tokens = size.catalog,
            history_turns = history.len(),
            "orchestrator: selecting actions"
        );

        let first = self
            .call_model(messages, Some(self.catalog.clone()), self.config.first_pass, deadline)
            .await
            .map_err(|e| match e {
                AgentError::DeadlineExceeded { phase } => AgentError::ModelServiceFailure {
                    reason: format!("request deadline exceeded during {phase}"),
                },
                other => other,
            })?;

        if !first.has_tool_calls() {
            log.enter(Phase::NoActions);
            let reply = first
                .text
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(GREETING)
                .to_string();
            log.enter(Phase::Responding);
            return Ok(ChatResponse {
                success: true,
                reply,
                functions_executed: 0,
                debug_info: None,
            });
        }

        log.enter(Phase::ExecutingActions);
        let calls = first.tool_calls;
        tracing::info!(
            request_id = %log.request_id,
            count = calls.len(),
            actions = ?calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            "orchestrator: executing actions"
        );
        let results = FunctionRouter::new(&ctx).dispatch_all(&calls, Some(deadline)).await;

        log.enter(Phase::SecondModelCall);
        let mut messages = Vec::with_capacity(history.len() + results.len() + 3);
        messages.push(ChatMessage::system(synthesis_prompt(&prompt)));
        messages.extend(history);
        messages.push(ChatMessage::user(turn.message));
        messages.push(ChatMessage::assistant_tool_calls(first.text.clone(), &calls));
        messages.extend(tool_result_messages(&results));
        tracing::debug!(
            request_id = %log.request_id,
            estimated_tokens = RequestSize::measure(&messages, None).total(),
            "orchestrator: synthesizing reply"
        );

        let synthesized = match self
            .call_model(messages, None, self.config.second_pass, deadline)
            .await
        {
            Ok(reply) => reply.text,
            Err(e) => {
                tracing::warn!(request_id = %log.request_id, error = %e, "orchestrator: synthesis failed, falling back");
                None
            }
        };

        log.enter(Phase::ValidatingReply);
        let reply = finalize_reply(synthesized.as_deref(), &results);

        log.enter(Phase::Responding);
        Ok(ChatResponse {
            success: true,
            reply,
            functions_executed: results.len(),
            debug_info: Some(DebugInfo {
                functions: results.iter().map(|r| r.name.clone()).collect(),
            }),
        })
    }

    /// One model call bounded by the request deadline.
    async fn call_model(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<Vec<ToolDefinition>>,
        sampling: SamplingOverrides,
        deadline: tokio::time::Instant,
    ) -> Result<ModelReply, AgentError> {
        let phase = if tools.is_some() { "first model call" } else { "second model call" };
        match tokio::time::timeout_at(deadline, self.model.complete(messages, tools, sampling)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(AgentError::DeadlineExceeded {
                phase: phase.to_string(),
            }),
        }
    }
}

/// Client history as model messages, oldest first, blank turns dropped.
fn history_messages(history: &[HistoryTurn]) -> Vec<ChatMessage> {
    let skip = history.len().saturating_sub(MAX_HISTORY_TURNS);
    history
        .iter()
        .skip(skip)
        .filter(|t| !t.text.trim().is_empty())
        .map(|t| {
            if t.is_user {
                ChatMessage::user(t.text.clone())
            } else {
                ChatMessage::assistant(t.text.clone())
            }
        })
        .collect()
}

fn tool_result_messages(results: &[ActionResult]) -> impl Iterator<Item = ChatMessage> + '_ {
    results
        .iter()
        .map(|r| ChatMessage::tool_result(&r.call_id, r.to_payload().to_string()))
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::test_support::*;
    use crate::inference::types::{Role, ToolCall};
    use crate::inference::InferenceError;
    use crate::store::{num, text, Table};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Model that replays scripted replies and records what it was sent.
    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<ModelReply, InferenceError>>>,
        seen: Mutex<Vec<(Vec<ChatMessage>, bool)>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<ModelReply, InferenceError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ModelService for ScriptedModel {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            tools: Option<Vec<ToolDefinition>>,
            _sampling: SamplingOverrides,
        ) -> Result<ModelReply, InferenceError> {
            self.seen.lock().unwrap().push((messages, tools.is_some()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ModelReply::default()))
        }
    }

    fn text_reply(text: &str) -> Result<ModelReply, InferenceError> {
        Ok(ModelReply {
            text: Some(text.into()),
            tool_calls: vec![],
            finish_reason: Some("stop".into()),
        })
    }

    fn calls_reply(calls: &[(&str, Value)]) -> Result<ModelReply, InferenceError> {
        Ok(ModelReply {
            text: None,
            tool_calls: calls
                .iter()
                .enumerate()
                .map(|(i, (name, args))| ToolCall {
                    id: format!("call_{i}"),
                    name: name.to_string(),
                    arguments: args.clone(),
                })
                .collect(),
            finish_reason: Some("tool_calls".into()),
        })
    }

    fn config() -> OrchestratorConfig {
        OrchestratorConfig {
            first_pass: SamplingOverrides {
                temperature: 1.0,
                top_p: None,
                max_tokens: 2000,
            },
            second_pass: SamplingOverrides {
                temperature: 0.7,
                top_p: None,
                max_tokens: 1000,
            },
            request_timeout: Duration::from_secs(60),
        }
    }

    fn turn<'a>(ctx: &ExecContext, message: &'a str, history: &'a [HistoryTurn]) -> ChatTurn<'a> {
        ChatTurn {
            store: Arc::clone(&ctx.store),
            user_id: USER,
            today: today(),
            message,
            history,
        }
    }

    #[tokio::test]
    async fn test_logs_shift_and_falls_back_on_bare_checkmark() {
        let ctx = ctx();
        seed_job(&ctx, "Bar Luna", 12.0, false).await;
        let model = ScriptedModel::new(vec![
            calls_reply(&[(
                "add_shift",
                json!({ "date": "today", "cashTips": 40, "creditTips": 60, "hoursWorked": 6 }),
            )]),
            text_reply("✅"),
        ]);
        let orchestrator = Orchestrator::new(model.clone(), config());

        let response = orchestrator
            .handle(turn(&ctx, "I made $40 cash and $60 credit today, worked 6 hours", &[]))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.functions_executed, 1);
        assert!(response.reply.contains("$172"), "reply was {:?}", response.reply);
        assert_eq!(
            response.debug_info,
            Some(DebugInfo {
                functions: vec!["add_shift".into()]
            })
        );

        let shifts = ctx.select(&ctx.query(Table::Shifts)).await.unwrap();
        assert_eq!(shifts.len(), 1);
        assert_eq!(text(&shifts[0], "date"), Some("2026-01-10"));
        assert_eq!(num(&shifts[0], "cash_tips"), 40.0);
        assert_eq!(num(&shifts[0], "credit_tips"), 60.0);
        assert_eq!(num(&shifts[0], "hours_worked"), 6.0);
        assert_eq!(num(&shifts[0], "hourly_rate"), 12.0);

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].1, "first pass carries the catalog");
        assert!(!seen[1].1, "second pass carries no tools");
        let tool_msg = seen[1].0.last().unwrap();
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_0"));
    }

    #[tokio::test]
    async fn test_unknown_action_does_not_abort_siblings() {
        let ctx = ctx();
        let model = ScriptedModel::new(vec![
            calls_reply(&[
                ("teleport_user", json!({})),
                ("set_monthly_goal", json!({ "amount": 2500 })),
            ]),
            text_reply("I set your monthly goal to $2,500. I couldn't do the other thing."),
        ]);
        let orchestrator = Orchestrator::new(model, config());
        let response = orchestrator
            .handle(turn(&ctx, "set a 2500 monthly goal and teleport me", &[]))
            .await
            .unwrap();

        assert_eq!(response.functions_executed, 2);
        assert!(response.reply.starts_with("I set your monthly goal"));
        let goals = ctx.select(&ctx.query(Table::Goals)).await.unwrap();
        assert_eq!(goals.len(), 1);
    }

    #[tokio::test]
    async fn test_plain_text_and_empty_replies() {
        let ctx = ctx();
        let model = ScriptedModel::new(vec![text_reply("Hi! How can I help with your tips today?"), text_reply("  ")]);
        let orchestrator = Orchestrator::new(model, config());

        let first = orchestrator.handle(turn(&ctx, "hello", &[])).await.unwrap();
        assert_eq!(first.reply, "Hi! How can I help with your tips today?");
        assert_eq!(first.functions_executed, 0);
        assert!(first.debug_info.is_none());

        let second = orchestrator.handle(turn(&ctx, "hello again", &[])).await.unwrap();
        assert_eq!(second.reply, GREETING);
    }

    #[tokio::test]
    async fn test_first_call_failure_is_an_error() {
        let ctx = ctx();
        let model = ScriptedModel::new(vec![Err(InferenceError::HttpError {
            status: 400,
            body: "bad request".into(),
        })]);
        let orchestrator = Orchestrator::new(model, config());
        let err = orchestrator.handle(turn(&ctx, "hi", &[])).await.unwrap_err();
        assert!(matches!(err, AgentError::ModelServiceFailure { .. }));
    }

    #[tokio::test]
    async fn test_second_call_failure_falls_back_with_confirmation() {
        let ctx = ctx();
        seed_shift(&ctx, json!({ "date": "2026-01-09", "cash_tips": 80 })).await;
        let model = ScriptedModel::new(vec![
            calls_reply(&[("delete_shift", json!({ "date": "yesterday" }))]),
            Err(InferenceError::ConnectionFailed {
                endpoint: "http://model".into(),
                reason: "reset".into(),
            }),
        ]);
        let orchestrator = Orchestrator::new(model, config());
        let response = orchestrator
            .handle(turn(&ctx, "delete yesterday's shift", &[]))
            .await
            .unwrap();
        assert_eq!(
            response.reply,
            "Are you sure you want to delete the shift from 2026-01-09? You earned $80.00 that day."
        );
        assert_eq!(ctx.select(&ctx.query(Table::Shifts)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_history_is_forwarded_in_order() {
        let ctx = ctx();
        let model = ScriptedModel::new(vec![text_reply("Sure, which job was that for?")]);
        let orchestrator = Orchestrator::new(model.clone(), config());
        let history = vec![
            HistoryTurn {
                text: "add a shift".into(),
                is_user: true,
            },
            HistoryTurn {
                text: "What did you make?".into(),
                is_user: false,
            },
            HistoryTurn {
                text: " ".into(),
                is_user: true,
            },
        ];
        orchestrator.handle(turn(&ctx, "$200", &history)).await.unwrap();

        let seen = model.seen.lock().unwrap();
        let roles: Vec<Role> = seen[0].0.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(seen[0].0[3].content.as_deref(), Some("$200"));
    }
}
