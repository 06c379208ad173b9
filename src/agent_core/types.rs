//! Shared types across the agent core: action outcomes and the HTTP
//! request/response envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::DispatchError;

// ─── Action outcomes ────────────────────────────────────────────────────────

/// What a successfully dispatched action produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The action ran. `data` is merged into the result payload.
    Completed {
        message: Option<String>,
        data: Value,
    },
    /// A destructive or bulk action was previewed and nothing was written.
    ConfirmationRequired { message: String, preview: Value },
}

impl ActionOutcome {
    pub fn done(message: impl Into<String>, data: Value) -> Self {
        ActionOutcome::Completed {
            message: Some(message.into()),
            data,
        }
    }

    /// A read with no sentence of its own.
    pub fn data(data: Value) -> Self {
        ActionOutcome::Completed {
            message: None,
            data,
        }
    }

    pub fn confirm(message: impl Into<String>, preview: Value) -> Self {
        ActionOutcome::ConfirmationRequired {
            message: message.into(),
            preview,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ActionOutcome::Completed { message, .. } => message.as_deref(),
            ActionOutcome::ConfirmationRequired { message, .. } => Some(message),
        }
    }
}

/// One action's result, as fed back to the model and to the fallback reply.
#[derive(Debug, Clone)]
pub struct ActionResult {
    pub name: String,
    pub call_id: String,
    pub outcome: Result<ActionOutcome, DispatchError>,
}

impl ActionResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn needs_confirmation(&self) -> bool {
        matches!(self.outcome, Ok(ActionOutcome::ConfirmationRequired { .. }))
    }

    /// JSON payload: the outcome's data plus `success`, `message`, and
    /// `needsConfirmation` or `error`/`errorKind`.
    pub fn to_payload(&self) -> Value {
        let mut out = Map::new();
        match &self.outcome {
            Ok(ActionOutcome::Completed { message, data }) => {
                merge_into(&mut out, data);
                out.insert("success".into(), Value::Bool(true));
                if let Some(m) = message {
                    out.insert("message".into(), Value::String(m.clone()));
                }
            }
            Ok(ActionOutcome::ConfirmationRequired { message, preview }) => {
                merge_into(&mut out, preview);
                out.insert("success".into(), Value::Bool(true));
                out.insert("needsConfirmation".into(), Value::Bool(true));
                out.insert("message".into(), Value::String(message.clone()));
            }
            Err(e) => {
                out.insert("success".into(), Value::Bool(false));
                out.insert("error".into(), Value::String(e.to_string()));
                out.insert("errorKind".into(), Value::String(e.kind().into()));
            }
        }
        Value::Object(out)
    }
}

fn merge_into(out: &mut Map<String, Value>, data: &Value) {
    match data {
        Value::Object(fields) => out.extend(fields.clone()),
        Value::Null => {}
        other => {
            out.insert("result".into(), other.clone());
        }
    }
}

// ─── HTTP envelope ──────────────────────────────────────────────────────────

/// One prior turn supplied by the client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryTurn {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub is_user: bool,
}

/// Inbound chat request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DebugInfo {
    pub functions: Vec<String>,
}

/// Outbound chat response body.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub success: bool,
    pub reply: String,
    pub functions_executed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<DebugInfo>,
}
