//! Chat completion response parsing.

use serde::Deserialize;
use uuid::Uuid;

use super::errors::InferenceError;
use super::types::{ModelReply, ToolCall};

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
    tool_calls: Option<Vec<CompletionToolCall>>,
}

#[derive(Deserialize)]
struct CompletionToolCall {
    id: Option<String>,
    function: CompletionFunction,
}

#[derive(Deserialize)]
struct CompletionFunction {
    name: String,
    #[serde(default)]
    arguments: Option<String>,
}

/// Parse a non-streaming `/chat/completions` body into a [`ModelReply`].
///
/// Only the first choice is used. Tool call ids are generated when the
/// endpoint omits them. Arguments that are not valid JSON are kept as a raw
/// string so the router can report the call as invalid without dropping it.
pub fn parse_completion_response(body: &str) -> Result<ModelReply, InferenceError> {
    let resp: CompletionResponse =
        serde_json::from_str(body).map_err(|e| InferenceError::ResponseParse {
            reason: format!("failed to parse completion response: {e}"),
        })?;

    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or(InferenceError::ResponseParse {
            reason: "empty choices array".into(),
        })?;

    let text = choice.message.content.filter(|c| !c.trim().is_empty());

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| {
            let id = tc
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("call_{}", Uuid::new_v4()));
            let raw = tc.function.arguments.unwrap_or_default();
            let arguments = if raw.trim().is_empty() {
                serde_json::Value::Object(Default::default())
            } else {
                serde_json::from_str(&raw).unwrap_or_else(|e| {
                    tracing::warn!(
                        tool = %tc.function.name,
                        error = %e,
                        "tool call arguments are not valid JSON"
                    );
                    serde_json::Value::String(raw.clone())
                })
            };
            ToolCall {
                id,
                name: tc.function.name,
                arguments,
            }
        })
        .collect();

    Ok(ModelReply {
        text,
        tool_calls,
        finish_reason: choice.finish_reason,
    })
}
