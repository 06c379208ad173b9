//! Shared types for the inference client.
//!
//! These mirror the OpenAI Chat Completions API types, used for both
//! request building and response parsing.

use serde::{Deserialize, Serialize};

// ─── Request Types ───────────────────────────────────────────────────────────

/// A single message in the conversation.
///
/// `content` is serialized as `""` (not `null`) for assistant messages that
/// only carry tool calls; `tool_call_id` and `tool_calls` are skipped when
/// `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(serialize_with = "serialize_content")]
    pub content: Option<String>,
    /// Tool call results are sent back as `tool` role messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Assistant messages may contain tool calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallResponse>>,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self::text(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::text(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::text(Role::Assistant, text)
    }

    /// Assistant turn that requested the given tool calls.
    pub fn assistant_tool_calls(text: Option<String>, calls: &[ToolCall]) -> Self {
        Self {
            role: Role::Assistant,
            content: text,
            tool_call_id: None,
            tool_calls: Some(calls.iter().map(ToolCallResponse::from).collect()),
        }
    }

    /// Result of one tool call, keyed by the call id.
    pub fn tool_result(call_id: &str, content: String) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content),
            tool_call_id: Some(call_id.to_string()),
            tool_calls: None,
        }
    }

    fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(text.into()),
            tool_call_id: None,
            tool_calls: None,
        }
    }
}

/// Custom serializer for `content`: emit `""` instead of `null` when `None`.
fn serialize_content<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(s) => serializer.serialize_str(s),
        None => serializer.serialize_str(""),
    }
}

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Tool definition sent in the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub r#type: String,
    pub function: FunctionDefinition,
}

impl ToolDefinition {
    pub fn function(name: &str, description: &str, parameters: serde_json::Value) -> Self {
        Self {
            r#type: "function".to_string(),
            function: FunctionDefinition {
                name: name.to_string(),
                description: description.to_string(),
                parameters,
            },
        }
    }
}

/// Function definition within a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    pub max_tokens: u32,
    pub stream: bool,
}

/// Sampling parameters for a single inference call.
///
/// The orchestrator sends a more exploratory setting for action selection
/// and a calmer one for the reply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingOverrides {
    pub temperature: f32,
    pub top_p: Option<f32>,
    pub max_tokens: u32,
}

impl From<crate::config::PassSampling> for SamplingOverrides {
    fn from(pass: crate::config::PassSampling) -> Self {
        Self {
            temperature: pass.temperature,
            top_p: None,
            max_tokens: pass.max_tokens,
        }
    }
}

// ─── Response Types ──────────────────────────────────────────────────────────

/// A parsed tool call extracted from the model's response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this tool call (generated if the model doesn't provide one).
    pub id: String,
    /// Action name, e.g. `"add_shift"`.
    pub name: String,
    /// Parsed JSON arguments.
    pub arguments: serde_json::Value,
}

/// Tool call as returned in the OpenAI response format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResponse {
    pub id: String,
    pub r#type: String,
    pub function: FunctionCallResponse,
}

impl From<&ToolCall> for ToolCallResponse {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            r#type: "function".to_string(),
            function: FunctionCallResponse {
                name: call.name.clone(),
                arguments: call.arguments.to_string(),
            },
        }
    }
}

/// Function call details in a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCallResponse {
    pub name: String,
    pub arguments: String,
}

/// A complete (non-streamed) model response.
#[derive(Debug, Clone, Default)]
pub struct ModelReply {
    /// Text content, `None` when empty.
    pub text: Option<String>,
    /// Tool calls requested by the model, in order.
    pub tool_calls: Vec<ToolCall>,
    /// Why the model stopped: `"stop"`, `"tool_calls"`, `"length"`.
    pub finish_reason: Option<String>,
}

impl ModelReply {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_synthesis_request_omits_tools_and_top_p() {
        let body = ChatCompletionRequest {
            model: "biz-model".to_string(),
            messages: vec![ChatMessage::system("Reply to the user."), ChatMessage::user("thanks")],
            tools: None,
            tool_choice: None,
            temperature: 0.7,
            top_p: None,
            max_tokens: 1000,
            stream: false,
        };
        let v = serde_json::to_value(&body).unwrap();
        let keys: Vec<&str> = v.as_object().unwrap().keys().map(String::as_str).collect();
        for absent in ["tools", "tool_choice", "top_p"] {
            assert!(!keys.contains(&absent), "{absent} should be omitted");
        }
        assert_eq!(v["messages"][1]["role"], json!("user"));
        assert_eq!(v["max_tokens"], json!(1000));
    }

    #[test]
    fn test_assistant_tool_call_content_is_empty_string() {
        let call = ToolCall {
            id: "call_1".into(),
            name: "add_shift".into(),
            arguments: json!({"date": "2026-01-10"}),
        };
        let msg = ChatMessage::assistant_tool_calls(None, &[call]);
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["content"], json!(""));
        assert_eq!(v["role"], json!("assistant"));
        assert_eq!(v["tool_calls"][0]["function"]["name"], json!("add_shift"));
        assert_eq!(
            v["tool_calls"][0]["function"]["arguments"],
            json!("{\"date\":\"2026-01-10\"}")
        );
    }

    #[test]
    fn test_tool_result_message() {
        let msg = ChatMessage::tool_result("call_9", "{\"success\":true}".into());
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["role"], json!("tool"));
        assert_eq!(v["tool_call_id"], json!("call_9"));
    }

    #[test]
    fn test_sampling_from_pass() {
        let s: SamplingOverrides = crate::config::PassSampling {
            temperature: 1.0,
            max_tokens: 2000,
        }
        .into();
        assert_eq!(s.max_tokens, 2000);
        assert!(s.top_p.is_none());
    }
}
