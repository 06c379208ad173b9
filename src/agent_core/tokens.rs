//! Request size estimates and byte-bounded truncation.
//!
//! The full action catalog rides along on every first-pass request, so it
//! usually outweighs the conversation itself. [`RequestSize`] breaks an
//! outgoing request into prompt, history and catalog shares for the request
//! log. Estimates are character heuristics (prose ≈ 3.2 chars/token, JSON ≈
//! 2.8); nothing is rejected on them.

use crate::inference::types::{ChatMessage, Role, ToolDefinition};

const PROSE_CHARS_PER_TOKEN: f64 = 3.2;
const JSON_CHARS_PER_TOKEN: f64 = 2.8;

/// Role label and separators.
const PER_MESSAGE: u32 = 4;
/// Call id, type tag and braces.
const PER_TOOL_CALL: u32 = 10;

/// Longest prefix of `s` no larger than `max_bytes` that ends on a char
/// boundary.
pub(crate) fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let cut = (0..=max_bytes)
        .rev()
        .find(|&i| s.is_char_boundary(i))
        .unwrap_or(0);
    &s[..cut]
}

fn tokens_at(len: usize, chars_per_token: f64) -> u32 {
    (len as f64 / chars_per_token).ceil() as u32
}

fn prose(text: &str) -> u32 {
    tokens_at(text.len(), PROSE_CHARS_PER_TOKEN)
}

fn json(text: &str) -> u32 {
    tokens_at(text.len(), JSON_CHARS_PER_TOKEN)
}

/// Estimated tokens for one message. Tool results and call arguments are
/// counted as JSON.
pub fn message_tokens(message: &ChatMessage) -> u32 {
    let body = message.content.as_deref().map_or(0, |c| match message.role {
        Role::Tool => json(c),
        _ => prose(c),
    });
    let calls: u32 = message
        .tool_calls
        .iter()
        .flatten()
        .map(|c| PER_TOOL_CALL + prose(&c.function.name) + json(&c.function.arguments))
        .sum();
    let id = message.tool_call_id.as_deref().map_or(0, prose);
    PER_MESSAGE + body + calls + id
}

/// Estimated prompt size of one model request, by share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestSize {
    /// System prompt(s), including the context snapshot.
    pub system: u32,
    /// Prior turns, the new user message and any tool exchange.
    pub conversation: u32,
    /// Serialized tool schemas.
    pub catalog: u32,
}

impl RequestSize {
    pub fn measure(messages: &[ChatMessage], tools: Option<&[ToolDefinition]>) -> Self {
        let (system, conversation) = messages.iter().fold((0, 0), |(s, c), m| {
            let n = message_tokens(m);
            if m.role == Role::System {
                (s + n, c)
            } else {
                (s, c + n)
            }
        });
        let catalog = tools
            .and_then(|t| serde_json::to_string(t).ok())
            .map_or(0, |schema| json(&schema));
        Self {
            system,
            conversation,
            catalog,
        }
    }

    pub fn total(&self) -> u32 {
        self.system + self.conversation + self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::types::ToolCall;
    use serde_json::json;

    #[test]
    fn test_prose_and_json_rates() {
        assert_eq!(prose(""), 0);
        // 5 / 3.2 → 2
        assert_eq!(prose("hello"), 2);
        // 17 / 2.8 → 7
        assert_eq!(json(r#"{"date": "today"}"#), 7);
    }

    #[test]
    fn test_user_message_tokens() {
        // 13 chars → 5, plus the per-message overhead
        assert_eq!(message_tokens(&ChatMessage::user("Hello, world!")), 9);
    }

    #[test]
    fn test_tool_turns_count_calls_and_ids() {
        let call = ToolCall {
            id: "call_1".into(),
            name: "add_shift".into(),
            arguments: json!({ "date": "2026-01-10", "cashTips": 40 }),
        };
        let turn = ChatMessage::assistant_tool_calls(None, std::slice::from_ref(&call));
        assert!(message_tokens(&turn) > PER_MESSAGE + PER_TOOL_CALL);

        let result = ChatMessage::tool_result("call_1", r#"{"success":true}"#.into());
        // 16 chars as JSON → 6, id 6 chars as prose → 2
        assert_eq!(message_tokens(&result), PER_MESSAGE + 6 + 2);
    }

    #[test]
    fn test_request_size_shares() {
        let messages = vec![
            ChatMessage::system("You are Biz."),
            ChatMessage::user("I made $40 today"),
        ];
        let tools = vec![ToolDefinition::function(
            "get_goals",
            "List goals",
            json!({ "type": "object", "properties": {} }),
        )];

        let bare = RequestSize::measure(&messages, None);
        assert_eq!(bare.catalog, 0);
        assert_eq!(bare.system, message_tokens(&messages[0]));
        assert_eq!(bare.conversation, message_tokens(&messages[1]));

        let with_catalog = RequestSize::measure(&messages, Some(&tools));
        assert!(with_catalog.catalog > 0);
        assert_eq!(with_catalog.total(), bare.total() + with_catalog.catalog);
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate_utf8("hello world", 5), "hello");
        assert_eq!(truncate_utf8("short", 100), "short");
        // '═' is 3 bytes; a cut at 4 or 5 backs off to 3
        assert_eq!(truncate_utf8("═══", 4), "═");
        assert_eq!(truncate_utf8("═══", 6), "══");
        assert_eq!(truncate_utf8("═", 2), "");
    }
}
