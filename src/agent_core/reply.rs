//! Reply validation and the deterministic fallback reply.
//!
//! The synthesis call sometimes returns nothing usable: an empty string, a
//! lone "✅", or a sentence cut off after a few characters. Those replies are
//! rejected and rebuilt from the action results, so the user always gets a
//! complete sentence.

use super::errors::AgentError;
use super::types::{ActionOutcome, ActionResult};

/// Replies shorter than this (after trimming) are rejected.
const MIN_REPLY_CHARS: usize = 10;

const GENERIC_CLOSING: &str = "Action completed. Anything else?";

/// Ok with the trimmed reply, or [`AgentError::DegenerateReply`].
pub fn validate_reply(reply: Option<&str>) -> Result<String, AgentError> {
    let raw = reply.unwrap_or_default();
    let trimmed = raw.trim();
    if trimmed.chars().count() < MIN_REPLY_CHARS || !trimmed.chars().any(char::is_alphanumeric) {
        return Err(AgentError::DegenerateReply {
            reply: raw.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn spaced(name: &str) -> String {
    name.replace('_', " ")
}

/// One line per action: confirmation prompts first, then each action's own
/// message or a generic success line, then failures.
pub fn fallback_reply(results: &[ActionResult]) -> String {
    let mut confirmations = Vec::new();
    let mut lines = Vec::new();
    for r in results {
        match &r.outcome {
            Ok(ActionOutcome::ConfirmationRequired { message, .. }) => {
                confirmations.push(message.clone());
            }
            Ok(ActionOutcome::Completed { message: Some(m), .. }) if !m.trim().is_empty() => {
                lines.push(m.clone());
            }
            Ok(ActionOutcome::Completed { .. }) => {
                lines.push(format!("✅ {} completed.", spaced(&r.name)));
            }
            Err(e) => lines.push(format!("❌ {}: {e}", spaced(&r.name))),
        }
    }
    confirmations.extend(lines);
    if confirmations.is_empty() {
        GENERIC_CLOSING.to_string()
    } else {
        confirmations.join(" ")
    }
}

/// Append any confirmation prompt the model left out, so a destructive
/// preview is never silently dropped.
pub fn ensure_confirmations(mut reply: String, results: &[ActionResult]) -> String {
    for r in results {
        if let Ok(ActionOutcome::ConfirmationRequired { message, .. }) = &r.outcome {
            if !reply.contains(message.as_str()) {
                reply.push_str("\n\n");
                reply.push_str(message);
            }
        }
    }
    reply
}

/// The reply to send: the model's if it validates, else the fallback.
pub fn finalize_reply(model_reply: Option<&str>, results: &[ActionResult]) -> String {
    match validate_reply(model_reply) {
        Ok(reply) => ensure_confirmations(reply, results),
        Err(e) => {
            tracing::warn!(error = %e, "model reply rejected, using fallback");
            fallback_reply(results)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_core::errors::DispatchError;
    use serde_json::json;

    fn result(name: &str, outcome: Result<ActionOutcome, DispatchError>) -> ActionResult {
        ActionResult {
            name: name.into(),
            call_id: format!("call-{name}"),
            outcome,
        }
    }

    #[test]
    fn test_degenerate_replies_rejected() {
        for reply in [None, Some(""), Some("   "), Some("✅"), Some("Done!"), Some("✅ ✨ !!! ... ⚠️ ❌")] {
            assert!(validate_reply(reply).is_err(), "{reply:?} should be rejected");
        }
        assert_eq!(
            validate_reply(Some("  Added your shift.  ")).unwrap(),
            "Added your shift."
        );
    }

    #[test]
    fn test_fallback_puts_confirmations_first() {
        let results = vec![
            result("add_shift", Ok(ActionOutcome::done("✅ Added shift.", json!({})))),
            result(
                "delete_shift",
                Ok(ActionOutcome::confirm("Are you sure you want to delete it?", json!({}))),
            ),
            result("get_goals", Ok(ActionOutcome::data(json!({})))),
            result("fly", Err(DispatchError::UnknownAction { name: "fly".into() })),
        ];
        assert_eq!(
            fallback_reply(&results),
            "Are you sure you want to delete it? ✅ Added shift. ✅ get goals completed. ❌ fly: Unknown function: fly"
        );
    }

    #[test]
    fn test_fallback_with_no_results() {
        assert_eq!(fallback_reply(&[]), GENERIC_CLOSING);
    }

    #[test]
    fn test_missing_confirmation_is_appended() {
        let results = vec![result(
            "bulk_delete_shifts",
            Ok(ActionOutcome::confirm("Delete 3 shifts? Please confirm.", json!({}))),
        )];
        let reply = finalize_reply(Some("I can take care of that for you."), &results);
        assert!(reply.ends_with("Delete 3 shifts? Please confirm."));

        let already = finalize_reply(Some("Delete 3 shifts? Please confirm."), &results);
        assert_eq!(already, "Delete 3 shifts? Please confirm.");
    }
}
