//! Agent Core error types.
//!
//! [`DispatchError`] is per action and always ends up inside that action's
//! result payload. [`AgentError`] is per request.

use thiserror::Error;

use crate::inference::InferenceError;
use crate::store::StoreError;

/// Errors raised while resolving, validating, or executing one action.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DispatchError {
    /// The model named an action outside the catalog.
    #[error("Unknown function: {name}")]
    UnknownAction { name: String },

    /// Arguments were missing, mistyped, or out of range.
    #[error("{reason}")]
    ValidationFailed { reason: String },

    /// The referenced entity does not exist for this user.
    #[error("{message}")]
    NotFound { message: String },

    /// A date-like argument could not be resolved.
    #[error("Could not understand the date \"{input}\" for {field}")]
    UnparseableDate { field: String, input: String },

    /// The data store rejected or failed the operation.
    #[error("Database error: {reason}")]
    StoreFailure { reason: String },

    /// The request deadline expired before the action ran.
    #[error("Skipped: the request ran out of time before this action started")]
    DeadlineExceeded,
}

impl DispatchError {
    pub fn validation(reason: impl Into<String>) -> Self {
        DispatchError::ValidationFailed {
            reason: reason.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        DispatchError::NotFound {
            message: message.into(),
        }
    }

    /// Stable machine-readable tag, included in the result payload.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::UnknownAction { .. } => "unknown_action",
            DispatchError::ValidationFailed { .. } => "validation_failed",
            DispatchError::NotFound { .. } => "not_found",
            DispatchError::UnparseableDate { .. } => "unparseable_date",
            DispatchError::StoreFailure { .. } => "store_failure",
            DispatchError::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

impl From<StoreError> for DispatchError {
    fn from(e: StoreError) -> Self {
        DispatchError::StoreFailure {
            reason: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(e: serde_json::Error) -> Self {
        DispatchError::ValidationFailed {
            reason: format!("invalid arguments: {e}"),
        }
    }
}

/// Errors that end or reshape a whole chat request.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The caller's credential is missing or was rejected.
    #[error("Authentication required - please log in to the app")]
    AuthenticationRequired,

    /// The request carried no message text.
    #[error("No message provided")]
    MissingMessage,

    /// The model endpoint failed or returned garbage.
    #[error("model service failure: {reason}")]
    ModelServiceFailure { reason: String },

    /// The synthesized reply was empty or punctuation only. Always recovered
    /// by the fallback reply; never returned to the client.
    #[error("degenerate reply: {reply:?}")]
    DegenerateReply { reply: String },

    /// The request deadline expired during the named phase.
    #[error("request deadline exceeded during {phase}")]
    DeadlineExceeded { phase: String },
}

impl From<InferenceError> for AgentError {
    fn from(e: InferenceError) -> Self {
        AgentError::ModelServiceFailure {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_becomes_store_failure() {
        let err: DispatchError = StoreError::Http {
            status: 500,
            body: "boom".into(),
        }
        .into();
        assert_eq!(err.kind(), "store_failure");
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_error_messages_are_user_facing() {
        assert_eq!(
            DispatchError::UnknownAction {
                name: "fly_to_moon".into()
            }
            .to_string(),
            "Unknown function: fly_to_moon"
        );
        assert_eq!(
            DispatchError::not_found("No shift found for 2026-01-10").to_string(),
            "No shift found for 2026-01-10"
        );
        assert_eq!(
            AgentError::AuthenticationRequired.to_string(),
            "Authentication required - please log in to the app"
        );
    }
}
