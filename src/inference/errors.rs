//! Model endpoint errors. The orchestrator turns these into
//! `AgentError::ModelServiceFailure` on the first pass and into the
//! fallback reply on the second.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InferenceError {
    /// TCP/HTTP connection to the model endpoint failed.
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// The model endpoint did not respond within the configured timeout.
    #[error("inference timeout after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Non-2xx HTTP response from the model endpoint.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body was not a valid completion.
    #[error("response parse error: {reason}")]
    ResponseParse { reason: String },

    /// Client construction failed.
    #[error("config error: {reason}")]
    ConfigError { reason: String },
}

impl InferenceError {
    /// Whether the request may succeed if sent again: connect failures,
    /// timeouts, rate limiting and gateway errors.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            InferenceError::ConnectionFailed { .. }
                | InferenceError::Timeout { .. }
                | InferenceError::HttpError {
                    status: 429 | 500 | 502..=504,
                    ..
                }
        )
    }
}
