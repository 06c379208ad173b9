//! Inference Client: OpenAI-compatible API client for the tool-calling model.
//!
//! This module handles all communication with the model endpoint:
//! - Non-streaming chat completions with bounded retry
//! - Response parsing (text + native JSON tool calls)
//! - The [`ModelService`] seam the orchestrator is written against
//!
//! The client speaks the OpenAI Chat Completions API, so switching model
//! vendors is a config change, not a code change.

pub mod client;
pub mod errors;
pub mod response;
pub mod types;

// Re-exports for convenience
pub use client::{InferenceClient, ModelService};
pub use errors::InferenceError;
pub use types::{ChatMessage, ModelReply, Role, SamplingOverrides, ToolCall, ToolDefinition};
