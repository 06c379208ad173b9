//! Agent Core: the conversation layer of the Biz service.
//!
//! Submodules:
//! - `catalog`: The closed action enumeration and the versioned tool schemas
//! - `actions`: Typed, validated arguments for every action
//! - `dates`: Natural-language date resolution against a reference day
//! - `router`: Dispatches model tool calls to the domain executors
//! - `context`: Bounded snapshot of the caller's data for the system prompt
//! - `prompt`: System prompt text for both model passes
//! - `reply`: Reply validation and the deterministic fallback
//! - `tokens`: Token estimation for request logging
//! - `orchestrator`: Two-pass pipeline: select actions, execute, synthesize
//! - `types`: Action outcomes and the HTTP envelope
//! - `errors`: Dispatch- and request-level error types

pub mod actions;
pub mod catalog;
pub mod context;
pub mod dates;
pub mod errors;
pub mod orchestrator;
pub mod prompt;
pub mod reply;
pub mod router;
pub mod tokens;
pub mod types;

// Re-exports for convenience
pub use catalog::{ActionName, CATALOG_VERSION};
pub use errors::{AgentError, DispatchError};
pub use orchestrator::{ChatTurn, Orchestrator, OrchestratorConfig};
pub use router::FunctionRouter;
pub use types::{ActionOutcome, ActionResult, ChatRequest, ChatResponse, HistoryTurn};
