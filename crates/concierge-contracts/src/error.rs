//! Runtime error types for the Concierge router.
//!
//! All fallible operations return `ConciergeResult<T>`. Guardrail blocks are
//! not errors; they are reported through `GuardrailResult::Blocked`.

use thiserror::Error;

use crate::{agent::AgentId, tool::ToolId};

/// The unified error type for the Concierge crates.
#[derive(Debug, Error)]
pub enum ConciergeError {
    /// An illegal handoff target or an out-of-order context mutation.
    #[error("invalid transition: {reason}")]
    InvalidTransition { reason: String },

    /// An agent id that is not in the registry.
    #[error("unknown agent '{agent}'")]
    UnknownAgent { agent: AgentId },

    /// The agent asked for a tool the gate did not grant this turn.
    #[error("tool '{tool}' is not granted to agent '{agent}'")]
    UngrantedToolRequest { tool: ToolId, agent: AgentId },

    /// The completion capability failed or timed out.
    #[error("completion unavailable: {reason}")]
    CompletionUnavailable { reason: String },

    /// A tool execution failed.
    #[error("tool '{tool}' failed: {reason}")]
    ToolFailed { tool: ToolId, reason: String },

    /// The audit writer could not persist a record.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A JSON Schema could not be compiled or applied.
    #[error("schema validation error: {reason}")]
    SchemaValidation { reason: String },
}

/// Convenience alias used throughout the Concierge crates.
pub type ConciergeResult<T> = Result<T, ConciergeError>;
