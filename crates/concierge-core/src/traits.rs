//! Core trait definitions for the Concierge turn pipeline.
//!
//! These traits define the collaborator boundary:
//!
//! - `CompletionProvider`: untrusted logic (normally backed by an LLM)
//! - `ToolExecutor`:       untrusted side effects (tickets, refunds, restarts)
//! - `Guardrail`:          trusted gate on inbound and outbound text
//! - `Verifier`:           trusted checker for tool arguments
//! - `AuditWriter`:        trusted sink for every orchestrator decision
//!
//! The orchestrator wires them together. A completion is never requested
//! for text the guardrail blocked, and a tool is never executed unless the
//! tool gate granted it and the verifier passed its arguments.

use concierge_contracts::{
    agent::SessionId,
    completion::{Completion, CompletionRequest},
    error::ConciergeResult,
    execution::TurnRecord,
    guardrail::{Direction, GuardrailResult},
    tool::{ToolError, ToolId, ToolInvocationRequest, ToolOutput, ToolSpec},
    verify::VerificationReport,
};

use crate::session::Context;

/// The opaque completion capability.
///
/// Implementations are **untrusted**. They receive the active agent's role
/// prompt, guarded history and the gated tool list, and answer with text, a
/// handoff request, a tool call, or some combination the orchestrator
/// resolves. Any `Err` is treated as `CompletionUnavailable` and retried.
pub trait CompletionProvider: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> ConciergeResult<Completion>;
}

/// The tool execution capability.
///
/// Only called with tools the gate granted and arguments the verifier
/// passed. Implementations read the context but never mutate it; requested
/// changes come back as `ToolOutput::updates`.
pub trait ToolExecutor: Send + Sync {
    fn execute(
        &self,
        tool: &ToolId,
        args: &serde_json::Value,
        context: &Context,
    ) -> Result<ToolOutput, ToolError>;
}

/// The guardrail: a deterministic text policy applied in both directions.
///
/// Implementations are **trusted** and must be pure functions of their
/// inputs and static configuration.
pub trait Guardrail: Send + Sync {
    /// Check `text` flowing in `direction` for the session in `context`.
    fn check(&self, text: &str, direction: Direction, context: &Context) -> GuardrailResult;

    /// The fixed message shown in place of blocked text.
    fn refusal_message(&self) -> &str;
}

/// The tool argument verifier.
pub trait Verifier: Send + Sync {
    /// Verify `invocation` against the static `spec` of the tool it names.
    ///
    /// Return `passed = false` with populated `failures` when any check
    /// fails. `Err` is reserved for a verifier that cannot run at all, e.g.
    /// an uncompilable schema.
    fn verify(
        &self,
        invocation: &ToolInvocationRequest,
        spec: &ToolSpec,
    ) -> ConciergeResult<VerificationReport>;
}

/// The audit writer: the append-only decision record.
///
/// A failed write aborts the turn with `ConciergeError::AuditWriteFailed`;
/// the context is left as it was before the turn started.
pub trait AuditWriter: Send + Sync {
    /// Append one decision record.
    fn write(&self, record: &TurnRecord) -> ConciergeResult<()>;

    /// Mark a session as complete. Called once when the session closes.
    fn finalize(&self, session_id: &SessionId) -> ConciergeResult<()>;
}
