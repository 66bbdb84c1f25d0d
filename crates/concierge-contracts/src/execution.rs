//! Turn-level results and audit records.
//!
//! `TurnOutcome` is what the orchestrator returns to the caller after each
//! user turn. `TurnRecord` is what gets written to the audit log, one per
//! decision the orchestrator makes while processing that turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    agent::{AgentId, SessionId},
    context::{IssueType, Turn},
    guardrail::BlockReason,
    tool::ToolId,
};

/// A completed transfer of the active-agent role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: AgentId,
    pub to: AgentId,
}

/// The outcome of one user turn.
///
/// Callers print the emitted turns and keep going:
/// - `Responded` → print `turns` in order
/// - `Refused` → print the single refusal turn; nothing else happened
/// - `Unavailable` → print `message`; the context is untouched and the same
///   input can be retried
/// - `Closed` → stop reading input
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The turn ran to completion.
    Responded {
        /// Agent turns emitted during this user turn, in order.
        turns: Vec<Turn>,
        /// Handoffs that took effect during this user turn.
        transfers: Vec<Transfer>,
    },

    /// The inbound guardrail blocked the user's text.
    Refused {
        turn: Turn,
        reason: BlockReason,
    },

    /// The completion capability could not produce a usable answer.
    Unavailable {
        message: String,
    },

    /// The session is closed; no turn was processed.
    Closed,
}

impl TurnOutcome {
    /// Agent turns emitted to the user, empty for `Unavailable` and `Closed`.
    pub fn emitted(&self) -> &[Turn] {
        match self {
            TurnOutcome::Responded { turns, .. } => turns,
            TurnOutcome::Refused { turn, .. } => std::slice::from_ref(turn),
            TurnOutcome::Unavailable { .. } | TurnOutcome::Closed => &[],
        }
    }
}

/// What the orchestrator decided at one point of a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnEvent {
    InboundBlocked { reason: BlockReason },
    OutboundBlocked { reason: BlockReason },
    Replied { guarded_text: String },
    HandedOff { to: AgentId, issue_type: IssueType },
    HandoffRejected { target: AgentId },
    ToolExecuted { tool: ToolId },
    ToolFailed { tool: ToolId, reason: String },
    ToolNotGranted { tool: ToolId },
    CompletionUnavailable { attempts: u32, reason: String },
    StepBudgetExhausted { steps: u32 },
    SessionClosed,
}

/// An immutable record of one orchestrator decision, written to the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub session_id: SessionId,
    /// Zero-based index of the user turn being processed.
    pub turn: u64,
    /// The agent that was active when the decision was made.
    pub agent_id: AgentId,
    pub event: TurnEvent,
    /// Wall-clock time the record was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl TurnRecord {
    pub fn new(session_id: SessionId, turn: u64, agent_id: AgentId, event: TurnEvent) -> Self {
        Self { session_id, turn, agent_id, event, timestamp: Utc::now() }
    }
}
