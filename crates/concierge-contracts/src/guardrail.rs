//! Guardrail check types.
//!
//! A guardrail check never fails: it either lets text through (possibly
//! redacted) or blocks it with a reason that is written to logs and the
//! audit trail but never shown to the user.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which way the checked text is flowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// User text, before any agent sees it.
    Inbound,
    /// Agent text, before the user sees it.
    Outbound,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Inbound, Direction::Outbound];
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => f.write_str("inbound"),
            Direction::Outbound => f.write_str("outbound"),
        }
    }
}

/// Why a piece of text was blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockReason {
    /// A forbidden term appeared as a whole word. Never waivable.
    ForbiddenTerm { term: String },
    /// A phrase associated with a forbidden intent appeared.
    ForbiddenIntent { intent: String },
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::ForbiddenTerm { term } => write!(f, "forbidden term '{term}'"),
            BlockReason::ForbiddenIntent { intent } => write!(f, "forbidden intent '{intent}'"),
        }
    }
}

/// Outcome of a guardrail check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardrailResult {
    /// The text may pass. Outbound text may have been redacted.
    Allowed { text: String },
    /// The text must not be forwarded or shown.
    Blocked { reason: BlockReason },
}

impl GuardrailResult {
    pub fn is_blocked(&self) -> bool {
        matches!(self, GuardrailResult::Blocked { .. })
    }
}
