//! Agent identity and definition types.
//!
//! The set of agents is closed: every handler the router can activate is a
//! variant of [`AgentId`]. Behaviour is resolved by looking the id up in the
//! agent registry, never through trait objects keyed by name.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{context::IssueType, tool::ToolId};

/// Identifier of one of the fixed request handlers.
///
/// Serialized in lowercase (`"triage"`, `"billing"`, ...) so that agent
/// configuration files and audit records stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    Triage,
    Billing,
    Technical,
    General,
}

impl AgentId {
    /// Every agent id, Triage first.
    pub const ALL: [AgentId; 4] = [
        AgentId::Triage,
        AgentId::Billing,
        AgentId::Technical,
        AgentId::General,
    ];

    /// The three specialist handlers Triage may route to.
    pub const SPECIALISTS: [AgentId; 3] = [AgentId::Billing, AgentId::Technical, AgentId::General];

    /// Stable lowercase name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::Triage => "triage",
            AgentId::Billing => "billing",
            AgentId::Technical => "technical",
            AgentId::General => "general",
        }
    }

    /// Name shown to the user in front of each agent turn.
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentId::Triage => "Triage Agent",
            AgentId::Billing => "Billing Agent",
            AgentId::Technical => "Technical Agent",
            AgentId::General => "General Agent",
        }
    }

    pub fn is_specialist(&self) -> bool {
        !matches!(self, AgentId::Triage)
    }

    /// The specialist that owns `issue_type`. Unclassified issues stay with
    /// Triage.
    pub fn for_issue(issue_type: IssueType) -> Self {
        match issue_type {
            IssueType::Billing => AgentId::Billing,
            IssueType::Technical => AgentId::Technical,
            IssueType::General => AgentId::General,
            IssueType::Unclassified => AgentId::Triage,
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique identifier for one conversation.
///
/// Appears in every log line and audit record produced while the session
/// is open.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub uuid::Uuid);

impl SessionId {
    /// Create a new, unique session ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Static description of one agent, loaded once at startup.
///
/// `allowed_tools` is the upper bound on what the agent may ever invoke; the
/// tool gate narrows it further per turn. `handoff_targets` lists the only
/// agents this one may transfer the conversation to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub id: AgentId,
    pub role_prompt: String,
    #[serde(default)]
    pub allowed_tools: BTreeSet<ToolId>,
    #[serde(default)]
    pub handoff_targets: BTreeSet<AgentId>,
}

impl AgentDefinition {
    pub fn may_hand_off_to(&self, target: AgentId) -> bool {
        self.handoff_targets.contains(&target)
    }
}
