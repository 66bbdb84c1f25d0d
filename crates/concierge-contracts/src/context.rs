//! Conversation data: issue classification, turns, and the read-only
//! context snapshot handed to the completion capability.
//!
//! The mutable session state itself lives in `concierge-core`, which is the
//! only crate allowed to change it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;

/// How Triage classified the user's issue.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Billing,
    Technical,
    General,
    #[default]
    Unclassified,
}

impl IssueType {
    /// The issue type implied by routing to `agent`.
    ///
    /// Triage owns no issue domain and maps to `Unclassified`.
    pub fn for_agent(agent: AgentId) -> Self {
        match agent {
            AgentId::Billing => IssueType::Billing,
            AgentId::Technical => IssueType::Technical,
            AgentId::General => IssueType::General,
            AgentId::Triage => IssueType::Unclassified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Billing => "billing",
            IssueType::Technical => "technical",
            IssueType::General => "general",
            IssueType::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Agent,
}

/// One entry in the conversation history.
///
/// `raw_text` is what the speaker produced; `guarded_text` is what survived
/// the guardrail and is the only form ever shown to the user or sent back
/// to the completion capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub agent_id: Option<AgentId>,
    pub raw_text: String,
    pub guarded_text: String,
}

impl Turn {
    pub fn user(raw_text: impl Into<String>, guarded_text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            agent_id: None,
            raw_text: raw_text.into(),
            guarded_text: guarded_text.into(),
        }
    }

    pub fn agent(
        agent_id: AgentId,
        raw_text: impl Into<String>,
        guarded_text: impl Into<String>,
    ) -> Self {
        Self {
            speaker: Speaker::Agent,
            agent_id: Some(agent_id),
            raw_text: raw_text.into(),
            guarded_text: guarded_text.into(),
        }
    }

    /// Label printed before the turn's text on the console.
    pub fn label(&self) -> &'static str {
        match (self.speaker, self.agent_id) {
            (Speaker::Agent, Some(agent)) => agent.display_name(),
            (Speaker::Agent, None) => "Agent",
            (Speaker::User, _) => "You",
        }
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label(), self.guarded_text)
    }
}

/// Lifecycle of a session. `Closed` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Open,
    Closed,
}

/// The session facts an agent may see when it is prompted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub user_name: String,
    pub email: Option<String>,
    pub is_premium: bool,
    pub issue_type: IssueType,
    pub active_agent: AgentId,
    pub last_ticket_id: Option<String>,
}
