//! Request and result types for the opaque completion capability.
//!
//! The orchestrator builds a [`CompletionRequest`] for the active agent and
//! receives a [`Completion`]. A completion may carry reply text, a handoff
//! request and a tool call all at once; [`Completion::into_action`] resolves
//! which one the orchestrator acts on.

use serde::{Deserialize, Serialize};

use crate::{
    agent::AgentId,
    context::{ContextSnapshot, IssueType, Speaker, Turn},
    tool::{ToolId, ToolInvocationRequest, ToolSpec},
};

/// A request from the active agent to transfer the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffRequest {
    pub target: AgentId,
    /// Issue classification chosen by Triage. When absent, the orchestrator
    /// derives it from `target`.
    #[serde(default)]
    pub classification: Option<IssueType>,
}

/// Raw result of one completion call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub handoff: Option<HandoffRequest>,
    #[serde(default)]
    pub tool_call: Option<ToolInvocationRequest>,
}

impl Completion {
    /// A plain text reply.
    pub fn reply(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Self::default() }
    }

    /// A handoff to `target` with no classification and no announcement.
    pub fn handoff(target: AgentId) -> Self {
        Self {
            handoff: Some(HandoffRequest { target, classification: None }),
            ..Self::default()
        }
    }

    /// A handoff carrying Triage's issue classification.
    pub fn classified_handoff(target: AgentId, classification: IssueType) -> Self {
        Self {
            handoff: Some(HandoffRequest { target, classification: Some(classification) }),
            ..Self::default()
        }
    }

    /// A request to run `tool` with `args`.
    pub fn tool_call(tool: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            tool_call: Some(ToolInvocationRequest { tool: ToolId::new(tool), args }),
            ..Self::default()
        }
    }

    /// Attach text to any completion. Alongside a handoff the text is the
    /// outgoing agent's announcement.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Decide what the orchestrator should do with this completion.
    ///
    /// Precedence: handoff, then tool call, then reply. A tool call that
    /// arrives together with a handoff is dropped, since only the agent that
    /// owns the follow-up may run tools.
    pub fn into_action(self) -> CompletionAction {
        if let Some(request) = self.handoff {
            return CompletionAction::Handoff { request, announcement: self.text };
        }
        if let Some(call) = self.tool_call {
            return CompletionAction::Invoke(call);
        }
        match self.text {
            Some(text) if !text.trim().is_empty() => CompletionAction::Reply(text),
            _ => CompletionAction::Empty,
        }
    }
}

/// The single action a completion resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionAction {
    Reply(String),
    Handoff {
        request: HandoffRequest,
        announcement: Option<String>,
    },
    Invoke(ToolInvocationRequest),
    /// Nothing usable was returned.
    Empty,
}

/// Why the agent is being prompted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PromptPurpose {
    /// Answer the latest user turn.
    Respond,
    /// The agent just received the conversation from `from` and should
    /// acknowledge it.
    Acknowledge { from: AgentId },
}

/// Information fed back to the agent within the same user turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feedback {
    ToolResult { tool: ToolId, output: serde_json::Value },
    ToolError { tool: ToolId, message: String },
    /// The requested tool is not available to this agent right now.
    ToolNotGranted { tool: ToolId },
    /// The requested handoff target is not permitted from this agent.
    HandoffRejected { target: AgentId },
    /// The previous completion contained nothing actionable.
    EmptyCompletion,
}

/// One history entry as the completion capability sees it: guarded text only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub speaker: Speaker,
    pub agent_id: Option<AgentId>,
    pub text: String,
}

impl From<&Turn> for HistoryMessage {
    fn from(turn: &Turn) -> Self {
        Self {
            speaker: turn.speaker,
            agent_id: turn.agent_id,
            text: turn.guarded_text.clone(),
        }
    }
}

/// Everything the completion capability receives for one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub agent: AgentId,
    pub role_prompt: String,
    pub context: ContextSnapshot,
    /// Guarded history only; raw text never leaves the session.
    pub history: Vec<HistoryMessage>,
    pub allowed_tools: Vec<ToolSpec>,
    pub purpose: PromptPurpose,
    pub feedback: Vec<Feedback>,
}

impl CompletionRequest {
    /// Guarded text of the most recent user turn, if any.
    pub fn latest_user_text(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|m| m.speaker == Speaker::User)
            .map(|m| m.text.as_str())
    }

    pub fn offers_tool(&self, tool: &str) -> bool {
        self.allowed_tools.iter().any(|t| t.id.as_str() == tool)
    }
}
