//! Tool identifiers, static tool specifications, and invocation values.
//!
//! Tools are the side-effecting capabilities an agent can ask for: creating
//! tickets, issuing refunds, restarting services. Whether a tool is usable on
//! a given turn depends on both the agent's static grant and the tool's
//! `ToolEligibility` evaluated against the session state.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::IssueType;

/// Name of a tool, e.g. `"create_ticket"` or `"refund"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolId(pub String);

impl ToolId {
    /// Construct a tool id from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Context conditions under which a tool may be offered to an agent.
///
/// An empty `issue_types` set means "any issue type".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolEligibility {
    #[serde(default)]
    pub requires_premium: bool,
    #[serde(default)]
    pub issue_types: BTreeSet<IssueType>,
}

impl ToolEligibility {
    /// Return true if a session with the given premium flag and issue type
    /// may use the tool.
    pub fn admits(&self, is_premium: bool, issue_type: IssueType) -> bool {
        if self.requires_premium && !is_premium {
            return false;
        }
        self.issue_types.is_empty() || self.issue_types.contains(&issue_type)
    }
}

/// Static description of one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub id: ToolId,
    pub description: String,
    /// JSON Schema the invocation arguments must satisfy. `Null` disables
    /// structural checking.
    #[serde(default)]
    pub args_schema: serde_json::Value,
    #[serde(default)]
    pub eligibility: ToolEligibility,
}

/// A request, produced by one completion call, to run a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationRequest {
    pub tool: ToolId,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// A change to session state requested by a tool.
///
/// Tools never touch the context directly; the orchestrator applies these
/// after the tool returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContextUpdate {
    /// Remember the most recently created ticket.
    RecordTicket { ticket_id: String },
}

/// Successful result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub payload: serde_json::Value,
    #[serde(default)]
    pub updates: Vec<ContextUpdate>,
}

impl ToolOutput {
    pub fn new(payload: serde_json::Value) -> Self {
        Self { payload, updates: Vec::new() }
    }

    pub fn with_update(mut self, update: ContextUpdate) -> Self {
        self.updates.push(update);
        self
    }
}

/// Failure reported by the tool execution collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ToolError {
    pub message: String,
}

impl ToolError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
