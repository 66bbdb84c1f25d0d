//! The context store: per-session conversation state.
//!
//! A `Context` is created once per session, owned exclusively by whoever
//! drives that session, and mutated only through the checked operations
//! below. Fields are private so the invariants hold for every caller:
//!
//! - `active_agent` always names a registered agent
//! - `issue_type` changes only while Triage is active
//! - no specialist becomes active while the issue is unclassified
//! - `history` is append-only
//!
//! `Context` itself is not serializable: its history carries the raw text
//! of blocked turns. `Context::view` is the form that may be shown.

use serde::Serialize;
use tracing::debug;

use concierge_contracts::{
    agent::{AgentId, SessionId},
    completion::{Feedback, HistoryMessage},
    context::{ContextSnapshot, IssueType, SessionStatus, Turn},
    error::{ConciergeError, ConciergeResult},
    tool::{ContextUpdate, ToolInvocationRequest},
};

use crate::registry::AgentRegistry;

/// Structured state for one conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    session_id: SessionId,
    user_name: String,
    email: Option<String>,
    is_premium: bool,
    issue_type: IssueType,
    history: Vec<Turn>,
    active_agent: AgentId,
    last_ticket_id: Option<String>,
    status: SessionStatus,
    /// Number of user turns processed so far.
    turn: u64,
    /// Tools already run for an input whose turn was abandoned.
    tool_ledger: Option<ToolLedger>,
}

/// What a session may show its user: guarded history only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextView {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub context: ContextSnapshot,
    pub status: SessionStatus,
    pub turn: u64,
    pub history: Vec<HistoryMessage>,
}

/// One tool call that ran, with the feedback and updates it produced.
#[derive(Debug, Clone, PartialEq)]
struct ExecutedTool {
    call: ToolInvocationRequest,
    feedback: Feedback,
    updates: Vec<ContextUpdate>,
}

/// Tool calls made while answering `input`.
///
/// Survives an abandoned turn so that retrying the same input reuses the
/// results instead of running the tools again.
#[derive(Debug, Clone, PartialEq)]
struct ToolLedger {
    input: String,
    /// Ran during an earlier attempt and not yet requested again.
    pending: Vec<ExecutedTool>,
    /// Ran or replayed during the current attempt.
    executed: Vec<ExecutedTool>,
}

/// Start a new session: Triage active, issue unclassified, empty history.
pub fn create_session(user_name: impl Into<String>, is_premium: bool) -> Context {
    let context = Context {
        session_id: SessionId::new(),
        user_name: user_name.into().trim().to_string(),
        email: None,
        is_premium,
        issue_type: IssueType::Unclassified,
        history: Vec::new(),
        active_agent: AgentId::Triage,
        last_ticket_id: None,
        status: SessionStatus::Open,
        turn: 0,
        tool_ledger: None,
    };
    debug!(
        session_id = %context.session_id,
        is_premium,
        "session created"
    );
    context
}

impl Context {
    /// Attach the user's email address at session start.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        let email = email.into().trim().to_string();
        self.email = (!email.is_empty()).then_some(email);
        self
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn is_premium(&self) -> bool {
        self.is_premium
    }

    pub fn issue_type(&self) -> IssueType {
        self.issue_type
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn active_agent(&self) -> AgentId {
        self.active_agent
    }

    pub fn last_ticket_id(&self) -> Option<&str> {
        self.last_ticket_id.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_closed(&self) -> bool {
        self.status == SessionStatus::Closed
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// The read-only view handed to the completion capability.
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            user_name: self.user_name.clone(),
            email: self.email.clone(),
            is_premium: self.is_premium,
            issue_type: self.issue_type,
            active_agent: self.active_agent,
            last_ticket_id: self.last_ticket_id.clone(),
        }
    }

    /// Serializable view for display. Raw text never appears in it.
    pub fn view(&self) -> ContextView {
        ContextView {
            session_id: self.session_id.clone(),
            context: self.snapshot(),
            status: self.status,
            turn: self.turn,
            history: self.history.iter().map(HistoryMessage::from).collect(),
        }
    }

    // ── Checked mutations ────────────────────────────────────────────────────

    /// Append `turn` to the history. Existing turns are never touched.
    pub fn append_turn(&mut self, turn: Turn) {
        self.history.push(turn);
    }

    /// Record the issue classification.
    ///
    /// Only Triage classifies; any other active agent yields
    /// `InvalidTransition`.
    pub fn set_issue_type(&mut self, issue_type: IssueType) -> ConciergeResult<()> {
        if self.active_agent != AgentId::Triage {
            return Err(ConciergeError::InvalidTransition {
                reason: format!(
                    "issue type can only be set while triage is active (active agent is '{}')",
                    self.active_agent
                ),
            });
        }
        self.issue_type = issue_type;
        Ok(())
    }

    /// Make `agent_id` the active agent.
    ///
    /// Fails with `UnknownAgent` if the registry does not contain it, and
    /// with `InvalidTransition` if a specialist would become active before
    /// Triage classified the issue.
    pub fn set_active_agent(
        &mut self,
        registry: &AgentRegistry,
        agent_id: AgentId,
    ) -> ConciergeResult<()> {
        if !registry.contains(agent_id) {
            return Err(ConciergeError::UnknownAgent { agent: agent_id });
        }
        if agent_id.is_specialist() && self.issue_type == IssueType::Unclassified {
            return Err(ConciergeError::InvalidTransition {
                reason: format!("'{agent_id}' cannot become active before the issue is classified"),
            });
        }
        self.active_agent = agent_id;
        Ok(())
    }

    /// Apply a change requested by a tool.
    pub(crate) fn apply_update(&mut self, update: &ContextUpdate) {
        match update {
            ContextUpdate::RecordTicket { ticket_id } => {
                self.last_ticket_id = Some(ticket_id.clone());
            }
        }
    }

    pub(crate) fn advance_turn(&mut self) {
        self.turn += 1;
    }

    pub(crate) fn close(&mut self) {
        self.status = SessionStatus::Closed;
    }

    // ── Tool ledger ──────────────────────────────────────────────────────────

    /// Start answering `input`. Tool results from an abandoned attempt at
    /// the same input stay available for replay; any other input drops them.
    pub(crate) fn begin_input(&mut self, input: &str) {
        match self.tool_ledger.take() {
            Some(mut ledger) if ledger.input == input => {
                let mut pending = std::mem::take(&mut ledger.executed);
                pending.append(&mut ledger.pending);
                ledger.pending = pending;
                self.tool_ledger = Some(ledger);
            }
            _ => {
                self.tool_ledger = Some(ToolLedger {
                    input: input.to_string(),
                    pending: Vec::new(),
                    executed: Vec::new(),
                });
            }
        }
    }

    /// Feedback for `call` if an abandoned attempt already ran it.
    ///
    /// Each earlier execution is replayed at most once.
    pub(crate) fn replay_tool(&mut self, call: &ToolInvocationRequest) -> Option<Feedback> {
        let ledger = self.tool_ledger.as_mut()?;
        let index = ledger.pending.iter().position(|done| done.call == *call)?;
        let done = ledger.pending.remove(index);
        let feedback = done.feedback.clone();
        ledger.executed.push(done);
        Some(feedback)
    }

    /// Note a tool execution so an abandoned turn can keep its effects.
    pub(crate) fn remember_tool(
        &mut self,
        call: &ToolInvocationRequest,
        feedback: &Feedback,
        updates: &[ContextUpdate],
    ) {
        if let Some(ledger) = self.tool_ledger.as_mut() {
            ledger.executed.push(ExecutedTool {
                call: call.clone(),
                feedback: feedback.clone(),
                updates: updates.to_vec(),
            });
        }
    }

    /// The input was answered; nothing is left to replay.
    pub(crate) fn finish_input(&mut self) {
        self.tool_ledger = None;
    }

    /// Take the tool effects of an abandoned `draft` without the rest of it.
    pub(crate) fn keep_tool_effects(&mut self, draft: &Context) {
        let Some(ledger) = &draft.tool_ledger else { return };
        if ledger.executed.is_empty() && ledger.pending.is_empty() {
            return;
        }
        for done in &ledger.executed {
            for update in &done.updates {
                self.apply_update(update);
            }
        }
        self.tool_ledger = Some(ledger.clone());
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use concierge_contracts::{
        agent::AgentId,
        completion::Feedback,
        context::{IssueType, SessionStatus, Speaker, Turn},
        error::ConciergeError,
        tool::{ContextUpdate, ToolId, ToolInvocationRequest},
    };

    use super::create_session;
    use crate::registry::{tests::registry_toml, AgentRegistry};

    fn registry() -> AgentRegistry {
        AgentRegistry::from_toml_str(&registry_toml()).unwrap()
    }

    #[test]
    fn new_session_starts_in_triage_unclassified() {
        let ctx = create_session("  Noor ", true);

        assert_eq!(ctx.user_name(), "Noor");
        assert!(ctx.is_premium());
        assert_eq!(ctx.active_agent(), AgentId::Triage);
        assert_eq!(ctx.issue_type(), IssueType::Unclassified);
        assert_eq!(ctx.status(), SessionStatus::Open);
        assert!(ctx.history().is_empty());
        assert_eq!(ctx.turn(), 0);
    }

    #[test]
    fn append_turn_preserves_order() {
        let mut ctx = create_session("Noor", false);
        ctx.append_turn(Turn::user("first", "first"));
        ctx.append_turn(Turn::agent(AgentId::Triage, "second", "second"));
        ctx.append_turn(Turn::user("third", "third"));

        let texts: Vec<&str> = ctx.history().iter().map(|t| t.raw_text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
        assert_eq!(ctx.history()[1].speaker, Speaker::Agent);
    }

    #[test]
    fn issue_type_only_settable_from_triage() {
        let registry = registry();
        let mut ctx = create_session("Noor", false);

        ctx.set_issue_type(IssueType::Billing).unwrap();
        ctx.set_active_agent(&registry, AgentId::Billing).unwrap();

        match ctx.set_issue_type(IssueType::Technical) {
            Err(ConciergeError::InvalidTransition { reason }) => {
                assert!(reason.contains("billing"), "reason should name the active agent: {reason}");
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
        assert_eq!(ctx.issue_type(), IssueType::Billing);
    }

    #[test]
    fn specialist_requires_classification() {
        let registry = registry();
        let mut ctx = create_session("Noor", false);

        let result = ctx.set_active_agent(&registry, AgentId::Technical);
        assert!(matches!(result, Err(ConciergeError::InvalidTransition { .. })));
        assert_eq!(ctx.active_agent(), AgentId::Triage);
    }

    #[test]
    fn unregistered_agent_is_rejected() {
        let mut ctx = create_session("Noor", false);
        ctx.set_issue_type(IssueType::General).unwrap();

        match ctx.set_active_agent(&AgentRegistry::empty(), AgentId::General) {
            Err(ConciergeError::UnknownAgent { agent }) => assert_eq!(agent, AgentId::General),
            other => panic!("expected UnknownAgent, got {:?}", other),
        }
        assert_eq!(ctx.active_agent(), AgentId::Triage);
    }

    #[test]
    fn ticket_update_is_recorded() {
        let mut ctx = create_session("Noor", false);
        ctx.apply_update(&ContextUpdate::RecordTicket { ticket_id: "t-42".to_string() });
        assert_eq!(ctx.last_ticket_id(), Some("t-42"));
        assert_eq!(ctx.snapshot().last_ticket_id.as_deref(), Some("t-42"));
    }

    #[test]
    fn view_shows_only_guarded_text() {
        let mut ctx = create_session("Noor", false);
        ctx.append_turn(Turn::user("my pin is zebra", "my pin is [redacted]"));
        ctx.append_turn(Turn::agent(AgentId::Triage, "try the hack", "I can't help with that."));

        let view = ctx.view();
        assert_eq!(view.history.len(), 2);
        assert_eq!(view.history[1].text, "I can't help with that.");

        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("zebra"), "raw user text leaked: {json}");
        assert!(!json.contains("hack"), "raw agent text leaked: {json}");
        assert!(json.contains("\"user_name\":\"Noor\""));
    }

    fn ticket_call() -> ToolInvocationRequest {
        ToolInvocationRequest {
            tool: ToolId::new("create_ticket"),
            args: json!({"title": "x"}),
        }
    }

    fn ticket_feedback() -> Feedback {
        Feedback::ToolResult { tool: ToolId::new("create_ticket"), output: json!({"ticket_id": "t-1"}) }
    }

    #[test]
    fn abandoned_tool_effects_are_kept_and_replayed_once() {
        let mut ctx = create_session("Noor", false);
        let updates = [ContextUpdate::RecordTicket { ticket_id: "t-1".to_string() }];

        let mut draft = ctx.clone();
        draft.begin_input("open a ticket");
        draft.remember_tool(&ticket_call(), &ticket_feedback(), &updates);
        ctx.keep_tool_effects(&draft);
        assert_eq!(ctx.last_ticket_id(), Some("t-1"));
        assert!(ctx.history().is_empty());

        let mut retry = ctx.clone();
        retry.begin_input("open a ticket");
        assert_eq!(retry.replay_tool(&ticket_call()), Some(ticket_feedback()));
        assert_eq!(retry.replay_tool(&ticket_call()), None);
    }

    #[test]
    fn different_input_drops_ledger() {
        let mut ctx = create_session("Noor", false);
        let mut draft = ctx.clone();
        draft.begin_input("open a ticket");
        draft.remember_tool(&ticket_call(), &ticket_feedback(), &[]);
        ctx.keep_tool_effects(&draft);

        let mut next = ctx.clone();
        next.begin_input("something else");
        assert_eq!(next.replay_tool(&ticket_call()), None);

        let mut answered = ctx.clone();
        answered.finish_input();
        answered.begin_input("open a ticket");
        assert_eq!(answered.replay_tool(&ticket_call()), None);
    }

    #[test]
    fn blank_email_is_ignored() {
        let ctx = create_session("Noor", false).with_email("   ");
        assert_eq!(ctx.email(), None);
        let ctx = create_session("Noor", false).with_email("noor@pro.example");
        assert_eq!(ctx.email(), Some("noor@pro.example"));
    }
}
