//! The Concierge orchestrator: the per-turn control loop.
//!
//! Every user turn runs the same pipeline:
//!
//!   Guardrail (in) → Tool Gate → Completion → [Tool | Handoff]* → Guardrail (out) → Commit
//!
//! The turn is computed on a draft copy of the context and committed only
//! when it finishes. A turn abandoned because the completion capability is
//! unavailable commits nothing but the effects of tools that already ran;
//! retrying the same input replays those tool results instead of running
//! the tools again.
//!
//! Invariants enforced here:
//! - no completion is requested for inbound text the guardrail blocked
//! - no tool runs unless the gate granted it and the verifier passed it
//! - the active agent changes only through a handoff its definition permits
//! - errors from the completion and tool collaborators never escape a turn

use std::sync::Arc;

use tracing::{debug, info, warn};

use concierge_contracts::{
    agent::{AgentDefinition, AgentId},
    completion::{
        Completion, CompletionAction, CompletionRequest, Feedback, HandoffRequest,
        HistoryMessage, PromptPurpose,
    },
    context::{IssueType, Turn},
    error::{ConciergeError, ConciergeResult},
    execution::{Transfer, TurnEvent, TurnOutcome, TurnRecord},
    guardrail::{Direction, GuardrailResult},
    tool::ToolInvocationRequest,
    verify::{VerificationFailure, VerificationReport},
};

use crate::{
    config::OrchestratorConfig,
    gate::{allowed_tools, granted_specs},
    registry::AgentRegistry,
    session::{create_session, Context},
    traits::{AuditWriter, CompletionProvider, Guardrail, ToolExecutor, Verifier},
};

/// Drives conversations through the agent registry.
///
/// One orchestrator serves any number of sessions. It holds only read-only
/// configuration and `Send + Sync` collaborators; each session's `Context`
/// is owned by its caller and passed in per turn.
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    guardrail: Box<dyn Guardrail>,
    completion: Box<dyn CompletionProvider>,
    tools: Box<dyn ToolExecutor>,
    verifier: Box<dyn Verifier>,
    audit: Box<dyn AuditWriter>,
    config: OrchestratorConfig,
}

/// How the completion loop for one turn ended.
enum Conversation {
    Finished {
        turns: Vec<Turn>,
        transfers: Vec<Transfer>,
    },
    Abandoned,
}

impl Orchestrator {
    /// Create an orchestrator with the default `OrchestratorConfig`.
    pub fn new(
        registry: Arc<AgentRegistry>,
        guardrail: Box<dyn Guardrail>,
        completion: Box<dyn CompletionProvider>,
        tools: Box<dyn ToolExecutor>,
        verifier: Box<dyn Verifier>,
        audit: Box<dyn AuditWriter>,
    ) -> Self {
        Self {
            registry,
            guardrail,
            completion,
            tools,
            verifier,
            audit,
            config: OrchestratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Open a new session with Triage active.
    pub fn start_session(&self, user_name: &str, is_premium: bool) -> Context {
        let context = create_session(user_name, is_premium);
        info!(
            session_id = %context.session_id(),
            is_premium,
            "session started"
        );
        context
    }

    /// Process one user turn.
    ///
    /// # Pipeline
    ///
    /// 1. Closed session → `TurnOutcome::Closed`; exit command → close, `Closed`
    /// 2. Inbound guardrail: `Blocked` → append the fixed refusal, return
    ///    `Refused` without calling the completion capability
    /// 3. Append the user turn and run the completion loop for the active
    ///    agent, re-prompting after tool results, rejected handoffs and
    ///    ungranted tool requests, and prompting the new agent for an
    ///    acknowledgement after a valid handoff
    /// 4. Outbound guardrail on every agent text; blocked text is replaced
    ///    by the refusal
    /// 5. Commit the draft context and return `Responded`
    ///
    /// If the completion capability stays unavailable, or the step budget
    /// runs out, `Unavailable` is returned. `context` then keeps only the
    /// updates of tools that ran, and a retry of the same input reuses
    /// their results.
    ///
    /// # Errors
    ///
    /// Only audit write failures and registry inconsistencies are returned
    /// as `Err`. Collaborator failures are handled inside the turn.
    pub fn run_turn(&self, context: &mut Context, input: &str) -> ConciergeResult<TurnOutcome> {
        if context.is_closed() {
            debug!(session_id = %context.session_id(), "input ignored, session is closed");
            return Ok(TurnOutcome::Closed);
        }
        if self.config.is_exit_command(input) {
            self.close(context)?;
            return Ok(TurnOutcome::Closed);
        }

        let mut draft = context.clone();
        let agent = draft.active_agent();

        debug!(
            session_id = %draft.session_id(),
            turn = draft.turn(),
            agent = %agent,
            "turn starting"
        );

        // ── Step 1: Inbound guardrail ────────────────────────────────────────
        //
        // Blocked user text goes nowhere: not into history, not to the agent.
        let guarded = match self.guardrail.check(input, Direction::Inbound, &draft) {
            GuardrailResult::Allowed { text } => text,
            GuardrailResult::Blocked { reason } => {
                warn!(
                    session_id = %draft.session_id(),
                    agent = %agent,
                    reason = %reason,
                    "inbound text blocked"
                );
                self.record(&draft, agent, TurnEvent::InboundBlocked { reason: reason.clone() })?;

                let refusal = self.guardrail.refusal_message();
                let turn = Turn::agent(agent, refusal, refusal);
                draft.append_turn(turn.clone());
                draft.advance_turn();
                *context = draft;
                return Ok(TurnOutcome::Refused { turn, reason });
            }
        };
        draft.append_turn(Turn::user(input, guarded));
        draft.begin_input(input);

        // ── Steps 2-4: Completion loop ───────────────────────────────────────
        match self.converse(&mut draft)? {
            Conversation::Finished { turns, transfers } => {
                draft.finish_input();
                draft.advance_turn();
                *context = draft;
                Ok(TurnOutcome::Responded { turns, transfers })
            }
            Conversation::Abandoned => {
                context.keep_tool_effects(&draft);
                Ok(TurnOutcome::Unavailable {
                    message: self.config.unavailable_message.clone(),
                })
            }
        }
    }

    /// Close the session. Later turns return `TurnOutcome::Closed`.
    ///
    /// Closing an already closed session is a no-op.
    pub fn close(&self, context: &mut Context) -> ConciergeResult<()> {
        if context.is_closed() {
            return Ok(());
        }
        self.record(context, context.active_agent(), TurnEvent::SessionClosed)?;
        self.audit.finalize(context.session_id())?;
        context.close();

        info!(
            session_id = %context.session_id(),
            turns = context.turn(),
            "session closed"
        );
        Ok(())
    }

    fn converse(&self, draft: &mut Context) -> ConciergeResult<Conversation> {
        let mut turns = Vec::new();
        let mut transfers = Vec::new();
        let mut feedback: Vec<Feedback> = Vec::new();
        let mut purpose = PromptPurpose::Respond;

        for step in 0..self.config.max_steps_per_turn {
            let agent = draft.active_agent();
            let definition = self.registry.get(agent)?;
            let granted = allowed_tools(&self.registry, agent, draft)?;

            let request = CompletionRequest {
                agent,
                role_prompt: definition.role_prompt.clone(),
                context: draft.snapshot(),
                history: draft.history().iter().map(HistoryMessage::from).collect(),
                allowed_tools: granted_specs(&self.registry, &granted),
                purpose,
                feedback: feedback.clone(),
            };

            debug!(
                session_id = %draft.session_id(),
                agent = %agent,
                step,
                tools = request.allowed_tools.len(),
                "requesting completion"
            );

            let Some(completion) = self.complete_with_retry(draft, &request)? else {
                return Ok(Conversation::Abandoned);
            };

            match completion.into_action() {
                CompletionAction::Reply(text) => {
                    let turn = self.guard_outbound(draft, agent, text)?;
                    self.record(
                        draft,
                        agent,
                        TurnEvent::Replied { guarded_text: turn.guarded_text.clone() },
                    )?;
                    draft.append_turn(turn.clone());
                    turns.push(turn);
                    return Ok(Conversation::Finished { turns, transfers });
                }

                CompletionAction::Handoff { request, announcement } => {
                    if let Err(err) = validate_handoff(definition, &request) {
                        warn!(
                            session_id = %draft.session_id(),
                            agent = %agent,
                            target = %request.target,
                            error = %err,
                            "handoff rejected, re-prompting"
                        );
                        self.record(draft, agent, TurnEvent::HandoffRejected { target: request.target })?;
                        feedback.push(Feedback::HandoffRejected { target: request.target });
                        continue;
                    }

                    if let Some(text) = announcement {
                        let turn = self.guard_outbound(draft, agent, text)?;
                        draft.append_turn(turn.clone());
                        turns.push(turn);
                    }

                    let issue_type = self.apply_handoff(draft, agent, &request)?;
                    info!(
                        session_id = %draft.session_id(),
                        from = %agent,
                        to = %request.target,
                        issue_type = %issue_type,
                        "conversation handed off"
                    );
                    self.record(
                        draft,
                        agent,
                        TurnEvent::HandedOff { to: request.target, issue_type },
                    )?;
                    transfers.push(Transfer { from: agent, to: request.target });
                    feedback.clear();
                    purpose = PromptPurpose::Acknowledge { from: agent };
                }

                CompletionAction::Invoke(call) => {
                    if !granted.contains(&call.tool) {
                        let err = ConciergeError::UngrantedToolRequest {
                            tool: call.tool.clone(),
                            agent,
                        };
                        warn!(
                            session_id = %draft.session_id(),
                            error = %err,
                            "tool not granted, re-prompting without it"
                        );
                        self.record(draft, agent, TurnEvent::ToolNotGranted { tool: call.tool.clone() })?;
                        feedback.push(Feedback::ToolNotGranted { tool: call.tool });
                        continue;
                    }
                    let result = self.run_tool(draft, agent, &call)?;
                    feedback.push(result);
                }

                CompletionAction::Empty => {
                    warn!(
                        session_id = %draft.session_id(),
                        agent = %agent,
                        "completion had nothing actionable, re-prompting"
                    );
                    feedback.push(Feedback::EmptyCompletion);
                }
            }
        }

        let steps = self.config.max_steps_per_turn;
        warn!(
            session_id = %draft.session_id(),
            agent = %draft.active_agent(),
            steps,
            "step budget exhausted, abandoning turn"
        );
        self.record(draft, draft.active_agent(), TurnEvent::StepBudgetExhausted { steps })?;
        Ok(Conversation::Abandoned)
    }

    /// Call the completion capability, retrying failures.
    ///
    /// Returns `Ok(None)` once every attempt has failed.
    fn complete_with_retry(
        &self,
        draft: &Context,
        request: &CompletionRequest,
    ) -> ConciergeResult<Option<Completion>> {
        let attempts = self.config.max_completion_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.completion.complete(request) {
                Ok(completion) => return Ok(Some(completion)),
                Err(err) => {
                    warn!(
                        session_id = %draft.session_id(),
                        agent = %request.agent,
                        attempt,
                        max_attempts = attempts,
                        error = %err,
                        "completion attempt failed"
                    );
                    last_error = Some(err);
                }
            }
        }

        let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
        self.record(
            draft,
            request.agent,
            TurnEvent::CompletionUnavailable { attempts, reason },
        )?;
        Ok(None)
    }

    /// Verify and execute a granted tool, folding the outcome into feedback.
    fn run_tool(
        &self,
        draft: &mut Context,
        agent: AgentId,
        call: &ToolInvocationRequest,
    ) -> ConciergeResult<Feedback> {
        let tool = call.tool.clone();

        if let Some(feedback) = draft.replay_tool(call) {
            debug!(
                session_id = %draft.session_id(),
                tool = %tool,
                "tool already ran for this input, replaying its result"
            );
            return Ok(feedback);
        }

        let report = match self.registry.tool(&tool) {
            Some(spec) => self.verifier.verify(call, spec).unwrap_or_else(|err| {
                VerificationReport::from_failures(vec![VerificationFailure {
                    check_id: "verifier".to_string(),
                    message: err.to_string(),
                }])
            }),
            None => VerificationReport::from_failures(vec![VerificationFailure {
                check_id: "catalog".to_string(),
                message: format!("tool '{tool}' is not in the catalog"),
            }]),
        };

        if !report.passed {
            let reason = report.summary();
            warn!(
                session_id = %draft.session_id(),
                tool = %tool,
                failures = %reason,
                "tool arguments failed verification"
            );
            self.record(draft, agent, TurnEvent::ToolFailed { tool: tool.clone(), reason: reason.clone() })?;
            return Ok(Feedback::ToolError { tool, message: reason });
        }

        match self.tools.execute(&tool, &call.args, draft) {
            Ok(output) => {
                for update in &output.updates {
                    draft.apply_update(update);
                }
                debug!(
                    session_id = %draft.session_id(),
                    tool = %tool,
                    updates = output.updates.len(),
                    "tool executed"
                );
                self.record(draft, agent, TurnEvent::ToolExecuted { tool: tool.clone() })?;
                let feedback = Feedback::ToolResult { tool, output: output.payload };
                draft.remember_tool(call, &feedback, &output.updates);
                Ok(feedback)
            }
            Err(err) => {
                let failure = ConciergeError::ToolFailed {
                    tool: tool.clone(),
                    reason: err.message.clone(),
                };
                warn!(session_id = %draft.session_id(), error = %failure, "tool execution failed");
                self.record(
                    draft,
                    agent,
                    TurnEvent::ToolFailed { tool: tool.clone(), reason: err.message.clone() },
                )?;
                Ok(Feedback::ToolError { tool, message: err.message })
            }
        }
    }

    /// Make the handoff target active. Triage records its classification
    /// first so no specialist ever sees an unclassified issue.
    fn apply_handoff(
        &self,
        draft: &mut Context,
        from: AgentId,
        request: &HandoffRequest,
    ) -> ConciergeResult<IssueType> {
        if from == AgentId::Triage {
            draft.set_issue_type(classification_for(request))?;
        }
        draft.set_active_agent(&self.registry, request.target)?;
        Ok(draft.issue_type())
    }

    /// Run the outbound guardrail over agent text and build its turn.
    fn guard_outbound(&self, draft: &Context, agent: AgentId, text: String) -> ConciergeResult<Turn> {
        match self.guardrail.check(&text, Direction::Outbound, draft) {
            GuardrailResult::Allowed { text: guarded } => Ok(Turn::agent(agent, text, guarded)),
            GuardrailResult::Blocked { reason } => {
                warn!(
                    session_id = %draft.session_id(),
                    agent = %agent,
                    reason = %reason,
                    "outbound text blocked, substituting refusal"
                );
                self.record(draft, agent, TurnEvent::OutboundBlocked { reason })?;
                Ok(Turn::agent(agent, text, self.guardrail.refusal_message()))
            }
        }
    }

    fn record(&self, context: &Context, agent: AgentId, event: TurnEvent) -> ConciergeResult<()> {
        self.audit.write(&TurnRecord::new(
            context.session_id().clone(),
            context.turn(),
            agent,
            event,
        ))
    }
}

/// The issue type Triage's handoff assigns.
fn classification_for(request: &HandoffRequest) -> IssueType {
    request
        .classification
        .unwrap_or_else(|| IssueType::for_agent(request.target))
}

/// Check a handoff against the outgoing agent's definition without
/// touching any state.
fn validate_handoff(definition: &AgentDefinition, request: &HandoffRequest) -> ConciergeResult<()> {
    if !definition.may_hand_off_to(request.target) {
        return Err(ConciergeError::InvalidTransition {
            reason: format!("'{}' may not hand off to '{}'", definition.id, request.target),
        });
    }
    if definition.id == AgentId::Triage
        && request.target.is_specialist()
        && classification_for(request) == IssueType::Unclassified
    {
        return Err(ConciergeError::InvalidTransition {
            reason: format!("triage must classify the issue before handing off to '{}'", request.target),
        });
    }
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────────────
