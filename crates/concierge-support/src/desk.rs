//! Wiring for a complete support desk.
//!
//! `SupportDesk` owns an `Orchestrator` built from the embedded policy
//! files, plus shared handles to the ticket book and the audit writer so the
//! console and the scenarios can inspect them after the orchestrator has
//! taken ownership of its collaborators.

use std::path::Path;
use std::sync::Arc;

use concierge_audit::InMemoryAuditWriter;
use concierge_contracts::error::ConciergeResult;
use concierge_core::{
    config::OrchestratorConfig, registry::AgentRegistry, traits::CompletionProvider, Orchestrator,
};
use concierge_guardrail::GuardrailEngine;

use crate::{scripted::ScriptedCompletion, tickets::TicketBook, tools::{support_verifier, SupportTools}};

/// Embedded agent registry and tool catalog.
pub const AGENTS_TOML: &str = include_str!("../policies/agents.toml");

/// Embedded guardrail policy.
pub const GUARDRAILS_TOML: &str = include_str!("../policies/guardrails.toml");

pub struct SupportDesk {
    orchestrator: Orchestrator,
    tickets: Arc<TicketBook>,
    audit: InMemoryAuditWriter,
}

impl SupportDesk {
    /// The standard desk: embedded policies and the scripted agents.
    pub fn standard() -> ConciergeResult<Self> {
        Ok(Self::assemble(
            AgentRegistry::from_toml_str(AGENTS_TOML)?,
            GuardrailEngine::from_toml_str(GUARDRAILS_TOML)?,
            Box::new(ScriptedCompletion::default()),
            OrchestratorConfig::default(),
        ))
    }

    /// Like [`standard`](Self::standard), but each policy may be read from a
    /// file instead of the embedded copy.
    pub fn from_paths(
        agents: Option<&Path>,
        guardrails: Option<&Path>,
        config: OrchestratorConfig,
    ) -> ConciergeResult<Self> {
        let registry = match agents {
            Some(path) => AgentRegistry::from_file(path)?,
            None => AgentRegistry::from_toml_str(AGENTS_TOML)?,
        };
        let guardrail = match guardrails {
            Some(path) => GuardrailEngine::from_file(path)?,
            None => GuardrailEngine::from_toml_str(GUARDRAILS_TOML)?,
        };
        Ok(Self::assemble(registry, guardrail, Box::new(ScriptedCompletion::default()), config))
    }

    /// Build a desk around any completion provider.
    pub fn assemble(
        registry: AgentRegistry,
        guardrail: GuardrailEngine,
        completion: Box<dyn CompletionProvider>,
        config: OrchestratorConfig,
    ) -> Self {
        let tickets = Arc::new(TicketBook::new());
        let audit = InMemoryAuditWriter::new();

        let orchestrator = Orchestrator::new(
            Arc::new(registry),
            Box::new(guardrail),
            completion,
            Box::new(SupportTools::new(Arc::clone(&tickets))),
            Box::new(support_verifier()),
            Box::new(audit.clone()),
        )
        .with_config(config);

        Self { orchestrator, tickets, audit }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn tickets(&self) -> &TicketBook {
        &self.tickets
    }

    pub fn audit(&self) -> &InMemoryAuditWriter {
        &self.audit
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use concierge_contracts::{
        agent::AgentId,
        completion::{Completion, CompletionRequest, Feedback},
        error::{ConciergeError, ConciergeResult},
        execution::TurnOutcome,
        tool::ToolId,
    };
    use concierge_core::{config::OrchestratorConfig, registry::AgentRegistry, traits::CompletionProvider};
    use concierge_guardrail::GuardrailEngine;

    use super::{SupportDesk, AGENTS_TOML, GUARDRAILS_TOML};
    use crate::scripted::ScriptedCompletion;

    fn desk_with(completion: Box<dyn CompletionProvider>) -> SupportDesk {
        SupportDesk::assemble(
            AgentRegistry::from_toml_str(AGENTS_TOML).unwrap(),
            GuardrailEngine::from_toml_str(GUARDRAILS_TOML).unwrap(),
            completion,
            OrchestratorConfig::default(),
        )
    }

    /// Always answers with text the outbound guardrail blocks.
    struct LeakyAgent;

    impl CompletionProvider for LeakyAgent {
        fn complete(&self, _request: &CompletionRequest) -> ConciergeResult<Completion> {
            Ok(Completion::reply("here is how to hack the billing portal"))
        }
    }

    /// Scripted agents that go offline once a ticket has been opened, until
    /// `offline` is cleared.
    struct OfflineAfterTicket {
        inner: ScriptedCompletion,
        offline: Arc<AtomicBool>,
    }

    impl CompletionProvider for OfflineAfterTicket {
        fn complete(&self, request: &CompletionRequest) -> ConciergeResult<Completion> {
            let ticket_opened = request.feedback.iter().any(
                |f| matches!(f, Feedback::ToolResult { tool, .. } if tool.as_str() == "create_ticket"),
            );
            if ticket_opened && self.offline.load(Ordering::SeqCst) {
                return Err(ConciergeError::CompletionUnavailable { reason: "connection reset".to_string() });
            }
            self.inner.complete(request)
        }
    }

    #[test]
    fn embedded_policies_load() {
        let desk = SupportDesk::standard().unwrap();
        let registry = desk.orchestrator().registry();

        assert_eq!(registry.agents().count(), 4);
        let billing = registry.get(AgentId::Billing).unwrap();
        assert!(billing.allowed_tools.contains(&ToolId::new("check_subscription")));
        assert!(registry.tool(&ToolId::new("refund")).unwrap().eligibility.requires_premium);
    }

    #[test]
    fn blocked_reply_never_reaches_context_view() {
        let desk = desk_with(Box::new(LeakyAgent));
        let mut ctx = desk.orchestrator().start_session("Noor", false);

        let outcome = desk.orchestrator().run_turn(&mut ctx, "hello").unwrap();
        assert_eq!(outcome.emitted()[0].guarded_text, "I'm not able to help with that request.");

        let json = serde_json::to_string_pretty(&ctx.view()).unwrap();
        assert!(!json.contains("hack"), "blocked text leaked into the view: {json}");
        assert!(json.contains("I'm not able to help with that request."));
    }

    #[test]
    fn retry_after_outage_opens_one_ticket() {
        let offline = Arc::new(AtomicBool::new(true));
        let desk = desk_with(Box::new(OfflineAfterTicket {
            inner: ScriptedCompletion::default(),
            offline: Arc::clone(&offline),
        }));
        let mut ctx = desk.orchestrator().start_session("Noor", false);
        let input = "I have a question about my account";

        let outcome = desk.orchestrator().run_turn(&mut ctx, input).unwrap();
        assert!(matches!(outcome, TurnOutcome::Unavailable { .. }));
        assert_eq!(desk.tickets().list().len(), 1);
        let ticket_id = ctx.last_ticket_id().map(str::to_string);
        assert!(ticket_id.is_some(), "the opened ticket must be remembered");

        offline.store(false, Ordering::SeqCst);
        let outcome = desk.orchestrator().run_turn(&mut ctx, input).unwrap();

        assert_eq!(desk.tickets().list().len(), 1, "retry must not open a second ticket");
        assert_eq!(ctx.last_ticket_id().map(str::to_string), ticket_id);
        let reply = &outcome.emitted().last().unwrap().guarded_text;
        assert!(reply.contains(ticket_id.as_deref().unwrap()), "reply should name the ticket: {reply}");
    }

    #[test]
    fn missing_policy_file_is_config_error() {
        let result = SupportDesk::from_paths(
            Some(std::path::Path::new("/nonexistent/agents.toml")),
            None,
            Default::default(),
        );
        assert!(matches!(
            result,
            Err(concierge_contracts::error::ConciergeError::ConfigError { .. })
        ));
    }
}
