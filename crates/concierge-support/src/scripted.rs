//! A deterministic, rule-based completion provider.
//!
//! `ScriptedCompletion` stands in for a language model in the demo and the
//! scenario tests. It decides from the request alone (agent, purpose,
//! latest user text, gated tools and feedback) so one instance can serve
//! every session concurrently.
//!
//! It deliberately does not check `allowed_tools` before asking for a tool:
//! the billing agent always tries to refund, and it is the orchestrator's
//! job to refuse when the gate withheld `refund`.

use serde_json::{json, Value};

use concierge_contracts::{
    agent::AgentId,
    completion::{Completion, CompletionRequest, Feedback, PromptPurpose},
    context::IssueType,
    error::ConciergeResult,
    tool::ToolId,
};
use concierge_core::traits::CompletionProvider;

use crate::intent::IntentClassifier;

const BACK_TO_TRIAGE: [&str; 3] = ["start over", "back to triage", "wrong department"];

#[derive(Default)]
pub struct ScriptedCompletion {
    classifier: IntentClassifier,
}

impl ScriptedCompletion {
    pub fn new(classifier: IntentClassifier) -> Self {
        Self { classifier }
    }

    fn triage(&self, request: &CompletionRequest, message: &str) -> Completion {
        match self.classifier.classify(message) {
            Some(issue_type) => {
                let target = AgentId::for_issue(issue_type);
                Completion::classified_handoff(target, issue_type)
                    .with_text(format!("I will connect you with our {}.", target.display_name()))
            }
            None => Completion::reply(format!(
                "Thanks {}. Could you tell me a little more? I can help with billing, technical problems, or general questions.",
                request.context.user_name
            )),
        }
    }

    fn billing(&self, request: &CompletionRequest, message: &str) -> Completion {
        let feedback = &request.feedback;

        if let Some(Feedback::HandoffRejected { .. }) = feedback.last() {
            return Completion::reply(
                "Technical problems are outside what billing can handle. Say 'start over' and triage will route you again.",
            );
        }
        if not_granted(feedback, "refund") {
            return Completion::reply(
                "Refunds are available only to premium members. Your ticket stays open and our billing team will follow up.",
            );
        }
        if let Some(output) = tool_result(feedback, "refund") {
            let id = output["ticket"]["id"].as_str().unwrap_or_default();
            return Completion::reply(format!("Refund processed for ticket {id}."));
        }
        if let Some(output) = tool_result(feedback, "check_subscription") {
            return Completion::reply(if output["is_premium"] == true {
                "Your subscription is premium."
            } else {
                "Your subscription is on the basic plan."
            });
        }
        if let Some(message) = tool_error(feedback) {
            return Completion::reply(format!("I could not complete that: {message}"));
        }
        if wants_triage(message) {
            return Completion::handoff(AgentId::Triage).with_text("Let me send you back to triage.");
        }
        if self.classifier.classify(message) == Some(IssueType::Technical)
            && !mentions_any(message, &["refund", "charge", "charged"])
        {
            return Completion::handoff(AgentId::Technical).with_text("Let me pass you to technical support.");
        }

        if mentions_any(message, &["refund", "charge", "charged"]) {
            let ticket_id = tool_result(feedback, "create_ticket")
                .and_then(|o| o["ticket_id"].as_str().map(str::to_string))
                .or_else(|| request.context.last_ticket_id.clone());
            return match ticket_id {
                Some(ticket_id) => Completion::tool_call("refund", json!({ "ticket_id": ticket_id })),
                None => Completion::tool_call(
                    "create_ticket",
                    json!({ "title": "Billing issue", "description": message }),
                ),
            };
        }
        if mentions_any(message, &["subscription", "premium", "plan"]) {
            if let Some(email) = &request.context.email {
                return Completion::tool_call("check_subscription", json!({ "email": email }));
            }
        }
        Completion::reply("I can help with refunds, charges, and invoices.")
    }

    fn technical(&self, request: &CompletionRequest, message: &str) -> Completion {
        let feedback = &request.feedback;

        if let Some(output) = tool_result(feedback, "restart_service") {
            return Completion::reply(output["message"].as_str().unwrap_or("Service restarted.").to_string());
        }
        if not_granted(feedback, "restart_service") {
            return Completion::reply("Restart is not permitted for your issue type.");
        }
        if let Some(output) = tool_result(feedback, "create_ticket") {
            let id = output["ticket_id"].as_str().unwrap_or_default();
            return Completion::reply(format!("I opened ticket {id} for our engineers."));
        }
        if let Some(message) = tool_error(feedback) {
            return Completion::reply(format!("That did not work ({message}). Ask me to open a ticket and engineering will take a look."));
        }
        if wants_triage(message) {
            return Completion::handoff(AgentId::Triage).with_text("Let me send you back to triage.");
        }
        if mentions_any(message, &["ticket"]) {
            return Completion::tool_call(
                "create_ticket",
                json!({ "title": "Technical issue", "description": message }),
            );
        }
        if mentions_any(message, &["restart", "not working", "error", "down", "crash", "crashes"]) {
            return Completion::tool_call("restart_service", json!({ "service_name": "main-service" }));
        }
        Completion::reply("I can attempt to restart services or create a ticket for engineering.")
    }

    fn general(&self, request: &CompletionRequest, message: &str) -> Completion {
        let feedback = &request.feedback;

        if let Some(output) = tool_result(feedback, "create_ticket") {
            let id = output["ticket_id"].as_str().unwrap_or_default();
            return Completion::reply(format!("Created ticket {id} for your request."));
        }
        if tool_error(feedback).is_some() {
            return Completion::reply("Could not create a ticket right now.");
        }
        if wants_triage(message) {
            return Completion::handoff(AgentId::Triage).with_text("Let me send you back to triage.");
        }
        Completion::tool_call("create_ticket", json!({ "title": "General inquiry", "description": message }))
    }
}

impl CompletionProvider for ScriptedCompletion {
    fn complete(&self, request: &CompletionRequest) -> ConciergeResult<Completion> {
        let message = request.latest_user_text().unwrap_or_default();

        let completion = match request.agent {
            AgentId::Triage => self.triage(request, message),
            AgentId::Billing => self.billing(request, message),
            AgentId::Technical => self.technical(request, message),
            AgentId::General => self.general(request, message),
        };

        Ok(match request.purpose {
            PromptPurpose::Acknowledge { .. } => greet(request, completion),
            PromptPurpose::Respond => completion,
        })
    }
}

/// Prefix a final reply with a greeting from the agent that just took over.
fn greet(request: &CompletionRequest, completion: Completion) -> Completion {
    if completion.handoff.is_some() || completion.tool_call.is_some() {
        return completion;
    }
    let greeting = format!("Hello {}, this is the {}.", request.context.user_name, request.agent.display_name());
    let text = match &completion.text {
        Some(text) => format!("{greeting} {text}"),
        None => greeting,
    };
    completion.with_text(text)
}

fn mentions_any(message: &str, keywords: &[&str]) -> bool {
    let message = message.to_lowercase();
    keywords.iter().any(|k| message.contains(k))
}

fn wants_triage(message: &str) -> bool {
    mentions_any(message, &BACK_TO_TRIAGE)
}

fn tool_result<'a>(feedback: &'a [Feedback], name: &str) -> Option<&'a Value> {
    feedback.iter().find_map(|f| match f {
        Feedback::ToolResult { tool, output } if tool.as_str() == name => Some(output),
        _ => None,
    })
}

fn tool_error(feedback: &[Feedback]) -> Option<&str> {
    feedback.iter().find_map(|f| match f {
        Feedback::ToolError { message, .. } => Some(message.as_str()),
        _ => None,
    })
}

fn not_granted(feedback: &[Feedback], name: &str) -> bool {
    feedback
        .iter()
        .any(|f| matches!(f, Feedback::ToolNotGranted { tool } if *tool == ToolId::new(name)))
}
