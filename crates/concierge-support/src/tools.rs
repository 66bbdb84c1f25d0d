//! The support desk's tool implementations.
//!
//! Tools read the session context but never change it directly. Opening a
//! ticket asks the orchestrator to record the ticket id through a
//! `ContextUpdate`.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use concierge_contracts::{
    context::IssueType,
    tool::{ContextUpdate, ToolError, ToolId, ToolOutput},
};
use concierge_core::{session::Context, traits::ToolExecutor};
use concierge_verify::ArgsVerifier;

use crate::tickets::{NewTicket, RefundError, TicketBook};

pub struct SupportTools {
    tickets: Arc<TicketBook>,
}

impl SupportTools {
    pub fn new(tickets: Arc<TicketBook>) -> Self {
        Self { tickets }
    }

    fn create_ticket(&self, args: &Value, context: &Context) -> Result<ToolOutput, ToolError> {
        let ticket = self.tickets.open(NewTicket {
            title: str_arg(args, "title")?,
            description: args["description"].as_str().unwrap_or_default(),
            user_name: context.user_name(),
            email: context.email(),
            category: context.issue_type(),
        });
        info!(session_id = %context.session_id(), ticket_id = %ticket.id, "ticket opened");

        Ok(ToolOutput::new(json!({ "ok": true, "ticket_id": ticket.id, "ticket": ticket }))
            .with_update(ContextUpdate::RecordTicket { ticket_id: ticket.id }))
    }

    fn refund(&self, args: &Value, context: &Context) -> Result<ToolOutput, ToolError> {
        let ticket_id = str_arg(args, "ticket_id")?;
        match self.tickets.refund(ticket_id) {
            Ok(ticket) => {
                info!(session_id = %context.session_id(), ticket_id, "refund processed");
                Ok(ToolOutput::new(json!({
                    "ok": true,
                    "ticket": ticket,
                    "message": "Refund processed."
                })))
            }
            Err(RefundError::NotFound) => Err(ToolError::new(format!("ticket '{ticket_id}' not found"))),
            Err(RefundError::AlreadyRefunded) => {
                Err(ToolError::new(format!("ticket '{ticket_id}' was already refunded")))
            }
        }
    }

    fn restart_service(&self, args: &Value, context: &Context) -> Result<ToolOutput, ToolError> {
        let service = str_arg(args, "service_name")?;
        if context.issue_type() != IssueType::Technical {
            return Err(ToolError::new("restarts are only available for technical issues"));
        }
        info!(session_id = %context.session_id(), service, "service restarted");
        Ok(ToolOutput::new(json!({
            "ok": true,
            "message": format!("Service '{service}' restarted successfully.")
        })))
    }

    fn check_subscription(&self, args: &Value, context: &Context) -> Result<ToolOutput, ToolError> {
        let email = str_arg(args, "email")?;
        let is_premium = context.is_premium() || email.to_lowercase().contains("pro");
        Ok(ToolOutput::new(json!({ "email": email, "is_premium": is_premium })))
    }
}

impl ToolExecutor for SupportTools {
    fn execute(&self, tool: &ToolId, args: &Value, context: &Context) -> Result<ToolOutput, ToolError> {
        match tool.as_str() {
            "create_ticket" => self.create_ticket(args, context),
            "refund" => self.refund(args, context),
            "restart_service" => self.restart_service(args, context),
            "check_subscription" => self.check_subscription(args, context),
            other => Err(ToolError::new(format!("no implementation for tool '{other}'"))),
        }
    }
}

fn str_arg<'a>(args: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    args[name]
        .as_str()
        .ok_or_else(|| ToolError::new(format!("missing string argument '{name}'")))
}

/// The argument verifier for the support tools: JSON Schema from the
/// catalog plus a ticket id format check for refunds.
pub fn support_verifier() -> ArgsVerifier {
    ArgsVerifier::new().with_check(
        "refund",
        "ticket-id-format",
        Box::new(|args: &Value| {
            let id = args["ticket_id"].as_str().unwrap_or_default();
            uuid::Uuid::parse_str(id)
                .is_err()
                .then(|| format!("'{id}' is not a ticket id"))
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use concierge_contracts::{
        context::IssueType,
        tool::{ContextUpdate, ToolId, ToolInvocationRequest, ToolSpec},
    };
    use concierge_core::{
        session::{create_session, Context},
        traits::{ToolExecutor, Verifier},
    };

    use super::{support_verifier, SupportTools};
    use crate::tickets::{TicketBook, TicketStatus};

    fn billing_context(premium: bool) -> Context {
        let mut ctx = create_session("Noor", premium).with_email("noor@example.com");
        ctx.set_issue_type(IssueType::Billing).unwrap();
        ctx
    }

    #[test]
    fn create_ticket_records_context_update() {
        let book = Arc::new(TicketBook::new());
        let tools = SupportTools::new(book.clone());
        let ctx = billing_context(true);

        let output = tools
            .execute(&ToolId::new("create_ticket"), &json!({ "title": "Billing issue", "description": "x" }), &ctx)
            .unwrap();

        let id = output.payload["ticket_id"].as_str().unwrap().to_string();
        assert_eq!(output.updates, [ContextUpdate::RecordTicket { ticket_id: id.clone() }]);
        let ticket = book.get(&id).unwrap();
        assert_eq!(ticket.category, IssueType::Billing);
        assert_eq!(ticket.email.as_deref(), Some("noor@example.com"));
    }

    #[test]
    fn refund_marks_ticket() {
        let book = Arc::new(TicketBook::new());
        let tools = SupportTools::new(book.clone());
        let ctx = billing_context(true);

        let created = tools
            .execute(&ToolId::new("create_ticket"), &json!({ "title": "t", "description": "" }), &ctx)
            .unwrap();
        let id = created.payload["ticket_id"].as_str().unwrap();

        tools.execute(&ToolId::new("refund"), &json!({ "ticket_id": id }), &ctx).unwrap();
        assert_eq!(book.get(id).unwrap().status, TicketStatus::Refunded);

        let again = tools.execute(&ToolId::new("refund"), &json!({ "ticket_id": id }), &ctx);
        assert!(again.unwrap_err().message.contains("already refunded"));
    }

    #[test]
    fn restart_requires_technical_issue() {
        let tools = SupportTools::new(Arc::new(TicketBook::new()));
        let args = json!({ "service_name": "api" });

        assert!(tools.execute(&ToolId::new("restart_service"), &args, &billing_context(false)).is_err());

        let mut ctx = create_session("Noor", false);
        ctx.set_issue_type(IssueType::Technical).unwrap();
        let output = tools.execute(&ToolId::new("restart_service"), &args, &ctx).unwrap();
        assert_eq!(output.payload["message"], "Service 'api' restarted successfully.");
    }

    #[test]
    fn subscription_detects_pro_email() {
        let tools = SupportTools::new(Arc::new(TicketBook::new()));
        let ctx = billing_context(false);

        let pro = tools
            .execute(&ToolId::new("check_subscription"), &json!({ "email": "sam@PRO.example" }), &ctx)
            .unwrap();
        assert_eq!(pro.payload["is_premium"], true);

        let basic = tools
            .execute(&ToolId::new("check_subscription"), &json!({ "email": "sam@example.com" }), &ctx)
            .unwrap();
        assert_eq!(basic.payload["is_premium"], false);
    }

    #[test]
    fn unknown_tool_is_an_error() {
        let tools = SupportTools::new(Arc::new(TicketBook::new()));
        assert!(tools.execute(&ToolId::new("wire_money"), &json!({}), &billing_context(true)).is_err());
    }

    #[test]
    fn refund_ticket_id_must_be_uuid() {
        let verifier = support_verifier();
        let spec = ToolSpec {
            id: ToolId::new("refund"),
            description: "Refund".to_string(),
            args_schema: serde_json::Value::Null,
            eligibility: Default::default(),
        };
        let call = |id: &str| ToolInvocationRequest { tool: ToolId::new("refund"), args: json!({ "ticket_id": id }) };

        assert!(!verifier.verify(&call("t-1"), &spec).unwrap().passed);
        assert!(verifier
            .verify(&call("4b8e2f5c-1d2a-4c3b-9e8f-0a1b2c3d4e5f"), &spec)
            .unwrap()
            .passed);
    }
}
