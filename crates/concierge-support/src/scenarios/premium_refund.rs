//! Scenario B: Premium-only Refund
//!
//! A basic-plan user asks Billing for a refund. Billing opens a ticket and
//! then asks for `refund`, but the tool gate withheld it because refunds
//! need a premium subscription. The request is refused without running the
//! tool and Billing explains why.
//!
//! The same conversation for a premium user is run alongside for contrast:
//! the gate grants `refund`, its ticket id passes verification and the
//! ticket is marked refunded.

use concierge_contracts::{error::ConciergeResult, tool::ToolId};
use concierge_core::gate::allowed_tools;

use crate::desk::SupportDesk;

use super::{play, print_conversation, print_summary, ScenarioRun};

pub const INPUTS: [&str; 1] = ["I was charged twice and I want a refund"];

/// Play the conversation for `user_name` with the given plan.
pub fn play_scenario(user_name: &str, is_premium: bool) -> ConciergeResult<ScenarioRun> {
    play(SupportDesk::standard()?, user_name, is_premium, &INPUTS)
}

fn print_gate(run: &ScenarioRun) -> ConciergeResult<()> {
    let desk = &run.desk;
    let granted = allowed_tools(desk.orchestrator().registry(), run.context.active_agent(), &run.context)?;
    let names: Vec<&str> = granted.iter().map(ToolId::as_str).collect();
    println!("  Tools granted to {}: {}", run.context.active_agent().display_name(), names.join(", "));
    for ticket in desk.tickets().list() {
        println!("  Ticket {}: {:?}", ticket.id, ticket.status);
    }
    println!();
    Ok(())
}

/// Run Scenario B and print both conversations.
pub fn run_scenario() -> ConciergeResult<()> {
    println!("=== Scenario B: Premium-only Refund ===");
    println!();

    for (user, premium) in [("Sam", false), ("Noor", true)] {
        println!("  User: {user} ({})", if premium { "premium" } else { "basic plan" });
        println!();
        let run = play_scenario(user, premium)?;
        print_conversation(&run, &INPUTS);
        print_gate(&run)?;
        print_summary(&run);
    }

    println!("  Scenario B complete.");
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use concierge_contracts::{agent::AgentId, execution::TurnEvent, tool::ToolId};
    use concierge_core::gate::allowed_tools;

    use super::play_scenario;
    use crate::{scenarios::testing::audit_events, tickets::TicketStatus};

    #[test]
    fn basic_user_refund_is_not_granted() {
        let run = play_scenario("Sam", false).unwrap();

        assert_eq!(run.context.active_agent(), AgentId::Billing);
        let granted =
            allowed_tools(run.desk.orchestrator().registry(), AgentId::Billing, &run.context).unwrap();
        assert!(!granted.contains(&ToolId::new("refund")));

        let events = audit_events(&run);
        assert!(events.contains(&TurnEvent::ToolNotGranted { tool: ToolId::new("refund") }));
        assert!(!events.contains(&TurnEvent::ToolExecuted { tool: ToolId::new("refund") }));

        // The ticket was opened but never refunded.
        let tickets = run.desk.tickets().list();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].status, TicketStatus::Open);
        assert_eq!(run.context.last_ticket_id(), Some(tickets[0].id.as_str()));

        let reply = &run.outcomes[0].emitted().last().unwrap().guarded_text;
        assert!(reply.contains("premium members"), "unexpected reply: {reply}");
    }

    #[test]
    fn premium_user_refund_executes() {
        let run = play_scenario("Noor", true).unwrap();

        let events = audit_events(&run);
        assert!(events.contains(&TurnEvent::ToolExecuted { tool: ToolId::new("refund") }));

        let tickets = run.desk.tickets().list();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].status, TicketStatus::Refunded);

        let reply = &run.outcomes[0].emitted().last().unwrap().guarded_text;
        assert!(reply.contains("Refund processed"), "unexpected reply: {reply}");
    }
}
