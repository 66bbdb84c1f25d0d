//! Scenario D: Lateral Handoff
//!
//! Once in Billing, the user describes a technical problem. Billing asks to
//! hand the conversation straight to Technical, which its definition does
//! not allow: specialists may only return to Triage. The handoff is
//! rejected, Billing stays active and is re-prompted, and its reply tells
//! the user how to be routed again.
//!
//! The user then says "start over": Billing hands back to Triage, which
//! routes the technical problem to Technical on the next turn.

use concierge_contracts::error::ConciergeResult;

use crate::desk::SupportDesk;

use super::{play, print_conversation, print_summary, ScenarioRun};

pub const USER: &str = "Noor";
pub const INPUTS: [&str; 4] = [
    "I need help with my billing",
    "my app crashes when I open my invoices",
    "ok, start over please",
    "the app is not working",
];

pub fn play_scenario(turns: usize) -> ConciergeResult<ScenarioRun> {
    play(SupportDesk::standard()?, USER, true, &INPUTS[..turns.min(INPUTS.len())])
}

/// Run Scenario D and print the conversation.
pub fn run_scenario() -> ConciergeResult<()> {
    println!("=== Scenario D: Lateral Handoff ===");
    println!();

    let run = play_scenario(INPUTS.len())?;
    print_conversation(&run, &INPUTS);
    print_summary(&run);

    println!("  Scenario D complete.");
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use concierge_contracts::{
        agent::AgentId,
        context::IssueType,
        execution::{TurnEvent, TurnOutcome},
        tool::ToolId,
    };

    use super::play_scenario;
    use crate::scenarios::testing::audit_events;

    #[test]
    fn billing_cannot_hand_off_to_technical() {
        let run = play_scenario(2).unwrap();

        assert_eq!(run.context.active_agent(), AgentId::Billing);
        assert_eq!(run.context.issue_type(), IssueType::Billing);
        assert!(audit_events(&run).contains(&TurnEvent::HandoffRejected { target: AgentId::Technical }));

        match &run.outcomes[1] {
            TurnOutcome::Responded { turns, transfers } => {
                assert!(transfers.is_empty());
                assert_eq!(turns.len(), 1);
                assert_eq!(turns[0].agent_id, Some(AgentId::Billing));
                assert!(
                    turns[0].guarded_text.starts_with("Technical problems are outside what billing can handle."),
                    "unexpected reply: {}",
                    turns[0].guarded_text
                );
                assert!(turns[0].guarded_text.contains("'start over'"));
                assert_eq!(turns[0].guarded_text, turns[0].raw_text, "nothing in the reply needs redaction");
            }
            other => panic!("expected Responded, got {:?}", other),
        }
    }

    #[test]
    fn returning_through_triage_reaches_technical() {
        let run = play_scenario(4).unwrap();

        assert_eq!(run.context.active_agent(), AgentId::Technical);
        assert_eq!(run.context.issue_type(), IssueType::Technical);

        let events = audit_events(&run);
        assert!(events.contains(&TurnEvent::HandedOff { to: AgentId::Triage, issue_type: IssueType::Billing }));
        assert!(events.contains(&TurnEvent::ToolExecuted { tool: ToolId::new("restart_service") }));

        let reply = &run.outcomes[3].emitted().last().unwrap().guarded_text;
        assert!(reply.contains("restarted successfully"), "unexpected reply: {reply}");
        assert!(run.desk.audit().verify_integrity(run.context.session_id()));
    }
}
