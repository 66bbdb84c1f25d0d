//! Scenario A: Billing Handoff
//!
//! A premium user opens with a billing request. Triage classifies it,
//! announces the transfer and hands off to Billing, which greets the user
//! in the same turn.
//!
//! Pipeline walk-through:
//!   1. Inbound guardrail → Allowed
//!   2. Triage (no tools) → HandoffRequest(Billing, classification=billing)
//!   3. Announcement passes the outbound guardrail and is emitted as Triage
//!   4. issue_type = billing, active_agent = Billing
//!   5. Billing prompted to acknowledge → reply, outbound guardrail, emitted

use concierge_contracts::error::ConciergeResult;

use crate::desk::SupportDesk;

use super::{play, print_conversation, print_summary, ScenarioRun};

pub const USER: &str = "Noor";
pub const INPUTS: [&str; 1] = ["I need help with my billing"];

pub fn play_scenario() -> ConciergeResult<ScenarioRun> {
    play(SupportDesk::standard()?, USER, true, &INPUTS)
}

/// Run Scenario A and print the conversation.
pub fn run_scenario() -> ConciergeResult<()> {
    println!("=== Scenario A: Billing Handoff ===");
    println!();
    println!("  User: {USER} (premium)");
    println!();

    let run = play_scenario()?;
    print_conversation(&run, &INPUTS);
    print_summary(&run);

    println!("  Scenario A complete.");
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use concierge_contracts::{
        agent::AgentId,
        context::IssueType,
        execution::{Transfer, TurnEvent, TurnOutcome},
    };

    use super::play_scenario;
    use crate::scenarios::testing::audit_events;

    #[test]
    fn triage_hands_off_to_billing_which_acknowledges() {
        let run = play_scenario().unwrap();

        assert_eq!(run.context.active_agent(), AgentId::Billing);
        assert_eq!(run.context.issue_type(), IssueType::Billing);

        match &run.outcomes[0] {
            TurnOutcome::Responded { turns, transfers } => {
                assert_eq!(transfers, &[Transfer { from: AgentId::Triage, to: AgentId::Billing }]);
                assert_eq!(turns.len(), 2);
                assert_eq!(turns[0].agent_id, Some(AgentId::Triage));
                assert_eq!(turns[1].agent_id, Some(AgentId::Billing));
                assert!(
                    turns[1].guarded_text.starts_with("Hello Noor, this is the Billing Agent."),
                    "unexpected acknowledgement: {}",
                    turns[1].guarded_text
                );
            }
            other => panic!("expected Responded, got {:?}", other),
        }
    }

    #[test]
    fn handoff_is_audited() {
        let run = play_scenario().unwrap();

        assert!(audit_events(&run).contains(&TurnEvent::HandedOff {
            to: AgentId::Billing,
            issue_type: IssueType::Billing,
        }));
        assert!(run.desk.audit().verify_integrity(run.context.session_id()));
    }
}
