//! Support desk demo scenarios.
//!
//! Each scenario drives a real `SupportDesk` (guardrail engine, tool gate,
//! verifier, hash-chained audit, scripted agents) through a short
//! conversation and demonstrates one routing or enforcement rule.

pub mod billing_handoff;
pub mod forbidden_term;
pub mod lateral_handoff;
pub mod premium_refund;

use concierge_contracts::{error::ConciergeResult, execution::TurnOutcome};
use concierge_core::session::Context;

use crate::desk::SupportDesk;

/// A finished scenario conversation, kept for printing and assertions.
pub struct ScenarioRun {
    pub desk: SupportDesk,
    pub context: Context,
    pub outcomes: Vec<TurnOutcome>,
}

/// Open a session on `desk` and feed it `inputs` in order.
pub fn play(
    desk: SupportDesk,
    user_name: &str,
    is_premium: bool,
    inputs: &[&str],
) -> ConciergeResult<ScenarioRun> {
    let mut context = desk.orchestrator().start_session(user_name, is_premium);
    let mut outcomes = Vec::with_capacity(inputs.len());
    for input in inputs {
        outcomes.push(desk.orchestrator().run_turn(&mut context, input)?);
    }
    Ok(ScenarioRun { desk, context, outcomes })
}

/// Print the conversation the way the console shows it.
pub(crate) fn print_conversation(run: &ScenarioRun, inputs: &[&str]) {
    for (input, outcome) in inputs.iter().zip(&run.outcomes) {
        println!("  You: {input}");
        match outcome {
            TurnOutcome::Unavailable { message } => println!("  System: {message}"),
            TurnOutcome::Closed => println!("  System: session closed"),
            other => {
                for turn in other.emitted() {
                    println!("  {turn}");
                }
            }
        }
    }
    println!();
}

/// Print the final context and the audit chain status.
pub(crate) fn print_summary(run: &ScenarioRun) {
    let ctx = &run.context;
    println!("  Active agent:   {}", ctx.active_agent().display_name());
    println!("  Issue type:     {}", ctx.issue_type());
    println!("  Last ticket:    {}", ctx.last_ticket_id().unwrap_or("-"));

    let audit = run.desk.audit();
    let events = audit.export_log(ctx.session_id()).map_or(0, |log| log.events.len());
    println!(
        "  Audit chain:    {} ({} event(s))",
        if audit.verify_integrity(ctx.session_id()) { "VERIFIED" } else { "FAILED" },
        events
    );
    println!();
}

/// Run all four scenarios in order.
pub fn run_all() -> ConciergeResult<()> {
    billing_handoff::run_scenario()?;
    premium_refund::run_scenario()?;
    forbidden_term::run_scenario()?;
    lateral_handoff::run_scenario()?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use concierge_contracts::execution::TurnEvent;

    use super::ScenarioRun;

    /// Every audit event recorded for the run's session.
    pub(crate) fn audit_events(run: &ScenarioRun) -> Vec<TurnEvent> {
        run.desk
            .audit()
            .export_log(run.context.session_id())
            .map(|log| log.events.into_iter().map(|e| e.record.event).collect())
            .unwrap_or_default()
    }
}
