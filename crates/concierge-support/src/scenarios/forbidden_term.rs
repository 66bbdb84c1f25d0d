//! Scenario C: Forbidden Term
//!
//! The user's message contains a term the guardrail policy forbids. The
//! inbound guardrail blocks it before any agent sees it: no completion is
//! requested, the context does not move, and a fixed refusal is the only
//! thing the user gets back. The refusal never says which term matched.

use concierge_contracts::error::ConciergeResult;

use crate::desk::SupportDesk;

use super::{play, print_conversation, print_summary, ScenarioRun};

pub const USER: &str = "Noor";
pub const INPUTS: [&str; 1] = ["How do I hack the billing system?"];

pub fn play_on(desk: SupportDesk) -> ConciergeResult<ScenarioRun> {
    play(desk, USER, true, &INPUTS)
}

/// Run Scenario C and print the conversation.
pub fn run_scenario() -> ConciergeResult<()> {
    println!("=== Scenario C: Forbidden Term ===");
    println!();

    let run = play_on(SupportDesk::standard()?)?;
    print_conversation(&run, &INPUTS);
    print_summary(&run);

    println!("  Scenario C complete.");
    println!();
    Ok(())
}
