//! # concierge-support
//!
//! Customer-support reference runtime for the Concierge agent router.
//!
//! Four agents share one conversation: a triage agent that classifies the
//! user's issue and three specialists (billing, technical, general) that
//! resolve it with a small tool set backed by an in-memory ticket book.
//! A deterministic scripted provider stands in for the language model.
//!
//! Demonstrated scenarios:
//!
//! 1. **Billing Handoff**: triage classifies and transfers in one turn.
//! 2. **Premium-only Refund**: the tool gate withholds `refund` from
//!    basic-plan users.
//! 3. **Forbidden Term**: the inbound guardrail refuses before any agent
//!    is asked.
//! 4. **Lateral Handoff**: specialists may only return to triage.
//!
//! All data is fictional. No external API calls are made.

pub mod desk;
pub mod intent;
pub mod scenarios;
pub mod scripted;
pub mod tickets;
pub mod tools;

pub use desk::SupportDesk;
pub use scripted::ScriptedCompletion;
pub use tickets::{Ticket, TicketBook};
