//! # concierge-core
//!
//! The turn orchestrator for the Concierge multi-agent support desk.
//!
//! This crate provides:
//! - The collaborator traits (`CompletionProvider`, `ToolExecutor`,
//!   `Guardrail`, `Verifier`, `AuditWriter`)
//! - The validated `AgentRegistry` and tool catalog
//! - The per-session `Context` store and the tool gate
//! - The `Orchestrator` that runs each user turn through them
//!
//! ## Usage
//!
//! ```rust,ignore
//! use concierge_core::{Orchestrator, registry::AgentRegistry};
//!
//! let mut ctx = orchestrator.start_session("Noor", true);
//! let outcome = orchestrator.run_turn(&mut ctx, "I was charged twice")?;
//! for turn in outcome.emitted() {
//!     println!("{turn}");
//! }
//! ```

pub mod config;
pub mod gate;
pub mod orchestrator;
pub mod registry;
pub mod session;
pub mod traits;

pub use orchestrator::Orchestrator;
