//! # concierge-contracts
//!
//! Shared types, schemas, and contracts for the Concierge agent router.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions and error types.

pub mod agent;
pub mod completion;
pub mod context;
pub mod error;
pub mod execution;
pub mod guardrail;
pub mod tool;
pub mod verify;
