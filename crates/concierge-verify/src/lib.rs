//! # concierge-verify
//!
//! Tool argument verification for the Concierge router.
//!
//! [`ArgsVerifier`] implements [`Verifier`](concierge_core::traits::Verifier):
//! it validates a tool call's arguments against the tool's JSON Schema and
//! then runs any custom checks the hosting application registered for that
//! tool.

pub mod engine;

pub use engine::{ArgsVerifier, CheckFn};
