//! # concierge-audit
//!
//! Append-only, SHA-256 hash-chained audit trail for the Concierge router.
//!
//! ## Overview
//!
//! Every decision the orchestrator records is wrapped in an `AuditEvent`
//! that links to the previous event of the same session via its hash.
//! Changing a single byte of any stored event breaks the chain and is
//! detected by `verify_chain`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use concierge_audit::InMemoryAuditWriter;
//!
//! let audit = InMemoryAuditWriter::new();
//! // Give a clone to the orchestrator, keep this one for inspection.
//! let orchestrator = Orchestrator::new(registry, guardrail, completion, tools, verifier, Box::new(audit.clone()));
//!
//! assert!(audit.verify_integrity(ctx.session_id()));
//! let log = audit.export_log(ctx.session_id());
//! ```

pub mod chain;
pub mod event;
pub mod memory;

pub use chain::{hash_event, verify_chain};
pub use event::{AuditEvent, AuditLog};
pub use memory::InMemoryAuditWriter;

// ── Tests ─────────────────────────────────────────────────────────────────────
