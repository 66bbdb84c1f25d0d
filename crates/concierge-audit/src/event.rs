//! Audit event and log types.
//!
//! `AuditEvent` is one link in a session's hash chain: it wraps a
//! `TurnRecord` with its position and the SHA-256 hashes that make
//! tampering detectable. `AuditLog` is the exported chain for one session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use concierge_contracts::{agent::SessionId, execution::TurnRecord};

/// A single entry in one session's hash chain.
///
/// Modifying any field, including those of the embedded `record`,
/// invalidates `this_hash` and every later `prev_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Position in the session's chain, starting at 0.
    pub sequence: u64,

    pub session_id: SessionId,

    pub record: TurnRecord,

    /// Hash of the previous event, or `GENESIS_HASH` for the first one.
    pub prev_hash: String,

    /// Hash over (session_id, sequence, prev_hash, canonical JSON of record).
    pub this_hash: String,
}

impl AuditEvent {
    /// The `prev_hash` of the first event in every chain.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// The exported audit chain of a single session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub session_id: SessionId,

    /// All events in chain order.
    pub events: Vec<AuditEvent>,

    /// When the session was closed, if it has been.
    pub finalized_at: Option<DateTime<Utc>>,

    /// `this_hash` of the last event. Empty if the log is empty.
    pub terminal_hash: String,
}
