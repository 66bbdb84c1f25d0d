//! Hash-chain primitives: hashing and chain integrity verification.
//!
//! Hash input layout (bytes, in order):
//!   1. session_id as its hyphenated UUID string
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. compact JSON of the turn record

use sha2::{Digest, Sha256};

use concierge_contracts::{
    agent::SessionId,
    error::{ConciergeError, ConciergeResult},
    execution::TurnRecord,
};

use crate::event::AuditEvent;

/// Compute the SHA-256 hash for one audit event, as lowercase hex.
pub fn hash_event(
    session_id: &SessionId,
    sequence: u64,
    record: &TurnRecord,
    prev_hash: &str,
) -> ConciergeResult<String> {
    let record_json = serde_json::to_vec(record).map_err(|e| ConciergeError::AuditWriteFailed {
        reason: format!("turn record is not serializable: {e}"),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(session_id.to_string().as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&record_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Verify the integrity of one session's chain.
///
/// Valid when every event links to its predecessor (or `GENESIS_HASH`),
/// carries the expected sequence number, and its `this_hash` matches the
/// hash recomputed from its fields. An empty chain is valid.
pub fn verify_chain(events: &[AuditEvent]) -> bool {
    let mut expected_prev = AuditEvent::GENESIS_HASH;

    for (position, event) in events.iter().enumerate() {
        if event.prev_hash != expected_prev || event.sequence != position as u64 {
            return false;
        }

        let recomputed = hash_event(&event.session_id, event.sequence, &event.record, &event.prev_hash);
        if recomputed.ok().as_deref() != Some(event.this_hash.as_str()) {
            return false;
        }

        expected_prev = &event.this_hash;
    }

    true
}
