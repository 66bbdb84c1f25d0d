//! In-memory implementation of `AuditWriter`.
//!
//! `InMemoryAuditWriter` keeps one hash chain per session in a map behind
//! a `Mutex`. The orchestrator may drive many sessions from many threads;
//! each session's records still form their own gap-free chain.
//!
//! Cloning the writer shares the underlying chains, so a caller can hand
//! one clone to the orchestrator and keep another to export logs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::info;

use concierge_contracts::{
    agent::SessionId,
    error::{ConciergeError, ConciergeResult},
    execution::TurnRecord,
};
use concierge_core::traits::AuditWriter;

use crate::{
    chain::{hash_event, verify_chain},
    event::{AuditEvent, AuditLog},
};

// ── Internal mutable state ────────────────────────────────────────────────────

/// One session's chain.
pub(crate) struct SessionChain {
    pub(crate) events: Vec<AuditEvent>,
    pub(crate) last_hash: String,
    pub(crate) finalized_at: Option<DateTime<Utc>>,
}

impl SessionChain {
    fn new() -> Self {
        Self {
            events: Vec::new(),
            last_hash: AuditEvent::GENESIS_HASH.to_string(),
            finalized_at: None,
        }
    }
}

type Chains = HashMap<SessionId, SessionChain>;

// ── Public writer ─────────────────────────────────────────────────────────────

/// An in-memory, append-only audit writer backed by per-session SHA-256
/// hash chains.
#[derive(Clone, Default)]
pub struct InMemoryAuditWriter {
    pub(crate) chains: Arc<Mutex<Chains>>,
}

impl InMemoryAuditWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for_write(&self) -> ConciergeResult<MutexGuard<'_, Chains>> {
        self.chains.lock().map_err(|e| ConciergeError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {}", e),
        })
    }

    /// Read access survives a poisoned lock; the chains are verified, not
    /// trusted.
    fn lock_for_read(&self) -> MutexGuard<'_, Chains> {
        self.chains.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Export the chain of `session_id`, or `None` if nothing was recorded
    /// for it.
    pub fn export_log(&self, session_id: &SessionId) -> Option<AuditLog> {
        let chains = self.lock_for_read();
        let chain = chains.get(session_id)?;

        Some(AuditLog {
            session_id: session_id.clone(),
            events: chain.events.clone(),
            finalized_at: chain.finalized_at,
            terminal_hash: chain.events.last().map(|e| e.this_hash.clone()).unwrap_or_default(),
        })
    }

    /// Verify that the chain of `session_id` has not been tampered with.
    /// A session with no records is trivially intact.
    pub fn verify_integrity(&self, session_id: &SessionId) -> bool {
        self.lock_for_read()
            .get(session_id)
            .map_or(true, |chain| verify_chain(&chain.events))
    }

    /// Sessions with at least one record.
    pub fn sessions(&self) -> Vec<SessionId> {
        self.lock_for_read().keys().cloned().collect()
    }
}

// ── AuditWriter impl ──────────────────────────────────────────────────────────

impl AuditWriter for InMemoryAuditWriter {
    /// Append `record` to the chain of the session it belongs to.
    ///
    /// Fails with `AuditWriteFailed` once that session has been finalized.
    fn write(&self, record: &TurnRecord) -> ConciergeResult<()> {
        let mut chains = self.lock_for_write()?;
        let chain = chains.entry(record.session_id.clone()).or_insert_with(SessionChain::new);

        if chain.finalized_at.is_some() {
            return Err(ConciergeError::AuditWriteFailed {
                reason: format!("audit log for session {} is already finalized", record.session_id),
            });
        }

        let sequence = chain.events.len() as u64;
        let prev_hash = chain.last_hash.clone();
        let this_hash = hash_event(&record.session_id, sequence, record, &prev_hash)?;

        chain.events.push(AuditEvent {
            sequence,
            session_id: record.session_id.clone(),
            record: record.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        chain.last_hash = this_hash;

        Ok(())
    }

    /// Seal the session's chain. Later writes for it are rejected.
    fn finalize(&self, session_id: &SessionId) -> ConciergeResult<()> {
        let mut chains = self.lock_for_write()?;
        let chain = chains.entry(session_id.clone()).or_insert_with(SessionChain::new);
        chain.finalized_at.get_or_insert_with(Utc::now);

        info!(
            session_id = %session_id,
            event_count = chain.events.len(),
            terminal_hash = %chain.last_hash,
            "audit log finalized"
        );

        Ok(())
    }
}
