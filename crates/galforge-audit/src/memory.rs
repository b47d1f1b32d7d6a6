//! In-memory implementation of `AuditWriter`.
//!
//! `InMemoryAuditWriter` keeps the chain in a `Vec` behind a `Mutex`. Wrap
//! it in an `Arc` to hand one clone to the executor and keep another for
//! `export_log()` and `verify_integrity()`.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, info};

use galforge_contracts::{
    error::{GalforgeError, GalforgeResult},
    execution::AuditRecord,
};
use galforge_core::traits::AuditWriter;

use crate::{
    chain::{hash_event, verify_chain},
    event::{AuditEvent, AuditLog},
};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct InMemoryState {
    pub(crate) events: Vec<AuditEvent>,
    pub(crate) sequence: u64,
    pub(crate) last_hash: String,
    pub(crate) finalized: bool,
}

// ── Public writer ─────────────────────────────────────────────────────────────

/// An in-memory, append-only audit writer backed by a SHA-256 hash chain.
pub struct InMemoryAuditWriter {
    run_id: String,
    pub(crate) state: Mutex<InMemoryState>,
}

impl InMemoryAuditWriter {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            state: Mutex::new(InMemoryState {
                events: Vec::new(),
                sequence: 0,
                last_hash: AuditEvent::GENESIS_HASH.to_string(),
                finalized: false,
            }),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Read access survives a poisoned lock: the chain itself is still
    /// checked by `verify_chain`.
    fn read(&self) -> MutexGuard<'_, InMemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot every event written so far.
    pub fn export_log(&self) -> AuditLog {
        let state = self.read();
        AuditLog {
            run_id: self.run_id.clone(),
            events: state.events.clone(),
            exported_at: Utc::now(),
            terminal_hash: state.events.last().map(|e| e.this_hash.clone()).unwrap_or_default(),
            finalized: state.finalized,
        }
    }

    /// The records written so far, without chain metadata.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.read().events.iter().map(|e| e.record.clone()).collect()
    }

    pub fn verify_integrity(&self) -> bool {
        verify_chain(&self.read().events)
    }
}

// ── AuditWriter impl ──────────────────────────────────────────────────────────

impl AuditWriter for InMemoryAuditWriter {
    /// Append one record to the chain.
    ///
    /// Fails once the run has been finalized.
    fn write(&self, record: &AuditRecord) -> GalforgeResult<()> {
        let mut state = self.state.lock().map_err(|e| GalforgeError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {e}"),
        })?;

        if state.finalized {
            return Err(GalforgeError::AuditWriteFailed {
                reason: format!("run {} is already finalized", self.run_id),
            });
        }

        let prev_hash = state.last_hash.clone();
        let sequence = state.sequence;
        let this_hash = hash_event(&self.run_id, sequence, record, &prev_hash)?;

        debug!(
            run_id = %self.run_id,
            sequence,
            agent = %record.agent,
            kind = ?record.kind,
            outcome = ?record.outcome,
            "audit event appended"
        );

        state.events.push(AuditEvent {
            sequence,
            run_id: self.run_id.clone(),
            record: record.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.sequence += 1;
        state.last_hash = this_hash;

        Ok(())
    }

    fn finalize(&self, run_id: &str) -> GalforgeResult<()> {
        let mut state = self.state.lock().map_err(|e| GalforgeError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {e}"),
        })?;

        if run_id != self.run_id {
            return Err(GalforgeError::AuditWriteFailed {
                reason: format!("finalize called for run {run_id}, writer belongs to {}", self.run_id),
            });
        }

        state.finalized = true;
        info!(
            run_id = %run_id,
            event_count = state.events.len(),
            terminal_hash = %state.last_hash,
            "audit log finalized"
        );

        Ok(())
    }
}
