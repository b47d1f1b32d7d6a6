//! Audit event and log types.
//!
//! `AuditEvent` wraps one executor `AuditRecord` with its position in the
//! chain and the SHA-256 hashes linking it to its neighbours. `AuditLog` is
//! the snapshot exported at the end of a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use galforge_contracts::execution::{AuditRecord, RecordOutcome};

/// A single entry in the hash chain of one run.
///
/// Changing any field, including those of the embedded `record`,
/// invalidates `this_hash` and every later `prev_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Position in the chain, starting at 0.
    pub sequence: u64,
    pub run_id: String,
    pub record: AuditRecord,
    /// Hash of the previous event, or `GENESIS_HASH` for the first.
    pub prev_hash: String,
    /// Hash over (run_id, sequence, prev_hash, record JSON).
    pub this_hash: String,
}

impl AuditEvent {
    /// The `prev_hash` of the first event in every chain.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// A snapshot of one run's audit chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub run_id: String,
    /// Events in chain order.
    pub events: Vec<AuditEvent>,
    pub exported_at: DateTime<Utc>,
    /// `this_hash` of the last event; empty for an empty log.
    pub terminal_hash: String,
    /// True once the executor has called `finalize`.
    pub finalized: bool,
}

impl AuditLog {
    /// Events whose flow degraded to a fallback or kept the old output.
    pub fn degraded(&self) -> impl Iterator<Item = &AuditEvent> {
        self.events
            .iter()
            .filter(|e| e.record.outcome != RecordOutcome::Validated)
    }

    /// Events recorded for one agent, in order.
    pub fn for_agent<'a>(&'a self, agent: &'a str) -> impl Iterator<Item = &'a AuditEvent> + 'a {
        self.events.iter().filter(move |e| e.record.agent == agent)
    }
}
