//! Hash-chain primitives: hashing and chain integrity verification.
//!
//! Hash input layout (bytes, in order):
//!   1. run_id as UTF-8 bytes
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. compact JSON of the record

use sha2::{Digest, Sha256};

use galforge_contracts::{
    error::{GalforgeError, GalforgeResult},
    execution::AuditRecord,
};

use crate::event::AuditEvent;

/// Compute the lowercase hex SHA-256 of one event.
pub fn hash_event(
    run_id: &str,
    sequence: u64,
    record: &AuditRecord,
    prev_hash: &str,
) -> GalforgeResult<String> {
    let record_json = serde_json::to_vec(record).map_err(|e| GalforgeError::AuditWriteFailed {
        reason: format!("audit record could not be serialized: {e}"),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(run_id.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&record_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Verify the integrity of a hash chain.
///
/// Each event's `prev_hash` must equal the previous event's `this_hash`
/// (`GENESIS_HASH` for the first), and each `this_hash` must match the value
/// recomputed from the event's own fields. An empty chain is valid.
pub fn verify_chain(events: &[AuditEvent]) -> bool {
    let mut expected_prev = AuditEvent::GENESIS_HASH.to_string();

    for event in events {
        if event.prev_hash != expected_prev {
            return false;
        }

        match hash_event(&event.run_id, event.sequence, &event.record, &event.prev_hash) {
            Ok(recomputed) if recomputed == event.this_hash => {}
            _ => return false,
        }

        expected_prev = event.this_hash.clone();
    }

    true
}
