//! # galforge-audit
//!
//! Append-only, SHA-256 hash-chained audit trail for the galforge runtime.
//!
//! ## Overview
//!
//! Every generation, feedback repair, and global revision the executor
//! performs is wrapped in an `AuditEvent` linked to the previous event by
//! hash. Editing any stored event breaks the chain, which `verify_chain`
//! detects.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use galforge_audit::InMemoryAuditWriter;
//!
//! let audit = Arc::new(InMemoryAuditWriter::new(run_id.to_string()));
//! let executor = AgentExecutor::new(backend, validator, Box::new(audit.clone()), settings)
//!     .with_run_id(run_id);
//! // ... run agents ...
//! executor.finish()?;
//! assert!(audit.verify_integrity());
//! ```

pub mod chain;
pub mod event;
pub mod memory;

pub use chain::{hash_event, verify_chain};
pub use event::{AuditEvent, AuditLog};
pub use memory::InMemoryAuditWriter;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use galforge_contracts::{
        error::GalforgeError,
        execution::{AuditRecord, DiffChange, DiffEntry, RecordKind, RecordOutcome},
    };
    use galforge_core::traits::AuditWriter;

    use super::{AuditEvent, InMemoryAuditWriter};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn make_record(agent: &str, outcome: RecordOutcome) -> AuditRecord {
        AuditRecord {
            agent: agent.to_string(),
            kind: RecordKind::Generation,
            outcome,
            attempts: 1,
            changes: vec![],
            timestamp: Utc::now(),
        }
    }

    fn three_events(run_id: &str) -> InMemoryAuditWriter {
        let writer = InMemoryAuditWriter::new(run_id);
        writer.write(&make_record("story_core", RecordOutcome::Validated)).unwrap();
        writer.write(&make_record("world", RecordOutcome::Fallback)).unwrap();
        writer.write(&make_record("cast", RecordOutcome::Validated)).unwrap();
        writer
    }

    // ── Tests ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_hash_chain_integrity() {
        let writer = three_events("run-integrity");
        assert!(writer.verify_integrity(), "chain must be valid after sequential writes");
    }

    /// Editing a stored record, e.g. to hide a fallback, breaks the chain.
    #[test]
    fn test_tamper_detection() {
        let writer = three_events("run-tamper");

        {
            let mut state = writer.state.lock().unwrap();
            state.events[1].record.outcome = RecordOutcome::Validated;
        }

        assert!(!writer.verify_integrity(), "chain must detect tampering with a stored event");
    }

    #[test]
    fn test_tampered_diff_is_detected() {
        let writer = InMemoryAuditWriter::new("run-diff");
        let mut record = make_record("cast", RecordOutcome::Validated);
        record.kind = RecordKind::FeedbackRedo;
        record.changes = vec![DiffEntry {
            path: "heroines".to_string(),
            change: DiffChange::Changed {
                old: json!([]),
                new: json!([{ "name": "Aoi" }]),
            },
        }];
        writer.write(&record).unwrap();

        {
            let mut state = writer.state.lock().unwrap();
            state.events[0].record.changes.clear();
        }
        assert!(!writer.verify_integrity());
    }

    #[test]
    fn test_genesis_hash() {
        let writer = InMemoryAuditWriter::new("run-genesis");
        writer.write(&make_record("story_core", RecordOutcome::Validated)).unwrap();

        let log = writer.export_log();
        assert_eq!(log.events.len(), 1);
        assert_eq!(log.events[0].prev_hash, AuditEvent::GENESIS_HASH);
    }

    #[test]
    fn test_sequence_monotonic() {
        let log = three_events("run-seq").export_log();
        for (idx, event) in log.events.iter().enumerate() {
            assert_eq!(event.sequence, idx as u64);
        }
    }

    #[test]
    fn test_export_log() {
        let writer = three_events("run-export");
        let log = writer.export_log();

        assert_eq!(log.run_id, "run-export");
        assert_eq!(log.events.len(), 3);
        assert_eq!(log.terminal_hash, log.events.last().unwrap().this_hash);
        assert!(!log.finalized);
        assert!(super::verify_chain(&log.events));

        let degraded: Vec<&str> = log.degraded().map(|e| e.record.agent.as_str()).collect();
        assert_eq!(degraded, vec!["world"]);
        assert_eq!(log.for_agent("cast").count(), 1);
    }

    #[test]
    fn test_verify_empty() {
        let writer = InMemoryAuditWriter::new("run-empty");
        assert!(writer.verify_integrity());
        assert!(super::verify_chain(&[]));
        assert_eq!(writer.export_log().terminal_hash, "");
    }

    /// After finalize the log is sealed against further writes.
    #[test]
    fn test_write_after_finalize_fails() {
        let writer = three_events("run-sealed");
        writer.finalize("run-sealed").unwrap();
        assert!(writer.export_log().finalized);

        let result = writer.write(&make_record("plot", RecordOutcome::Validated));
        assert!(matches!(result, Err(GalforgeError::AuditWriteFailed { .. })));
        assert_eq!(writer.records().len(), 3);
    }

    #[test]
    fn test_finalize_rejects_foreign_run_id() {
        let writer = InMemoryAuditWriter::new("run-a");
        assert!(writer.finalize("run-b").is_err());
        assert!(!writer.export_log().finalized);
    }
}
