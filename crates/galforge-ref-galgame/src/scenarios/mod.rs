//! Scripted walk-throughs of the executor and the consistency loop.
//!
//! Each scenario wires the real executor, validator, and audit writer to a
//! `ScriptedBackend` loaded with canned responses from `mock_data`, prints
//! what happened, and returns an error if the runtime misbehaved.

use std::sync::Arc;

use galforge_audit::InMemoryAuditWriter;
use galforge_backend::{ScriptStep, ScriptedBackend};
use galforge_config::RuntimeConfig;
use galforge_contracts::{agent::RunId, error::GalforgeResult};
use galforge_core::AgentExecutor;
use galforge_verify::SchemaValidator;

pub mod clean_generation;
pub mod consistency_loop;
pub mod content_filter;
pub mod feedback_redo;
pub mod repair_round;

const SCRIPTED_CONFIG: &str = include_str!("../../config/scripted.toml");

/// Executor plus the handles a scenario inspects afterwards.
pub struct ScriptedRuntime {
    pub backend: Arc<ScriptedBackend>,
    pub audit: Arc<InMemoryAuditWriter>,
    pub config: RuntimeConfig,
    pub executor: AgentExecutor,
}

impl ScriptedRuntime {
    pub fn new(steps: Vec<ScriptStep>) -> GalforgeResult<Self> {
        let config = RuntimeConfig::from_toml_str(SCRIPTED_CONFIG)?;
        let run_id = RunId::new();
        let backend = Arc::new(ScriptedBackend::new(steps));
        let audit = Arc::new(InMemoryAuditWriter::new(run_id.to_string()));

        let executor = AgentExecutor::new(
            Box::new(Arc::clone(&backend)),
            Box::new(SchemaValidator::new()),
            Box::new(Arc::clone(&audit)),
            config.executor_settings(),
        )
        .with_run_id(run_id);

        Ok(Self {
            backend,
            audit,
            config,
            executor,
        })
    }

    /// Seal the audit log and print its integrity line.
    pub fn finish(&self) -> GalforgeResult<()> {
        self.executor.finish()?;
        let log = self.audit.export_log();
        println!(
            "  Audit chain integrity:  {} ({} event(s), {} degraded)",
            if self.audit.verify_integrity() { "VERIFIED" } else { "FAILED" },
            log.events.len(),
            log.degraded().count()
        );
        Ok(())
    }
}
