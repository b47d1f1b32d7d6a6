//! The two-tier story pipeline.
//!
//! The outline loop builds and checks story core and world; the full loop
//! starts from that document, adds cast and plot, and checks everything.
//! A broken outline is therefore repaired before the detail stages spend
//! any backend calls on it.

use serde_json::json;
use tracing::{info, warn};

use galforge_config::RuntimeConfig;
use galforge_consistency::{ConsistencyLoop, Convergence, ProducerStage};
use galforge_contracts::{
    agent::{AgentSpec, PromptInputs},
    document::Document,
    error::GalforgeResult,
};
use galforge_core::AgentExecutor;

use crate::catalog;

/// The result of both loops.
#[derive(Debug, Clone)]
pub struct StoryRun {
    pub outline: Convergence,
    pub full: Convergence,
}

impl StoryRun {
    pub fn document(&self) -> &Document {
        &self.full.document
    }

    /// Revisions applied across both loops.
    pub fn revisions_applied(&self) -> usize {
        self.outline
            .revisions
            .iter()
            .chain(&self.full.revisions)
            .filter(|r| r.applied)
            .count()
    }
}

pub fn generate_story(executor: &AgentExecutor, config: &RuntimeConfig, idea: &str) -> GalforgeResult<StoryRun> {
    for name in config.unknown_agents(catalog::ALL_AGENTS) {
        warn!(agent = %name, "configuration overrides an agent the catalog does not define");
    }

    let mut inputs = PromptInputs::new();
    inputs.insert("idea".to_string(), json!(idea));

    let configure = |stages: Vec<ProducerStage>| -> Vec<ProducerStage> {
        stages
            .into_iter()
            .map(|mut s| {
                s.spec = config.apply_overrides(s.spec);
                s
            })
            .collect()
    };
    let spec = |s: AgentSpec| config.apply_overrides(s);
    let planner = spec(catalog::revision_planner());

    info!(run_id = %executor.run_id(), "outline phase");
    let outline = ConsistencyLoop::new(
        executor,
        spec(catalog::outline_checker()),
        planner.clone(),
        config.consistency(),
    )
    .converge(&configure(catalog::outline_stages()), Document::new(), &inputs)?;

    info!(run_id = %executor.run_id(), "full document phase");
    let full = ConsistencyLoop::new(executor, spec(catalog::consistency_checker()), planner, config.consistency())
        .converge(&configure(catalog::full_stages()), outline.document.clone(), &inputs)?;

    Ok(StoryRun { outline, full })
}
