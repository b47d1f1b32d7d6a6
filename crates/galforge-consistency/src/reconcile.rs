//! Reconciling a planner's execution order with its modifications.
//!
//! The two lists come from one LLM response and routinely disagree. Only
//! agents present in both, and known to the pipeline, are revised. Every
//! dropped entry is logged at warn.

use std::collections::HashSet;

use tracing::warn;

use galforge_contracts::plan::{AgentModification, RevisionPlan};

/// The plan steps that will actually run, in execution order.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled<'p> {
    pub steps: Vec<&'p AgentModification>,
    /// Agent names that were discarded, each at most once.
    pub dropped: Vec<String>,
}

impl Reconciled<'_> {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

pub fn reconcile<'p>(plan: &'p RevisionPlan, known_agents: &[&str]) -> Reconciled<'p> {
    let mut steps = Vec::new();
    let mut dropped: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    let mut discard = |name: &str| {
        if !dropped.iter().any(|d| d == name) {
            dropped.push(name.to_string());
        }
    };

    for name in &plan.execution_order {
        if !seen.insert(name.as_str()) {
            warn!(agent = %name, "agent listed twice in execution order, keeping the first");
            continue;
        }
        if !known_agents.contains(&name.as_str()) {
            warn!(agent = %name, "execution order names an unknown agent, dropping it");
            discard(name);
            continue;
        }
        match plan.modification_for(name) {
            Some(modification) => steps.push(modification),
            None => {
                warn!(agent = %name, "execution order names an agent with no modification, dropping it");
                discard(name);
            }
        }
    }

    for modification in &plan.agent_modifications {
        if !seen.contains(modification.agent_name.as_str()) {
            warn!(
                agent = %modification.agent_name,
                "modification is missing from the execution order, dropping it"
            );
            discard(&modification.agent_name);
        }
    }

    Reconciled { steps, dropped }
}
