//! Revision plans produced by the planner agent.
//!
//! The planner is itself an LLM call, so a `RevisionPlan` is untrusted
//! input: the consistency loop reconciles `execution_order` against
//! `agent_modifications` before acting on it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::feedback::Severity;

pub const DEFAULT_MAX_CONSISTENCY_ROUNDS: u32 = 3;

/// Budget and threshold for one consistency loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyConfig {
    /// Repair rounds allowed after the initial check.
    pub max_rounds: u32,
    /// Issues below this severity never trigger a repair round.
    pub blocking_severity: Severity,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_CONSISTENCY_ROUNDS,
            blocking_severity: Severity::Medium,
        }
    }
}

/// The planner's repair directions for one consistency round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionPlan {
    /// When false the loop terminates immediately.
    #[serde(alias = "hasIssues")]
    pub has_issues: bool,
    #[serde(default, alias = "agentModifications")]
    pub agent_modifications: Vec<AgentModification>,
    /// Agent names in the order their repairs run.
    #[serde(default, alias = "executionOrder")]
    pub execution_order: Vec<String>,
}

impl RevisionPlan {
    /// A plan with nothing to do.
    pub fn declined() -> Self {
        Self {
            has_issues: false,
            agent_modifications: Vec::new(),
            execution_order: Vec::new(),
        }
    }

    pub fn modification_for(&self, agent_name: &str) -> Option<&AgentModification> {
        self.agent_modifications
            .iter()
            .find(|m| m.agent_name == agent_name)
    }
}

/// Repair directions for one agent's section of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentModification {
    #[serde(alias = "agentName")]
    pub agent_name: String,
    /// The planner's view of the section being repaired.
    #[serde(default, alias = "currentContent")]
    pub current_content: Value,
    #[serde(alias = "modificationInstructions")]
    pub modification_instructions: String,
    /// Free-text hints naming other sections relevant to this repair.
    #[serde(default, alias = "contextFromOtherAgents")]
    pub context_from_other_agents: String,
    #[serde(default, alias = "expectedOutcome", skip_serializing_if = "Option::is_none")]
    pub expected_outcome: Option<String>,
}

/// A section of another agent's output quoted into a revision prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnippet {
    pub section: String,
    pub content: Value,
}

/// Everything the executor needs to run one global revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionRequest {
    pub instructions: String,
    pub expected_outcome: Option<String>,
    pub context: Vec<ContextSnippet>,
}

impl RevisionRequest {
    pub fn from_modification(modification: &AgentModification, context: Vec<ContextSnippet>) -> Self {
        Self {
            instructions: modification.modification_instructions.clone(),
            expected_outcome: modification.expected_outcome.clone(),
            context,
        }
    }
}
