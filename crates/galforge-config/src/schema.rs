//! Configuration schema.
//!
//! A `RuntimeConfig` is deserialized from TOML. Every section and field has
//! a default, so an empty file is a valid configuration.
//!
//! Example:
//! ```toml
//! [backend]
//! base_url = "https://api.openai.com/v1"
//! model = "gpt-4o-mini"
//! api_key_env = "OPENAI_API_KEY"
//!
//! [retry]
//! max_fix_rounds = 4
//! moderation_keywords = ["content_filter", "moderation"]
//!
//! [consistency]
//! max_rounds = 3
//! blocking_severity = "high"
//!
//! [agents.cast]
//! temperature = 0.9
//! max_fix_rounds = 6
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use galforge_contracts::{
    agent::{DEFAULT_MAX_FIX_ROUNDS, DEFAULT_MAX_REDO_ROUNDS},
    feedback::Severity,
    plan::DEFAULT_MAX_CONSISTENCY_ROUNDS,
};
use galforge_core::{
    classify::DEFAULT_MODERATION_KEYWORDS,
    executor::{DEFAULT_MAX_FEEDBACK_ISSUES, DEFAULT_REVISION_ROUNDS},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub backend: BackendSection,
    pub retry: RetrySection,
    pub consistency: ConsistencySection,
    /// Per-agent overrides keyed by agent name.
    pub agents: BTreeMap<String, AgentOverride>,
}

/// `[backend]`: how to reach the generative backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    /// Base URL of an OpenAI-compatible API; `/chat/completions` is appended.
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key. The binary
    /// reads it; the library never touches the environment.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 120,
            temperature: 0.7,
            max_tokens: 4096,
        }
    }
}

/// `[retry]`: budgets shared by every agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub max_fix_rounds: u32,
    pub max_redo_rounds: u32,
    pub moderation_backoff_ms: u64,
    /// Substrings that mark a backend error as a moderation refusal.
    pub moderation_keywords: Vec<String>,
    pub max_feedback_issues: usize,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_fix_rounds: DEFAULT_MAX_FIX_ROUNDS,
            max_redo_rounds: DEFAULT_MAX_REDO_ROUNDS,
            moderation_backoff_ms: 1_000,
            moderation_keywords: DEFAULT_MODERATION_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            max_feedback_issues: DEFAULT_MAX_FEEDBACK_ISSUES,
        }
    }
}

/// `[consistency]`: the consistency loop's budgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencySection {
    pub max_rounds: u32,
    /// Backend calls allowed per planner-directed section revision.
    pub revision_rounds: u32,
    pub blocking_severity: Severity,
}

impl Default for ConsistencySection {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_CONSISTENCY_ROUNDS,
            revision_rounds: DEFAULT_REVISION_ROUNDS,
            blocking_severity: Severity::Medium,
        }
    }
}

/// `[agents.<name>]`: overrides for one agent. Unset fields keep the
/// agent's own value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentOverride {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub max_fix_rounds: Option<u32>,
    pub max_redo_rounds: Option<u32>,
    pub use_structured_output: Option<bool>,
}
