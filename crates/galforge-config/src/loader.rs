//! Loading `RuntimeConfig` and turning it into runtime settings.
//!
//! Configuration is passed explicitly: the binary loads one `RuntimeConfig`
//! and derives the executor settings, the consistency loop budget, and each
//! agent's effective spec from it.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use galforge_contracts::{
    agent::AgentSpec,
    backend::GenerationConfig,
    error::{GalforgeError, GalforgeResult},
    plan::ConsistencyConfig,
};
use galforge_core::{ErrorClassifier, ExecutorSettings};

use crate::schema::RuntimeConfig;

impl RuntimeConfig {
    /// Parse and validate a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `GalforgeError::ConfigError` if the TOML is malformed, has a
    /// field of the wrong type, or sets a budget to zero.
    pub fn from_toml_str(s: &str) -> GalforgeResult<Self> {
        let config: RuntimeConfig = toml::from_str(s).map_err(|e| GalforgeError::ConfigError {
            reason: format!("failed to parse galforge TOML: {e}"),
        })?;
        config.validate()?;
        debug!(
            model = %config.backend.model,
            agent_overrides = config.agents.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `GalforgeError::ConfigError` if the file cannot be read or
    /// its content is rejected by `from_toml_str`.
    pub fn from_file(path: &Path) -> GalforgeResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| GalforgeError::ConfigError {
            reason: format!("failed to read config file '{}': {e}", path.display()),
        })?;
        info!(path = %path.display(), "loading configuration file");
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> GalforgeResult<()> {
        let zero = |field: &str| GalforgeError::ConfigError {
            reason: format!("{field} must be at least 1"),
        };

        if self.retry.max_fix_rounds == 0 {
            return Err(zero("retry.max_fix_rounds"));
        }
        if self.retry.max_redo_rounds == 0 {
            return Err(zero("retry.max_redo_rounds"));
        }
        if self.consistency.revision_rounds == 0 {
            return Err(zero("consistency.revision_rounds"));
        }
        if self.backend.timeout_secs == 0 {
            return Err(zero("backend.timeout_secs"));
        }
        for (name, agent) in &self.agents {
            if agent.max_fix_rounds == Some(0) {
                return Err(zero(&format!("agents.{name}.max_fix_rounds")));
            }
            if agent.max_redo_rounds == Some(0) {
                return Err(zero(&format!("agents.{name}.max_redo_rounds")));
            }
        }
        Ok(())
    }

    /// Global generation parameters from `[backend]`.
    pub fn generation(&self) -> GenerationConfig {
        GenerationConfig {
            model: self.backend.model.clone(),
            temperature: self.backend.temperature,
            max_tokens: self.backend.max_tokens,
            timeout_secs: self.backend.timeout_secs,
            json_mode: false,
        }
    }

    /// The settings handed to `AgentExecutor::new`.
    pub fn executor_settings(&self) -> ExecutorSettings {
        ExecutorSettings {
            generation: self.generation(),
            moderation_backoff: Duration::from_millis(self.retry.moderation_backoff_ms),
            classifier: ErrorClassifier::new(&self.retry.moderation_keywords),
            max_feedback_issues: self.retry.max_feedback_issues,
            revision_rounds: self.consistency.revision_rounds,
        }
    }

    pub fn consistency(&self) -> ConsistencyConfig {
        ConsistencyConfig {
            max_rounds: self.consistency.max_rounds,
            blocking_severity: self.consistency.blocking_severity,
        }
    }

    /// Apply `[retry]` budgets, then any `[agents.<name>]` override.
    pub fn apply_overrides(&self, mut spec: AgentSpec) -> AgentSpec {
        spec.max_fix_rounds = self.retry.max_fix_rounds;
        spec.max_redo_rounds = self.retry.max_redo_rounds;

        let Some(agent) = self.agents.get(&spec.name) else {
            return spec;
        };
        debug!(agent = %spec.name, "applying agent overrides");

        if let Some(t) = agent.temperature {
            spec.temperature = Some(t);
        }
        if let Some(m) = agent.max_tokens {
            spec.max_tokens = Some(m);
        }
        if let Some(n) = agent.max_fix_rounds {
            spec.max_fix_rounds = n;
        }
        if let Some(n) = agent.max_redo_rounds {
            spec.max_redo_rounds = n;
        }
        if let Some(on) = agent.use_structured_output {
            spec.use_structured_output = on;
        }
        spec
    }

    /// Override sections naming none of `known` agents; usually a typo.
    pub fn unknown_agents<'a>(&'a self, known: &[&str]) -> Vec<&'a str> {
        self.agents
            .keys()
            .map(String::as_str)
            .filter(|name| !known.contains(name))
            .collect()
    }
}
