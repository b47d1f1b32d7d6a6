//! Agent identity and static configuration types.
//!
//! An agent is data, not code: one `AgentSpec` value carries the prompt
//! templates, the validation contract, the retry budgets, and the safe
//! default an agent degrades to. The executor interprets every spec the same
//! way.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    error::{GalforgeError, GalforgeResult},
    verify::OutputSchema,
};

/// A structured agent output: field name to arbitrarily nested value.
pub type JsonObject = Map<String, Value>;

/// Named values substituted into an agent's human prompt template.
pub type PromptInputs = Map<String, Value>;

/// Unique identifier for one pipeline run.
///
/// Every audit record written by an executor belongs to the run this
/// UUID identifies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub uuid::Uuid);

impl RunId {
    /// Create a new, unique run ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

pub const DEFAULT_MAX_FIX_ROUNDS: u32 = 4;
pub const DEFAULT_MAX_REDO_ROUNDS: u32 = 2;

fn default_max_fix_rounds() -> u32 {
    DEFAULT_MAX_FIX_ROUNDS
}

fn default_max_redo_rounds() -> u32 {
    DEFAULT_MAX_REDO_ROUNDS
}

/// Static configuration for one agent.
///
/// Built once when the agent is registered and never mutated afterwards;
/// configuration overrides produce a new value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Identifier used in logs and for matching repair feedback to its source.
    pub name: String,
    /// System prompt sent verbatim on every fresh-generation round.
    pub system_prompt: String,
    /// Human prompt with `{{ placeholder }}` slots filled from `PromptInputs`.
    pub human_prompt_template: String,
    /// Paths that must be present and non-empty in a successful output.
    ///
    /// Supports `a.b`, `list[2].field`, and `list[].field` (every element).
    #[serde(default)]
    pub required_fields: Vec<String>,
    /// Optional deep schema checked after the required fields pass.
    #[serde(default)]
    pub schema: Option<OutputSchema>,
    /// Ask the backend to constrain its output to a JSON object.
    #[serde(default)]
    pub use_structured_output: bool,
    /// Total backend calls allowed for one `run()`, round 0 included.
    #[serde(default = "default_max_fix_rounds")]
    pub max_fix_rounds: u32,
    /// Backend calls allowed for one feedback repair.
    #[serde(default = "default_max_redo_rounds")]
    pub max_redo_rounds: u32,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Safe default returned, marked `fallback = true`, when generation is
    /// exhausted or filtered.
    #[serde(default)]
    pub fallback: JsonObject,
}

impl AgentSpec {
    /// Create a spec with default budgets and no validation contract.
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        human_prompt_template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            human_prompt_template: human_prompt_template.into(),
            required_fields: Vec::new(),
            schema: None,
            use_structured_output: false,
            max_fix_rounds: DEFAULT_MAX_FIX_ROUNDS,
            max_redo_rounds: DEFAULT_MAX_REDO_ROUNDS,
            temperature: None,
            max_tokens: None,
            fallback: JsonObject::new(),
        }
    }

    pub fn with_required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_schema(mut self, schema: OutputSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_structured_output(mut self, enabled: bool) -> Self {
        self.use_structured_output = enabled;
        self
    }

    pub fn with_fix_rounds(mut self, rounds: u32) -> Self {
        self.max_fix_rounds = rounds;
        self
    }

    pub fn with_redo_rounds(mut self, rounds: u32) -> Self {
        self.max_redo_rounds = rounds;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the safe default. Non-object values are ignored.
    pub fn with_fallback(mut self, fallback: Value) -> Self {
        if let Value::Object(map) = fallback {
            self.fallback = map;
        }
        self
    }

    /// Check the construction invariants.
    ///
    /// Both budgets must allow at least one backend call.
    pub fn validate(&self) -> GalforgeResult<()> {
        if self.name.trim().is_empty() {
            return Err(GalforgeError::InvalidSpec {
                reason: "agent name must not be empty".to_string(),
            });
        }
        if self.max_fix_rounds == 0 {
            return Err(GalforgeError::InvalidSpec {
                reason: format!("agent '{}' has max_fix_rounds = 0", self.name),
            });
        }
        if self.max_redo_rounds == 0 {
            return Err(GalforgeError::InvalidSpec {
                reason: format!("agent '{}' has max_redo_rounds = 0", self.name),
            });
        }
        Ok(())
    }

    /// The fallback object with the `fallback = true` marker applied.
    pub fn marked_fallback(&self) -> JsonObject {
        let mut output = self.fallback.clone();
        output.insert("fallback".to_string(), Value::Bool(true));
        output
    }
}
