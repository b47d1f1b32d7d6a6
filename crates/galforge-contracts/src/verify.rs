//! Validation schema and outcome types.
//!
//! Every agent output is checked against its spec's required fields and,
//! when present, an `OutputSchema` before it is accepted. The outcome is a
//! human-readable reason rather than a structured error list because the
//! reason is pasted straight into the next repair prompt.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The deep validation contract for one agent's output.
///
/// Combines a JSON Schema document with declarative rules that go beyond
/// what the structural check expresses conveniently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSchema {
    /// Unique identifier for this schema (e.g. "cast-v1").
    pub schema_id: String,
    /// JSON Schema document. `Value::Null` means no structural constraint.
    #[serde(default)]
    pub json_schema: Value,
    /// Additional rules evaluated after structural validation.
    #[serde(default)]
    pub rules: Vec<ValidationRule>,
}

impl OutputSchema {
    pub fn new(schema_id: impl Into<String>, json_schema: Value) -> Self {
        Self {
            schema_id: schema_id.into(),
            json_schema,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// A single declarative rule applied to an agent output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Identifier referenced in failure reasons.
    pub rule_id: String,
    pub description: String,
    pub rule_type: RuleType,
}

impl ValidationRule {
    pub fn new(rule_id: impl Into<String>, description: impl Into<String>, rule_type: RuleType) -> Self {
        Self {
            rule_id: rule_id.into(),
            description: description.into(),
            rule_type,
        }
    }
}

/// Rule kinds the validator understands.
///
/// Paths use the same syntax as required fields; a `[]` segment applies the
/// rule to every element of the array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RuleType {
    /// The value at `field_path` must equal one of `allowed`.
    AllowedValues {
        field_path: String,
        allowed: Vec<Value>,
    },

    /// The number at `field_path` must lie within the inclusive bounds.
    NumberRange {
        field_path: String,
        min: Option<f64>,
        max: Option<f64>,
    },

    /// The array at `field_path` must hold at least `min` elements.
    MinItems { field_path: String, min: usize },

    /// Delegate to a function registered on the validator by name.
    Custom { function_name: String },
}

/// Result of validating one output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    Valid,
    Invalid { reason: String },
}

impl ValidationOutcome {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}
