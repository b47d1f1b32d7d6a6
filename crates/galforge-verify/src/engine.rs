//! Schema-based output validator for the galforge runtime.
//!
//! `SchemaValidator` implements the `Validator` trait from `galforge-core`.
//! Validation runs in two tiers:
//!
//! 1. **Required fields**: each path in `AgentSpec::required_fields` is
//!    resolved against the output. If anything is missing the output is
//!    rejected with one reason naming every missing path, and tier 2 is
//!    skipped.
//! 2. **Schema**: when the `AgentSpec` carries an `OutputSchema`, the output is
//!    validated against its JSON Schema document and then against each
//!    `ValidationRule`. All failures are collected into one reason.
//!
//! Reasons are written for the backend: they are pasted verbatim into the
//! next repair prompt.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use galforge_contracts::{
    agent::{AgentSpec, JsonObject},
    error::{GalforgeError, GalforgeResult},
    verify::{OutputSchema, RuleType, ValidationOutcome},
};
use galforge_core::traits::Validator;

use crate::path;

/// A caller-supplied validation function.
///
/// Receives the full agent output. Returns `Some(message)` when the check
/// fails, or `None` on success.
pub type CustomRuleFn = Box<dyn Fn(&JsonObject) -> Option<String> + Send + Sync>;

/// The galforge output validator.
///
/// Domain-specific checks are registered by name at startup and referenced
/// from `RuleType::Custom` rules.
pub struct SchemaValidator {
    custom_rules: HashMap<String, CustomRuleFn>,
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self {
            custom_rules: HashMap::new(),
        }
    }

    /// Register a custom validation function under `name`.
    ///
    /// Registering the same name twice replaces the previous function.
    pub fn register_rule(&mut self, name: impl Into<String>, f: CustomRuleFn) {
        self.custom_rules.insert(name.into(), f);
    }

    /// Tier 1. Returns every missing concrete path, in declaration order.
    fn missing_fields(root: &Value, required: &[String]) -> Vec<String> {
        let mut missing = Vec::new();
        for field in required {
            for path in path::missing(root, field) {
                if !missing.contains(&path) {
                    missing.push(path);
                }
            }
        }
        missing
    }

    /// Tier 2. Returns one line per violation.
    fn schema_violations(
        &self,
        output: &JsonObject,
        root: &Value,
        schema: &OutputSchema,
    ) -> GalforgeResult<Vec<String>> {
        let mut violations = Vec::new();

        // A null json_schema means no structural constraint.
        if !schema.json_schema.is_null() {
            let validator = jsonschema::validator_for(&schema.json_schema).map_err(|e| {
                GalforgeError::SchemaValidation {
                    reason: format!("schema '{}' is not a valid JSON Schema: {e}", schema.schema_id),
                }
            })?;
            for error in validator.iter_errors(root) {
                let location = error.instance_path.to_string();
                let location = if location.is_empty() { "(root)".to_string() } else { location };
                violations.push(format!("{location}: {error}"));
            }
        }

        for rule in &schema.rules {
            debug!(rule_id = %rule.rule_id, description = %rule.description, "evaluating rule");

            match &rule.rule_type {
                // ── AllowedValues ────────────────────────────────────────────
                RuleType::AllowedValues { field_path, allowed } => {
                    let found = path::resolve(root, field_path);
                    if found.is_empty() {
                        violations.push(format!("{field_path}: missing; expected one of {}", list(allowed)));
                    }
                    for (at, actual) in found {
                        if !allowed.contains(actual) {
                            violations.push(format!("{at}: expected one of {}, got {actual}", list(allowed)));
                        }
                    }
                }

                // ── NumberRange ──────────────────────────────────────────────
                RuleType::NumberRange { field_path, min, max } => {
                    let found = path::resolve(root, field_path);
                    if found.is_empty() {
                        violations.push(format!("{field_path}: missing; expected a number"));
                    }
                    for (at, actual) in found {
                        match actual.as_f64() {
                            None => violations.push(format!("{at}: expected a number, got {actual}")),
                            Some(n) => {
                                if min.is_some_and(|lo| n < lo) || max.is_some_and(|hi| n > hi) {
                                    violations.push(format!(
                                        "{at}: expected a number in {}, got {n}",
                                        range(*min, *max)
                                    ));
                                }
                            }
                        }
                    }
                }

                // ── MinItems ─────────────────────────────────────────────────
                RuleType::MinItems { field_path, min } => {
                    let found = path::resolve(root, field_path);
                    if found.is_empty() {
                        violations.push(format!("{field_path}: missing; expected at least {min} item(s)"));
                    }
                    for (at, actual) in found {
                        match actual.as_array() {
                            Some(items) if items.len() >= *min => {}
                            Some(items) => violations.push(format!(
                                "{at}: expected at least {min} item(s), got {}",
                                items.len()
                            )),
                            None => violations.push(format!("{at}: expected an array, got {actual}")),
                        }
                    }
                }

                // ── Custom ───────────────────────────────────────────────────
                // An unregistered name is a configuration bug, not an output
                // defect, so it is raised rather than fed to a repair round.
                RuleType::Custom { function_name } => {
                    let f = self.custom_rules.get(function_name.as_str()).ok_or_else(|| {
                        GalforgeError::SchemaValidation {
                            reason: format!(
                                "rule '{}' references unregistered function '{function_name}'",
                                rule.rule_id
                            ),
                        }
                    })?;
                    if let Some(message) = f(output) {
                        violations.push(format!("{}: {message}", rule.rule_id));
                    }
                }
            }
        }

        Ok(violations)
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn list(values: &[Value]) -> String {
    let items: Vec<String> = values.iter().map(Value::to_string).collect();
    format!("[{}]", items.join(", "))
}

fn range(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(lo), Some(hi)) => format!("[{lo}, {hi}]"),
        (Some(lo), None) => format!("[{lo}, ∞)"),
        (None, Some(hi)) => format!("(-∞, {hi}]"),
        (None, None) => "(-∞, ∞)".to_string(),
    }
}

impl Validator for SchemaValidator {
    fn validate(&self, output: &JsonObject, spec: &AgentSpec) -> GalforgeResult<ValidationOutcome> {
        let root = Value::Object(output.clone());

        let missing = Self::missing_fields(&root, &spec.required_fields);
        if !missing.is_empty() {
            let reason = if missing.len() == 1 {
                format!("missing required field: {}", missing[0])
            } else {
                format!("missing required fields: {}", missing.join(", "))
            };
            warn!(agent = %spec.name, %reason, "required field check failed");
            return Ok(ValidationOutcome::Invalid { reason });
        }

        let Some(schema) = &spec.schema else {
            return Ok(ValidationOutcome::Valid);
        };

        let violations = self.schema_violations(output, &root, schema)?;
        debug!(
            agent = %spec.name,
            schema_id = %schema.schema_id,
            violation_count = violations.len(),
            "schema check complete"
        );

        if violations.is_empty() {
            return Ok(ValidationOutcome::Valid);
        }

        let reason = format!(
            "schema '{}' found {} violation(s):\n- {}",
            schema.schema_id,
            violations.len(),
            violations.join("\n- ")
        );
        warn!(agent = %spec.name, %reason, "schema check failed");
        Ok(ValidationOutcome::Invalid { reason })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
