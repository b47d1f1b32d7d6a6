//! JSON Schemas for checker reports and revision plans.
//!
//! The loop decodes checker and planner output into typed values. Attaching
//! these schemas to the checker and planner specs moves every decode
//! failure into validation, where the executor can still spend a repair
//! round on it. Field names accept both snake_case and camelCase, matching
//! the serde aliases on the contract types.

use serde_json::{json, Value};

use galforge_contracts::verify::OutputSchema;

pub const CHECK_REPORT_SCHEMA_ID: &str = "check-report-v1";
pub const REVISION_PLAN_SCHEMA_ID: &str = "revision-plan-v1";

/// Every spelling `Severity` deserializes from.
const SEVERITY_VALUES: &[&str] = &[
    "low", "Low", "LOW", "minor",
    "medium", "Medium", "MEDIUM", "moderate",
    "high", "High", "HIGH", "major",
    "critical", "Critical", "CRITICAL", "blocker",
];

/// `{"required": [snake]}` or `{"required": [camel]}`.
fn required_either(snake: &str, camel: &str) -> Value {
    json!({ "anyOf": [{ "required": [snake] }, { "required": [camel] }] })
}

fn string_properties(names: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = names
        .iter()
        .map(|n| (n.to_string(), json!({ "type": "string" })))
        .collect();
    Value::Object(properties)
}

/// Schema for a `CheckReport`.
pub fn check_report_schema() -> OutputSchema {
    let mut properties = string_properties(&["source_agent", "sourceAgent", "description"]);
    properties["severity"] = json!({ "enum": SEVERITY_VALUES });
    properties["fix_suggestion"] = json!({ "type": "string" });
    properties["fixSuggestion"] = json!({ "type": "string" });
    properties["related_field"] = json!({ "type": ["string", "null"] });
    properties["relatedField"] = json!({ "type": ["string", "null"] });

    OutputSchema::new(
        CHECK_REPORT_SCHEMA_ID,
        json!({
            "type": "object",
            "required": ["valid"],
            "properties": {
                "valid": { "type": "boolean" },
                "issues": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["severity", "description"],
                        "allOf": [required_either("source_agent", "sourceAgent")],
                        "properties": properties
                    }
                }
            }
        }),
    )
}

/// Schema for a `RevisionPlan`.
pub fn revision_plan_schema() -> OutputSchema {
    let properties = string_properties(&[
        "agent_name",
        "agentName",
        "modification_instructions",
        "modificationInstructions",
        "context_from_other_agents",
        "contextFromOtherAgents",
    ]);
    let modification = json!({
        "type": "object",
        "allOf": [
            required_either("agent_name", "agentName"),
            required_either("modification_instructions", "modificationInstructions")
        ],
        "properties": properties
    });
    let order = json!({ "type": "array", "items": { "type": "string" } });

    OutputSchema::new(
        REVISION_PLAN_SCHEMA_ID,
        json!({
            "type": "object",
            "allOf": [required_either("has_issues", "hasIssues")],
            "properties": {
                "has_issues": { "type": "boolean" },
                "hasIssues": { "type": "boolean" },
                "agent_modifications": { "type": "array", "items": modification },
                "agentModifications": { "type": "array", "items": modification },
                "execution_order": order,
                "executionOrder": order
            }
        }),
    )
}

#[cfg(test)]
mod tests {
    use galforge_contracts::{feedback::CheckReport, plan::RevisionPlan};

    use super::*;

    fn conforms(schema: &OutputSchema, value: &Value) -> bool {
        jsonschema::validator_for(&schema.json_schema)
            .unwrap()
            .is_valid(value)
    }

    #[test]
    fn test_report_schema_accepts_what_decodes() {
        let report = json!({
            "valid": false,
            "issues": [
                { "source_agent": "characters", "severity": "high", "description": "a" },
                { "sourceAgent": "world_setting", "severity": "MINOR", "description": "b", "relatedField": "era" }
            ]
        });
        // "MINOR" is not an accepted spelling.
        assert!(!conforms(&check_report_schema(), &report));

        let mut fixed = report.clone();
        fixed["issues"][1]["severity"] = json!("minor");
        assert!(conforms(&check_report_schema(), &fixed));
        assert!(serde_json::from_value::<CheckReport>(fixed).is_ok());
    }

    #[test]
    fn test_report_schema_rejects_undecodable_reports() {
        let schema = check_report_schema();
        for bad in [
            json!({ "valid": "false", "issues": [] }),
            json!({ "valid": false, "issues": [{ "source_agent": "a", "severity": "severe", "description": "x" }] }),
            json!({ "valid": false, "issues": [{ "severity": "high", "description": "x" }] }),
            json!({ "valid": false, "issues": [{ "source_agent": "a", "severity": "high" }] }),
        ] {
            assert!(!conforms(&schema, &bad), "accepted {bad}");
            assert!(serde_json::from_value::<CheckReport>(bad).is_err());
        }
    }

    #[test]
    fn test_plan_schema_requires_instructions() {
        let schema = revision_plan_schema();
        let plan = json!({
            "hasIssues": true,
            "agentModifications": [{ "agentName": "characters", "modificationInstructions": "fix Aoi" }],
            "executionOrder": ["characters"]
        });
        assert!(conforms(&schema, &plan));
        assert!(serde_json::from_value::<RevisionPlan>(plan).is_ok());

        let missing = json!({
            "has_issues": true,
            "agent_modifications": [{ "agent_name": "characters" }]
        });
        assert!(!conforms(&schema, &missing));
        assert!(serde_json::from_value::<RevisionPlan>(missing).is_err());

        assert!(!conforms(&schema, &json!({ "has_issues": "yes" })));
        assert!(!conforms(&schema, &json!({ "agent_modifications": [] })));
    }
}
