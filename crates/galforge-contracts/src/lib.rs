//! # galforge-contracts
//!
//! Shared types, schemas, and contracts for the galforge agent runtime.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions and error types.

pub mod agent;
pub mod backend;
pub mod document;
pub mod error;
pub mod execution;
pub mod feedback;
pub mod plan;
pub mod verify;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use agent::{AgentSpec, RunId};
    use backend::{BackendRequest, GenerationConfig, Role};
    use document::Document;
    use error::GalforgeError;
    use execution::{DiffChange, DiffEntry, ExecutionResult, FallbackCause};
    use feedback::{CheckReport, Issue, Severity};
    use plan::RevisionPlan;

    // ── AgentSpec ────────────────────────────────────────────────────────────

    #[test]
    fn test_agent_spec_defaults() {
        let spec = AgentSpec::new("story_core", "system", "{{ idea }}");
        assert_eq!(spec.max_fix_rounds, 4);
        assert_eq!(spec.max_redo_rounds, 2);
        assert!(spec.required_fields.is_empty());
        assert!(spec.schema.is_none());
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_agent_spec_rejects_zero_fix_rounds() {
        let spec = AgentSpec::new("story_core", "system", "{{ idea }}").with_fix_rounds(0);
        match spec.validate() {
            Err(GalforgeError::InvalidSpec { reason }) => {
                assert!(reason.contains("max_fix_rounds"), "unexpected reason: {reason}");
            }
            other => panic!("expected InvalidSpec, got {:?}", other),
        }
    }

    #[test]
    fn test_agent_spec_deserializes_with_default_budgets() {
        let spec: AgentSpec = serde_json::from_value(json!({
            "name": "cast",
            "system_prompt": "s",
            "human_prompt_template": "h",
            "required_fields": ["heroines[].name"]
        }))
        .unwrap();
        assert_eq!(spec.max_fix_rounds, 4);
        assert_eq!(spec.max_redo_rounds, 2);
        assert_eq!(spec.required_fields, vec!["heroines[].name".to_string()]);
    }

    #[test]
    fn test_marked_fallback_sets_flag_and_keeps_content() {
        let spec = AgentSpec::new("world", "s", "h").with_fallback(json!({ "era": "modern" }));
        let marked = spec.marked_fallback();
        assert_eq!(marked["fallback"], json!(true));
        assert_eq!(marked["era"], json!("modern"));
        // The stored default itself is untouched.
        assert!(!spec.fallback.contains_key("fallback"));
    }

    // ── GenerationConfig ─────────────────────────────────────────────────────

    #[test]
    fn test_generation_config_applies_agent_overrides() {
        let global = GenerationConfig::default();
        let spec = AgentSpec::new("plot", "s", "h")
            .with_temperature(0.2)
            .with_structured_output(true);
        let resolved = global.resolve_for(&spec);
        assert_eq!(resolved.temperature, 0.2);
        assert_eq!(resolved.max_tokens, global.max_tokens);
        assert!(resolved.json_mode);
    }

    #[test]
    fn test_backend_request_new_is_system_then_user() {
        let req = BackendRequest::new("sys", "usr", GenerationConfig::default());
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, Role::System);
        assert_eq!(req.last_user_message(), Some("usr"));
    }

    // ── Severity ─────────────────────────────────────────────────────────────

    #[test]
    fn test_severity_orders_by_priority() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);

        let mut all = vec![Severity::Medium, Severity::Critical, Severity::Low, Severity::High];
        all.sort();
        assert_eq!(
            all,
            vec![Severity::Low, Severity::Medium, Severity::High, Severity::Critical]
        );
    }

    #[test]
    fn test_severity_accepts_capitalized_aliases() {
        let s: Severity = serde_json::from_value(json!("High")).unwrap();
        assert_eq!(s, Severity::High);
        let s: Severity = serde_json::from_value(json!("critical")).unwrap();
        assert_eq!(s, Severity::Critical);
    }

    #[test]
    fn test_issue_accepts_camel_case_fields() {
        let issue: Issue = serde_json::from_value(json!({
            "sourceAgent": "cast",
            "severity": "critical",
            "description": "heroines[1] missing motivation",
            "fixSuggestion": "add a motivation",
            "relatedField": "heroines[1].motivation"
        }))
        .unwrap();
        assert_eq!(issue.source_agent, "cast");
        assert_eq!(issue.related_field.as_deref(), Some("heroines[1].motivation"));
    }

    // ── CheckReport ──────────────────────────────────────────────────────────

    #[test]
    fn test_check_report_blocking_respects_threshold() {
        let report = CheckReport {
            valid: false,
            issues: vec![Issue::new("plot", Severity::Low, "minor pacing note")],
        };
        assert!(!report.is_blocking(Severity::Medium));
        assert!(report.is_blocking(Severity::Low));

        let valid = CheckReport {
            valid: true,
            issues: vec![Issue::new("plot", Severity::Critical, "ignored when valid")],
        };
        assert!(!valid.is_blocking(Severity::Low));
    }

    // ── RevisionPlan ─────────────────────────────────────────────────────────

    #[test]
    fn test_revision_plan_accepts_camel_case() {
        let plan: RevisionPlan = serde_json::from_value(json!({
            "hasIssues": true,
            "agentModifications": [
                { "agentName": "cast", "modificationInstructions": "fix heroine 2" }
            ],
            "executionOrder": ["cast"]
        }))
        .unwrap();
        assert!(plan.has_issues);
        assert!(plan.modification_for("cast").is_some());
        assert!(plan.modification_for("plot").is_none());
        assert_eq!(plan.agent_modifications[0].current_content, serde_json::Value::Null);
    }

    // ── ExecutionResult ──────────────────────────────────────────────────────

    #[test]
    fn test_execution_result_fallback_accessors() {
        let spec = AgentSpec::new("world", "s", "h").with_fallback(json!({ "era": "modern" }));
        let result = ExecutionResult::Fallback {
            output: spec.marked_fallback(),
            cause: FallbackCause::ContentFiltered {
                message: "content_filter".to_string(),
            },
            attempts: 4,
        };
        assert!(result.is_fallback());
        assert!(result.is_filtered());
        assert_eq!(result.attempts(), 4);
        assert_eq!(result.output()["fallback"], json!(true));
    }

    #[test]
    fn test_diff_entry_display_uses_change_markers() {
        let added = DiffEntry {
            path: "tone".to_string(),
            change: DiffChange::Added { new: json!("warm") },
        };
        let changed = DiffEntry {
            path: "heroines[1]".to_string(),
            change: DiffChange::Changed {
                old: json!(1),
                new: json!(2),
            },
        };
        assert_eq!(added.to_string(), "+ tone: \"warm\"");
        assert_eq!(changed.to_string(), "~ heroines[1]: 1 -> 2");
    }

    // ── Document ─────────────────────────────────────────────────────────────

    #[test]
    fn test_document_tracks_fallback_sections() {
        let mut doc = Document::new();
        let mut world = agent::JsonObject::new();
        world.insert("era".to_string(), json!("modern"));
        world.insert("fallback".to_string(), json!(true));
        let mut cast = agent::JsonObject::new();
        cast.insert("heroines".to_string(), json!([]));

        doc.insert("world", world);
        doc.insert("cast", cast);

        assert_eq!(doc.len(), 2);
        assert_eq!(doc.fallback_sections(), vec!["world"]);
        assert_eq!(doc.to_value()["cast"]["heroines"], json!([]));
    }

    // ── RunId ────────────────────────────────────────────────────────────────

    #[test]
    fn test_run_id_new_produces_unique_values() {
        let ids: std::collections::HashSet<String> =
            (0..100).map(|_| RunId::new().to_string()).collect();
        assert_eq!(ids.len(), 100);
    }

    // ── GalforgeError display messages ───────────────────────────────────────

    #[test]
    fn test_error_transport_display() {
        let err = GalforgeError::Transport {
            agent: "cast".to_string(),
            attempts: 4,
            message: "connection reset".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("cast"));
        assert!(msg.contains("4 attempt"));
        assert!(msg.contains("connection reset"));
    }

    #[test]
    fn test_error_template_display() {
        let err = GalforgeError::Template {
            agent: "plot".to_string(),
            reason: "undefined value".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("failed to render"));
        assert!(msg.contains("undefined value"));
    }

    #[test]
    fn test_error_config_error_display() {
        let err = GalforgeError::ConfigError {
            reason: "missing backend section".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("configuration error"));
        assert!(msg.contains("missing backend section"));
    }
}
