//! Scenario 4: feedback redo
//!
//! A checker reports a critical problem with Hina's motivation in an
//! already-accepted cast. Two sub-cases share the same issue:
//!
//! - **A**: the first repair drops the field, the corrective follow-up
//!   fixes it, and the repaired cast replaces the old one.
//! - **B**: both repair attempts drop the field, so the original cast is
//!   kept untouched.

use galforge_backend::ScriptStep;
use galforge_contracts::{
    agent::JsonObject,
    error::{GalforgeError, GalforgeResult},
    feedback::Issue,
};
use serde_json::Value;

use crate::catalog;
use crate::mock_data;

use super::ScriptedRuntime;

fn issue() -> GalforgeResult<Issue> {
    serde_json::from_value(mock_data::hina_motivation_issue()).map_err(|e| GalforgeError::SchemaValidation {
        reason: format!("mock issue does not decode: {e}"),
    })
}

fn previous_cast() -> JsonObject {
    match mock_data::characters() {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}

fn redo(replies: [Value; 2]) -> GalforgeResult<(ScriptedRuntime, JsonObject)> {
    let runtime = ScriptedRuntime::new(replies.iter().map(|v| ScriptStep::reply(mock_data::compact(v))).collect())?;
    let spec = runtime.config.apply_overrides(catalog::characters());
    let output = runtime.executor.redo_with_feedback(&spec, &previous_cast(), &[issue()?])?;
    Ok((runtime, output))
}

/// Sub-case A: repaired on the corrective follow-up.
pub fn execute_repaired() -> GalforgeResult<(ScriptedRuntime, JsonObject)> {
    redo([mock_data::characters_missing_motivation(), mock_data::characters_repaired()])
}

/// Sub-case B: every attempt fails validation.
pub fn execute_exhausted() -> GalforgeResult<(ScriptedRuntime, JsonObject)> {
    redo([mock_data::characters_missing_motivation(), mock_data::characters_missing_motivation()])
}

fn hina_motivation(cast: &JsonObject) -> &str {
    cast.get("heroines")
        .and_then(|h| h.get(1))
        .and_then(|h| h.get("motivation"))
        .and_then(Value::as_str)
        .unwrap_or("<missing>")
}

pub fn run_scenario() -> GalforgeResult<()> {
    println!("=== Scenario 4: Feedback Redo ===");
    println!();
    println!("  Issue: [critical] heroines[1] motivation duplicates the stall contest subplot");
    println!("  Before: {}", hina_motivation(&previous_cast()));
    println!();

    println!("  Case A: corrective follow-up succeeds");
    let (runtime, output) = execute_repaired()?;
    println!("    Backend calls:  {}", runtime.backend.call_count());
    println!("    After:          {}", hina_motivation(&output));
    runtime.finish()?;
    println!();

    println!("  Case B: every attempt fails validation");
    let (runtime, output) = execute_exhausted()?;
    println!("    Backend calls:  {}", runtime.backend.call_count());
    println!(
        "    After:          {} ({})",
        hina_motivation(&output),
        if output == previous_cast() { "original kept" } else { "CHANGED" }
    );
    runtime.finish()?;
    println!();
    println!("  Scenario 4 complete.");
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use galforge_contracts::{
        backend::Role,
        execution::{RecordKind, RecordOutcome},
    };

    use super::*;

    #[test]
    fn test_repaired_cast_replaces_previous() {
        let (runtime, output) = execute_repaired().unwrap();

        assert_eq!(Value::Object(output), mock_data::characters_repaired());
        assert_eq!(runtime.backend.call_count(), 2);

        let records = runtime.audit.records();
        assert_eq!(records[0].kind, RecordKind::FeedbackRedo);
        assert_eq!(records[0].outcome, RecordOutcome::Validated);
        assert!(
            records[0].changes.iter().any(|c| c.path.contains("heroines")),
            "expected a diff entry for the heroines array: {:?}",
            records[0].changes
        );
    }

    #[test]
    fn test_follow_up_carries_previous_answer_and_correction() {
        let (runtime, _) = execute_repaired().unwrap();
        let follow_up = &runtime.backend.requests()[1];

        let roles: Vec<Role> = follow_up.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::System]);
        assert!(follow_up.messages[3].content.contains("heroines[1].motivation"));
    }

    #[test]
    fn test_feedback_prompt_targets_the_reported_field() {
        let (runtime, _) = execute_repaired().unwrap();
        let prompt = runtime.backend.requests()[0].last_user_message().unwrap().to_string();
        assert!(prompt.contains("heroines[1].motivation"), "{prompt}");
        assert!(prompt.contains("critical"), "{prompt}");
    }

    #[test]
    fn test_exhausted_redo_keeps_original() {
        let (runtime, output) = execute_exhausted().unwrap();

        assert_eq!(output, previous_cast());
        assert_eq!(runtime.backend.call_count(), 2);
        assert_eq!(runtime.audit.records()[0].outcome, RecordOutcome::Unchanged);
    }
}
