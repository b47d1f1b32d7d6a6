//! Scenario 2: repair round
//!
//! The first answer only has `genre`. Validation names the four missing
//! fields, round 1 sends a repair prompt quoting that reason and the
//! required-field list, and the second answer is accepted.

use galforge_backend::ScriptStep;
use galforge_contracts::{agent::PromptInputs, error::GalforgeResult, execution::ExecutionResult};
use serde_json::json;

use crate::catalog;
use crate::mock_data;

use super::ScriptedRuntime;

pub fn execute() -> GalforgeResult<(ScriptedRuntime, ExecutionResult)> {
    let runtime = ScriptedRuntime::new(vec![
        ScriptStep::reply(mock_data::story_core_partial()),
        ScriptStep::reply(mock_data::compact(&mock_data::story_core())),
    ])?;

    let mut inputs = PromptInputs::new();
    inputs.insert("idea".to_string(), json!(mock_data::IDEA));

    let spec = runtime.config.apply_overrides(catalog::story_core());
    let result = runtime.executor.run(&spec, &inputs)?;
    Ok((runtime, result))
}

pub fn run_scenario() -> GalforgeResult<()> {
    println!("=== Scenario 2: Repair Round ===");
    println!();

    let (runtime, result) = execute()?;
    let requests = runtime.backend.requests();

    println!("  Round 0 answer:   {}", mock_data::story_core_partial());
    if let Some(repair) = requests.get(1).and_then(|r| r.last_user_message()) {
        let first_line = repair.lines().next().unwrap_or_default();
        println!("  Round 1 prompt:   {first_line}");
    }
    println!("  Backend calls:    {}", runtime.backend.call_count());
    println!(
        "  Result:           {} after {} attempt(s)",
        if result.is_fallback() { "FALLBACK" } else { "VALIDATED" },
        result.attempts()
    );
    println!();

    runtime.finish()?;
    println!();
    println!("  Scenario 2 complete.");
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use galforge_contracts::backend::Role;
    use galforge_core::prompt::REPAIR_SYSTEM_PROMPT;

    use super::*;

    #[test]
    fn test_second_round_is_accepted() {
        let (runtime, result) = execute().unwrap();
        assert!(!result.is_fallback());
        assert_eq!(result.attempts(), 2);
        assert_eq!(runtime.backend.call_count(), 2);
    }

    #[test]
    fn test_repair_prompt_names_every_missing_field() {
        let (runtime, _) = execute().unwrap();
        let repair = &runtime.backend.requests()[1];

        assert_eq!(repair.messages[0].role, Role::System);
        assert_eq!(repair.messages[0].content, REPAIR_SYSTEM_PROMPT);
        let prompt = repair.last_user_message().unwrap();
        assert!(
            prompt.contains("missing required fields: themes, tone, must_have, forbidden"),
            "{prompt}"
        );
    }

    #[test]
    fn test_audit_records_one_validated_generation() {
        let (runtime, _) = execute().unwrap();
        let records = runtime.audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].attempts, 2);
    }
}
