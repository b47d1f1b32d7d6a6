//! Scenario 3: content filter
//!
//! Every round is refused by the provider's moderation layer. The executor
//! backs off between rounds and, once the budget is spent, returns the
//! agent's fallback marked `fallback = true` with a `ContentFiltered` cause
//! instead of raising.

use galforge_backend::ScriptStep;
use galforge_contracts::{
    agent::PromptInputs,
    error::GalforgeResult,
    execution::{ExecutionResult, FallbackCause},
};
use serde_json::json;

use crate::catalog;
use crate::mock_data;

use super::ScriptedRuntime;

pub fn execute() -> GalforgeResult<(ScriptedRuntime, ExecutionResult)> {
    let runtime = ScriptedRuntime::new(Vec::new())?;
    let spec = runtime.config.apply_overrides(catalog::world_setting());
    runtime
        .backend
        .push((0..spec.max_fix_rounds).map(|_| ScriptStep::fail(mock_data::MODERATION_ERROR)));

    let mut inputs = PromptInputs::new();
    inputs.insert("idea".to_string(), json!(mock_data::IDEA));
    inputs.insert("story_core".to_string(), mock_data::story_core());

    let result = runtime.executor.run(&spec, &inputs)?;
    Ok((runtime, result))
}

pub fn run_scenario() -> GalforgeResult<()> {
    println!("=== Scenario 3: Content Filter ===");
    println!();

    let (runtime, result) = execute()?;

    println!("  Agent:            {}", catalog::WORLD_SETTING);
    println!("  Backend calls:    {} (all refused)", runtime.backend.call_count());
    match &result {
        ExecutionResult::Fallback { cause, .. } => {
            let label = match cause {
                FallbackCause::ContentFiltered { .. } => "content filtered",
                FallbackCause::ValidationExhausted { .. } => "validation exhausted",
            };
            println!("  Result:           FALLBACK ({label})");
            println!("  Placeholder era:  {}", result.output()["era"].as_str().unwrap_or("?"));
        }
        ExecutionResult::Validated { .. } => println!("  Result:           VALIDATED"),
    }
    println!();

    runtime.finish()?;
    println!();
    println!("  Scenario 3 complete.");
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn test_filtered_rounds_degrade_to_marked_fallback() {
        let (runtime, result) = execute().unwrap();

        assert!(result.is_filtered());
        assert_eq!(result.attempts(), 4);
        assert_eq!(runtime.backend.call_count(), 4);
        assert_eq!(result.output()["fallback"], Value::Bool(true));
        assert_eq!(result.output()["era"], json!("present day"));
    }

    #[test]
    fn test_fallback_is_audited_as_degraded() {
        let (runtime, _) = execute().unwrap();
        runtime.executor.finish().unwrap();
        let log = runtime.audit.export_log();
        assert_eq!(log.degraded().count(), 1);
        assert!(log.finalized);
        assert!(runtime.audit.verify_integrity());
    }
}
