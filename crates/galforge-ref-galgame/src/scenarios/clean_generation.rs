//! Scenario 1: clean generation
//!
//! The story core agent answers with a fenced but otherwise perfect JSON
//! object. Extraction strips the fence, validation passes on round 0, and
//! the object comes back unchanged after a single backend call.

use galforge_backend::ScriptStep;
use galforge_contracts::{agent::PromptInputs, error::GalforgeResult, execution::ExecutionResult};
use serde_json::{json, Value};

use crate::catalog;
use crate::mock_data;

use super::ScriptedRuntime;

pub fn execute() -> GalforgeResult<(ScriptedRuntime, ExecutionResult)> {
    let runtime = ScriptedRuntime::new(vec![ScriptStep::reply(mock_data::story_core_fenced())])?;

    let mut inputs = PromptInputs::new();
    inputs.insert("idea".to_string(), json!(mock_data::IDEA));

    let spec = runtime.config.apply_overrides(catalog::story_core());
    let result = runtime.executor.run(&spec, &inputs)?;
    Ok((runtime, result))
}

pub fn run_scenario() -> GalforgeResult<()> {
    println!("=== Scenario 1: Clean Generation ===");
    println!();

    let (runtime, result) = execute()?;

    println!("  Agent:            {}", catalog::STORY_CORE);
    println!("  Backend calls:    {}", runtime.backend.call_count());
    println!(
        "  Result:           {}",
        if result.is_fallback() { "FALLBACK" } else { "VALIDATED" }
    );
    println!("  Genre:            {}", result.output()["genre"].as_str().unwrap_or("?"));
    println!(
        "  Themes:           {}",
        result.output()["themes"]
            .as_array()
            .map(|t| t.iter().filter_map(Value::as_str).collect::<Vec<_>>().join(", "))
            .unwrap_or_default()
    );
    println!();

    runtime.finish()?;
    println!();
    println!("  Scenario 1 complete.");
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_output_is_accepted_on_round_zero() {
        let (runtime, result) = execute().unwrap();

        assert_eq!(result.attempts(), 1);
        assert!(!result.is_fallback());
        assert_eq!(Value::Object(result.into_output()), mock_data::story_core());
        assert_eq!(runtime.backend.call_count(), 1);
    }

    #[test]
    fn test_prompt_carries_the_idea() {
        let (runtime, _) = execute().unwrap();
        let prompt = runtime.backend.requests()[0].last_user_message().unwrap().to_string();
        assert!(prompt.contains("summer festival romance"), "{prompt}");
    }

    #[test]
    fn test_run_scenario_completes() {
        assert!(run_scenario().is_ok());
    }
}
