//! Scenario 5: consistency loop
//!
//! The full two-tier pipeline against a scripted backend:
//!
//! 1. outline phase: story core and world are built, the outline checker
//!    finds nothing
//! 2. full phase: cast and plot are built, the consistency checker reports
//!    a missing shrine and a closed lighthouse
//! 3. the planner's execution order names `characters` without giving it a
//!    modification; that entry is dropped and only world and plot are
//!    revised
//! 4. the re-check is clean and the loop converges

use galforge_backend::ScriptStep;
use galforge_contracts::error::GalforgeResult;

use crate::mock_data;
use crate::pipeline::{generate_story, StoryRun};

use super::ScriptedRuntime;

fn script() -> Vec<ScriptStep> {
    let reply = |v: serde_json::Value| ScriptStep::reply(mock_data::compact(&v));
    vec![
        // outline phase
        ScriptStep::reply(mock_data::story_core_fenced()),
        reply(mock_data::world_setting()),
        reply(mock_data::clean_report()),
        // full phase
        reply(mock_data::characters()),
        reply(mock_data::plot_outline()),
        reply(mock_data::blocking_report()),
        reply(mock_data::revision_plan_with_orphan()),
        reply(mock_data::world_setting_with_shrine()),
        reply(mock_data::plot_outline_revised()),
        reply(mock_data::clean_report()),
    ]
}

pub fn execute() -> GalforgeResult<(ScriptedRuntime, StoryRun)> {
    let runtime = ScriptedRuntime::new(script())?;
    let run = generate_story(&runtime.executor, &runtime.config, mock_data::IDEA)?;
    Ok((runtime, run))
}

pub fn run_scenario() -> GalforgeResult<()> {
    println!("=== Scenario 5: Consistency Loop ===");
    println!();

    let (runtime, run) = execute()?;

    println!(
        "  Outline phase:    {:?} after {} round(s)",
        run.outline.termination, run.outline.rounds
    );
    println!(
        "  Full phase:       {:?} after {} round(s)",
        run.full.termination, run.full.rounds
    );
    for revision in run.outline.revisions.iter().chain(&run.full.revisions) {
        println!(
            "    round {} revised {:<14} {}",
            revision.round,
            revision.agent,
            if revision.applied { "applied" } else { "kept previous" }
        );
    }
    println!("  Sections:         {}", run.document().len());
    println!("  Backend calls:    {}", runtime.backend.call_count());
    println!();

    runtime.finish()?;
    println!();
    println!("  Scenario 5 complete.");
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use galforge_consistency::Termination;
    use galforge_contracts::execution::RecordKind;

    use super::*;
    use crate::catalog;

    #[test]
    fn test_both_phases_converge() {
        let (runtime, run) = execute().unwrap();

        assert_eq!(run.outline.termination, Termination::Converged);
        assert_eq!(run.outline.rounds, 0);
        assert_eq!(run.full.termination, Termination::Converged);
        assert_eq!(run.full.rounds, 1);
        assert_eq!(run.document().len(), 4);
        assert_eq!(runtime.backend.remaining(), 0);
    }

    #[test]
    fn test_orphaned_order_entry_is_not_revised() {
        let (_, run) = execute().unwrap();
        let revised: Vec<&str> = run.full.revisions.iter().map(|r| r.agent.as_str()).collect();
        assert_eq!(revised, vec![catalog::WORLD_SETTING, catalog::PLOT_OUTLINE]);
        assert_eq!(run.revisions_applied(), 2);
    }

    #[test]
    fn test_revisions_land_in_the_document() {
        let (_, run) = execute().unwrap();
        let doc = run.document();

        let locations = &doc.get(catalog::WORLD_SETTING).unwrap()["locations"];
        assert_eq!(locations[2]["name"], json!("Minato shrine"));
        let rin = &doc.get(catalog::PLOT_OUTLINE).unwrap()["routes"][2]["summary"];
        assert!(rin.as_str().unwrap().contains("shrine steps"));
    }

    #[test]
    fn test_outline_sections_are_not_regenerated() {
        let (runtime, _) = execute().unwrap();
        let story_core_calls = runtime
            .audit
            .records()
            .iter()
            .filter(|r| r.agent == catalog::STORY_CORE && r.kind == RecordKind::Generation)
            .count();
        assert_eq!(story_core_calls, 1);
    }

    #[test]
    fn test_revision_prompt_quotes_related_section() {
        let (runtime, _) = execute().unwrap();
        // Index 7 is the world revision; its hint names the characters agent.
        let prompt = runtime.backend.requests()[7].last_user_message().unwrap().to_string();
        assert!(prompt.contains("hilltop shrine"), "{prompt}");
        assert!(prompt.contains("### characters"), "{prompt}");
        assert!(prompt.contains("shrine maiden"), "{prompt}");
    }

    #[test]
    fn test_audit_chain_survives_the_whole_run() {
        let (runtime, _) = execute().unwrap();
        runtime.executor.finish().unwrap();
        assert!(runtime.audit.verify_integrity());
        assert_eq!(runtime.audit.export_log().events.len(), 10);
    }
}
