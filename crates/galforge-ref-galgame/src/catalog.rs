//! The reference agent catalog.
//!
//! Four producer agents build the story document section by section; two
//! checkers review it (outline first, then the whole document) and one
//! planner turns reported issues into revision instructions. Each section
//! is named after the agent that owns it.

use serde_json::json;

use galforge_consistency::{check_report_schema, revision_plan_schema, ProducerStage};
use galforge_contracts::{
    agent::AgentSpec,
    verify::{OutputSchema, RuleType, ValidationRule},
};

pub const STORY_CORE: &str = "story_core";
pub const WORLD_SETTING: &str = "world_setting";
pub const CHARACTERS: &str = "characters";
pub const PLOT_OUTLINE: &str = "plot_outline";
pub const OUTLINE_CHECKER: &str = "outline_checker";
pub const CONSISTENCY_CHECKER: &str = "consistency_checker";
pub const REVISION_PLANNER: &str = "revision_planner";

/// Every agent name in the catalog.
pub const ALL_AGENTS: &[&str] = &[
    STORY_CORE,
    WORLD_SETTING,
    CHARACTERS,
    PLOT_OUTLINE,
    OUTLINE_CHECKER,
    CONSISTENCY_CHECKER,
    REVISION_PLANNER,
];

const DESIGNER_SYSTEM: &str = "You are a visual novel designer. Answer with one JSON object only.";

// ── Producers ────────────────────────────────────────────────────────────────

pub fn story_core() -> AgentSpec {
    AgentSpec::new(
        STORY_CORE,
        DESIGNER_SYSTEM,
        "Story idea: {{ idea }}\n\n\
         Distil the idea into a story core with these fields:\n\
         - genre: one word\n\
         - themes: list of themes\n\
         - tone: the overall mood\n\
         - must_have: elements the story must contain\n\
         - forbidden: elements the story must avoid",
    )
    .with_required_fields(["genre", "themes", "tone", "must_have", "forbidden"])
    .with_schema(
        OutputSchema::new(
            "story-core-v1",
            json!({
                "type": "object",
                "properties": {
                    "genre": { "type": "string" },
                    "themes": { "type": "array", "items": { "type": "string" } },
                    "must_have": { "type": "array" },
                    "forbidden": { "type": "array" }
                }
            }),
        )
        .with_rule(ValidationRule::new(
            "themes-present",
            "a story needs at least one theme",
            RuleType::MinItems {
                field_path: "themes".to_string(),
                min: 1,
            },
        )),
    )
    .with_fallback(json!({
        "genre": "slice of life",
        "themes": ["friendship"],
        "tone": "gentle",
        "must_have": [],
        "forbidden": []
    }))
}

pub fn world_setting() -> AgentSpec {
    AgentSpec::new(
        WORLD_SETTING,
        DESIGNER_SYSTEM,
        "Story idea: {{ idea }}\n\nStory core:\n{{ story_core }}\n\n\
         Describe the world with:\n\
         - era\n\
         - locations: list of {name, description}\n\
         - rules: anything unusual about how this world works",
    )
    .with_required_fields(["era", "locations[].name", "locations[].description", "rules"])
    .with_fallback(json!({
        "era": "present day",
        "locations": [{ "name": "school", "description": "an ordinary high school" }],
        "rules": []
    }))
}

pub fn characters() -> AgentSpec {
    AgentSpec::new(
        CHARACTERS,
        DESIGNER_SYSTEM,
        "Story idea: {{ idea }}\n\nStory core:\n{{ story_core }}\n\nWorld:\n{{ world_setting }}\n\n\
         Create the cast:\n\
         - protagonist: {name, personality}\n\
         - heroines: list of {name, age, archetype, personality, motivation}",
    )
    .with_required_fields([
        "protagonist.name",
        "heroines[].name",
        "heroines[].personality",
        "heroines[].motivation",
    ])
    .with_schema(
        OutputSchema::new("cast-v1", json!({ "type": "object" }))
            .with_rule(ValidationRule::new(
                "cast-size",
                "a route structure needs at least two heroines",
                RuleType::MinItems {
                    field_path: "heroines".to_string(),
                    min: 2,
                },
            ))
            .with_rule(ValidationRule::new(
                "heroine-archetype",
                "archetypes come from the studio's list",
                RuleType::AllowedValues {
                    field_path: "heroines[].archetype".to_string(),
                    allowed: ["tsundere", "kuudere", "dandere", "genki", "yamato nadeshiko", "mysterious"]
                        .into_iter()
                        .map(|a| json!(a))
                        .collect(),
                },
            )),
    )
    .with_redo_rounds(2)
    .with_fallback(json!({
        "protagonist": { "name": "Protagonist", "personality": "kind" },
        "heroines": []
    }))
}

pub fn plot_outline() -> AgentSpec {
    AgentSpec::new(
        PLOT_OUTLINE,
        DESIGNER_SYSTEM,
        "Story core:\n{{ story_core }}\n\nWorld:\n{{ world_setting }}\n\nCast:\n{{ characters }}\n\n\
         Outline the plot:\n\
         - acts: list of {title, summary}\n\
         - routes: one {heroine, summary, ending} per heroine; ending is good, normal, or bad",
    )
    .with_required_fields(["acts[].title", "acts[].summary", "routes[].heroine", "routes[].ending"])
    .with_schema(
        OutputSchema::new("plot-v1", json!({ "type": "object" })).with_rule(ValidationRule::new(
            "route-ending",
            "every route ends in a known ending type",
            RuleType::AllowedValues {
                field_path: "routes[].ending".to_string(),
                allowed: vec![json!("good"), json!("normal"), json!("bad")],
            },
        )),
    )
    .with_fallback(json!({ "acts": [], "routes": [] }))
}

// ── Checkers and planner ─────────────────────────────────────────────────────

const REPORT_FIELDS: [&str; 2] = ["valid", "issues"];

const REPORT_INSTRUCTIONS: &str = "Answer with {\"valid\": bool, \"issues\": [{\"source_agent\", \
\"severity\": low|medium|high|critical, \"description\", \"fix_suggestion\", \"related_field\"}]}. \
source_agent must name the agent whose section is wrong.";

/// Reviews story core and world before the expensive detail stages run.
pub fn outline_checker() -> AgentSpec {
    AgentSpec::new(
        OUTLINE_CHECKER,
        "You review visual novel outlines for contradictions.",
        format!(
            "Story idea: {{{{ idea }}}}\n\nOutline:\n{{{{ document }}}}\n\n\
             Check that the world fits the story core. {REPORT_INSTRUCTIONS}"
        ),
    )
    .with_required_fields(REPORT_FIELDS)
    .with_schema(check_report_schema())
    .with_fix_rounds(2)
    .with_fallback(json!({ "valid": false, "issues": [] }))
}

pub fn consistency_checker() -> AgentSpec {
    AgentSpec::new(
        CONSISTENCY_CHECKER,
        "You review visual novel design documents for contradictions between sections.",
        format!(
            "Story idea: {{{{ idea }}}}\n\nDocument:\n{{{{ document }}}}\n\n\
             Check every section against the others. {REPORT_INSTRUCTIONS}"
        ),
    )
    .with_required_fields(REPORT_FIELDS)
    .with_schema(check_report_schema())
    .with_fix_rounds(2)
    .with_fallback(json!({ "valid": false, "issues": [] }))
}

pub fn revision_planner() -> AgentSpec {
    AgentSpec::new(
        REVISION_PLANNER,
        "You plan revisions of a visual novel design document.",
        "Document:\n{{ document }}\n\nIssues:\n{{ issues }}\n\n\
         Answer with {\"has_issues\": bool, \"agent_modifications\": [{\"agent_name\", \
         \"modification_instructions\", \"context_from_other_agents\", \"expected_outcome\"}], \
         \"execution_order\": [agent names]}. Only name agents that own a section.",
    )
    .with_required_fields(["has_issues"])
    .with_schema(revision_plan_schema())
    .with_fix_rounds(2)
    .with_fallback(json!({ "has_issues": false }))
}

// ── Stage graphs ─────────────────────────────────────────────────────────────

/// Stages reviewed by the outline checker.
pub fn outline_stages() -> Vec<ProducerStage> {
    vec![
        ProducerStage::new(story_core(), STORY_CORE),
        ProducerStage::new(world_setting(), WORLD_SETTING).after([STORY_CORE]),
    ]
}

/// Every producer stage. Sections already built by the outline loop are
/// not regenerated.
pub fn full_stages() -> Vec<ProducerStage> {
    let mut stages = outline_stages();
    stages.push(ProducerStage::new(characters(), CHARACTERS).after([STORY_CORE, WORLD_SETTING]));
    stages.push(ProducerStage::new(plot_outline(), PLOT_OUTLINE).after([STORY_CORE, WORLD_SETTING, CHARACTERS]));
    stages
}
