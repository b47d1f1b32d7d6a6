//! Canned backend responses for the scripted scenarios.
//!
//! All story content here is fictional and hardcoded. The raw strings are
//! shaped like real model output: some fenced, some with commentary, some
//! missing fields, so the executor's extraction and repair paths are
//! exercised.

use serde_json::{json, Value};

pub const IDEA: &str = "A summer festival romance in a seaside town where a shrine maiden \
hides the fact that the festival is the town's last.";

/// Error text a provider returns when its moderation layer refuses a prompt.
pub const MODERATION_ERROR: &str =
    "backend returned 400 Bad Request: {\"error\": {\"code\": \"content_filter\", \"message\": \"The response was filtered\"}}";

// ── Story core ───────────────────────────────────────────────────────────────

/// A complete story core wrapped in a markdown fence.
pub fn story_core_fenced() -> String {
    format!("```json\n{}\n```", pretty(&story_core()))
}

pub fn story_core() -> Value {
    json!({
        "genre": "romance",
        "themes": ["youth", "farewell", "tradition"],
        "tone": "warm with a bittersweet undercurrent",
        "must_have": ["summer festival", "fireworks finale"],
        "forbidden": ["supernatural villains"]
    })
}

/// The first answer of the repair scenario: only one of five fields.
pub fn story_core_partial() -> String {
    "Sure! Here is the story core: {\"genre\": \"romance\"}".to_string()
}

// ── World ────────────────────────────────────────────────────────────────────

pub fn world_setting() -> Value {
    json!({
        "era": "present day, late August",
        "locations": [
            { "name": "Shiokaze harbor", "description": "fishing port where the festival stalls gather" },
            { "name": "old lighthouse", "description": "closed since the storm three years ago" }
        ],
        "rules": ["the town is due to be merged into the city next spring"]
    })
}

/// World setting after the consistency loop asked for the shrine.
pub fn world_setting_with_shrine() -> Value {
    json!({
        "era": "present day, late August",
        "locations": [
            { "name": "Shiokaze harbor", "description": "fishing port where the festival stalls gather" },
            { "name": "old lighthouse", "description": "closed since the storm three years ago" },
            { "name": "Minato shrine", "description": "hilltop shrine that hosts the festival" }
        ],
        "rules": ["the town is due to be merged into the city next spring"]
    })
}

// ── Cast ─────────────────────────────────────────────────────────────────────

pub fn characters() -> Value {
    json!({
        "protagonist": { "name": "Haruto", "personality": "quiet, observant, returning home for the summer" },
        "heroines": [
            {
                "name": "Aoi",
                "age": 17,
                "archetype": "kuudere",
                "personality": "composed shrine maiden",
                "motivation": "hold the last festival without telling anyone it is the last"
            },
            {
                "name": "Hina",
                "age": 17,
                "archetype": "genki",
                "personality": "runs her family's shaved-ice stall",
                "motivation": "win the festival's stall contest"
            },
            {
                "name": "Rin",
                "age": 18,
                "archetype": "tsundere",
                "personality": "prickly photographer",
                "motivation": "photograph the town before it changes"
            }
        ]
    })
}

/// A repaired cast where only Hina's motivation was rewritten.
pub fn characters_repaired() -> Value {
    let mut cast = characters();
    cast["heroines"][1]["motivation"] = json!("keep her grandmother's stall open one more year");
    cast
}

/// A repair attempt that lost Hina's motivation entirely.
pub fn characters_missing_motivation() -> Value {
    let mut cast = characters();
    if let Some(hina) = cast["heroines"][1].as_object_mut() {
        hina.remove("motivation");
    }
    cast
}

// ── Plot ─────────────────────────────────────────────────────────────────────

pub fn plot_outline() -> Value {
    json!({
        "acts": [
            { "title": "Homecoming", "summary": "Haruto returns as festival preparations begin" },
            { "title": "Lanterns", "summary": "the three heroines pull Haruto into the preparations" },
            { "title": "Last Fireworks", "summary": "the festival night and its secret" }
        ],
        "routes": [
            { "heroine": "Aoi", "summary": "Haruto learns the festival is the last", "ending": "good" },
            { "heroine": "Hina", "summary": "the stall contest", "ending": "normal" },
            { "heroine": "Rin", "summary": "a final photo from the lighthouse balcony", "ending": "good" }
        ]
    })
}

/// Plot after the loop moved Rin's finale off the closed lighthouse.
pub fn plot_outline_revised() -> Value {
    let mut plot = plot_outline();
    plot["routes"][2]["summary"] = json!("a final photo from the shrine steps above the harbor");
    plot
}

// ── Checker reports and plans ────────────────────────────────────────────────

pub fn clean_report() -> Value {
    json!({ "valid": true, "issues": [] })
}

/// Two cross-section contradictions in the full document.
pub fn blocking_report() -> Value {
    json!({
        "valid": false,
        "issues": [
            {
                "source_agent": "world_setting",
                "severity": "high",
                "description": "Aoi is a shrine maiden but the world has no shrine",
                "fix_suggestion": "add the festival shrine to the locations",
                "related_field": "locations"
            },
            {
                "source_agent": "plot_outline",
                "severity": "medium",
                "description": "Rin's finale uses the lighthouse balcony, but the lighthouse is closed",
                "related_field": "routes[2].summary"
            },
            {
                "source_agent": "characters",
                "severity": "low",
                "description": "Haruto's personality could be more specific"
            }
        ]
    })
}

/// A plan whose execution order names an agent with no modification.
pub fn revision_plan_with_orphan() -> Value {
    json!({
        "has_issues": true,
        "agent_modifications": [
            {
                "agent_name": "world_setting",
                "current_content": {},
                "modification_instructions": "Add the hilltop shrine where Aoi serves and where the festival is held.",
                "context_from_other_agents": "Aoi in characters is the shrine maiden",
                "expected_outcome": "locations include the shrine"
            },
            {
                "agent_name": "plot_outline",
                "current_content": {},
                "modification_instructions": "Move Rin's final photo away from the closed lighthouse.",
                "context_from_other_agents": "see the lighthouse in world_setting locations"
            }
        ],
        "execution_order": ["world_setting", "characters", "plot_outline"]
    })
}

// ── Feedback issues ──────────────────────────────────────────────────────────

/// The checker issue used by the feedback-redo scenario.
pub fn hina_motivation_issue() -> Value {
    json!({
        "sourceAgent": "characters",
        "severity": "critical",
        "description": "heroines[1] motivation duplicates the stall contest subplot",
        "fixSuggestion": "give Hina a personal reason tied to the town's merger",
        "relatedField": "heroines[1].motivation"
    })
}

pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// Compact JSON, as most models answer.
pub fn compact(value: &Value) -> String {
    value.to_string()
}
