//! Cross-section context for global revisions.
//!
//! A planner modification carries a free-text hint such as "keep Aoi's
//! backstory consistent with the world_setting locations". A section is
//! quoted into the revision prompt when the hint mentions its name, the
//! agent that owns it, or one of its top-level keys.

use serde_json::Value;

use galforge_contracts::{document::Document, plan::ContextSnippet};

use crate::stage::ProducerStage;

/// Keys shorter than this are too generic to match on.
const MIN_KEY_CHARS: usize = 4;

pub fn gather_context(
    document: &Document,
    stages: &[ProducerStage],
    target_section: &str,
    hint: &str,
) -> Vec<ContextSnippet> {
    let hint = hint.to_lowercase();
    if hint.trim().is_empty() {
        return Vec::new();
    }

    document
        .sections()
        .filter(|(name, _)| name.as_str() != target_section)
        .filter(|(name, content)| {
            mentions(&hint, name)
                || stages
                    .iter()
                    .any(|s| &s.section == *name && mentions(&hint, &s.spec.name))
                || content
                    .keys()
                    .filter(|k| k.chars().count() >= MIN_KEY_CHARS)
                    .any(|k| mentions(&hint, k))
        })
        .map(|(name, content)| ContextSnippet {
            section: name.clone(),
            content: Value::Object(content.clone()),
        })
        .collect()
}

/// Matches `world_setting` as written or as "world setting".
fn mentions(hint: &str, name: &str) -> bool {
    let name = name.to_lowercase();
    hint.contains(&name) || hint.contains(&name.replace('_', " "))
}
