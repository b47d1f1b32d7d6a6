//! The composite story document.
//!
//! A document is a set of named sections, each owned by exactly one
//! producer agent. It is the only long-lived state of a pipeline run and
//! has a single writer at a time: whichever loop round currently holds it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::JsonObject;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    sections: BTreeMap<String, JsonObject>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, section: &str) -> Option<&JsonObject> {
        self.sections.get(section)
    }

    pub fn contains(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Replace a section, returning the previous content.
    pub fn insert(&mut self, section: impl Into<String>, content: JsonObject) -> Option<JsonObject> {
        self.sections.insert(section.into(), content)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&String, &JsonObject)> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// The whole document as one JSON object keyed by section name.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.sections
                .iter()
                .map(|(k, v)| (k.clone(), Value::Object(v.clone())))
                .collect(),
        )
    }

    /// Names of sections whose content carries the fallback marker.
    pub fn fallback_sections(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter(|(_, v)| v.get("fallback").and_then(Value::as_bool).unwrap_or(false))
            .map(|(k, _)| k.as_str())
            .collect()
    }
}
