//! Structural diff between two agent outputs.
//!
//! Objects are compared key by key and recursed into. Arrays and scalars are
//! compared as whole values by their serialized form. The diff is logged and
//! audited only; nothing acts on it.

use galforge_contracts::{
    agent::JsonObject,
    execution::{DiffChange, DiffEntry},
};
use serde_json::Value;

pub fn structural_diff(old: &JsonObject, new: &JsonObject) -> Vec<DiffEntry> {
    let mut entries = Vec::new();
    diff_objects("", old, new, &mut entries);
    entries
}

fn diff_objects(prefix: &str, old: &JsonObject, new: &JsonObject, out: &mut Vec<DiffEntry>) {
    for (key, old_value) in old {
        let path = join(prefix, key);
        match new.get(key) {
            None => out.push(DiffEntry {
                path,
                change: DiffChange::Removed {
                    old: old_value.clone(),
                },
            }),
            Some(new_value) => diff_values(&path, old_value, new_value, out),
        }
    }
    for (key, new_value) in new {
        if !old.contains_key(key) {
            out.push(DiffEntry {
                path: join(prefix, key),
                change: DiffChange::Added {
                    new: new_value.clone(),
                },
            });
        }
    }
}

fn diff_values(path: &str, old: &Value, new: &Value, out: &mut Vec<DiffEntry>) {
    match (old, new) {
        (Value::Object(a), Value::Object(b)) => diff_objects(path, a, b, out),
        _ if old.to_string() != new.to_string() => out.push(DiffEntry {
            path: path.to_string(),
            change: DiffChange::Changed {
                old: old.clone(),
                new: new.clone(),
            },
        }),
        _ => {}
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}
