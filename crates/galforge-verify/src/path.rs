//! Field path resolution.
//!
//! Paths are dotted keys with optional array selectors:
//!
//! - `world.era`            nested key
//! - `heroines[2].name`     one element
//! - `heroines[].name`      every element (`[*]` is accepted too)
//!
//! A value counts as present when it is not `null` and not `""`.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
    Each,
}

fn parse(path: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for part in path.split('.').filter(|p| !p.is_empty()) {
        let (key, mut rest) = match part.find('[') {
            Some(open) => (&part[..open], &part[open..]),
            None => (part, ""),
        };
        if !key.is_empty() {
            segments.push(Segment::Key(key.to_string()));
        }
        while let Some(stripped) = rest.strip_prefix('[') {
            let Some(close) = stripped.find(']') else {
                // Unterminated selector: treat the remainder as a literal key.
                segments.push(Segment::Key(rest.to_string()));
                break;
            };
            let selector = stripped[..close].trim();
            segments.push(match selector {
                "" | "*" => Segment::Each,
                n => match n.parse() {
                    Ok(index) => Segment::Index(index),
                    Err(_) => Segment::Key(n.to_string()),
                },
            });
            rest = &stripped[close + 1..];
        }
    }
    segments
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn append(base: &str, segment: &Segment) -> String {
    match segment {
        Segment::Key(key) if base.is_empty() => key.clone(),
        Segment::Key(key) => format!("{base}.{key}"),
        Segment::Index(i) => format!("{base}[{i}]"),
        Segment::Each => base.to_string(),
    }
}

/// Concrete paths under `path` that are missing or empty in `root`.
///
/// An `[]` selector over a missing or empty array reports the array itself.
pub fn missing(root: &Value, path: &str) -> Vec<String> {
    let mut out = Vec::new();
    walk_missing(root, &parse(path), String::new(), &mut out);
    out
}

fn walk_missing(value: &Value, segments: &[Segment], at: String, out: &mut Vec<String>) {
    let Some((head, tail)) = segments.split_first() else {
        if !is_present(value) {
            out.push(at);
        }
        return;
    };

    match head {
        Segment::Key(key) => match value.get(key.as_str()) {
            Some(child) if is_present(child) => walk_missing(child, tail, append(&at, head), out),
            _ => out.push(append(&at, head)),
        },
        Segment::Index(i) => match value.get(*i) {
            Some(child) if is_present(child) => walk_missing(child, tail, append(&at, head), out),
            _ => out.push(append(&at, head)),
        },
        Segment::Each => match value.as_array() {
            Some(items) if !items.is_empty() => {
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{at}[{i}]");
                    if is_present(item) {
                        walk_missing(item, tail, item_path, out);
                    } else {
                        out.push(item_path);
                    }
                }
            }
            _ => out.push(at),
        },
    }
}

/// Every present value `path` selects in `root`, with its concrete path.
pub fn resolve<'v>(root: &'v Value, path: &str) -> Vec<(String, &'v Value)> {
    let mut out = Vec::new();
    walk_resolve(root, &parse(path), String::new(), &mut out);
    out
}

fn walk_resolve<'v>(value: &'v Value, segments: &[Segment], at: String, out: &mut Vec<(String, &'v Value)>) {
    let Some((head, tail)) = segments.split_first() else {
        if !value.is_null() {
            out.push((at, value));
        }
        return;
    };

    match head {
        Segment::Key(key) => {
            if let Some(child) = value.get(key.as_str()) {
                walk_resolve(child, tail, append(&at, head), out);
            }
        }
        Segment::Index(i) => {
            if let Some(child) = value.get(*i) {
                walk_resolve(child, tail, append(&at, head), out);
            }
        }
        Segment::Each => {
            if let Some(items) = value.as_array() {
                for (i, item) in items.iter().enumerate() {
                    walk_resolve(item, tail, format!("{at}[{i}]"), out);
                }
            }
        }
    }
}
