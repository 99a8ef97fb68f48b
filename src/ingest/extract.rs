// src/ingest/extract.rs
//! Deep-path lookup over parsed payload trees.
//!
//! A path that does not resolve is a typed `None`, never a panic: adapters use
//! this both to find their item collection and to pull optional nested fields
//! (image URLs, author names) out of a single item.

use serde_json::Value;

/// One step of an extraction path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// Object member.
    Key(&'static str),
    /// Array element.
    Index(usize),
}

/// Ordered steps locating a value inside a payload tree.
pub type Path = &'static [Segment];

/// Follow `path` from `root`.
///
/// Returns `None` when any segment is missing or meets the wrong shape, when
/// the reached value is JSON `null`, and for the empty path (which selects
/// nothing rather than the whole document).
pub fn lookup<'a>(root: &'a Value, path: &[Segment]) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    path.iter()
        .try_fold(root, |node, seg| match (seg, node) {
            (Segment::Key(k), Value::Object(map)) => map.get(*k),
            (Segment::Index(i), Value::Array(items)) => items.get(*i),
            _ => None,
        })
        .filter(|v| !v.is_null())
}

/// String at `path`, if the path resolves to a string.
pub fn lookup_str<'a>(root: &'a Value, path: &[Segment]) -> Option<&'a str> {
    lookup(root, path).and_then(Value::as_str)
}

/// Number at `path`. Numeric strings count too; several upstreams quote
/// their counters.
pub fn lookup_f64(root: &Value, path: &[Segment]) -> Option<f64> {
    match lookup(root, path)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
