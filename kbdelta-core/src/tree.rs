//! Get/set/remove of values at arbitrary paths in a JSON tree.
//!
//! Missing intermediate containers are created on write. Whether a new
//! container is an array or an object is decided by the *next* segment: a
//! numeric segment produces an array. This is a heuristic: `a.0.b` cannot
//! distinguish "index 0" from "key `0`", and array semantics always win.
//! Against an existing object, an index segment addresses the decimal key,
//! so `{"0": ..}` stays reachable.

use kbdelta_types::{KbPath, Segment};
use serde_json::{Map, Value};

/// Look up the value at `path`. The root path returns `tree` itself.
pub fn get<'a>(tree: &'a Value, path: &KbPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(tree, |node, seg| child(node, seg))
}

/// Write `value` at `path`, creating intermediate containers as needed.
///
/// Returns `false` when nothing was written: the path is empty, or a
/// non-numeric key meets an existing array.
pub fn set(tree: &mut Value, path: &KbPath, value: Value) -> bool {
    let Some((last, parents)) = path.segments().split_last() else {
        return false;
    };

    let mut node = tree;
    for (i, seg) in parents.iter().enumerate() {
        let next = parents.get(i + 1).unwrap_or(last);
        match slot(node, seg) {
            Some(slot) => {
                if !slot.is_object() && !slot.is_array() {
                    *slot = empty_container_for(next);
                }
                node = slot;
            }
            None => {
                tracing::debug!(path = %path, "segment cannot address container; write skipped");
                return false;
            }
        }
    }

    match slot(node, last) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => {
            tracing::debug!(path = %path, "segment cannot address container; write skipped");
            false
        }
    }
}

/// Delete the entry at `path` entirely and return it.
///
/// Unlike [`set`], this never creates containers. Removing an array element
/// shifts the following elements down.
pub fn remove(tree: &mut Value, path: &KbPath) -> Option<Value> {
    let (last, parents) = path.segments().split_last()?;
    let parent = parents
        .iter()
        .try_fold(tree, |node, seg| child_mut(node, seg))?;

    match parent {
        Value::Object(map) => map.shift_remove(&key_name(last)),
        Value::Array(items) => {
            let idx = index_of(last)?;
            (idx < items.len()).then(|| items.remove(idx))
        }
        _ => None,
    }
}

fn child<'a>(node: &'a Value, seg: &Segment) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(&key_name(seg)),
        Value::Array(items) => items.get(index_of(seg)?),
        _ => None,
    }
}

fn child_mut<'a>(node: &'a mut Value, seg: &Segment) -> Option<&'a mut Value> {
    match node {
        Value::Object(map) => map.get_mut(&key_name(seg)),
        Value::Array(items) => items.get_mut(index_of(seg)?),
        _ => None,
    }
}

/// Writable slot for `seg` inside `node`, created (as `null`) if missing.
fn slot<'a>(node: &'a mut Value, seg: &Segment) -> Option<&'a mut Value> {
    match node {
        Value::Object(map) => Some(map.entry(key_name(seg)).or_insert(Value::Null)),
        Value::Array(items) => {
            let idx = index_of(seg)?;
            if idx >= items.len() {
                items.resize(idx + 1, Value::Null);
            }
            items.get_mut(idx)
        }
        _ => None,
    }
}

fn empty_container_for(next: &Segment) -> Value {
    if next.is_numeric() {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

fn key_name(seg: &Segment) -> String {
    match seg {
        Segment::Key(k) => k.clone(),
        Segment::Index(i) => i.to_string(),
    }
}

fn index_of(seg: &Segment) -> Option<usize> {
    match seg {
        Segment::Index(i) => Some(*i),
        Segment::Key(k) if seg.is_numeric() => k.parse().ok(),
        Segment::Key(_) => None,
    }
}
