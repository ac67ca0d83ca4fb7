//! Structural diff of a working tree against its baseline.

use kbdelta_types::{is_note_key, ChangeSet, KbPath};
use serde_json::Value;

/// Compute the flat change set that turns `original` into `current`.
///
/// The walk is keyed purely by path:
///
/// - scalars and arrays compare by value and are recorded whole; arrays
///   are never diffed element by element
/// - objects recurse over the union of keys on both sides
/// - note-sentinel keys (`*_notes`, `_general_note`) go to `notes` instead,
///   and only when the new value is a non-empty string or list
///
/// A note that was non-empty in `original` and is empty or gone in
/// `current` is recorded as a `null` tombstone so that re-applying the
/// change set clears it. Removal of an ordinary data key is not
/// representable and is skipped.
pub fn diff(original: &Value, current: &Value) -> ChangeSet {
    let mut changes = ChangeSet::new();
    walk(Some(original), current, &KbPath::root(), &mut changes);
    changes
}

fn walk(original: Option<&Value>, current: &Value, path: &KbPath, out: &mut ChangeSet) {
    match current {
        Value::Object(curr_map) => {
            let orig_map = original.and_then(Value::as_object);

            let orig_only = orig_map
                .into_iter()
                .flat_map(|m| m.keys())
                .filter(|k| !curr_map.contains_key(*k));

            for key in curr_map.keys().chain(orig_only) {
                let child_path = path.child_key(key.clone());
                let curr_value = curr_map.get(key);
                let orig_value = orig_map.and_then(|m| m.get(key));

                if is_note_key(key) {
                    diff_note(orig_value, curr_value, &child_path, out);
                    continue;
                }

                match curr_value {
                    Some(value @ Value::Object(_)) => walk(orig_value, value, &child_path, out),
                    Some(value) => record_leaf(orig_value, value, &child_path, out),
                    None => {
                        tracing::debug!(path = %child_path, "data key removed from working tree; not representable");
                    }
                }
            }
        }
        Value::Array(items) if path.is_empty() => {
            let orig_items = original.and_then(Value::as_array);
            for (i, item) in items.iter().enumerate() {
                let child_path = path.child_index(i);
                let orig_item = orig_items.and_then(|o| o.get(i));
                match item {
                    Value::Object(_) => walk(orig_item, item, &child_path, out),
                    _ => record_leaf(orig_item, item, &child_path, out),
                }
            }
        }
        _ => record_leaf(original, current, path, out),
    }
}

fn record_leaf(original: Option<&Value>, current: &Value, path: &KbPath, out: &mut ChangeSet) {
    if path.is_empty() {
        return;
    }
    if original != Some(current) {
        out.modifications.insert(path.to_string(), current.clone());
    }
}

fn diff_note(original: Option<&Value>, current: Option<&Value>, path: &KbPath, out: &mut ChangeSet) {
    if original == current {
        return;
    }
    match current {
        Some(value) if has_note_content(value) => {
            out.notes.insert(path.to_string(), value.clone());
        }
        _ if original.is_some_and(has_note_content) => {
            out.notes.insert(path.to_string(), Value::Null);
        }
        _ => {}
    }
}

/// A note value worth persisting: a non-empty string or a non-empty list.
pub fn has_note_content(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}
