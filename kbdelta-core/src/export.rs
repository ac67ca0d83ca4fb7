//! Sparse-tree export of a change set.

use crate::path::parse;
use crate::tree;
use kbdelta_types::{ChangeSet, NOTES_SUFFIX};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Merge modifications and notes into a single flat path -> value map.
///
/// For every `*_notes` entry whose data field was not itself modified, the
/// field's current value is added so the exported fragment shows what the
/// note is about.
pub fn flatten_for_export(changes: &ChangeSet, current: &Value) -> BTreeMap<String, Value> {
    let mut flat = changes.modifications.clone();

    for (note_path, value) in &changes.notes {
        flat.insert(note_path.clone(), value.clone());

        if !note_path.ends_with(NOTES_SUFFIX) {
            continue;
        }
        let Some(data_path) = parse(note_path).data_path_of_notes() else {
            continue;
        };
        let data_key = note_path[..note_path.len() - NOTES_SUFFIX.len()].to_string();
        if flat.contains_key(&data_key) {
            continue;
        }
        if let Some(value) = tree::get(current, &data_path) {
            flat.insert(data_key, value.clone());
        }
    }

    flat
}

/// Expand a flat path map into a nested tree, the same way patches are applied.
pub fn expand(flat: &BTreeMap<String, Value>) -> Value {
    let mut root = Value::Object(Map::new());
    for (path, value) in flat {
        tree::set(&mut root, &parse(path), value.clone());
    }
    root
}

/// Build the exported sparse tree, or `None` when there is nothing to export.
pub fn export(changes: &ChangeSet, current: &Value) -> Option<Value> {
    if changes.is_empty() {
        return None;
    }
    Some(expand(&flatten_for_export(changes, current)))
}
