//! Replay of a change set onto a baseline tree.

use crate::path::parse;
use crate::tree;
use kbdelta_types::ChangeSet;
use serde_json::Value;

/// Return a copy of `baseline` with `changes` applied. `baseline` is untouched.
pub fn apply(baseline: &Value, changes: Option<&ChangeSet>) -> Value {
    let mut patched = baseline.clone();
    if let Some(changes) = changes {
        apply_in_place(&mut patched, changes);
    }
    patched
}

/// Apply `changes` directly to `tree`.
///
/// Modifications go first, then notes. A `null` note removes the sentinel
/// key instead of writing `null`. Applying the same change set twice leaves
/// the tree as a single application does.
pub fn apply_in_place(tree: &mut Value, changes: &ChangeSet) {
    for (path, value) in &changes.modifications {
        tree::set(tree, &parse(path), value.clone());
    }
    for (path, value) in &changes.notes {
        let path = parse(path);
        if value.is_null() {
            tree::remove(tree, &path);
        } else {
            tree::set(tree, &path, value.clone());
        }
    }
    tracing::debug!(
        modifications = changes.modifications.len(),
        notes = changes.notes.len(),
        "change set applied"
    );
}
