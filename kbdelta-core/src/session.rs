//! Editing session over a baseline document and its working copy.
//!
//! A [`Session`] owns both trees and the change store. `original` is never
//! written after construction; every command edits `current`. The change
//! set is never kept as state: it is recomputed by diffing whenever a save,
//! export or undo needs it.

use crate::diff::diff;
use crate::encoding::{decode_from_storage, encode_for_storage, EncodingError};
use crate::export;
use crate::path::parse;
use crate::patch;
use crate::search::{search, SearchHits};
use crate::storage_key::KeyEncoding;
use crate::store::{ChangeStore, StoreError};
use crate::tree;
use kbdelta_types::{is_note_key, ChangeSet, KbPath, Segment, GENERAL_NOTE_KEY};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Change store is not configured; add a `store` section to the config to save changes")]
    StoreNotConfigured,

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("Note text is empty")]
    EmptyNote,

    #[error("No note #{index} at {path} ({len} present)")]
    NoteIndex {
        path: String,
        index: usize,
        len: usize,
    },

    #[error("Path cannot be edited: {0}")]
    InvalidPath(String),

    #[error("Array elements cannot carry notes: {0}; annotate the field holding the list")]
    ElementNotes(String),
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotConfigured => SessionError::StoreNotConfigured,
            other => SessionError::Store(other),
        }
    }
}

/// How the working tree was initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing persisted (or no store configured); working tree is the baseline.
    Baseline,
    /// Saved changes were found and applied.
    Restored { entries: usize },
    /// Loading failed; working tree is the baseline.
    FellBack { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    NothingToSave,
    Saved { entries: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    NothingToUndo,
    Reverted { entries: usize },
}

#[derive(Debug)]
pub struct Session<S> {
    original: Value,
    current: Value,
    store: S,
    encoding: KeyEncoding,
}

impl<S: ChangeStore> Session<S> {
    /// Session whose working tree starts as a copy of `original`.
    pub fn new(original: Value, store: S) -> Self {
        let current = original.clone();
        Self {
            original,
            current,
            store,
            encoding: KeyEncoding::default(),
        }
    }

    pub fn with_key_encoding(mut self, encoding: KeyEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Build a session and overlay whatever the store has saved.
    pub async fn open(original: Value, store: S, encoding: KeyEncoding) -> (Self, LoadOutcome) {
        let mut session = Self::new(original, store).with_key_encoding(encoding);
        let outcome = session.restore().await;
        (session, outcome)
    }

    /// Reset the working tree to the baseline plus the stored change set.
    ///
    /// Never fails: an unconfigured store is silent, any other problem is
    /// logged and reported as [`LoadOutcome::FellBack`].
    pub async fn restore(&mut self) -> LoadOutcome {
        let blob = match self.store.load().await {
            Ok(blob) => blob,
            Err(StoreError::NotConfigured) => {
                tracing::debug!("No change store configured; using baseline");
                self.current = self.original.clone();
                return LoadOutcome::Baseline;
            }
            Err(err) => return self.fall_back(err.to_string()),
        };

        match decode_from_storage(blob, self.encoding) {
            Ok(Some(changes)) => {
                self.current = patch::apply(&self.original, Some(&changes));
                tracing::info!(
                    store = %self.store.describe(),
                    entries = changes.len(),
                    "Restored saved changes"
                );
                LoadOutcome::Restored {
                    entries: changes.len(),
                }
            }
            Ok(None) => {
                self.current = self.original.clone();
                LoadOutcome::Baseline
            }
            Err(err) => self.fall_back(err.to_string()),
        }
    }

    fn fall_back(&mut self, reason: String) -> LoadOutcome {
        tracing::warn!("Could not load saved changes, using baseline: {}", reason);
        self.current = self.original.clone();
        LoadOutcome::FellBack { reason }
    }

    pub fn original(&self) -> &Value {
        &self.original
    }

    pub fn current(&self) -> &Value {
        &self.current
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn key_encoding(&self) -> KeyEncoding {
        self.encoding
    }

    /// Value at `path` in the working tree.
    pub fn get(&self, path: &str) -> Option<&Value> {
        tree::get(&self.current, &parse(path))
    }

    /// Top-level section names, in document order.
    pub fn sections(&self) -> Vec<&str> {
        self.current
            .as_object()
            .map(|m| {
                m.keys()
                    .map(String::as_str)
                    .filter(|k| !is_note_key(k))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Set a leaf value. Returns `false` if the value was already equal.
    pub fn apply_edit(&mut self, path: &str, value: Value) -> Result<bool, SessionError> {
        let parsed = parse(path);
        if parsed.is_empty() || ends_in_note_key(&parsed) {
            return Err(SessionError::InvalidPath(path.to_string()));
        }
        if tree::get(&self.current, &parsed) == Some(&value) {
            return Ok(false);
        }
        if !tree::set(&mut self.current, &parsed, value) {
            return Err(SessionError::InvalidPath(path.to_string()));
        }
        tracing::debug!(path = %parsed, "Edit applied");
        Ok(true)
    }

    /// Notes attached to the field at `path`.
    pub fn notes(&self, path: &str) -> Vec<String> {
        self.notes_path_for(path)
            .ok()
            .and_then(|np| tree::get(&self.current, &np))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Append a note to the field at `path`; returns its index.
    pub fn add_note(&mut self, path: &str, text: &str) -> Result<usize, SessionError> {
        let text = note_text(text)?;
        let notes_path = self.notes_path_for(path)?;
        let mut notes = self.note_list(&notes_path);
        notes.push(Value::String(text));
        let index = notes.len() - 1;
        self.write_notes(path, &notes_path, notes)?;
        Ok(index)
    }

    /// Replace the text of an existing note.
    pub fn edit_note(&mut self, path: &str, index: usize, text: &str) -> Result<(), SessionError> {
        let text = note_text(text)?;
        let notes_path = self.notes_path_for(path)?;
        let mut notes = self.note_list(&notes_path);
        let len = notes.len();
        let slot = notes.get_mut(index).ok_or_else(|| SessionError::NoteIndex {
            path: path.to_string(),
            index,
            len,
        })?;
        *slot = Value::String(text);
        self.write_notes(path, &notes_path, notes)
    }

    /// Remove one note. Removing the last note deletes the `_notes` key.
    pub fn delete_note(&mut self, path: &str, index: usize) -> Result<String, SessionError> {
        let notes_path = self.notes_path_for(path)?;
        let mut notes = self.note_list(&notes_path);
        if index >= notes.len() {
            return Err(SessionError::NoteIndex {
                path: path.to_string(),
                index,
                len: notes.len(),
            });
        }
        let removed = notes.remove(index);
        if notes.is_empty() {
            tree::remove(&mut self.current, &notes_path);
        } else {
            self.write_notes(path, &notes_path, notes)?;
        }
        Ok(removed.as_str().unwrap_or_default().to_string())
    }

    /// The general note of a top-level section.
    pub fn general_note(&self, section: &str) -> Option<&str> {
        self.current
            .get(section)
            .and_then(|s| s.get(GENERAL_NOTE_KEY))
            .and_then(Value::as_str)
    }

    /// Set a section's general note; blank text clears it.
    ///
    /// Returns whether a note is present afterwards.
    pub fn set_general_note(&mut self, section: &str, text: &str) -> Result<bool, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            self.clear_general_note(section);
            return Ok(false);
        }
        match self.current.get(section) {
            None | Some(Value::Object(_)) => {}
            Some(_) => return Err(invalid(section)),
        }
        let path = KbPath::root().child_key(section).child_key(GENERAL_NOTE_KEY);
        if !tree::set(&mut self.current, &path, Value::String(text.to_string())) {
            return Err(invalid(section));
        }
        Ok(true)
    }

    /// Remove a section's general note. Returns whether one existed.
    pub fn clear_general_note(&mut self, section: &str) -> bool {
        let path = KbPath::root().child_key(section).child_key(GENERAL_NOTE_KEY);
        tree::remove(&mut self.current, &path).is_some()
    }

    /// Delta between the baseline and the working tree.
    pub fn changes(&self) -> ChangeSet {
        diff(&self.original, &self.current)
    }

    pub fn has_changes(&self) -> bool {
        !self.changes().is_empty()
    }

    /// Overlay an externally supplied change set onto the working tree.
    pub fn apply_changes(&mut self, changes: &ChangeSet) {
        patch::apply_in_place(&mut self.current, changes);
    }

    /// Case-insensitive substring search over the working tree.
    pub fn search(&self, query: &str) -> SearchHits<'_> {
        search(&self.current, query)
    }

    /// Sparse tree of everything changed, `None` if nothing changed.
    pub fn export(&self) -> Option<Value> {
        export::export(&self.changes(), &self.current)
    }

    /// Persist the current delta. The working tree is never touched.
    ///
    /// An empty delta drops whatever blob the store still holds, so edits
    /// reverted by hand do not come back on the next open.
    pub async fn save(&self) -> Result<SaveOutcome, SessionError> {
        let changes = self.changes();
        if changes.is_empty() {
            match self.store.clear().await {
                Ok(()) | Err(StoreError::NotConfigured) => {}
                Err(err) => return Err(SessionError::Store(err)),
            }
            return Ok(SaveOutcome::NothingToSave);
        }
        let blob = encode_for_storage(&changes, self.encoding);
        self.store.save(&blob).await?;
        tracing::info!(
            store = %self.store.describe(),
            entries = changes.len(),
            "Saved changes"
        );
        Ok(SaveOutcome::Saved {
            entries: changes.len(),
        })
    }

    /// Drop every change: clear the store, then reset to the baseline.
    ///
    /// If clearing fails the working tree is left as it was. With no store
    /// configured there is nothing persisted, so the reset still happens.
    pub async fn undo(&mut self) -> Result<UndoOutcome, SessionError> {
        let entries = self.changes().len();
        if entries == 0 {
            return Ok(UndoOutcome::NothingToUndo);
        }
        match self.store.clear().await {
            Ok(()) | Err(StoreError::NotConfigured) => {}
            Err(err) => return Err(SessionError::Store(err)),
        }
        self.current = self.original.clone();
        tracing::info!(entries, "Reverted all changes");
        Ok(UndoOutcome::Reverted { entries })
    }

    /// Where the notes of the field at `path` live.
    ///
    /// An index segment that lands on an object names its decimal key, so
    /// `{"1": ..}` fields can be annotated. Elements of real arrays cannot.
    fn notes_path_for(&self, path: &str) -> Result<KbPath, SessionError> {
        let parsed = parse(path);
        if parsed.is_empty() || ends_in_note_key(&parsed) {
            return Err(invalid(path));
        }

        let mut segments = parsed.segments().to_vec();
        if let Some((Segment::Index(i), parent)) = parsed.segments().split_last() {
            let parent = KbPath::from_segments(parent.to_vec());
            if tree::get(&self.current, &parent).is_some_and(Value::is_object) {
                segments.pop();
                segments.push(Segment::Key(i.to_string()));
            }
        }

        KbPath::from_segments(segments)
            .notes_path()
            .ok_or_else(|| SessionError::ElementNotes(path.to_string()))
    }

    fn note_list(&self, notes_path: &KbPath) -> Vec<Value> {
        tree::get(&self.current, notes_path)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }

    fn write_notes(
        &mut self,
        path: &str,
        notes_path: &KbPath,
        notes: Vec<Value>,
    ) -> Result<(), SessionError> {
        if tree::set(&mut self.current, notes_path, Value::Array(notes)) {
            Ok(())
        } else {
            Err(invalid(path))
        }
    }
}

fn ends_in_note_key(path: &KbPath) -> bool {
    path.last()
        .and_then(|s| s.as_key())
        .is_some_and(is_note_key)
}

fn note_text(text: &str) -> Result<String, SessionError> {
    let text = text.trim();
    if text.is_empty() {
        Err(SessionError::EmptyNote)
    } else {
        Ok(text.to_string())
    }
}

fn invalid(path: &str) -> SessionError {
    SessionError::InvalidPath(path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, UnconfiguredStore};
    use serde_json::json;

    fn baseline() -> Value {
        json!({"A": {"x": "1", "x_notes": [], "items": ["a", "c"]}, "B": {"v": "I have a Dog"}})
    }

    #[tokio::test]
    async fn test_edit_and_note_produce_expected_changes() {
        let mut session = Session::new(json!({"A": {"x": "1", "x_notes": []}}), MemoryStore::new());
        assert!(session.apply_edit("A.x", json!("2")).unwrap());
        assert_eq!(session.add_note("A.x", "  check ").unwrap(), 0);

        let changes = session.changes();
        assert_eq!(
            serde_json::to_value(&changes).unwrap(),
            json!({"modifications": {"A.x": "2"}, "notes": {"A.x_notes": ["check"]}})
        );
    }

    #[tokio::test]
    async fn test_same_value_edit_is_noop() {
        let mut session = Session::new(baseline(), MemoryStore::new());
        assert!(!session.apply_edit("A.x", json!("1")).unwrap());
        assert!(!session.has_changes());
        assert!(matches!(
            session.apply_edit("A.x_notes", json!(["sneaky"])),
            Err(SessionError::InvalidPath(_))
        ));
        assert!(session.apply_edit("", json!(1)).is_err());
    }

    #[tokio::test]
    async fn test_deleting_last_note_removes_key() {
        let mut session = Session::new(baseline(), MemoryStore::new());
        session.add_note("B.v", "first").unwrap();
        session.add_note("B.v", "second").unwrap();
        session.edit_note("B.v", 1, "second!").unwrap();
        assert_eq!(session.notes("B.v"), vec!["first", "second!"]);

        assert_eq!(session.delete_note("B.v", 0).unwrap(), "first");
        assert_eq!(session.get("B.v_notes"), Some(&json!(["second!"])));
        assert_eq!(session.delete_note("B.v", 0).unwrap(), "second!");
        assert_eq!(session.get("B.v_notes"), None);
        assert!(session.current()["B"].as_object().unwrap().get("v_notes").is_none());
        assert!(!session.has_changes());
    }

    #[tokio::test]
    async fn test_emptying_baseline_note_list_removes_key() {
        let mut session = Session::new(baseline(), MemoryStore::new());
        session.add_note("A.x", "n").unwrap();
        session.delete_note("A.x", 0).unwrap();
        assert_eq!(session.get("A.x_notes"), None);

        // an empty baseline list carries no content, so nothing to record
        assert!(session.changes().notes.is_empty());
    }

    #[tokio::test]
    async fn test_array_elements_reject_notes() {
        let mut session = Session::new(baseline(), MemoryStore::new());
        let hit = session.search("c").next().unwrap();
        assert_eq!(hit.path.to_string(), "A.items[1]");

        assert!(matches!(
            session.add_note("A.items[1]", "check"),
            Err(SessionError::ElementNotes(p)) if p == "A.items[1]"
        ));
        assert!(matches!(
            session.delete_note("A.items[1]", 0),
            Err(SessionError::ElementNotes(_))
        ));
        assert!(session.notes("A.items[1]").is_empty());
        assert_eq!(session.current(), &baseline());
    }

    #[tokio::test]
    async fn test_notes_inside_array_elements_and_digit_keys() {
        let doc = json!({"A": {"rows": [{"label": "x"}], "years": {"2024": "ok"}}});
        let mut session = Session::new(doc, MemoryStore::new());

        session.add_note("A.rows[0].label", "row note").unwrap();
        assert_eq!(session.get("A.rows[0].label_notes"), Some(&json!(["row note"])));

        session.add_note("A.years.2024", "year note").unwrap();
        assert_eq!(session.notes("A.years.2024"), vec!["year note"]);
        assert_eq!(
            session.current()["A"]["years"]["2024_notes"],
            json!(["year note"])
        );

        session.delete_note("A.years.2024", 0).unwrap();
        assert!(session.current()["A"]["years"].get("2024_notes").is_none());
    }

    #[tokio::test]
    async fn test_removed_note_persists_without_nulls() {
        let doc = json!({"A": {"x": "1", "x_notes": ["old"]}});
        let store = MemoryStore::new();
        let mut session = Session::new(doc.clone(), store.clone());
        session.delete_note("A.x", 0).unwrap();
        assert_eq!(session.save().await.unwrap(), SaveOutcome::Saved { entries: 1 });

        let blob = store.snapshot().unwrap();
        assert_eq!(blob, json!({"notes": {"A%2Ex_notes": false}}));

        let (reopened, outcome) = Session::open(doc, store, KeyEncoding::Percent).await;
        assert_eq!(outcome, LoadOutcome::Restored { entries: 1 });
        assert_eq!(reopened.get("A.x_notes"), None);
        assert!(reopened.notes("A.x").is_empty());
    }

    #[tokio::test]
    async fn test_note_errors() {
        let mut session = Session::new(baseline(), MemoryStore::new());
        assert!(matches!(session.add_note("A.x", "   "), Err(SessionError::EmptyNote)));
        assert!(matches!(
            session.delete_note("A.x", 3),
            Err(SessionError::NoteIndex { index: 3, len: 0, .. })
        ));
        assert!(matches!(
            session.edit_note("A.x", 0, "text"),
            Err(SessionError::NoteIndex { .. })
        ));
    }

    #[tokio::test]
    async fn test_general_note_lifecycle() {
        let mut session = Session::new(baseline(), MemoryStore::new());
        assert!(session.set_general_note("A", " about A ").unwrap());
        assert_eq!(session.general_note("A"), Some("about A"));
        assert_eq!(
            session.changes().notes.get("A._general_note"),
            Some(&json!("about A"))
        );
        assert!(!session.set_general_note("A", "").unwrap());
        assert_eq!(session.general_note("A"), None);
        assert!(!session.has_changes());
        assert_eq!(session.sections(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_save_and_reopen_restores() {
        let store = MemoryStore::new();
        let mut session = Session::new(baseline(), store.clone());
        session.apply_edit("A.items[1]", json!("b")).unwrap();
        session.add_note("B.v", "woof").unwrap();
        assert_eq!(
            session.save().await.unwrap(),
            SaveOutcome::Saved { entries: 2 }
        );

        let (reopened, outcome) = Session::open(baseline(), store, KeyEncoding::Percent).await;
        assert_eq!(outcome, LoadOutcome::Restored { entries: 2 });
        assert_eq!(reopened.current(), session.current());
        assert_eq!(reopened.original(), &baseline());
    }

    #[tokio::test]
    async fn test_save_without_changes_drops_stale_blob() {
        let store = MemoryStore::new();
        let mut session = Session::new(baseline(), store.clone());
        session.apply_edit("A.x", json!("2")).unwrap();
        session.save().await.unwrap();

        session.apply_edit("A.x", json!("1")).unwrap();
        assert_eq!(session.save().await.unwrap(), SaveOutcome::NothingToSave);
        assert_eq!(store.snapshot(), None);

        let unconfigured = Session::new(baseline(), UnconfiguredStore);
        assert_eq!(unconfigured.save().await.unwrap(), SaveOutcome::NothingToSave);
    }

    #[tokio::test]
    async fn test_save_failures_keep_working_tree() {
        let mut session = Session::new(baseline(), UnconfiguredStore);
        session.apply_edit("A.x", json!("9")).unwrap();
        assert!(matches!(
            session.save().await,
            Err(SessionError::StoreNotConfigured)
        ));
        assert_eq!(session.get("A.x"), Some(&json!("9")));

        let store = MemoryStore::new();
        store.set_failing(true);
        let mut session = Session::new(baseline(), store);
        session.apply_edit("A.x", json!("9")).unwrap();
        assert!(matches!(session.save().await, Err(SessionError::Store(_))));
        assert_eq!(session.get("A.x"), Some(&json!("9")));
    }

    #[tokio::test]
    async fn test_open_fallbacks() {
        let (session, outcome) =
            Session::open(baseline(), UnconfiguredStore, KeyEncoding::Percent).await;
        assert_eq!(outcome, LoadOutcome::Baseline);
        assert_eq!(session.current(), &baseline());

        let failing = MemoryStore::with_blob(json!({"modifications": {"A%2Ex": "2"}}));
        failing.set_failing(true);
        let (session, outcome) = Session::open(baseline(), failing, KeyEncoding::Percent).await;
        assert!(matches!(outcome, LoadOutcome::FellBack { .. }));
        assert_eq!(session.current(), &baseline());

        let garbage = MemoryStore::with_blob(json!([1, 2, 3]));
        let (session, outcome) = Session::open(baseline(), garbage, KeyEncoding::Percent).await;
        assert!(matches!(outcome, LoadOutcome::FellBack { .. }));
        assert_eq!(session.current(), &baseline());
    }

    #[tokio::test]
    async fn test_undo_clears_store_and_resets() {
        let store = MemoryStore::new();
        let mut session = Session::new(baseline(), store.clone());
        assert_eq!(session.undo().await.unwrap(), UndoOutcome::NothingToUndo);

        session.apply_edit("A.x", json!("2")).unwrap();
        session.save().await.unwrap();
        assert!(store.snapshot().is_some());

        assert_eq!(
            session.undo().await.unwrap(),
            UndoOutcome::Reverted { entries: 1 }
        );
        assert_eq!(store.snapshot(), None);
        assert_eq!(session.current(), &baseline());
    }

    #[tokio::test]
    async fn test_undo_failure_keeps_edits() {
        let store = MemoryStore::new();
        let mut session = Session::new(baseline(), store.clone());
        session.apply_edit("A.x", json!("2")).unwrap();
        store.set_failing(true);
        assert!(matches!(session.undo().await, Err(SessionError::Store(_))));
        assert_eq!(session.get("A.x"), Some(&json!("2")));
    }

    #[tokio::test]
    async fn test_search_and_export_from_session() {
        let mut session = Session::new(baseline(), MemoryStore::new());
        let hits: Vec<_> = session.search("dog").collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path.to_string(), "B.v");

        assert_eq!(session.export(), None);
        session.add_note("B.v", "good boy").unwrap();
        assert_eq!(
            session.export(),
            Some(json!({"B": {"v": "I have a Dog", "v_notes": ["good boy"]}}))
        );
    }
}
