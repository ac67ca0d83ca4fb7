//! Shared types for kbdelta
//!
//! This crate provides the value types passed between the kbdelta crates:
//! tree paths, change sets, and the note-sentinel naming convention.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Suffix appended to a field name to form its notes sibling key.
pub const NOTES_SUFFIX: &str = "_notes";

/// Key holding the free-text note of a top-level section.
pub const GENERAL_NOTE_KEY: &str = "_general_note";

/// Returns true if `key` belongs to the notes side-channel.
pub fn is_note_key(key: &str) -> bool {
    key.ends_with(NOTES_SUFFIX) || key == GENERAL_NOTE_KEY
}

/// A single step in a tree path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    /// Object field name
    Key(String),
    /// Array position
    Index(usize),
}

impl Segment {
    pub fn key(k: impl Into<String>) -> Self {
        Segment::Key(k.into())
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(k) => Some(k),
            Segment::Index(_) => None,
        }
    }

    /// True for index segments and for keys made only of ASCII digits.
    pub fn is_numeric(&self) -> bool {
        match self {
            Segment::Index(_) => true,
            Segment::Key(k) => !k.is_empty() && k.bytes().all(|b| b.is_ascii_digit()),
        }
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        Segment::Key(s.to_owned())
    }
}

impl From<String> for Segment {
    fn from(s: String) -> Self {
        Segment::Key(s)
    }
}

impl From<usize> for Segment {
    fn from(i: usize) -> Self {
        Segment::Index(i)
    }
}

/// A location in a document tree.
///
/// The display form joins keys with `.` and renders indices as `[N]`,
/// e.g. `Category.items[2].label`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KbPath(Vec<Segment>);

impl KbPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.0.last()
    }

    /// New path with a key segment appended.
    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Key(key.into()));
        Self(segments)
    }

    /// New path with an index segment appended.
    pub fn child_index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(index));
        Self(segments)
    }

    /// Path of the `_notes` sibling for the field this path points at.
    ///
    /// `None` for the root and for index-terminated paths (`list[3]`): an
    /// array element has no sibling key to hold its notes.
    pub fn notes_path(&self) -> Option<Self> {
        let (last, parent) = self.0.split_last()?;
        let name = match last {
            Segment::Key(k) => format!("{k}{NOTES_SUFFIX}"),
            Segment::Index(_) => return None,
        };
        let mut segments = parent.to_vec();
        segments.push(Segment::Key(name));
        Some(Self(segments))
    }

    /// Inverse of [`KbPath::notes_path`]: the data field a `_notes` path annotates.
    pub fn data_path_of_notes(&self) -> Option<Self> {
        let (last, parent) = self.0.split_last()?;
        let name = last.as_key()?.strip_suffix(NOTES_SUFFIX)?;
        if name.is_empty() {
            return None;
        }
        let mut segments = parent.to_vec();
        let seg = Segment::Key(name.to_string());
        segments.push(if seg.is_numeric() {
            Segment::Index(name.parse().ok()?)
        } else {
            seg
        });
        Some(Self(segments))
    }
}

impl fmt::Display for KbPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                Segment::Key(k) if i == 0 => write!(f, "{k}")?,
                Segment::Key(k) => write!(f, ".{k}")?,
                Segment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

/// Flat overlay of edits relative to a baseline tree.
///
/// Keys are path strings. A key absent from `modifications` means the value
/// is inherited from the baseline. In `notes`, a `null` value marks a
/// removed annotation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub modifications: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub notes: BTreeMap<String, Value>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.modifications.is_empty() && self.notes.is_empty()
    }

    /// Total number of recorded entries across both maps.
    pub fn len(&self) -> usize {
        self.modifications.len() + self.notes.len()
    }
}
