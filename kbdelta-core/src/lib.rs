//! # kbdelta-core
//!
//! Core library for kbdelta, a diff/patch engine for JSON knowledge bases.
//!
//! This crate provides path parsing, tree access, change-set computation and
//! replay, storage-safe key encoding, search, export, and the editing
//! [`Session`] that ties them to a [`ChangeStore`].

pub mod config;
pub mod diff;
pub mod encoding;
pub mod export;
pub mod path;
pub mod patch;
pub mod search;
pub mod session;
pub mod storage_key;
pub mod store;
pub mod tree;

pub use config::{Config, StoreConfig, StoreKind};
pub use diff::diff;
pub use encoding::{decode_from_storage, encode_for_storage, EncodingError};
pub use patch::apply;
pub use search::{readable_path, search, SearchHit, SearchHits};
pub use session::{LoadOutcome, SaveOutcome, Session, SessionError, UndoOutcome};
pub use storage_key::KeyEncoding;
pub use store::{ChangeStore, MemoryStore, StoreError, UnconfiguredStore};

pub use kbdelta_types::{ChangeSet, KbPath, Segment, GENERAL_NOTE_KEY, NOTES_SUFFIX};
