//! Shared JSON shapes for machine-consumable command output.

use kbdelta_core::{ChangeSet, LoadOutcome};
use serde::Serialize;
use serde_json::Value;

pub const SCHEMA_VERSION: &str = "kbdelta-v1";

/// Standard envelope for `--json` responses.
#[derive(Serialize)]
pub struct Envelope<T> {
    pub schema_version: &'static str,
    pub kind: &'static str,
    pub data: T,
}

pub fn envelope<T>(kind: &'static str, data: T) -> Envelope<T> {
    Envelope {
        schema_version: SCHEMA_VERSION,
        kind,
        data,
    }
}

#[derive(Serialize)]
pub struct SearchResult {
    pub path: String,
    pub location: String,
    pub value: String,
}

#[derive(Serialize)]
pub struct SearchData {
    pub query: String,
    pub limit: usize,
    pub total: usize,
    pub results: Vec<SearchResult>,
}

#[derive(Serialize)]
pub struct FieldData {
    pub path: String,
    pub value: Option<Value>,
    pub notes: Vec<String>,
}

#[derive(Serialize)]
pub struct NotesData {
    pub path: String,
    pub notes: Vec<String>,
}

#[derive(Serialize)]
pub struct StatusData {
    pub document: String,
    pub store: String,
    pub key_encoding: &'static str,
    pub load: &'static str,
    pub modifications: usize,
    pub notes: usize,
    pub changes: ChangeSet,
}

/// Short label for a load outcome.
pub fn load_label(outcome: &LoadOutcome) -> &'static str {
    match outcome {
        LoadOutcome::Baseline => "baseline",
        LoadOutcome::Restored { .. } => "restored",
        LoadOutcome::FellBack { .. } => "fell_back",
    }
}
