//! Change set <-> storage blob conversion.

use crate::storage_key::{decode_key, encode_key, KeyEncoding};
use kbdelta_types::ChangeSet;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Stored blob is not an object: {0}")]
    MalformedBlob(String),

    #[error("Stored `{0}` section is not an object")]
    MalformedSection(&'static str),
}

/// Marker stored for a removed note. Realtime-database stores drop `null`
/// children on write, so the `null` tombstone never reaches the blob as is.
const REMOVED_NOTE: bool = false;

/// Encode every key of both maps for a restricted-alphabet store.
///
/// Values pass through unchanged, except that note tombstones are stored
/// as `false`. Empty maps are left out of the blob.
pub fn encode_for_storage(changes: &ChangeSet, encoding: KeyEncoding) -> Value {
    let mut blob = Map::new();
    if !changes.modifications.is_empty() {
        blob.insert(
            "modifications".into(),
            encode_section(&changes.modifications, encoding, Value::clone),
        );
    }
    if !changes.notes.is_empty() {
        blob.insert(
            "notes".into(),
            encode_section(&changes.notes, encoding, note_to_storage),
        );
    }
    Value::Object(blob)
}

/// Inverse of [`encode_for_storage`].
///
/// `None` (or a stored `null`) means nothing was ever persisted and yields
/// `None`; an empty object yields an empty change set.
pub fn decode_from_storage(
    blob: Option<Value>,
    encoding: KeyEncoding,
) -> Result<Option<ChangeSet>, EncodingError> {
    let map = match blob {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(map)) => map,
        Some(other) => return Err(EncodingError::MalformedBlob(type_name(&other).into())),
    };

    Ok(Some(ChangeSet {
        modifications: decode_section(&map, "modifications", encoding, Value::clone)?,
        notes: decode_section(&map, "notes", encoding, note_from_storage)?,
    }))
}

fn encode_section(
    section: &BTreeMap<String, Value>,
    encoding: KeyEncoding,
    value: fn(&Value) -> Value,
) -> Value {
    Value::Object(
        section
            .iter()
            .map(|(k, v)| (encode_key(k, encoding), value(v)))
            .collect(),
    )
}

fn note_to_storage(note: &Value) -> Value {
    match note {
        Value::Null => Value::Bool(REMOVED_NOTE),
        other => other.clone(),
    }
}

fn note_from_storage(note: &Value) -> Value {
    match note {
        Value::Bool(REMOVED_NOTE) => Value::Null,
        other => other.clone(),
    }
}

fn decode_section(
    blob: &Map<String, Value>,
    name: &'static str,
    encoding: KeyEncoding,
    value: fn(&Value) -> Value,
) -> Result<BTreeMap<String, Value>, EncodingError> {
    match blob.get(name) {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(Value::Object(section)) => Ok(section
            .iter()
            .map(|(k, v)| (decode_key(k, encoding), value(v)))
            .collect()),
        Some(_) => Err(EncodingError::MalformedSection(name)),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
