//! Diff/patch/storage round trips over whole documents.

use kbdelta_core::storage_key::{decode_key, encode_key};
use kbdelta_core::{
    apply, decode_from_storage, diff, encode_for_storage, ChangeSet, KeyEncoding, MemoryStore,
    Session,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn knowledge_base() -> Value {
    json!({
        "Care Team": {
            "lead": "Dr. Smith",
            "lead_notes": ["confirm spelling"],
            "members": ["a", "b", "c"],
            "contact": {"phone": "555-0100", "email": "care@example.com"},
            "_general_note": "reviewed 2024"
        },
        "Billing": {
            "plan": "basic",
            "rate": 10,
            "active": true
        }
    })
}

#[test]
fn patch_of_diff_reproduces_current() {
    let original = knowledge_base();
    let mut current = original.clone();
    current["Care Team"]["contact"]["phone"] = json!("555-0199");
    current["Care Team"]["members"][1] = json!("B");
    current["Billing"]["rate"] = json!(12);
    current["Billing"]["plan_notes"] = json!(["upgrade?"]);
    current["Billing"]["new_field"] = json!("added");

    let changes = diff(&original, &current);
    assert_eq!(apply(&original, Some(&changes)), current);
    assert_eq!(
        changes.modifications.get("Care Team.members"),
        Some(&json!(["a", "B", "c"]))
    );
}

#[test]
fn identical_trees_produce_no_changes() {
    let original = knowledge_base();
    assert!(diff(&original, &original.clone()).is_empty());
    assert_eq!(apply(&original, None), original);
    assert_eq!(apply(&original, Some(&ChangeSet::new())), original);
}

#[test]
fn applying_twice_is_idempotent() {
    let original = knowledge_base();
    let mut current = original.clone();
    current["Billing"]["plan"] = json!("pro");
    current["Care Team"]["lead_notes"] = json!(["confirm spelling", "called"]);

    let changes = diff(&original, &current);
    let once = apply(&original, Some(&changes));
    let twice = apply(&once, Some(&changes));
    assert_eq!(once, twice);
}

#[test]
fn removed_note_round_trips_as_tombstone() {
    let original = knowledge_base();
    let mut current = original.clone();
    current["Care Team"]
        .as_object_mut()
        .unwrap()
        .remove("lead_notes");
    current["Care Team"]["_general_note"] = json!("");

    let changes = diff(&original, &current);
    assert_eq!(changes.notes.get("Care Team.lead_notes"), Some(&Value::Null));

    let restored = apply(&original, Some(&changes));
    assert_eq!(restored["Care Team"].get("lead_notes"), None);
    assert_eq!(restored["Care Team"].get("_general_note"), None);
}

#[test]
fn storage_blob_survives_restricted_keys() {
    let original = json!({"Section.v1": {"a/b": "x", "list": ["p"]}});
    let mut current = original.clone();
    current["Section.v1"]["a/b"] = json!("y");
    current["Section.v1"]["list"][0] = json!("q");

    let changes = diff(&original, &current);
    for encoding in [KeyEncoding::Percent, KeyEncoding::Markers] {
        let blob = encode_for_storage(&changes, encoding);
        for key in blob["modifications"].as_object().unwrap().keys() {
            assert!(!key.contains(['.', '/', '[', ']', '#', '$']), "{key}");
        }
        let decoded = decode_from_storage(Some(blob), encoding).unwrap().unwrap();
        assert_eq!(decoded, changes);
    }
}

#[tokio::test]
async fn session_survives_reopen_through_store() {
    let store = MemoryStore::new();
    let mut session = Session::new(knowledge_base(), store.clone());
    session
        .apply_edit("Care Team.members[2]", json!("C"))
        .unwrap();
    session.add_note("Billing.rate", "verify").unwrap();
    session.set_general_note("Billing", "audit due").unwrap();
    session.save().await.unwrap();

    let (reopened, _) = Session::open(knowledge_base(), store, KeyEncoding::Percent).await;
    assert_eq!(reopened.current(), session.current());
    assert_eq!(reopened.notes("Billing.rate"), vec!["verify"]);
    assert_eq!(reopened.general_note("Billing"), Some("audit due"));
}

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-z ]{0,8}".prop_map(Value::String),
        any::<i32>().prop_map(|n| json!(n)),
        any::<bool>().prop_map(Value::Bool),
    ]
}

fn arb_section() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-z]{1,4}", arb_leaf(), 0..5)
        .prop_map(|m| Value::Object(m.into_iter().collect()))
}

fn arb_document() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[A-Z][a-z]{0,4}", arb_section(), 0..4)
        .prop_map(|m| Value::Object(m.into_iter().collect()))
}

proptest! {
    #[test]
    fn leaf_edits_always_round_trip(
        original in arb_document(),
        edits in prop::collection::vec((0usize..4, 0usize..5, arb_leaf()), 0..6),
    ) {
        let mut current = original.clone();
        for (section, field, value) in edits {
            let Some(obj) = current.as_object_mut() else { continue };
            let Some((_, sect)) = obj.iter_mut().nth(section) else { continue };
            let Some(fields) = sect.as_object_mut() else { continue };
            let key = fields.keys().nth(field).cloned().unwrap_or_else(|| format!("f{field}"));
            fields.insert(key, value);
        }

        let changes = diff(&original, &current);
        let patched = apply(&original, Some(&changes));
        prop_assert_eq!(&patched, &current);
        prop_assert_eq!(diff(&original, &patched), changes);
    }

    #[test]
    fn percent_keys_round_trip(key in "\\PC{0,16}") {
        let encoded = encode_key(&key, KeyEncoding::Percent);
        prop_assert_eq!(decode_key(&encoded, KeyEncoding::Percent), key);
    }
}
