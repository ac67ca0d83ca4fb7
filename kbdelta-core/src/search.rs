//! Substring search over the string leaves of a tree.
//!
//! No index is kept: each call to [`search`] starts a fresh depth-first
//! walk, and hits are produced lazily as the iterator is advanced.

use kbdelta_types::{is_note_key, KbPath, Segment};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub path: KbPath,
    pub value: String,
}

/// Lazy depth-first iterator over matching string leaves.
#[derive(Debug)]
pub struct SearchHits<'a> {
    needle: String,
    stack: Vec<(KbPath, &'a Value)>,
}

/// Case-insensitive search for `query` in every string leaf of `tree`.
///
/// Note sentinels are skipped. An empty or blank query matches nothing.
pub fn search<'a>(tree: &'a Value, query: &str) -> SearchHits<'a> {
    let needle = query.trim().to_lowercase();
    let stack = if needle.is_empty() {
        Vec::new()
    } else {
        vec![(KbPath::root(), tree)]
    };
    SearchHits { needle, stack }
}

impl<'a> Iterator for SearchHits<'a> {
    type Item = SearchHit;

    fn next(&mut self) -> Option<SearchHit> {
        while let Some((path, node)) = self.stack.pop() {
            match node {
                Value::Object(map) => {
                    // Reverse push keeps document order on pop.
                    for (key, value) in map.iter().rev() {
                        if !is_note_key(key) {
                            self.stack.push((path.child_key(key.clone()), value));
                        }
                    }
                }
                Value::Array(items) => {
                    for (i, value) in items.iter().enumerate().rev() {
                        self.stack.push((path.child_index(i), value));
                    }
                }
                Value::String(s) if s.to_lowercase().contains(&self.needle) => {
                    return Some(SearchHit {
                        path,
                        value: s.clone(),
                    });
                }
                _ => {}
            }
        }
        None
    }
}

impl<'a> SearchHits<'a> {
    /// Keep only the first hit for each distinct value.
    pub fn unique_values(self) -> impl Iterator<Item = SearchHit> + 'a {
        let mut seen = HashSet::new();
        self.filter(move |hit| seen.insert(hit.value.clone()))
    }
}

/// Human-oriented rendering of a path: `A > items > label`.
///
/// Array indices are dropped and underscores shown as spaces.
pub fn readable_path(path: &KbPath) -> String {
    path.segments()
        .iter()
        .filter_map(Segment::as_key)
        .map(|k| k.replace('_', " "))
        .collect::<Vec<_>>()
        .join(" > ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_case_insensitive_hit() {
        let tree = json!({"A": {"v": "I have a Dog"}});
        let hits: Vec<_> = search(&tree, "dog").collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path.to_string(), "A.v");
        assert_eq!(hits[0].value, "I have a Dog");
    }

    #[test]
    fn test_skips_notes_and_non_strings() {
        let tree = json!({
            "A": {
                "v": "cat",
                "v_notes": ["cat note"],
                "_general_note": "cat general",
                "n": 42,
                "flag": true
            }
        });
        let hits: Vec<_> = search(&tree, "cat").collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path.to_string(), "A.v");
    }

    #[test]
    fn test_array_paths_and_document_order() {
        let tree = json!({"B": {"list": ["alpha", {"x": "alphabet"}]}, "A": "alpine"});
        let paths: Vec<_> = search(&tree, "alp").map(|h| h.path.to_string()).collect();
        assert_eq!(paths, vec!["B.list[0]", "B.list[1].x", "A"]);
    }

    #[test]
    fn test_restartable_and_empty_query() {
        let tree = json!({"A": "x"});
        assert_eq!(search(&tree, "x").count(), 1);
        assert_eq!(search(&tree, "x").count(), 1);
        assert_eq!(search(&tree, "   ").count(), 0);
    }

    #[test]
    fn test_unique_values_keep_first() {
        let tree = json!({"A": {"a": "same"}, "B": {"b": "same", "c": "other same"}});
        let hits: Vec<_> = search(&tree, "same").unique_values().collect();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].path.to_string(), "A.a");
        assert_eq!(hits[1].path.to_string(), "B.c");
    }

    #[test]
    fn test_readable_path() {
        let path = crate::path::parse("Main_Section.items[3].label_text");
        assert_eq!(readable_path(&path), "Main Section > items > label text");
    }
}
