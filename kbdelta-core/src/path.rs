//! Path string parsing and joining.

use kbdelta_types::{KbPath, Segment};
use regex::Regex;
use std::sync::OnceLock;

static BRACKET_INDEX_REGEX: OnceLock<Regex> = OnceLock::new();

fn bracket_index_regex() -> &'static Regex {
    BRACKET_INDEX_REGEX.get_or_init(|| Regex::new(r"\[(\d+)\]").unwrap())
}

/// Parse a dotted/bracketed path string into segments
///
/// `[N]` is rewritten to `.N` before splitting on `.`; empty segments are
/// dropped, so malformed input (`"a..b."`, `""`) still yields whatever
/// segments can be recovered. All-digit segments become indices.
///
/// # Examples
///
/// ```
/// use kbdelta_core::path::parse;
///
/// let path = parse("Category.items[2].label");
/// assert_eq!(path.len(), 4);
/// assert_eq!(path.to_string(), "Category.items[2].label");
/// ```
pub fn parse(path: &str) -> KbPath {
    let normalized = bracket_index_regex().replace_all(path, ".$1");
    let segments = normalized
        .split('.')
        .filter(|s| !s.is_empty())
        .map(segment_from_str)
        .collect();
    KbPath::from_segments(segments)
}

/// Render segments back to the string form accepted by [`parse`].
pub fn join(segments: &[Segment]) -> String {
    KbPath::from_segments(segments.to_vec()).to_string()
}

fn segment_from_str(raw: &str) -> Segment {
    let seg = Segment::key(raw);
    if seg.is_numeric() {
        // Overlong digit runs do not fit an index; keep them as keys.
        match raw.parse::<usize>() {
            Ok(i) => Segment::Index(i),
            Err(_) => seg,
        }
    } else {
        seg
    }
}
