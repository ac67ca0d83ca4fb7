//! Storage-safe encoding of path strings used as store keys.
//!
//! Key-value stores in the Firebase family reject `.`, `#`, `$`, `/`, `[`
//! and `]` in keys. Two schemes are supported:
//!
//! - [`KeyEncoding::Percent`] escapes exactly the reserved set plus `%`, so
//!   every string round-trips.
//! - [`KeyEncoding::Markers`] reads and writes the `__DOT__`-style markers
//!   written by the legacy web client. A source string that already contains
//!   one of the marker words decodes to the reserved character instead.

use serde::{Deserialize, Serialize};

/// Characters a restricted store refuses in keys.
pub const RESERVED: [char; 6] = ['[', ']', '.', '#', '$', '/'];

const MARKERS: [(char, &str); 6] = [
    ('[', "__LBRACK__"),
    (']', "__RBRACK__"),
    ('.', "__DOT__"),
    ('#', "__HASH__"),
    ('$', "__DOLLAR__"),
    ('/', "__SLASH__"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEncoding {
    #[default]
    Percent,
    Markers,
}

impl KeyEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyEncoding::Percent => "percent",
            KeyEncoding::Markers => "markers",
        }
    }
}

/// Encode a key for storage under the given scheme.
pub fn encode_key(key: &str, encoding: KeyEncoding) -> String {
    match encoding {
        KeyEncoding::Percent => percent_encode(key),
        KeyEncoding::Markers => markers_encode(key),
    }
}

/// Decode a stored key back to its path string.
pub fn decode_key(key: &str, encoding: KeyEncoding) -> String {
    match encoding {
        KeyEncoding::Percent => percent_decode(key),
        KeyEncoding::Markers => markers_decode(key),
    }
}

fn percent_encode(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for ch in key.chars() {
        if ch == '%' || RESERVED.contains(&ch) {
            out.push_str(&format!("%{:02X}", ch as u32));
        } else {
            out.push(ch);
        }
    }
    out
}

fn percent_decode(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut rest = key;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match tail.get(1..3).and_then(escaped_char) {
            Some(ch) => {
                out.push(ch);
                rest = &tail[3..];
            }
            None => {
                // Not one of ours; keep the `%` literally.
                out.push('%');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn escaped_char(hex: &str) -> Option<char> {
    let code = u8::from_str_radix(hex, 16).ok()?;
    let ch = char::from(code);
    (ch == '%' || RESERVED.contains(&ch)).then_some(ch)
}

fn markers_encode(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for ch in key.chars() {
        match MARKERS.iter().find(|(c, _)| *c == ch) {
            Some((_, marker)) => out.push_str(marker),
            None => out.push(ch),
        }
    }
    out
}

fn markers_decode(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut rest = key;
    'outer: while !rest.is_empty() {
        for (ch, marker) in MARKERS {
            if let Some(tail) = rest.strip_prefix(marker) {
                out.push(ch);
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            out.push(ch);
        }
        rest = chars.as_str();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_percent_escapes_reserved_set() {
        assert_eq!(
            encode_key("A.items[1]#$/", KeyEncoding::Percent),
            "A%2Eitems%5B1%5D%23%24%2F"
        );
        assert_eq!(encode_key("100%", KeyEncoding::Percent), "100%25");
        assert_eq!(encode_key("plain key", KeyEncoding::Percent), "plain key");
    }

    #[test]
    fn test_percent_output_has_no_reserved_chars() {
        let encoded = encode_key("a.b[0]/c#d$e", KeyEncoding::Percent);
        assert!(!encoded.contains(RESERVED));
    }

    #[test]
    fn test_percent_decode_leaves_foreign_sequences() {
        assert_eq!(decode_key("50%off", KeyEncoding::Percent), "50%off");
        assert_eq!(decode_key("%41", KeyEncoding::Percent), "%41");
        assert_eq!(decode_key("%2", KeyEncoding::Percent), "%2");
        assert_eq!(decode_key("%2e", KeyEncoding::Percent), ".");
    }

    #[test]
    fn test_markers_match_legacy_client() {
        assert_eq!(
            encode_key("A.items[1]", KeyEncoding::Markers),
            "A__DOT__items__LBRACK__1__RBRACK__"
        );
        assert_eq!(
            decode_key("Cat__DOT__x_notes", KeyEncoding::Markers),
            "Cat.x_notes"
        );
    }

    #[test]
    fn test_markers_known_limitation() {
        // A literal marker word is indistinguishable from an encoded character.
        let encoded = encode_key("a__DOT__b", KeyEncoding::Markers);
        assert_eq!(decode_key(&encoded, KeyEncoding::Markers), "a.b");
    }

    #[test]
    fn test_encoding_names() {
        assert_eq!(KeyEncoding::default().as_str(), "percent");
        assert_eq!(KeyEncoding::Markers.as_str(), "markers");
    }

    proptest! {
        #[test]
        fn prop_percent_roundtrip(s in any::<String>()) {
            let encoded = encode_key(&s, KeyEncoding::Percent);
            prop_assert_eq!(decode_key(&encoded, KeyEncoding::Percent), s);
        }

        #[test]
        fn prop_percent_roundtrip_reserved_alphabet(s in "[\\[\\]\\.#$/%a-z0-9_]{0,24}") {
            let encoded = encode_key(&s, KeyEncoding::Percent);
            prop_assert!(!encoded.contains(RESERVED));
            prop_assert_eq!(decode_key(&encoded, KeyEncoding::Percent), s);
        }

        #[test]
        fn prop_markers_roundtrip_reserved_alphabet(s in "[\\[\\]\\.#$/a-z0-9]{0,24}") {
            let encoded = encode_key(&s, KeyEncoding::Markers);
            prop_assert!(!encoded.contains(RESERVED));
            prop_assert_eq!(decode_key(&encoded, KeyEncoding::Markers), s);
        }
    }
}
