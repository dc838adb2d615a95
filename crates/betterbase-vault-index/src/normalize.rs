//! Deterministic canonicalization of field values before trigram extraction.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Single separator every run of whitespace/punctuation collapses to.
pub const SEPARATOR: char = ' ';

/// Lowercase, diacritic-free text whose words are separated by exactly one
/// [`SEPARATOR`], with no leading or trailing separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize one field value.
///
/// NFKD-decomposes, drops combining marks (so `é` becomes `e`), lowercases,
/// keeps alphanumerics and turns every other run of characters into one
/// separator. Pure: no key, no randomness.
pub fn normalize(field: &str) -> NormalizedText {
    let mut out = String::with_capacity(field.len());
    let mut pending_separator = false;

    for c in field.nfkd() {
        if is_combining_mark(c) {
            continue;
        }
        if !c.is_alphanumeric() {
            pending_separator = true;
            continue;
        }
        if pending_separator && !out.is_empty() {
            out.push(SEPARATOR);
        }
        pending_separator = false;
        // Lowercasing can reintroduce marks (e.g. U+0130 -> "i\u{307}").
        out.extend(c.to_lowercase().filter(|lc| !is_combining_mark(*lc)));
    }

    NormalizedText(out)
}
