//! Trigram extraction over normalized text.
//!
//! Index side: every field is padded with one [`SENTINEL`] on each side so
//! short fields and field edges still produce grams. The sentinel is the
//! word separator, so a field edge looks exactly like a word edge.

use std::collections::BTreeSet;
use std::iter;

use crate::normalize::{normalize, NormalizedText, SEPARATOR};

/// Padding character placed at both ends of a field before windowing.
pub const SENTINEL: char = SEPARATOR;

/// Window width in characters.
pub const GRAM_LEN: usize = 3;

/// Deduplicated trigrams. A `BTreeSet` so iteration (and therefore any
/// derived output) is deterministic.
pub type TrigramSet = BTreeSet<String>;

fn windows(chars: &[char]) -> TrigramSet {
    chars
        .windows(GRAM_LEN)
        .map(|w| w.iter().collect::<String>())
        .collect()
}

/// Padded trigrams of one normalized field. Empty text yields no grams.
pub fn trigrams(text: &NormalizedText) -> TrigramSet {
    if text.is_empty() {
        return TrigramSet::new();
    }
    let padded: Vec<char> = iter::once(SENTINEL)
        .chain(text.as_str().chars())
        .chain(iter::once(SENTINEL))
        .collect();
    windows(&padded)
}

/// Union of the trigrams of each field, normalized independently.
///
/// No gram ever spans two fields; empty fields contribute nothing.
pub fn indexable_trigrams<I, S>(fields: I) -> TrigramSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut set = TrigramSet::new();
    for field in fields {
        set.extend(trigrams(&normalize(field.as_ref())));
    }
    set
}

/// Trigrams a query must find in an index.
///
/// A normalized query of three or more characters is windowed without
/// padding, so it matches anywhere inside a word ("smi" finds "Smith").
/// Shorter queries cannot form an unpadded gram and fall back to the padded
/// form, which matches a whole one- or two-character word.
///
/// Padded boundary grams such as `" sm"` are therefore never produced for
/// longer queries. To test whether an index holds one specific trigram, pass
/// it to [`QueryEngine::evaluate_trigrams`](crate::QueryEngine::evaluate_trigrams).
pub fn query_trigrams(query: &str) -> TrigramSet {
    let normalized = normalize(query);
    let chars: Vec<char> = normalized.as_str().chars().collect();
    if chars.len() >= GRAM_LEN {
        windows(&chars)
    } else {
        trigrams(&normalized)
    }
}
