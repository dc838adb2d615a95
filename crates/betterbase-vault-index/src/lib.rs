//! Blind-index search: text normalization, trigram extraction, keyed Bloom
//! indexes and the query engine that evaluates them.

pub mod bloom;
pub mod error;
pub mod normalize;
pub mod query;
pub mod trigram;

pub use bloom::{
    build_index, trigram_positions, BloomBuilder, BloomIndex, BloomParams, H1_CONTEXT, H2_CONTEXT,
    MAX_BLOOM_SIZE,
};
pub use error::IndexError;
pub use normalize::{normalize, NormalizedText};
pub use query::{IndexedRecord, QueryEngine};
pub use trigram::{indexable_trigrams, query_trigrams, trigrams, TrigramSet, SENTINEL};
