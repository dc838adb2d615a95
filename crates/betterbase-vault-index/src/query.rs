//! Blind-index query evaluation.
//!
//! A record matches iff, for every query trigram, all `k` of that trigram's
//! positions are set in the record's index. Matching is probabilistic:
//! false positives happen at roughly `(1 - e^(-k·n/m))^k`, false negatives
//! never do for a correctly built index. Candidates are not decrypted to
//! weed out false positives.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::bloom::{BloomBuilder, BloomIndex, BloomParams};
use crate::error::{IndexError, Result};
use crate::trigram::{query_trigrams, TrigramSet};

/// Anything carrying an id and a Bloom index can be searched.
pub trait IndexedRecord {
    type Id: Ord + Copy + std::fmt::Debug;

    fn record_id(&self) -> Self::Id;

    fn bloom_index(&self) -> &BloomIndex;
}

/// Evaluates queries against candidate indexes built with the same
/// parameters and digest as `builder`.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    builder: BloomBuilder,
}

impl QueryEngine {
    pub fn new(builder: BloomBuilder) -> Self {
        Self { builder }
    }

    pub fn params(&self) -> BloomParams {
        self.builder.params()
    }

    /// Every bit position a query needs, sorted and deduplicated.
    ///
    /// Rejects an empty trigram set: it would match every index.
    pub fn query_positions(&self, trigrams: &TrigramSet) -> Result<Vec<u32>> {
        if trigrams.is_empty() {
            return Err(IndexError::EmptyQuery);
        }
        let positions: BTreeSet<u32> = trigrams
            .iter()
            .flat_map(|t| self.builder.positions(t))
            .collect();
        Ok(positions.into_iter().collect())
    }

    /// Normalize `query`, derive its trigrams and return the ids of every
    /// candidate whose index may contain all of them, ascending.
    ///
    /// Trigrams come from [`query_trigrams`], so the padded grams at word
    /// boundaries are unreachable from here. Membership checks for a single
    /// trigram go through [`QueryEngine::evaluate_trigrams`].
    pub fn evaluate<R: IndexedRecord>(&self, query: &str, candidates: &[R]) -> Result<Vec<R::Id>> {
        let trigrams = query_trigrams(query);
        self.evaluate_trigrams(&trigrams, candidates)
    }

    /// [`QueryEngine::evaluate`] over an already extracted trigram set.
    ///
    /// Candidates whose index was built with different parameters are
    /// skipped: their bits cannot be compared until they are re-indexed.
    pub fn evaluate_trigrams<R: IndexedRecord>(
        &self,
        trigrams: &TrigramSet,
        candidates: &[R],
    ) -> Result<Vec<R::Id>> {
        let positions = self.query_positions(trigrams)?;
        let params = self.params();

        let mut matches = BTreeSet::new();
        for candidate in candidates {
            let index = candidate.bloom_index();
            if index.params() != params {
                warn!(
                    record_id = ?candidate.record_id(),
                    stored_size = index.params().size(),
                    stored_hash_count = index.params().hash_count(),
                    "skipping record with stale bloom parameters"
                );
                continue;
            }
            if index.contains_all(&positions) {
                matches.insert(candidate.record_id());
            }
        }

        debug!(
            trigrams = trigrams.len(),
            candidates = candidates.len(),
            matches = matches.len(),
            "evaluated blind-index query"
        );
        Ok(matches.into_iter().collect())
    }
}
