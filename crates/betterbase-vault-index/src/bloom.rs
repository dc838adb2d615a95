//! Keyed Bloom index over a record's trigrams.
//!
//! Positions use double hashing: two keyed digests per trigram
//! (`h1`, `h2`, each reduced mod `m`) give `k` positions
//! `(h1 + i * h2) mod m` for `i in 0..k`.
//!
//! Bit layout: position `p` lives in byte `p / 8`, bit `p % 8` (LSB first).

use std::sync::Arc;

use betterbase_vault_crypto::{Digest, KeyedDigest};

use crate::error::{IndexError, Result};
use crate::trigram::TrigramSet;

/// Digest context for the first base hash.
pub const H1_CONTEXT: &[u8] = b"bloom-h1";

/// Digest context for the second base hash.
pub const H2_CONTEXT: &[u8] = b"bloom-h2";

/// Largest accepted filter size in bits (2 MiB of index per record).
pub const MAX_BLOOM_SIZE: u32 = 1 << 24;

/// Filter size `m` and hash count `k`.
///
/// Fixed per deployment: an index built with one pair cannot be queried
/// with another, so records carry the pair they were built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BloomParams {
    size: u32,
    hash_count: u32,
}

impl BloomParams {
    /// Deployment defaults (`BLOOM_FILTER_SIZE=50000`, `BLOOM_FILTER_HASH_COUNT=7`).
    pub const DEFAULT: BloomParams = BloomParams {
        size: 50_000,
        hash_count: 7,
    };

    pub fn new(size: u32, hash_count: u32) -> Result<Self> {
        if size == 0 || size > MAX_BLOOM_SIZE {
            return Err(IndexError::InvalidParams(format!(
                "size must be in 1..={MAX_BLOOM_SIZE}, got {size}"
            )));
        }
        if hash_count == 0 || hash_count > size {
            return Err(IndexError::InvalidParams(format!(
                "hash count must be in 1..={size}, got {hash_count}"
            )));
        }
        Ok(Self { size, hash_count })
    }

    /// `m`, in bits.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// `k`.
    pub fn hash_count(&self) -> u32 {
        self.hash_count
    }

    /// Bytes needed to hold `m` bits.
    pub fn byte_len(&self) -> usize {
        (self.size as usize).div_ceil(8)
    }
}

impl Default for BloomParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Fixed-size bit array attached to exactly one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomIndex {
    params: BloomParams,
    bits: Vec<u8>,
}

impl BloomIndex {
    /// All-zero index.
    pub fn empty(params: BloomParams) -> Self {
        Self {
            params,
            bits: vec![0u8; params.byte_len()],
        }
    }

    /// Rebuild from persisted bytes; the length must match `params`.
    pub fn from_bytes(params: BloomParams, bits: Vec<u8>) -> Result<Self> {
        if bits.len() != params.byte_len() {
            return Err(IndexError::InvalidBloomLength {
                expected: params.byte_len(),
                got: bits.len(),
            });
        }
        Ok(Self { params, bits })
    }

    pub fn params(&self) -> BloomParams {
        self.params
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bits
    }

    pub fn set(&mut self, position: u32) {
        let p = (position % self.params.size) as usize;
        self.bits[p / 8] |= 1 << (p % 8);
    }

    pub fn is_set(&self, position: u32) -> bool {
        let p = (position % self.params.size) as usize;
        self.bits[p / 8] & (1 << (p % 8)) != 0
    }

    /// Standard membership: true iff every position is set.
    pub fn contains_all(&self, positions: &[u32]) -> bool {
        positions.iter().all(|&p| self.is_set(p))
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> u32 {
        self.bits.iter().map(|b| b.count_ones()).sum()
    }

    /// Fraction of the `m` bits that are set.
    pub fn fill_ratio(&self) -> f64 {
        f64::from(self.count_ones()) / f64::from(self.params.size)
    }

    /// `(1 - e^(-k·n/m))^k` for `n` indexed trigrams.
    pub fn estimated_false_positive_rate(&self, n: usize) -> f64 {
        let k = f64::from(self.params.hash_count);
        let m = f64::from(self.params.size);
        (1.0 - (-k * n as f64 / m).exp()).powf(k)
    }
}

/// Reduce a digest, read as a big-endian 256-bit integer, modulo `m`.
fn digest_mod(digest: &Digest, m: u32) -> u32 {
    let m = u64::from(m);
    let rem = digest
        .iter()
        .fold(0u64, |acc, &b| ((acc << 8) | u64::from(b)) % m);
    rem as u32
}

/// The `k` bit positions of one trigram.
pub fn trigram_positions(
    trigram: &str,
    params: BloomParams,
    digest: &dyn KeyedDigest,
) -> Vec<u32> {
    let m = u64::from(params.size);
    let h1 = u64::from(digest_mod(&digest.digest(trigram.as_bytes(), H1_CONTEXT), params.size));
    let h2 = u64::from(digest_mod(&digest.digest(trigram.as_bytes(), H2_CONTEXT), params.size));
    (0..u64::from(params.hash_count))
        .map(|i| ((h1 + i * h2) % m) as u32)
        .collect()
}

/// Build a record's index from its trigram set.
pub fn build_index(
    trigrams: &TrigramSet,
    params: BloomParams,
    digest: &dyn KeyedDigest,
) -> BloomIndex {
    let mut index = BloomIndex::empty(params);
    for trigram in trigrams {
        for position in trigram_positions(trigram, params, digest) {
            index.set(position);
        }
    }
    index
}

/// [`build_index`] bound to one parameter pair and digest.
///
/// Shared by the record codec (construction) and the query engine
/// (evaluation) so both sides derive positions identically.
#[derive(Clone)]
pub struct BloomBuilder {
    params: BloomParams,
    digest: Arc<dyn KeyedDigest>,
}

impl BloomBuilder {
    pub fn new(params: BloomParams, digest: Arc<dyn KeyedDigest>) -> Self {
        Self { params, digest }
    }

    pub fn params(&self) -> BloomParams {
        self.params
    }

    pub fn positions(&self, trigram: &str) -> Vec<u32> {
        trigram_positions(trigram, self.params, self.digest.as_ref())
    }

    pub fn build(&self, trigrams: &TrigramSet) -> BloomIndex {
        build_index(trigrams, self.params, self.digest.as_ref())
    }
}

impl std::fmt::Debug for BloomBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomBuilder")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
