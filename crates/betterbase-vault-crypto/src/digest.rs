//! Keyed pseudorandom digests for blind indexing.
//!
//! `digest(material, context) = HMAC-SHA256(key, context || material)`.
//! The same `(key, context, material)` always yields the same 32 bytes, which
//! is what lets a query recompute the positions a record's index was built with.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{CryptoError, Result};
use crate::types::{Digest, DIGEST_LENGTH};

type HmacSha256 = Hmac<Sha256>;

/// Context label for interchange blind tokens.
pub const TOKEN_CONTEXT: &[u8] = b"token";

/// A deterministic keyed hash family.
///
/// Callers only see this trait, so the concrete PRF (and its key) can be
/// swapped, e.g. during key rotation, without touching index code.
pub trait KeyedDigest: Send + Sync {
    fn digest(&self, material: &[u8], context: &[u8]) -> Digest;
}

/// HMAC-SHA256 keyed digest.
///
/// Holds the keyed MAC state; each digest clones it, so `&self` is enough
/// and one instance serves concurrent callers.
#[derive(Clone)]
pub struct HmacSha256Digest {
    mac: HmacSha256,
}

impl HmacSha256Digest {
    /// Accepts key material of any length (HMAC pads or hashes it internally).
    pub fn new(key: &[u8]) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(key)
            .map_err(|e| CryptoError::InvalidDigestKey(e.to_string()))?;
        Ok(Self { mac })
    }
}

impl KeyedDigest for HmacSha256Digest {
    fn digest(&self, material: &[u8], context: &[u8]) -> Digest {
        let mut mac = self.mac.clone();
        mac.update(context);
        mac.update(material);
        let mut out = [0u8; DIGEST_LENGTH];
        out.copy_from_slice(&mac.finalize().into_bytes());
        out
    }
}

impl std::fmt::Debug for HmacSha256Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSha256Digest")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// One-shot `HMAC-SHA256(key, context || material)`.
pub fn derive_hash(material: &[u8], context: &[u8], key: &[u8]) -> Result<Digest> {
    Ok(HmacSha256Digest::new(key)?.digest(material, context))
}

/// Interchange token for a trigram: lowercase hex of its keyed digest.
pub fn blind_token(digest: &dyn KeyedDigest, trigram: &str) -> String {
    hex::encode(digest.digest(trigram.as_bytes(), TOKEN_CONTEXT))
}
