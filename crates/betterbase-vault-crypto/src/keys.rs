//! Process-wide secret material: one key for record encryption, one for the
//! blind index. Both are immutable once constructed.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::digest::HmacSha256Digest;
use crate::error::{CryptoError, Result};
use crate::hkdf::hkdf_derive;
use crate::types::AES_KEY_LENGTH;

/// HKDF salt shared by both configured secrets.
const KEY_SALT: &[u8] = b"betterbase-vault/v1";
const ENCRYPTION_INFO: &[u8] = b"record-encryption";
const INDEX_INFO: &[u8] = b"bloom-index";

/// The two independent keys the engine runs with.
///
/// Construction enforces key separation: the encryption key and the index
/// key must differ. Never logged, never persisted, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretMaterial {
    encryption_key: [u8; AES_KEY_LENGTH],
    index_key: [u8; AES_KEY_LENGTH],
}

impl SecretMaterial {
    /// Build from raw 32-byte keys.
    pub fn new(encryption_key: &[u8], index_key: &[u8]) -> Result<Self> {
        let encryption_key = to_key(encryption_key)?;
        let index_key = to_key(index_key)?;
        if encryption_key == index_key {
            return Err(CryptoError::KeyReuse);
        }
        Ok(Self {
            encryption_key,
            index_key,
        })
    }

    /// Derive both keys from configured secret strings with HKDF-SHA256.
    ///
    /// The raw secrets are compared before derivation: distinct HKDF labels
    /// would otherwise hide a configuration that reuses one secret for both.
    pub fn derive(encryption_secret: &[u8], index_secret: &[u8]) -> Result<Self> {
        if encryption_secret == index_secret {
            return Err(CryptoError::KeyReuse);
        }
        let encryption_key = hkdf_derive(encryption_secret, KEY_SALT, ENCRYPTION_INFO)?;
        let index_key = hkdf_derive(index_secret, KEY_SALT, INDEX_INFO)?;
        Self::new(&encryption_key, &index_key)
    }

    pub fn encryption_key(&self) -> &[u8] {
        &self.encryption_key
    }

    pub fn index_key(&self) -> &[u8] {
        &self.index_key
    }

    /// Keyed digest over the index key.
    pub fn index_digest(&self) -> Result<HmacSha256Digest> {
        HmacSha256Digest::new(&self.index_key)
    }
}

fn to_key(bytes: &[u8]) -> Result<[u8; AES_KEY_LENGTH]> {
    bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
        expected: AES_KEY_LENGTH,
        got: bytes.len(),
    })
}

impl std::fmt::Debug for SecretMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretMaterial")
            .field("encryption_key", &"[REDACTED]")
            .field("index_key", &"[REDACTED]")
            .finish()
    }
}
