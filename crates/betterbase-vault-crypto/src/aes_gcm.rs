//! AES-256-GCM encryption for record payloads.
//!
//! Ciphertext, nonce and tag are returned detached so the record envelope can
//! store them as separate fields:
//! [nonce: 12 bytes][ciphertext: N bytes][tag: 16 bytes]

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use zeroize::Zeroize;

use crate::error::{CryptoError, Result};
use crate::types::{Sealed, AES_GCM_NONCE_LENGTH, AES_GCM_TAG_LENGTH, AES_KEY_LENGTH};

/// Generate a random 12-byte nonce for AES-GCM.
pub fn generate_nonce() -> Result<[u8; AES_GCM_NONCE_LENGTH]> {
    let mut nonce = [0u8; AES_GCM_NONCE_LENGTH];
    getrandom::getrandom(&mut nonce).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(nonce)
}

/// AES-256-GCM cipher bound to one key.
///
/// Every call to [`RecordCipher::encrypt`] draws a fresh random nonce, so a
/// single instance can be shared across threads and records.
pub struct RecordCipher {
    cipher: Aes256Gcm,
}

impl RecordCipher {
    /// Create a cipher from 32 bytes of raw key material.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != AES_KEY_LENGTH {
            return Err(CryptoError::InvalidKeyLength {
                expected: AES_KEY_LENGTH,
                got: key.len(),
            });
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// Encrypt `plaintext`, authenticating `aad` alongside it.
    pub fn encrypt(&self, plaintext: &[u8], aad: &[u8]) -> Result<Sealed> {
        let nonce = generate_nonce()?;
        let mut buffer = plaintext.to_vec();
        let tag = self
            .cipher
            .encrypt_in_place_detached(Nonce::from_slice(&nonce), aad, &mut buffer)
            .map_err(|e| {
                buffer.zeroize();
                CryptoError::EncryptionFailed(e.to_string())
            })?;

        let mut tag_bytes = [0u8; AES_GCM_TAG_LENGTH];
        tag_bytes.copy_from_slice(tag.as_slice());
        Ok(Sealed {
            ciphertext: buffer,
            nonce,
            tag: tag_bytes,
        })
    }

    /// Decrypt and verify. Any mismatch in ciphertext, nonce, tag, key or
    /// `aad` yields [`CryptoError::Authentication`]; no plaintext escapes.
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        nonce: &[u8],
        tag: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>> {
        if nonce.len() != AES_GCM_NONCE_LENGTH || tag.len() != AES_GCM_TAG_LENGTH {
            return Err(CryptoError::Authentication);
        }

        let mut buffer = ciphertext.to_vec();
        let verified = self.cipher.decrypt_in_place_detached(
            Nonce::from_slice(nonce),
            aad,
            &mut buffer,
            Tag::from_slice(tag),
        );
        if verified.is_err() {
            buffer.zeroize();
            return Err(CryptoError::Authentication);
        }
        Ok(buffer)
    }
}

/// Encrypt `plaintext` under `key` with a fresh nonce and no associated data.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<Sealed> {
    RecordCipher::new(key)?.encrypt(plaintext, &[])
}

/// Decrypt output of [`encrypt`].
pub fn decrypt(ciphertext: &[u8], nonce: &[u8], tag: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    RecordCipher::new(key)?.decrypt(ciphertext, nonce, tag, &[])
}
