//! HKDF-SHA256 key derivation.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::{CryptoError, Result};
use crate::types::AES_KEY_LENGTH;

/// Derive a 256-bit key using HKDF-SHA256.
///
/// # Arguments
/// * `ikm` - Input keying material (any length, e.g. a configured secret string)
/// * `salt` - Salt for domain separation
/// * `info` - Purpose label; distinct labels give independent keys
pub fn hkdf_derive(ikm: &[u8], salt: &[u8], info: &[u8]) -> Result<[u8; AES_KEY_LENGTH]> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = [0u8; AES_KEY_LENGTH];
    hk.expand(info, &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(format!("HKDF expand failed: {}", e)))?;
    Ok(okm)
}
