/// AES-GCM nonce length in bytes (96 bits per NIST recommendation).
pub const AES_GCM_NONCE_LENGTH: usize = 12;

/// AES-GCM tag length in bytes (128 bits).
pub const AES_GCM_TAG_LENGTH: usize = 16;

/// AES key length in bytes (256 bits).
pub const AES_KEY_LENGTH: usize = 32;

/// Keyed digest output length in bytes (HMAC-SHA256).
pub const DIGEST_LENGTH: usize = 32;

/// Fixed-size digest returned by a [`KeyedDigest`](crate::KeyedDigest).
pub type Digest = [u8; DIGEST_LENGTH];

/// Detached output of one AES-GCM encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; AES_GCM_NONCE_LENGTH],
    pub tag: [u8; AES_GCM_TAG_LENGTH],
}
