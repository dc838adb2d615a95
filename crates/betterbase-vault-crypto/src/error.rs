use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Tag verification failed: tampered ciphertext/nonce/tag, or the wrong key.
    #[error("Authentication failed: record is unreadable or corrupted")]
    Authentication,

    #[error("Invalid keyed digest key: {0}")]
    InvalidDigestKey(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Encryption key and index key must differ")]
    KeyReuse,

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
