use thiserror::Error;

use betterbase_vault_crypto::CryptoError;
use betterbase_vault_index::IndexError;

use crate::types::RecordId;

#[derive(Debug, Error)]
pub enum VaultError {
    /// Cryptographic failure. [`CryptoError::Authentication`] means the
    /// record is corrupted or was tampered with; it is never retried.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Index(#[from] IndexError),

    /// The record does not exist or belongs to another owner. Both cases
    /// look identical so callers cannot probe for existence.
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    #[error("Invalid record envelope: {0}")]
    Envelope(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl VaultError {
    /// True when a record failed AES-GCM tag verification.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, VaultError::Crypto(CryptoError::Authentication))
    }

    /// True when the caller supplied a query with nothing to search for.
    pub fn is_empty_query(&self) -> bool {
        matches!(self, VaultError::Index(IndexError::EmptyQuery))
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        VaultError::Serialization(e.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for VaultError {
    fn from(e: rusqlite::Error) -> Self {
        VaultError::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;
