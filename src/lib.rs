//! Encrypted record store with keyed Bloom-index substring search.
//!
//! Records are AES-256-GCM encrypted; searchable fields additionally feed a
//! per-record Bloom filter over HMAC-keyed trigrams, so the server can answer
//! substring queries without ever decrypting.

pub mod codec;
pub mod config;
pub mod envelope;
pub mod error;
pub mod fields;
pub mod storage;
pub mod types;
pub mod vault;

pub use codec::{EncryptedRecord, RecordCodec, SealedRecord};
pub use config::{ConfigError, Settings};
pub use envelope::{decode_record, encode_record, ENVELOPE_VERSION};
pub use error::{Result, VaultError};
pub use fields::{Field, Fields};
#[cfg(feature = "sqlite")]
pub use storage::SqliteStore;
pub use storage::{MemoryStore, RecordStore};
pub use types::{OwnerId, RecordId};
pub use vault::Vault;

pub use betterbase_vault_crypto as crypto;
pub use betterbase_vault_index as index;
