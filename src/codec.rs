//! Record codec: seal plaintext fields into an encrypted, indexed record and
//! open it again.
//!
//! Sealing computes the searchable fields' trigrams, builds the keyed Bloom
//! index, and AES-256-GCM encrypts the canonical field encoding. The owner
//! id is bound as associated data, so a record moved to another owner no
//! longer authenticates.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use zeroize::Zeroizing;

use betterbase_vault_crypto::{
    KeyedDigest, RecordCipher, SecretMaterial, AES_GCM_NONCE_LENGTH, AES_GCM_TAG_LENGTH,
};
use betterbase_vault_index::{
    indexable_trigrams, BloomBuilder, BloomIndex, BloomParams, IndexedRecord,
};

use crate::error::Result;
use crate::fields::Fields;
use crate::types::{OwnerId, RecordId};

/// Prefix of the associated data bound into every record's tag.
const OWNER_AAD_PREFIX: &[u8] = b"betterbase-vault/owner:";

fn owner_aad(owner: OwnerId) -> Vec<u8> {
    let mut aad = Vec::with_capacity(OWNER_AAD_PREFIX.len() + 8);
    aad.extend_from_slice(OWNER_AAD_PREFIX);
    aad.extend_from_slice(&owner.0.to_be_bytes());
    aad
}

/// An encrypted, indexed record that storage has not assigned an id to yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedRecord {
    pub owner_id: OwnerId,
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; AES_GCM_NONCE_LENGTH],
    pub tag: [u8; AES_GCM_TAG_LENGTH],
    pub bloom: BloomIndex,
    pub created_at: DateTime<Utc>,
}

/// A persisted record: storage id plus the sealed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedRecord {
    pub id: RecordId,
    pub sealed: SealedRecord,
}

impl EncryptedRecord {
    pub fn new(id: RecordId, sealed: SealedRecord) -> Self {
        Self { id, sealed }
    }

    pub fn owner_id(&self) -> OwnerId {
        self.sealed.owner_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.sealed.created_at
    }
}

impl IndexedRecord for EncryptedRecord {
    type Id = RecordId;

    fn record_id(&self) -> RecordId {
        self.id
    }

    fn bloom_index(&self) -> &BloomIndex {
        &self.sealed.bloom
    }
}

/// Seals and opens records under one encryption key and one index builder.
///
/// Immutable after construction; share it freely across threads.
pub struct RecordCodec {
    cipher: RecordCipher,
    builder: BloomBuilder,
}

impl RecordCodec {
    /// Codec over the configured key pair.
    pub fn new(keys: &SecretMaterial, params: BloomParams) -> Result<Self> {
        let digest: Arc<dyn KeyedDigest> = Arc::new(keys.index_digest()?);
        Self::with_builder(keys.encryption_key(), BloomBuilder::new(params, digest))
    }

    /// Codec over arbitrary key material. Performs no key-separation check,
    /// which lets tests build indexes under the "wrong" key on purpose.
    pub fn with_builder(encryption_key: &[u8], builder: BloomBuilder) -> Result<Self> {
        Ok(Self {
            cipher: RecordCipher::new(encryption_key)?,
            builder,
        })
    }

    pub fn builder(&self) -> &BloomBuilder {
        &self.builder
    }

    pub fn params(&self) -> BloomParams {
        self.builder.params()
    }

    /// Index and encrypt `fields` for `owner`, stamped with the current time.
    pub fn seal(&self, fields: &Fields, owner: OwnerId) -> Result<SealedRecord> {
        self.seal_at(fields, owner, Utc::now())
    }

    /// [`RecordCodec::seal`] with an explicit creation time (re-seal keeps
    /// the original one).
    pub fn seal_at(
        &self,
        fields: &Fields,
        owner: OwnerId,
        created_at: DateTime<Utc>,
    ) -> Result<SealedRecord> {
        let trigrams = indexable_trigrams(fields.searchable_values());
        let bloom = self.builder.build(&trigrams);

        let plaintext = fields.to_canonical_bytes()?;
        let sealed = self.cipher.encrypt(&plaintext, &owner_aad(owner))?;

        debug!(
            owner_id = %owner,
            fields = fields.len(),
            trigrams = trigrams.len(),
            bits_set = bloom.count_ones(),
            "sealed record"
        );

        Ok(SealedRecord {
            owner_id: owner,
            ciphertext: sealed.ciphertext,
            nonce: sealed.nonce,
            tag: sealed.tag,
            bloom,
            created_at,
        })
    }

    /// Decrypt and parse a record's fields.
    ///
    /// A failed tag check is returned as-is; it is never recovered here.
    pub fn open(&self, record: &SealedRecord) -> Result<Fields> {
        let plaintext = Zeroizing::new(self.cipher.decrypt(
            &record.ciphertext,
            &record.nonce,
            &record.tag,
            &owner_aad(record.owner_id),
        )?);
        Fields::from_canonical_bytes(&plaintext)
    }
}

impl std::fmt::Debug for RecordCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCodec")
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}
