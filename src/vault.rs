//! The vault: owner-scoped create / search / read over sealed records.
//!
//! Searching never decrypts. The query is normalized, split into trigrams
//! and matched against the Bloom index of each of the owner's records; the
//! resulting ids may include false positives, which callers filter after
//! opening the records they care about.

use std::sync::Arc;

use tracing::{debug, info, warn};

use betterbase_vault_crypto::{KeyedDigest, SecretMaterial};
use betterbase_vault_index::{BloomBuilder, BloomParams, IndexedRecord, QueryEngine};

use crate::codec::{EncryptedRecord, RecordCodec};
use crate::config::Settings;
use crate::error::{Result, VaultError};
use crate::fields::Fields;
use crate::storage::RecordStore;
use crate::types::{OwnerId, RecordId};

pub struct Vault<S: RecordStore> {
    codec: RecordCodec,
    engine: QueryEngine,
    store: S,
}

impl<S: RecordStore> Vault<S> {
    pub fn new(keys: &SecretMaterial, params: BloomParams, store: S) -> Result<Self> {
        let digest: Arc<dyn KeyedDigest> = Arc::new(keys.index_digest()?);
        let builder = BloomBuilder::new(params, digest);
        Ok(Self {
            codec: RecordCodec::with_builder(keys.encryption_key(), builder.clone())?,
            engine: QueryEngine::new(builder),
            store,
        })
    }

    /// Build a vault from startup settings over `store`.
    pub fn from_settings(settings: &Settings, store: S) -> Result<Self> {
        let keys = settings.secret_material()?;
        Self::new(&keys, settings.bloom, store)
    }

    pub fn codec(&self) -> &RecordCodec {
        &self.codec
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn params(&self) -> BloomParams {
        self.engine.params()
    }

    /// Seal `fields` for `owner` and persist them.
    pub fn create_record(&self, owner: OwnerId, fields: &Fields) -> Result<RecordId> {
        let sealed = self.codec.seal(fields, owner)?;
        let stored = self.store.persist(sealed)?;
        debug!(owner_id = %owner, record_id = %stored.id, "created record");
        Ok(stored.id)
    }

    /// Ids of `owner`'s records whose index may contain every trigram of
    /// `query`, ascending. May include false positives.
    pub fn search_records(&self, owner: OwnerId, query: &str) -> Result<Vec<RecordId>> {
        let candidates = self.owned_candidates(owner)?;
        Ok(self.engine.evaluate(query, &candidates)?)
    }

    /// [`Vault::search_records`], then decrypt each match.
    ///
    /// Records that fail to authenticate or parse are logged and left out;
    /// one corrupted record does not fail the whole search.
    pub fn search_and_open(
        &self,
        owner: OwnerId,
        query: &str,
    ) -> Result<Vec<(RecordId, Fields)>> {
        let candidates = self.owned_candidates(owner)?;
        let ids = self.engine.evaluate(query, &candidates)?;

        let mut opened = Vec::with_capacity(ids.len());
        for record in candidates.iter().filter(|r| ids.binary_search(&r.id).is_ok()) {
            match self.codec.open(&record.sealed) {
                Ok(fields) => opened.push((record.id, fields)),
                Err(e @ (VaultError::Crypto(_) | VaultError::Serialization(_))) => {
                    warn!(record_id = %record.id, error = %e, "skipping unreadable record");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(opened)
    }

    /// Decrypt one record. Absent and foreign records are both `NotFound`.
    pub fn get_record(&self, owner: OwnerId, id: RecordId) -> Result<Fields> {
        let record = self.owned_record(owner, id)?;
        self.codec.open(&record.sealed)
    }

    /// Replace a record's fields, keeping its id and creation time.
    pub fn update_record(&self, owner: OwnerId, id: RecordId, fields: &Fields) -> Result<()> {
        let existing = self.owned_record(owner, id)?;
        let sealed = self.codec.seal_at(fields, owner, existing.created_at())?;
        self.store.replace(id, sealed)?;
        debug!(owner_id = %owner, record_id = %id, "updated record");
        Ok(())
    }

    pub fn delete_record(&self, owner: OwnerId, id: RecordId) -> Result<()> {
        self.owned_record(owner, id)?;
        if !self.store.delete(id)? {
            return Err(VaultError::NotFound(id));
        }
        debug!(owner_id = %owner, record_id = %id, "deleted record");
        Ok(())
    }

    /// Re-seal every record of `owner` whose index was built with other
    /// Bloom parameters. Returns how many were rewritten.
    ///
    /// Re-indexing needs the plaintext, so each record is decrypted and
    /// sealed again under a fresh nonce. Records that no longer decrypt are
    /// logged and left as they are; the rest are still migrated.
    pub fn reindex(&self, owner: OwnerId) -> Result<usize> {
        let params = self.params();
        let mut rewritten = 0;
        let mut skipped = 0;
        for record in self.owned_candidates(owner)? {
            if record.bloom_index().params() == params {
                continue;
            }
            let fields = match self.codec.open(&record.sealed) {
                Ok(fields) => fields,
                Err(e @ (VaultError::Crypto(_) | VaultError::Serialization(_))) => {
                    warn!(record_id = %record.id, error = %e, "reindex skipping unreadable record");
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            let sealed = self.codec.seal_at(&fields, owner, record.created_at())?;
            self.store.replace(record.id, sealed)?;
            rewritten += 1;
        }
        info!(
            owner_id = %owner,
            rewritten,
            skipped,
            size = params.size(),
            hash_count = params.hash_count(),
            "reindexed records"
        );
        Ok(rewritten)
    }

    /// Candidates with a second owner check on top of the store's filter.
    fn owned_candidates(&self, owner: OwnerId) -> Result<Vec<EncryptedRecord>> {
        let mut candidates = self.store.fetch_candidates(owner)?;
        candidates.retain(|r| r.owner_id() == owner);
        Ok(candidates)
    }

    /// The store checks ownership before decoding, so a foreign record that
    /// fails to decode is still reported as `NotFound`.
    fn owned_record(&self, owner: OwnerId, id: RecordId) -> Result<EncryptedRecord> {
        match self.store.fetch_owned(owner, id)? {
            Some(record) if record.owner_id() == owner => Ok(record),
            _ => Err(VaultError::NotFound(id)),
        }
    }
}

impl<S: RecordStore + std::fmt::Debug> std::fmt::Debug for Vault<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("params", &self.params())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
