//! MemoryStore: a `RecordStore` that keeps encoded envelopes in a map.
//!
//! Records go through the same CBOR envelope as the SQLite store, so both
//! backends exercise identical decode paths.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use tracing::warn;

use crate::codec::{EncryptedRecord, SealedRecord};
use crate::envelope::{decode_record, encode_record};
use crate::error::{Result, VaultError};
use crate::types::{OwnerId, RecordId};

use super::traits::RecordStore;

#[derive(Debug)]
struct StoredRow {
    owner_id: OwnerId,
    blob: Vec<u8>,
}

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    rows: BTreeMap<RecordId, StoredRow>,
}

/// In-process record store. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite the raw blob stored for `id`. Returns false if absent.
    #[cfg(test)]
    pub(crate) fn put_raw(&self, id: RecordId, blob: Vec<u8>) -> bool {
        match self.inner.lock().rows.get_mut(&id) {
            Some(row) => {
                row.blob = blob;
                true
            }
            None => false,
        }
    }
}

impl RecordStore for MemoryStore {
    fn fetch_candidates(&self, owner: OwnerId) -> Result<Vec<EncryptedRecord>> {
        let inner = self.inner.lock();
        let mut out = Vec::new();
        for (&id, row) in inner.rows.iter().filter(|(_, r)| r.owner_id == owner) {
            match decode_record(&row.blob) {
                Ok(sealed) => out.push(EncryptedRecord::new(id, sealed)),
                Err(e) => warn!(record_id = %id, error = %e, "skipping undecodable record"),
            }
        }
        Ok(out)
    }

    fn fetch_by_id(&self, id: RecordId) -> Result<Option<EncryptedRecord>> {
        let inner = self.inner.lock();
        match inner.rows.get(&id) {
            Some(row) => Ok(Some(EncryptedRecord::new(id, decode_record(&row.blob)?))),
            None => Ok(None),
        }
    }

    fn fetch_owned(&self, owner: OwnerId, id: RecordId) -> Result<Option<EncryptedRecord>> {
        let inner = self.inner.lock();
        match inner.rows.get(&id) {
            Some(row) if row.owner_id == owner => {
                Ok(Some(EncryptedRecord::new(id, decode_record(&row.blob)?)))
            }
            _ => Ok(None),
        }
    }

    fn persist(&self, record: SealedRecord) -> Result<EncryptedRecord> {
        let blob = encode_record(&record)?;
        let mut inner = self.inner.lock();
        inner.last_id += 1;
        let id = RecordId(inner.last_id);
        inner.rows.insert(
            id,
            StoredRow {
                owner_id: record.owner_id,
                blob,
            },
        );
        Ok(EncryptedRecord::new(id, record))
    }

    fn replace(&self, id: RecordId, record: SealedRecord) -> Result<EncryptedRecord> {
        let blob = encode_record(&record)?;
        let mut inner = self.inner.lock();
        let row = inner.rows.get_mut(&id).ok_or(VaultError::NotFound(id))?;
        row.owner_id = record.owner_id;
        row.blob = blob;
        Ok(EncryptedRecord::new(id, record))
    }

    fn delete(&self, id: RecordId) -> Result<bool> {
        Ok(self.inner.lock().rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RecordCodec;
    use crate::fields::Fields;
    use betterbase_vault_crypto::SecretMaterial;
    use betterbase_vault_index::BloomParams;

    fn codec() -> RecordCodec {
        let keys = SecretMaterial::new(&[3u8; 32], &[4u8; 32]).unwrap();
        RecordCodec::new(&keys, BloomParams::new(256, 3).unwrap()).unwrap()
    }

    fn sealed(owner: i64, name: &str) -> SealedRecord {
        let fields = Fields::new().with_searchable("name", name);
        codec().seal(&fields, OwnerId(owner)).unwrap()
    }

    #[test]
    fn persist_assigns_increasing_ids() {
        let store = MemoryStore::new();
        let a = store.persist(sealed(1, "a")).unwrap();
        let b = store.persist(sealed(1, "b")).unwrap();
        assert_eq!(a.id, RecordId(1));
        assert_eq!(b.id, RecordId(2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let store = MemoryStore::new();
        let a = store.persist(sealed(1, "a")).unwrap();
        assert!(store.delete(a.id).unwrap());
        assert!(!store.delete(a.id).unwrap());
        let b = store.persist(sealed(1, "b")).unwrap();
        assert_eq!(b.id, RecordId(2));
    }

    #[test]
    fn candidates_are_scoped_to_owner() {
        let store = MemoryStore::new();
        store.persist(sealed(1, "a")).unwrap();
        store.persist(sealed(2, "b")).unwrap();
        store.persist(sealed(1, "c")).unwrap();
        let ids: Vec<RecordId> = store
            .fetch_candidates(OwnerId(1))
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, [RecordId(1), RecordId(3)]);
        assert!(store.fetch_candidates(OwnerId(3)).unwrap().is_empty());
    }

    #[test]
    fn fetch_by_id_round_trips_through_envelope() {
        let store = MemoryStore::new();
        let record = sealed(7, "Jane Smith");
        let stored = store.persist(record.clone()).unwrap();
        let fetched = store.fetch_by_id(stored.id).unwrap().unwrap();
        assert_eq!(fetched.sealed.ciphertext, record.ciphertext);
        assert_eq!(fetched.sealed.bloom, record.bloom);
        assert!(store.fetch_by_id(RecordId(99)).unwrap().is_none());
    }

    #[test]
    fn replace_requires_existing_record() {
        let store = MemoryStore::new();
        let err = store.replace(RecordId(5), sealed(1, "x")).unwrap_err();
        assert!(matches!(err, VaultError::NotFound(RecordId(5))));

        let stored = store.persist(sealed(1, "x")).unwrap();
        let replacement = sealed(1, "y");
        store.replace(stored.id, replacement.clone()).unwrap();
        let fetched = store.fetch_by_id(stored.id).unwrap().unwrap();
        assert_eq!(fetched.sealed.ciphertext, replacement.ciphertext);
    }

    #[test]
    fn corrupt_blob_is_skipped_in_candidates() {
        let store = MemoryStore::new();
        let a = store.persist(sealed(1, "a")).unwrap();
        store.persist(sealed(1, "b")).unwrap();
        assert!(store.put_raw(a.id, vec![0xde, 0xad]));
        let candidates = store.fetch_candidates(OwnerId(1)).unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(store.fetch_by_id(a.id).is_err());
    }

    #[test]
    fn fetch_owned_checks_owner_before_decoding() {
        let store = MemoryStore::new();
        let a = store.persist(sealed(1, "a")).unwrap();
        assert!(store.fetch_owned(OwnerId(1), a.id).unwrap().is_some());
        assert!(store.fetch_owned(OwnerId(2), a.id).unwrap().is_none());

        assert!(store.put_raw(a.id, vec![0xde, 0xad]));
        assert!(store.fetch_owned(OwnerId(2), a.id).unwrap().is_none());
        assert!(store.fetch_owned(OwnerId(2), RecordId(999)).unwrap().is_none());
        assert!(matches!(
            store.fetch_owned(OwnerId(1), a.id),
            Err(VaultError::Envelope(_))
        ));
    }
}
