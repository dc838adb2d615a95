use crate::codec::{EncryptedRecord, SealedRecord};
use crate::error::Result;
use crate::types::{OwnerId, RecordId};

/// Persistence backend for sealed records.
///
/// Implementations must be safe to share across threads; the vault holds
/// one store and calls it from any request.
pub trait RecordStore: Send + Sync {
    /// Every record owned by `owner`, ordered by id. Records that can no
    /// longer be decoded are skipped, not returned as errors.
    fn fetch_candidates(&self, owner: OwnerId) -> Result<Vec<EncryptedRecord>>;

    /// The record with `id`, regardless of owner.
    fn fetch_by_id(&self, id: RecordId) -> Result<Option<EncryptedRecord>>;

    /// The record with `id` if `owner` owns it. Ownership is checked against
    /// the stored owner before the blob is decoded, so an absent record and
    /// a foreign one both give `None`.
    fn fetch_owned(&self, owner: OwnerId, id: RecordId) -> Result<Option<EncryptedRecord>>;

    /// Store a new record and assign it an id.
    fn persist(&self, record: SealedRecord) -> Result<EncryptedRecord>;

    /// Overwrite the record with `id`. Fails with `NotFound` if it is absent.
    fn replace(&self, id: RecordId, record: SealedRecord) -> Result<EncryptedRecord>;

    /// Remove the record with `id`. Returns whether it existed.
    fn delete(&self, id: RecordId) -> Result<bool>;
}

impl<T: RecordStore + ?Sized> RecordStore for std::sync::Arc<T> {
    fn fetch_candidates(&self, owner: OwnerId) -> Result<Vec<EncryptedRecord>> {
        (**self).fetch_candidates(owner)
    }

    fn fetch_by_id(&self, id: RecordId) -> Result<Option<EncryptedRecord>> {
        (**self).fetch_by_id(id)
    }

    fn fetch_owned(&self, owner: OwnerId, id: RecordId) -> Result<Option<EncryptedRecord>> {
        (**self).fetch_owned(owner, id)
    }

    fn persist(&self, record: SealedRecord) -> Result<EncryptedRecord> {
        (**self).persist(record)
    }

    fn replace(&self, id: RecordId, record: SealedRecord) -> Result<EncryptedRecord> {
        (**self).replace(id, record)
    }

    fn delete(&self, id: RecordId) -> Result<bool> {
        (**self).delete(id)
    }
}
