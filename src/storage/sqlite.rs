//! SqliteStore: sealed records in a single SQLite table.
//!
//! ```sql
//! records(id INTEGER PRIMARY KEY AUTOINCREMENT,
//!         owner_id INTEGER NOT NULL,
//!         blob BLOB NOT NULL,
//!         created_at TEXT NOT NULL)
//! ```
//!
//! `blob` is the CBOR envelope; `owner_id` is duplicated out of it so
//! candidate fetches can filter in SQL.

use std::path::Path;

use chrono::SecondsFormat;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};

use crate::codec::{EncryptedRecord, SealedRecord};
use crate::envelope::{decode_record, encode_record};
use crate::error::{Result, VaultError};
use crate::types::{OwnerId, RecordId};

use super::traits::RecordStore;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL,
        blob BLOB NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_records_owner_id ON records(owner_id);
";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        info!(path = %path.display(), "opened sqlite record store");
        Self::with_connection(conn)
    }

    /// Private in-memory database, gone when the store is dropped.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Overwrite the raw blob stored for `id`. Returns false if absent.
    #[cfg(test)]
    fn put_raw(&self, id: RecordId, blob: &[u8]) -> Result<bool> {
        let changed = self.conn.lock().execute(
            "UPDATE records SET blob = ?1 WHERE id = ?2",
            params![blob, id.0],
        )?;
        Ok(changed > 0)
    }
}

fn timestamp(record: &SealedRecord) -> String {
    record
        .created_at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl RecordStore for SqliteStore {
    fn fetch_candidates(&self, owner: OwnerId) -> Result<Vec<EncryptedRecord>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare_cached("SELECT id, blob FROM records WHERE owner_id = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![owner.0], |row| {
            Ok((RecordId(row.get(0)?), row.get::<_, Vec<u8>>(1)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, blob) = row?;
            match decode_record(&blob) {
                Ok(sealed) => out.push(EncryptedRecord::new(id, sealed)),
                Err(e) => warn!(record_id = %id, error = %e, "skipping undecodable record"),
            }
        }
        Ok(out)
    }

    fn fetch_by_id(&self, id: RecordId) -> Result<Option<EncryptedRecord>> {
        let blob: Option<Vec<u8>> = self
            .conn
            .lock()
            .query_row(
                "SELECT blob FROM records WHERE id = ?1",
                params![id.0],
                |row| row.get(0),
            )
            .optional()?;
        match blob {
            Some(blob) => Ok(Some(EncryptedRecord::new(id, decode_record(&blob)?))),
            None => Ok(None),
        }
    }

    fn fetch_owned(&self, owner: OwnerId, id: RecordId) -> Result<Option<EncryptedRecord>> {
        let blob: Option<Vec<u8>> = self
            .conn
            .lock()
            .query_row(
                "SELECT blob FROM records WHERE id = ?1 AND owner_id = ?2",
                params![id.0, owner.0],
                |row| row.get(0),
            )
            .optional()?;
        match blob {
            Some(blob) => Ok(Some(EncryptedRecord::new(id, decode_record(&blob)?))),
            None => Ok(None),
        }
    }

    fn persist(&self, record: SealedRecord) -> Result<EncryptedRecord> {
        let blob = encode_record(&record)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO records (owner_id, blob, created_at) VALUES (?1, ?2, ?3)",
            params![record.owner_id.0, blob, timestamp(&record)],
        )?;
        let id = RecordId(conn.last_insert_rowid());
        Ok(EncryptedRecord::new(id, record))
    }

    fn replace(&self, id: RecordId, record: SealedRecord) -> Result<EncryptedRecord> {
        let blob = encode_record(&record)?;
        let changed = self.conn.lock().execute(
            "UPDATE records SET owner_id = ?1, blob = ?2, created_at = ?3 WHERE id = ?4",
            params![record.owner_id.0, blob, timestamp(&record), id.0],
        )?;
        if changed == 0 {
            return Err(VaultError::NotFound(id));
        }
        Ok(EncryptedRecord::new(id, record))
    }

    fn delete(&self, id: RecordId) -> Result<bool> {
        let changed = self
            .conn
            .lock()
            .execute("DELETE FROM records WHERE id = ?1", params![id.0])?;
        Ok(changed > 0)
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}
