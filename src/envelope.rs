//! Persisted record blob: CBOR encode/decode of a [`SealedRecord`].
//!
//! Short keys keep the blob compact:
//! `{v, o: owner, n: nonce, t: tag, c: ciphertext, m, k, b: bloom bits, ts: created millis}`.
//! `v` versions the layout; `m`/`k` record the Bloom parameters the index was
//! built with, so a parameter change can be detected and re-indexed.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use betterbase_vault_crypto::{AES_GCM_NONCE_LENGTH, AES_GCM_TAG_LENGTH};
use betterbase_vault_index::{BloomIndex, BloomParams};

use crate::codec::SealedRecord;
use crate::error::{Result, VaultError};
use crate::types::OwnerId;

/// Current envelope layout version.
pub const ENVELOPE_VERSION: u8 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct RecordEnvelope {
    v: u8,
    o: i64,
    #[serde(with = "serde_bytes")]
    n: Vec<u8>,
    #[serde(with = "serde_bytes")]
    t: Vec<u8>,
    #[serde(with = "serde_bytes")]
    c: Vec<u8>,
    m: u32,
    k: u32,
    #[serde(with = "serde_bytes")]
    b: Vec<u8>,
    ts: i64,
}

/// Encode a sealed record as CBOR bytes.
pub fn encode_record(record: &SealedRecord) -> Result<Vec<u8>> {
    let params = record.bloom.params();
    let envelope = RecordEnvelope {
        v: ENVELOPE_VERSION,
        o: record.owner_id.0,
        n: record.nonce.to_vec(),
        t: record.tag.to_vec(),
        c: record.ciphertext.clone(),
        m: params.size(),
        k: params.hash_count(),
        b: record.bloom.as_bytes().to_vec(),
        ts: record.created_at.timestamp_millis(),
    };
    let mut buf = Vec::new();
    ciborium::into_writer(&envelope, &mut buf)
        .map_err(|e| VaultError::Envelope(format!("CBOR encode error: {}", e)))?;
    Ok(buf)
}

/// Decode CBOR bytes into a sealed record, validating every fixed-size part.
pub fn decode_record(data: &[u8]) -> Result<SealedRecord> {
    let envelope: RecordEnvelope = ciborium::from_reader(data)
        .map_err(|e| VaultError::Envelope(format!("CBOR decode error: {}", e)))?;

    if envelope.v != ENVELOPE_VERSION {
        return Err(VaultError::Envelope(format!(
            "unsupported envelope version {}",
            envelope.v
        )));
    }

    let nonce: [u8; AES_GCM_NONCE_LENGTH] = envelope.n.as_slice().try_into().map_err(|_| {
        VaultError::Envelope(format!(
            "nonce must be {} bytes, got {}",
            AES_GCM_NONCE_LENGTH,
            envelope.n.len()
        ))
    })?;
    let tag: [u8; AES_GCM_TAG_LENGTH] = envelope.t.as_slice().try_into().map_err(|_| {
        VaultError::Envelope(format!(
            "tag must be {} bytes, got {}",
            AES_GCM_TAG_LENGTH,
            envelope.t.len()
        ))
    })?;

    let params = BloomParams::new(envelope.m, envelope.k)
        .map_err(|e| VaultError::Envelope(e.to_string()))?;
    let bloom = BloomIndex::from_bytes(params, envelope.b)
        .map_err(|e| VaultError::Envelope(e.to_string()))?;

    let created_at = DateTime::from_timestamp_millis(envelope.ts)
        .ok_or_else(|| VaultError::Envelope(format!("timestamp out of range: {}", envelope.ts)))?;

    Ok(SealedRecord {
        owner_id: OwnerId(envelope.o),
        ciphertext: envelope.c,
        nonce,
        tag,
        bloom,
        created_at,
    })
}
