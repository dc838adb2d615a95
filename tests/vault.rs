//! Integration tests for `Vault` over the memory and SQLite stores.

#![cfg(feature = "sqlite")]

use std::sync::Arc;

use betterbase_vault::{
    crypto::SecretMaterial, index::BloomParams, Fields, MemoryStore, OwnerId, RecordId,
    RecordStore, Settings, SqliteStore, Vault, VaultError,
};
use proptest::prelude::*;
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

const ALICE: OwnerId = OwnerId(1);
const BOB: OwnerId = OwnerId(2);

fn keys() -> SecretMaterial {
    let enc = hex::decode("000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f")
        .unwrap();
    let idx = hex::decode("f0e0d0c0b0a090807060504030201000f1e1d1c1b1a191817161514131211101")
        .unwrap();
    SecretMaterial::new(&enc, &idx).unwrap()
}

fn small_params() -> BloomParams {
    BloomParams::new(1024, 4).unwrap()
}

fn memory_vault() -> Vault<MemoryStore> {
    Vault::new(&keys(), small_params(), MemoryStore::new()).unwrap()
}

fn jane() -> Fields {
    Fields::new()
        .with_searchable("name", "Jane Smith")
        .with_searchable("diagnosis", "flu")
}

fn john() -> Fields {
    Fields::new()
        .with_searchable("name", "John Doe")
        .with_searchable("diagnosis", "cold")
}

/// Flip one ciphertext bit of a stored record in place.
fn tamper(store: &impl RecordStore, id: RecordId) {
    let mut sealed = store.fetch_by_id(id).unwrap().unwrap().sealed;
    sealed.ciphertext[0] ^= 0x01;
    store.replace(id, sealed).unwrap();
}

fn created_at(store: &impl RecordStore, id: RecordId) -> chrono::DateTime<chrono::Utc> {
    store.fetch_by_id(id).unwrap().unwrap().created_at()
}

// ============================================================================
// create / get
// ============================================================================

#[test]
fn create_then_get_round_trips() {
    let vault = memory_vault();
    let id = vault.create_record(ALICE, &jane()).unwrap();
    assert_eq!(vault.get_record(ALICE, id).unwrap(), jane());
}

#[test]
fn get_of_foreign_or_missing_record_is_not_found() {
    let vault = memory_vault();
    let id = vault.create_record(ALICE, &jane()).unwrap();
    assert!(matches!(
        vault.get_record(BOB, id),
        Err(VaultError::NotFound(_))
    ));
    assert!(matches!(
        vault.get_record(ALICE, RecordId(404)),
        Err(VaultError::NotFound(_))
    ));
}

#[test]
fn get_of_tampered_record_is_authentication_failure() {
    let vault = memory_vault();
    let id = vault.create_record(ALICE, &jane()).unwrap();
    tamper(vault.store(), id);
    assert!(vault.get_record(ALICE, id).unwrap_err().is_authentication_failure());
}

// ============================================================================
// search
// ============================================================================

#[test]
fn substring_query_finds_only_matching_record() {
    let vault = memory_vault();
    let a = vault.create_record(ALICE, &jane()).unwrap();
    vault.create_record(ALICE, &john()).unwrap();
    assert_eq!(vault.search_records(ALICE, "smi").unwrap(), vec![a]);
}

#[test]
fn query_is_normalized_like_the_index() {
    let vault = memory_vault();
    let fields = Fields::new().with_searchable("name", "José Núñez");
    let a = vault.create_record(ALICE, &fields).unwrap();
    assert_eq!(vault.search_records(ALICE, "  JOSE  ").unwrap(), vec![a]);
    assert_eq!(vault.search_records(ALICE, "nunez").unwrap(), vec![a]);
}

#[test]
fn every_searchable_field_is_matched() {
    let vault = memory_vault();
    let a = vault.create_record(ALICE, &jane()).unwrap();
    let b = vault.create_record(ALICE, &john()).unwrap();
    assert_eq!(vault.search_records(ALICE, "flu").unwrap(), vec![a]);
    assert_eq!(vault.search_records(ALICE, "john doe").unwrap(), vec![b]);
}

#[test]
fn private_fields_are_not_searchable() {
    let vault = memory_vault();
    let fields = Fields::new()
        .with_searchable("name", "Jane Smith")
        .with_private("ssn", "123-45-6789");
    let id = vault.create_record(ALICE, &fields).unwrap();
    assert!(vault.search_records(ALICE, "6789").unwrap().is_empty());
    let opened = vault.get_record(ALICE, id).unwrap();
    assert_eq!(opened.get("ssn"), Some("123-45-6789"));
}

#[test]
fn search_is_scoped_to_owner() {
    let vault = memory_vault();
    let a = vault.create_record(ALICE, &jane()).unwrap();
    let b = vault.create_record(BOB, &jane()).unwrap();
    assert_eq!(vault.search_records(ALICE, "smith").unwrap(), vec![a]);
    assert_eq!(vault.search_records(BOB, "smith").unwrap(), vec![b]);
    assert!(vault.search_records(OwnerId(3), "smith").unwrap().is_empty());
}

#[test]
fn results_are_ascending_ids() {
    let vault = memory_vault();
    let ids: Vec<RecordId> = (0..5)
        .map(|_| vault.create_record(ALICE, &jane()).unwrap())
        .collect();
    assert_eq!(vault.search_records(ALICE, "jane").unwrap(), ids);
}

#[test]
fn empty_queries_are_rejected() {
    let vault = memory_vault();
    vault.create_record(ALICE, &jane()).unwrap();
    for query in ["", "   ", "!!!"] {
        let err = vault.search_records(ALICE, query).unwrap_err();
        assert!(err.is_empty_query(), "{query:?} gave {err:?}");
    }
    // Also rejected when the owner has nothing stored.
    assert!(vault.search_records(BOB, "").unwrap_err().is_empty_query());
}

#[test]
fn search_and_open_skips_tampered_records() {
    let vault = memory_vault();
    let a = vault.create_record(ALICE, &jane()).unwrap();
    let b = vault.create_record(ALICE, &jane()).unwrap();
    tamper(vault.store(), a);

    // The index is untouched, so both still match.
    assert_eq!(vault.search_records(ALICE, "smith").unwrap(), vec![a, b]);
    let opened = vault.search_and_open(ALICE, "smith").unwrap();
    assert_eq!(opened, vec![(b, jane())]);
}

// ============================================================================
// update / delete
// ============================================================================

#[test]
fn update_reindexes_and_keeps_id() {
    let vault = memory_vault();
    let id = vault.create_record(ALICE, &jane()).unwrap();
    let created = created_at(vault.store(), id);

    vault.update_record(ALICE, id, &john()).unwrap();
    assert_eq!(vault.get_record(ALICE, id).unwrap(), john());
    assert_eq!(vault.search_records(ALICE, "doe").unwrap(), vec![id]);
    assert_eq!(created_at(vault.store(), id), created);
}

#[test]
fn update_and_delete_respect_ownership() {
    let vault = memory_vault();
    let id = vault.create_record(ALICE, &jane()).unwrap();
    assert!(matches!(
        vault.update_record(BOB, id, &john()),
        Err(VaultError::NotFound(_))
    ));
    assert!(matches!(
        vault.delete_record(BOB, id),
        Err(VaultError::NotFound(_))
    ));
    assert_eq!(vault.get_record(ALICE, id).unwrap(), jane());

    vault.delete_record(ALICE, id).unwrap();
    assert!(vault.search_records(ALICE, "smith").unwrap().is_empty());
    assert!(matches!(
        vault.delete_record(ALICE, id),
        Err(VaultError::NotFound(_))
    ));
}

// ============================================================================
// reindex
// ============================================================================

#[test]
fn reindex_migrates_records_built_with_old_params() {
    let store = Arc::new(MemoryStore::new());
    let old = Vault::new(&keys(), small_params(), Arc::clone(&store)).unwrap();
    let a = old.create_record(ALICE, &jane()).unwrap();
    old.create_record(ALICE, &john()).unwrap();
    old.create_record(BOB, &jane()).unwrap();

    let new_params = BloomParams::new(2048, 5).unwrap();
    let new = Vault::new(&keys(), new_params, Arc::clone(&store)).unwrap();

    // Stale indexes are skipped, not misread.
    assert!(new.search_records(ALICE, "smi").unwrap().is_empty());

    assert_eq!(new.reindex(ALICE).unwrap(), 2);
    assert_eq!(new.search_records(ALICE, "smi").unwrap(), vec![a]);
    assert_eq!(new.get_record(ALICE, a).unwrap(), jane());
    assert_eq!(new.reindex(ALICE).unwrap(), 0);

    // Bob's record still carries the old parameters.
    assert!(new.search_records(BOB, "smi").unwrap().is_empty());
    assert_eq!(old.search_records(BOB, "smi").unwrap().len(), 1);
}

#[test]
fn reindex_skips_unreadable_records_and_migrates_the_rest() {
    let store = Arc::new(MemoryStore::new());
    let old = Vault::new(&keys(), small_params(), Arc::clone(&store)).unwrap();
    let first = old.create_record(ALICE, &jane()).unwrap();
    let middle = old.create_record(ALICE, &jane()).unwrap();
    let last = old.create_record(ALICE, &john()).unwrap();
    tamper(&store, middle);

    let new_params = BloomParams::new(2048, 5).unwrap();
    let new = Vault::new(&keys(), new_params, Arc::clone(&store)).unwrap();
    assert_eq!(new.reindex(ALICE).unwrap(), 2);
    assert_eq!(new.search_records(ALICE, "smith").unwrap(), vec![first]);
    assert_eq!(new.search_records(ALICE, "doe").unwrap(), vec![last]);
    assert_eq!(new.get_record(ALICE, last).unwrap(), john());

    // The unreadable record keeps its old index and still fails to open.
    let stale = store.fetch_by_id(middle).unwrap().unwrap();
    assert_eq!(stale.sealed.bloom.params(), small_params());
    assert!(matches!(new.get_record(ALICE, middle), Err(VaultError::Crypto(_))));
    assert_eq!(new.reindex(ALICE).unwrap(), 0);
}

// ============================================================================
// SQLite + settings
// ============================================================================

#[test]
fn sqlite_vault_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("records.db");

    let open = || {
        let store = SqliteStore::open(&path).unwrap();
        Vault::new(&keys(), small_params(), store).unwrap()
    };

    let id = open().create_record(ALICE, &jane()).unwrap();

    let vault = open();
    assert_eq!(vault.search_records(ALICE, "smi").unwrap(), vec![id]);
    assert_eq!(vault.get_record(ALICE, id).unwrap(), jane());
    assert!(matches!(
        vault.get_record(BOB, id),
        Err(VaultError::NotFound(_))
    ));
}

#[test]
fn vault_from_settings() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("vault.db");
    let db_str = db.to_string_lossy().into_owned();
    let settings = Settings::from_lookup(|name| match name {
        "AES_KEY" => Some("correct horse".to_string()),
        "HMAC_KEY" => Some("battery staple".to_string()),
        "BLOOM_FILTER_SIZE" => Some("4096".to_string()),
        "DATABASE_PATH" => Some(db_str.clone()),
        _ => None,
    })
    .unwrap();

    let path = settings.database_path.clone().unwrap();
    let vault = Vault::from_settings(&settings, SqliteStore::open(path).unwrap()).unwrap();
    assert_eq!(vault.params(), BloomParams::new(4096, 7).unwrap());

    let id = vault.create_record(ALICE, &jane()).unwrap();
    assert_eq!(vault.search_records(ALICE, "jane smith").unwrap(), vec![id]);
}

#[test]
fn records_are_unreadable_under_other_keys() {
    let store = Arc::new(MemoryStore::new());
    let vault = Vault::new(&keys(), small_params(), Arc::clone(&store)).unwrap();
    let id = vault.create_record(ALICE, &jane()).unwrap();

    let other = SecretMaterial::derive(b"other aes", b"other hmac").unwrap();
    let intruder = Vault::new(&other, small_params(), Arc::clone(&store)).unwrap();
    assert!(intruder.get_record(ALICE, id).unwrap_err().is_authentication_failure());
    assert!(intruder.search_and_open(ALICE, "smith").unwrap().is_empty());
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn any_fields_round_trip(
        values in prop::collection::vec(("[a-z]{1,8}", "\\PC{0,24}", any::<bool>()), 0..6)
    ) {
        let vault = memory_vault();
        let fields: Fields = values
            .iter()
            .map(|(name, value, searchable)| {
                if *searchable {
                    betterbase_vault::Field::searchable(name.as_str(), value.as_str())
                } else {
                    betterbase_vault::Field::private(name.as_str(), value.as_str())
                }
            })
            .collect();
        let id = vault.create_record(ALICE, &fields).unwrap();
        prop_assert_eq!(vault.get_record(ALICE, id).unwrap(), fields);
    }

    #[test]
    fn searchable_words_always_find_their_record(word in "[a-z]{3,12}") {
        let vault = memory_vault();
        let fields = Fields::new().with_searchable("note", format!("see {word} now"));
        let id = vault.create_record(ALICE, &fields).unwrap();
        prop_assert!(vault.search_records(ALICE, &word).unwrap().contains(&id));
    }
}
