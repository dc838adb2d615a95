//! Record persistence.
//!
//! Stores keep only sealed envelopes: ciphertext, nonce, tag, Bloom bits and
//! the owner id. Nothing here ever sees a key or plaintext.

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
pub use traits::RecordStore;
