//! Crypto primitives for the encrypted record store: AES-256-GCM payload
//! encryption and the keyed digest family behind the blind index.

pub mod aes_gcm;
pub mod digest;
pub mod error;
pub mod hkdf;
pub mod keys;
pub mod types;

pub use aes_gcm::{decrypt, encrypt, generate_nonce, RecordCipher};
pub use digest::{blind_token, derive_hash, HmacSha256Digest, KeyedDigest, TOKEN_CONTEXT};
pub use error::CryptoError;
pub use hkdf::hkdf_derive;
pub use keys::SecretMaterial;
pub use types::{
    Digest, Sealed, AES_GCM_NONCE_LENGTH, AES_GCM_TAG_LENGTH, AES_KEY_LENGTH, DIGEST_LENGTH,
};
