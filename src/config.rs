//! Startup configuration, read once from the environment.
//!
//! | Variable                  | Required | Default  |
//! |---------------------------|----------|----------|
//! | `AES_KEY`                 | yes      |          |
//! | `HMAC_KEY`                | yes      |          |
//! | `BLOOM_FILTER_SIZE`       | no       | `50000`  |
//! | `BLOOM_FILTER_HASH_COUNT` | no       | `7`      |
//! | `DATABASE_PATH`           | no       | in-memory |
//!
//! `AES_KEY` and `HMAC_KEY` are secret strings; both keys are derived from
//! them with HKDF and must not be equal.

use std::path::PathBuf;

use thiserror::Error;
use zeroize::Zeroizing;

use betterbase_vault_crypto::{CryptoError, SecretMaterial};
use betterbase_vault_index::{BloomParams, IndexError};

pub const AES_KEY_VAR: &str = "AES_KEY";
pub const HMAC_KEY_VAR: &str = "HMAC_KEY";
pub const BLOOM_SIZE_VAR: &str = "BLOOM_FILTER_SIZE";
pub const BLOOM_HASH_COUNT_VAR: &str = "BLOOM_FILTER_HASH_COUNT";
pub const DATABASE_PATH_VAR: &str = "DATABASE_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid number for {name}: {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error(transparent)]
    Bloom(#[from] IndexError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Validated settings. Secrets are zeroized on drop and redacted from
/// `Debug` output.
pub struct Settings {
    encryption_secret: Zeroizing<String>,
    index_secret: Zeroizing<String>,
    pub bloom: BloomParams,
    pub database_path: Option<PathBuf>,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, which returns the raw value of a
    /// variable if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let encryption_secret = required(&lookup, AES_KEY_VAR)?;
        let index_secret = required(&lookup, HMAC_KEY_VAR)?;

        let size = number(&lookup, BLOOM_SIZE_VAR, BloomParams::DEFAULT.size())?;
        let hash_count = number(
            &lookup,
            BLOOM_HASH_COUNT_VAR,
            BloomParams::DEFAULT.hash_count(),
        )?;
        let bloom = BloomParams::new(size, hash_count)?;

        let database_path = lookup(DATABASE_PATH_VAR)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let settings = Self {
            encryption_secret,
            index_secret,
            bloom,
            database_path,
        };
        // Surface key reuse at startup rather than at first use.
        settings.secret_material()?;
        Ok(settings)
    }

    /// Derive the record-encryption and index keys.
    pub fn secret_material(&self) -> Result<SecretMaterial, ConfigError> {
        Ok(SecretMaterial::derive(
            self.encryption_secret.as_bytes(),
            self.index_secret.as_bytes(),
        )?)
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("encryption_secret", &"[REDACTED]")
            .field("index_secret", &"[REDACTED]")
            .field("bloom", &self.bloom)
            .field("database_path", &self.database_path)
            .finish()
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<Zeroizing<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name)
        .map(Zeroizing::new)
        .ok_or(ConfigError::Missing(name))?;
    if value.is_empty() {
        return Err(ConfigError::Missing(name));
    }
    Ok(value)
}

fn number<F>(lookup: &F, name: &'static str, default: u32) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value: raw }),
    }
}
